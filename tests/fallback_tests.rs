use bandmark::{
    assessment::{AssessmentOrigin, Band, WordCountStatus},
    grading::fallback::{MAX_PERTURBATION, base_score, generate, generate_with_rng},
};
use rand::{SeedableRng, rngs::StdRng};

const STATUSES: [WordCountStatus; 4] = [
    WordCountStatus::Optimal,
    WordCountStatus::TooShortPenalized,
    WordCountStatus::SeverelyUnderLength,
    WordCountStatus::TooLongPenalized,
];

#[test]
fn offline_results_are_always_well_formed() {
    for status in STATUSES {
        for seed in 0..250 {
            let mut rng = StdRng::seed_from_u64(seed);
            let result = generate_with_rng(275, status, &mut rng);

            assert_eq!(result.origin(), AssessmentOrigin::Offline);
            assert_eq!(result.word_count(), 275);
            assert_eq!(result.word_count_status(), status);

            let bands = result.criteria().bands();
            for band in bands {
                let value = band.value();
                assert!((4.0..=9.0).contains(&value), "criterion {value} out of range");
                assert_eq!((value * 2.0).fract(), 0.0, "criterion {value} not a half band");
                assert!((value - base_score(status)).abs() <= MAX_PERTURBATION + 0.25);
            }

            let overall = result.overall_band();
            assert_eq!(overall, Band::mean(&bands).clamped(4.0, 9.0));
            assert!((4.0..=9.0).contains(&overall.value()));

            assert!(!result.summary().is_empty());
            assert!(!result.corrections().is_empty());
            assert!(!result.annotations().is_empty());
            for (_, score) in result.criteria().labelled() {
                assert!(!score.feedback().is_empty());
            }
        }
    }
}

#[test]
fn base_score_tracks_length_status() {
    assert_eq!(base_score(WordCountStatus::Optimal), 6.0);
    assert_eq!(base_score(WordCountStatus::TooShortPenalized), 5.5);
    assert_eq!(base_score(WordCountStatus::TooLongPenalized), 5.5);
    assert_eq!(base_score(WordCountStatus::SeverelyUnderLength), 4.5);
}

#[test]
fn summary_marks_result_as_offline() {
    let result = generate(180, WordCountStatus::SeverelyUnderLength);
    assert!(result.summary().contains("offline"));
    assert!(result.summary().contains("far shorter"));
}
