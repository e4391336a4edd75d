//! Offline assessment used when no backend credential is configured.
//!
//! The result is built from static templates. The only randomness is a small
//! per-criterion perturbation, and the overall band is recomputed from the
//! criteria, so the output is always well formed.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use rand::Rng;

use crate::{
    assessment::{
        Annotation, AnnotationKind, AssessmentOrigin, AssessmentResult, Band, Correction,
        Criteria, CriterionScore, WordCountStatus,
    },
    constants::{BAND_CEILING, OVERALL_BAND_FLOOR},
};

/// Largest absolute perturbation applied to a criterion's base score.
pub const MAX_PERTURBATION: f64 = 0.25;

/// Base score for a word-count status.
pub fn base_score(status: WordCountStatus) -> f64 {
    match status {
        WordCountStatus::Optimal => 6.0,
        WordCountStatus::TooShortPenalized | WordCountStatus::TooLongPenalized => 5.5,
        WordCountStatus::SeverelyUnderLength => 4.5,
    }
}

/// Coarse quality tier used to pick template wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    /// 7.0 and above.
    Strong,
    /// 5.5 to 6.5.
    Competent,
    /// Below 5.5.
    Developing,
}

impl Tier {
    /// Tier for an overall band.
    fn of(band: Band) -> Self {
        if band.value() >= 7.0 {
            Tier::Strong
        } else if band.value() >= 5.5 {
            Tier::Competent
        } else {
            Tier::Developing
        }
    }
}

/// Generates an offline assessment using the thread-local RNG.
pub fn generate(word_count: usize, status: WordCountStatus) -> AssessmentResult {
    generate_with_rng(word_count, status, &mut rand::thread_rng())
}

/// Generates an offline assessment drawing perturbations from `rng`.
pub fn generate_with_rng<R: Rng>(
    word_count: usize,
    status: WordCountStatus,
    rng: &mut R,
) -> AssessmentResult {
    let base = base_score(status);
    let mut draw = || {
        let jitter = rng.gen_range(-MAX_PERTURBATION..=MAX_PERTURBATION);
        Band::new(base + jitter).clamped(OVERALL_BAND_FLOOR, BAND_CEILING)
    };
    let scores = [draw(), draw(), draw(), draw()];
    let overall = Band::mean(&scores).clamped(OVERALL_BAND_FLOOR, BAND_CEILING);
    let tier = Tier::of(overall);

    let criteria = Criteria {
        task_response:      CriterionScore::new(scores[0], task_response_feedback(status)),
        coherence_cohesion: CriterionScore::new(
            scores[1],
            "The essay shows a reasonable organisation with clear paragraphing. Use a wider \
             range of cohesive devices to improve the flow between ideas.",
        ),
        lexical_resource:   CriterionScore::new(
            scores[2],
            "Vocabulary is adequate for the topic. Bring in more precise, less common words \
             and avoid repeating the same expressions.",
        ),
        grammatical_range:  CriterionScore::new(
            scores[3],
            "Grammar shows some control of complex structures. Keep accuracy high while \
             trying a wider variety of sentence patterns.",
        ),
    };

    tracing::debug!("offline assessment: status={status} overall={overall}");

    AssessmentResult::builder()
        .overall_band(overall)
        .word_count(word_count)
        .word_count_status(status)
        .criteria(criteria)
        .corrections(generic_corrections())
        .annotations(generic_annotations())
        .summary(summary(tier, status))
        .origin(AssessmentOrigin::Offline)
        .build()
}

/// Task-response feedback for a word-count status.
fn task_response_feedback(status: WordCountStatus) -> &'static str {
    match status {
        WordCountStatus::Optimal => {
            "The response addresses the main parts of the question. Develop each argument \
             with a specific example or piece of evidence."
        }
        WordCountStatus::TooShortPenalized => {
            "The response is under the expected length, which limits how fully the task is \
             covered. Extend the main points with explanation and examples."
        }
        WordCountStatus::SeverelyUnderLength => {
            "The response is far too short to cover the task. Plan an introduction, two \
             developed body paragraphs and a conclusion."
        }
        WordCountStatus::TooLongPenalized => {
            "The response runs well over the expected length and loses focus. Keep only the \
             points that answer the question directly."
        }
    }
}

/// Summary text for a tier and word-count status.
fn summary(tier: Tier, status: WordCountStatus) -> String {
    let quality = match tier {
        Tier::Strong => "a strong response that effectively addresses",
        Tier::Competent => "a competent response that adequately addresses",
        Tier::Developing => "a developing response that partly addresses",
    };
    let length = match status {
        WordCountStatus::Optimal => "The length is appropriate for the task.",
        WordCountStatus::TooShortPenalized => {
            "It is shorter than required; write more to develop your ideas fully."
        }
        WordCountStatus::SeverelyUnderLength => {
            "It is far shorter than required, which heavily limits the score."
        }
        WordCountStatus::TooLongPenalized => {
            "It is longer than needed; tighten it to keep the argument focused."
        }
    };
    let focus = match tier {
        Tier::Strong => "refining word choice and strengthening cohesive devices",
        Tier::Competent | Tier::Developing => {
            "supporting arguments with specific examples and improving grammatical accuracy"
        }
    };
    format!(
        "This is an offline estimate: {quality} the question. {length} Focus on {focus} to \
         raise your band."
    )
}

/// Fixed sample corrections.
fn generic_corrections() -> Vec<Correction> {
    vec![
        Correction {
            original:    "The technology is very important in modern life.".into(),
            corrected:   "Technology plays a vital role in modern life.".into(),
            explanation: "Drop the unnecessary article and replace \"very important\" with a \
                          more precise phrase."
                .into(),
        },
        Correction {
            original:    "Many people thinks that...".into(),
            corrected:   "Many people think that...".into(),
            explanation: "Subject-verb agreement: \"people\" is plural.".into(),
        },
        Correction {
            original:    "In conclusion, I believe that both sides have their merits.".into(),
            corrected:   "In conclusion, while both views have merit, I firmly believe that..."
                .into(),
            explanation: "State a clearer personal position in the conclusion.".into(),
        },
    ]
}

/// Fixed sample annotations over common phrases.
fn generic_annotations() -> Vec<Annotation> {
    vec![
        Annotation::new(
            "very important",
            AnnotationKind::VocabularyUpgrade,
            "crucial",
            "A single precise adjective reads better than an intensifier.",
        ),
        Annotation::new(
            "a lot of",
            AnnotationKind::VocabularyUpgrade,
            "a great deal of",
            "Prefer a more formal quantifier in academic writing.",
        ),
        Annotation::new(
            "people thinks",
            AnnotationKind::Grammar,
            "people think",
            "\"people\" takes a plural verb.",
        ),
        Annotation::new(
            "In conclusion",
            AnnotationKind::Coherence,
            "To conclude",
            "Vary the signal that introduces your conclusion.",
        ),
    ]
}
