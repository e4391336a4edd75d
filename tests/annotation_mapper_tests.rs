use bandmark::{
    annotate::{Segment, map_annotations, segments},
    assessment::{Annotation, AnnotationKind},
};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn note(text: &str) -> Annotation {
    Annotation::new(text, AnnotationKind::Grammar, "fix", "because")
}

fn ranges(essay: &str, annotations: &[Annotation]) -> Vec<(usize, usize)> {
    map_annotations(essay, annotations)
        .iter()
        .map(|span| (span.start, span.end))
        .collect()
}

#[test]
fn no_annotations_no_spans() {
    assert!(map_annotations("Some essay text.", &[]).is_empty());
}

#[test]
fn repeated_text_claims_successive_occurrences() {
    let annotations = [note("bad"), note("bad"), note("bad")];
    assert_eq!(ranges("bad bad", &annotations), vec![(0, 3), (4, 7)]);
    assert_eq!(ranges("bad bad bad", &annotations), vec![(0, 3), (4, 7), (8, 11)]);
}

#[test]
fn text_missing_from_essay_is_dropped() {
    let annotations = [note("absent phrase"), note("essay")];
    let spans = map_annotations("A short essay.", &annotations);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].annotation.original_text, "essay");
    assert_eq!((spans[0].start, spans[0].end), (8, 13));
}

#[test]
fn empty_annotation_text_is_dropped() {
    assert!(map_annotations("anything", &[note("")]).is_empty());
}

#[test]
fn matching_ignores_case() {
    let essay = "This is VERY important.";
    let annotations = [note("very important")];
    let spans = map_annotations(essay, &annotations);
    assert_eq!(spans.len(), 1);
    let highlighted: String = essay
        .chars()
        .skip(spans[0].start)
        .take(spans[0].end - spans[0].start)
        .collect();
    assert_eq!(highlighted, "VERY important");
}

#[test]
fn orders_by_first_occurrence_not_input_order() {
    let essay = "first second third";
    let annotations = [note("third"), note("first"), note("second")];
    let spans = map_annotations(essay, &annotations);
    let texts: Vec<&str> = spans
        .iter()
        .map(|span| span.annotation.original_text.as_str())
        .collect();
    assert_eq!(texts, ["first", "second", "third"]);
}

#[test]
fn overlapping_annotations_never_overlap_in_output() {
    let essay = "the quick brown fox";
    let annotations = [note("quick brown"), note("brown fox")];
    assert_eq!(ranges(essay, &annotations), vec![(4, 15)]);
}

#[test]
fn offsets_are_characters_for_unicode_text() {
    let essay = "Café culture is très popular.";
    let annotations = [note("très")];
    assert_eq!(ranges(essay, &annotations), vec![(16, 20)]);

    let spans = map_annotations(essay, &annotations);
    let parts = segments(essay, &spans);
    assert!(matches!(parts[1], Segment::Highlight("très", _)));
}

#[test]
fn segments_reassemble_the_essay() {
    let essay = "People thinks technology is very important in a lot of ways.";
    let annotations = [note("a lot of"), note("people thinks"), note("very important")];
    let spans = map_annotations(essay, &annotations);
    let parts = segments(essay, &spans);

    let rebuilt: String = parts.iter().map(Segment::text).collect();
    assert_eq!(rebuilt, essay);
    assert_eq!(
        parts
            .iter()
            .filter(|part| matches!(part, Segment::Highlight(..)))
            .count(),
        3
    );
}

#[test]
fn spans_are_ascending_and_disjoint_for_random_input() {
    let words = ["alpha", "beta", "gamma", "delta", "alpha beta", "beta gamma", "zeta"];
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let essay = (0..rng.gen_range(0..30))
            .map(|_| words[rng.gen_range(0..4)])
            .collect::<Vec<_>>()
            .join(" ");
        let annotations: Vec<Annotation> = (0..rng.gen_range(0..8))
            .map(|_| note(words[rng.gen_range(0..words.len())]))
            .collect();

        let spans = map_annotations(&essay, &annotations);
        assert!(spans.len() <= annotations.len());
        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start, "overlap in {essay:?}");
        }
        for span in &spans {
            assert!(span.start < span.end);
            assert!(span.end <= essay.chars().count());
        }
        let rebuilt: String = segments(&essay, &spans).iter().map(Segment::text).collect();
        assert_eq!(rebuilt, essay);
    }
}
