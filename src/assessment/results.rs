#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use bon::Builder;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

use super::task::WordCountStatus;
use crate::constants::{BAND_CEILING, OVERALL_BAND_FLOOR};

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
/// A band score on the 0-9 scale in 0.5 steps.
pub struct Band(f64);

impl From<f64> for Band {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Band> for f64 {
    fn from(band: Band) -> Self {
        band.0
    }
}

impl Band {
    /// Creates a band, rounding to the nearest 0.5 and clamping into [0, 9].
    /// Non-finite input collapses to 0.
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Self(0.0);
        }
        Self(round_half(value).clamp(0.0, BAND_CEILING))
    }

    /// Returns this band clamped into `[floor, ceiling]`.
    pub fn clamped(self, floor: f64, ceiling: f64) -> Self {
        Self(self.0.clamp(floor, ceiling))
    }

    /// Returns this band clamped into the presentation range [4, 9].
    pub fn for_presentation(self) -> Self {
        self.clamped(OVERALL_BAND_FLOOR, BAND_CEILING)
    }

    /// Mean of `bands`, rounded to the nearest 0.5. An empty slice yields 0.
    pub fn mean(bands: &[Band]) -> Self {
        if bands.is_empty() {
            return Self(0.0);
        }
        let total: f64 = bands.iter().map(|b| b.0).sum();
        Self::new(total / bands.len() as f64)
    }

    /// Returns the numeric value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Rounds to the nearest multiple of 0.5, halves away from zero.
pub(crate) fn round_half(value: f64) -> f64 {
    (value * 2.0).round() / 2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Score and feedback for one assessment criterion.
pub struct CriterionScore {
    /// Band awarded for the criterion.
    score:    Band,
    /// Examiner feedback for the criterion.
    feedback: String,
}

impl CriterionScore {
    /// Creates a criterion score.
    pub fn new(score: Band, feedback: impl Into<String>) -> Self {
        Self {
            score,
            feedback: feedback.into(),
        }
    }

    /// Returns the band.
    pub fn score(&self) -> Band {
        self.score
    }

    /// Returns the feedback text.
    pub fn feedback(&self) -> &str {
        &self.feedback
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// The four criteria every assessment reports.
pub struct Criteria {
    /// Task response / task achievement.
    pub task_response:      CriterionScore,
    /// Coherence and cohesion.
    pub coherence_cohesion: CriterionScore,
    /// Lexical resource.
    pub lexical_resource:   CriterionScore,
    /// Grammatical range and accuracy.
    pub grammatical_range:  CriterionScore,
}

impl Criteria {
    /// Wire keys of the four criteria, in display order.
    pub const KEYS: [&'static str; 4] = [
        "task_response",
        "coherence_cohesion",
        "lexical_resource",
        "grammatical_range",
    ];

    /// Returns `(label, score)` pairs in display order.
    pub fn labelled(&self) -> [(&'static str, &CriterionScore); 4] {
        [
            ("Task Response", &self.task_response),
            ("Coherence & Cohesion", &self.coherence_cohesion),
            ("Lexical Resource", &self.lexical_resource),
            ("Grammatical Range & Accuracy", &self.grammatical_range),
        ]
    }

    /// Returns the four bands in display order.
    pub fn bands(&self) -> [Band; 4] {
        [
            self.task_response.score,
            self.coherence_cohesion.score,
            self.lexical_resource.score,
            self.grammatical_range.score,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A suggested sentence-level rewrite.
pub struct Correction {
    /// Text expected to appear in the essay.
    pub original:    String,
    /// Suggested replacement.
    pub corrected:   String,
    /// Why the replacement is better.
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// What an inline annotation is about.
pub enum AnnotationKind {
    /// Misspelled word.
    Spelling,
    /// Grammar error.
    Grammar,
    /// Weak or repeated word with a stronger alternative.
    VocabularyUpgrade,
    /// Stylistic suggestion.
    Style,
    /// Linking or flow issue.
    Coherence,
}

impl AnnotationKind {
    /// Parses a backend-supplied kind, falling back to grammar for anything
    /// unrecognised.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "spelling" => AnnotationKind::Spelling,
            "vocabulary_upgrade" | "vocabulary" => AnnotationKind::VocabularyUpgrade,
            "style" => AnnotationKind::Style,
            "coherence" => AnnotationKind::Coherence,
            _ => AnnotationKind::Grammar,
        }
    }

    /// The highlight color used for this kind.
    pub fn display_color(self) -> DisplayColor {
        match self {
            AnnotationKind::Spelling => DisplayColor::Orange,
            AnnotationKind::Grammar => DisplayColor::Red,
            AnnotationKind::VocabularyUpgrade => DisplayColor::Yellow,
            AnnotationKind::Style => DisplayColor::Green,
            AnnotationKind::Coherence => DisplayColor::Blue,
        }
    }

    /// Legend label.
    pub fn label(self) -> &'static str {
        match self {
            AnnotationKind::Spelling => "spelling",
            AnnotationKind::Grammar => "grammar",
            AnnotationKind::VocabularyUpgrade => "vocabulary",
            AnnotationKind::Style => "style",
            AnnotationKind::Coherence => "coherence",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Highlight color, one per [`AnnotationKind`].
pub enum DisplayColor {
    /// Errors.
    Red,
    /// Vocabulary suggestions.
    Yellow,
    /// Style.
    Green,
    /// Coherence.
    Blue,
    /// Spelling.
    Orange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "AnnotationRecord")]
/// Inline comment tied to a substring of the essay.
pub struct Annotation {
    /// Substring of the essay to highlight.
    pub original_text: String,
    /// What the annotation is about.
    pub kind:          AnnotationKind,
    /// Suggested replacement.
    pub correction:    String,
    /// Short explanation.
    pub explanation:   String,
}

impl Annotation {
    /// Creates an annotation.
    pub fn new(
        original_text: impl Into<String>,
        kind: AnnotationKind,
        correction: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            kind,
            correction: correction.into(),
            explanation: explanation.into(),
        }
    }

    /// Highlight color, derived from the kind.
    pub fn display_color(&self) -> DisplayColor {
        self.kind.display_color()
    }
}

/// Serialized form of an [`Annotation`], with its derived color.
#[derive(Serialize)]
struct AnnotationRecord {
    /// Substring of the essay to highlight.
    original_text: String,
    /// What the annotation is about.
    kind:          AnnotationKind,
    /// Suggested replacement.
    correction:    String,
    /// Short explanation.
    explanation:   String,
    /// Highlight color for `kind`.
    display_color: DisplayColor,
}

impl From<Annotation> for AnnotationRecord {
    fn from(annotation: Annotation) -> Self {
        Self {
            display_color: annotation.display_color(),
            original_text: annotation.original_text,
            kind:          annotation.kind,
            correction:    annotation.correction,
            explanation:   annotation.explanation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Which path produced an assessment.
pub enum AssessmentOrigin {
    /// Graded by the language-model backend.
    Backend,
    /// Produced offline without a credential.
    Offline,
}

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
/// Complete feedback for one submission. Built once and never mutated.
pub struct AssessmentResult {
    /// Overall band, always within [4, 9].
    #[serde(deserialize_with = "presentation_band")]
    overall_band:      Band,
    /// Words counted locally.
    word_count:        usize,
    /// Status derived locally from the word count.
    word_count_status: WordCountStatus,
    /// The four criterion scores.
    criteria:          Criteria,
    /// Sentence-level rewrites.
    #[builder(default)]
    corrections:       Vec<Correction>,
    /// Inline annotations.
    #[builder(default)]
    annotations:       Vec<Annotation>,
    /// Free-text summary.
    summary:           String,
    /// Path that produced this result.
    origin:            AssessmentOrigin,
}

impl AssessmentResult {
    /// Returns the overall band.
    pub fn overall_band(&self) -> Band {
        self.overall_band
    }

    /// Returns the locally counted word count.
    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// Returns the word-count status.
    pub fn word_count_status(&self) -> WordCountStatus {
        self.word_count_status
    }

    /// Returns the criterion scores.
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Returns the corrections.
    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    /// Returns the annotations.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns the summary.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns which path produced this result.
    pub fn origin(&self) -> AssessmentOrigin {
        self.origin
    }
}

/// Reads an overall band, rejecting values outside the presentation range.
fn presentation_band<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Band, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !(OVERALL_BAND_FLOOR..=BAND_CEILING).contains(&value) {
        return Err(D::Error::custom(format!(
            "overall band {value} is outside [{OVERALL_BAND_FLOOR}, {BAND_CEILING}]"
        )));
    }
    Ok(Band::new(value))
}
