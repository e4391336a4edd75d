//! Loose decoding of backend grading payloads and the normalisation step that
//! turns them into an [`AssessmentResult`].
//!
//! Nothing past [`normalize`] sees the raw structures.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use super::{
    results::{
        Annotation, AnnotationKind, AssessmentOrigin, AssessmentResult, Band, Correction,
        Criteria, CriterionScore,
    },
    task::WordCountStatus,
};
use crate::constants::{MISSING_FEEDBACK, MISSING_SUMMARY, NEUTRAL_CRITERION_SCORE};

/// Ways a backend grading payload can break the contract.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Payload is not parseable JSON.
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    /// Payload parsed but is not a JSON object.
    #[error("response is not a JSON object")]
    NotAnObject,
    /// Object fields have the wrong shape.
    #[error("response has an unexpected shape: {0}")]
    Shape(String),
    /// `overall_band` is absent or not a number.
    #[error("`overall_band` is missing or not numeric")]
    NonNumericBand,
    /// The `criteria` object is absent.
    #[error("`criteria` object is missing")]
    MissingCriteria,
    /// One of the four criterion keys is absent.
    #[error("criterion `{0}` is missing")]
    MissingCriterion(&'static str),
}

/// Criterion entry as sent by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCriterion {
    /// Score, hopefully numeric.
    #[serde(default)]
    pub score:    Option<Value>,
    /// Feedback, hopefully a string.
    #[serde(default)]
    pub feedback: Option<Value>,
}

/// Correction entry as sent by the backend. Both the long and short field
/// names are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCorrection {
    /// Original sentence (long form).
    #[serde(default)]
    pub original_sentence:  Option<Value>,
    /// Original sentence (short form).
    #[serde(default)]
    pub original:           Option<Value>,
    /// Corrected sentence (long form).
    #[serde(default)]
    pub corrected_sentence: Option<Value>,
    /// Corrected sentence (short form).
    #[serde(default)]
    pub corrected:          Option<Value>,
    /// Explanation.
    #[serde(default)]
    pub explanation:        Option<Value>,
}

/// Annotation entry as sent by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnnotation {
    /// Highlighted text.
    #[serde(default)]
    pub original_text: Option<Value>,
    /// Kind string.
    #[serde(default, rename = "type")]
    pub kind:          Option<Value>,
    /// Suggested fix.
    #[serde(default)]
    pub correction:    Option<Value>,
    /// Explanation.
    #[serde(default)]
    pub explanation:   Option<Value>,
    /// Free-form color hint; the color is always derived from the kind.
    #[serde(default)]
    pub ui_color:      Option<Value>,
}

/// Grading payload as sent by the backend, before validation.
///
/// Every field is kept as a [`Value`] so that one mistyped entry never fails
/// the whole decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAssessment {
    /// Backend aggregate band.
    #[serde(default)]
    pub overall_band:      Option<Value>,
    /// Echoed word count; informational only.
    #[serde(default)]
    pub word_count:        Option<Value>,
    /// Echoed word-count status; informational only.
    #[serde(default)]
    pub word_count_status: Option<Value>,
    /// Criterion entries keyed by wire name.
    #[serde(default)]
    pub criteria:          Option<Value>,
    /// Corrections.
    #[serde(default)]
    pub corrections:       Option<Value>,
    /// Annotations.
    #[serde(default)]
    pub annotations:       Option<Value>,
    /// Summary.
    #[serde(default)]
    pub summary:           Option<Value>,
}

/// Decodes `value` into `T`, falling back to `T::default()` when it has the
/// wrong shape.
fn lenient<T: DeserializeOwned + Default>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

/// Returns the string in `value`, if it holds one.
fn text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Elements of a JSON array that are objects, decoded leniently. Anything
/// other than an array yields nothing.
fn entries<T: DeserializeOwned + Default>(value: Option<Value>) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .map(lenient)
            .collect(),
        _ => Vec::new(),
    }
}

/// Removes a surrounding code fence (```` ```json ```` or ```` ``` ````) and
/// whitespace.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Decodes a backend reply into a [`RawAssessment`], stripping code fences
/// first.
pub fn parse_payload(text: &str) -> Result<RawAssessment, SchemaError> {
    let value: Value = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(SchemaError::NotAnObject);
    }
    serde_json::from_value(value).map_err(|e| SchemaError::Shape(e.to_string()))
}

/// Validates `raw` and builds the strongly typed result.
///
/// The locally computed `word_count` and `status` win over whatever the
/// backend echoed. Missing or mistyped scores, feedback and entries default;
/// a non-numeric band or an absent criterion key is a contract violation.
pub fn normalize(
    raw: RawAssessment,
    word_count: usize,
    status: WordCountStatus,
) -> Result<AssessmentResult, SchemaError> {
    let overall_band = raw
        .overall_band
        .as_ref()
        .and_then(Value::as_f64)
        .ok_or(SchemaError::NonNumericBand)?;

    let criteria = match raw.criteria {
        Some(Value::Object(map)) => map,
        _ => return Err(SchemaError::MissingCriteria),
    };
    let [task_response, coherence_cohesion, lexical_resource, grammatical_range] =
        Criteria::KEYS.map(|key| {
            criteria
                .get(key)
                .cloned()
                .map(|value| normalize_criterion(lenient(value)))
                .ok_or(SchemaError::MissingCriterion(key))
        });
    let criteria = Criteria {
        task_response:      task_response?,
        coherence_cohesion: coherence_cohesion?,
        lexical_resource:   lexical_resource?,
        grammatical_range:  grammatical_range?,
    };

    let corrections = entries::<RawCorrection>(raw.corrections)
        .into_iter()
        .map(|c| Correction {
            original:    text(c.original_sentence)
                .or_else(|| text(c.original))
                .unwrap_or_default(),
            corrected:   text(c.corrected_sentence)
                .or_else(|| text(c.corrected))
                .unwrap_or_default(),
            explanation: text(c.explanation).unwrap_or_default(),
        })
        .collect();

    let annotations = entries::<RawAnnotation>(raw.annotations)
        .into_iter()
        .map(|a| {
            Annotation::new(
                text(a.original_text).unwrap_or_default(),
                text(a.kind)
                    .as_deref()
                    .map(AnnotationKind::from_wire)
                    .unwrap_or(AnnotationKind::Grammar),
                text(a.correction).unwrap_or_default(),
                text(a.explanation).unwrap_or_default(),
            )
        })
        .collect();

    let summary = text(raw.summary)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| MISSING_SUMMARY.to_string());

    Ok(AssessmentResult::builder()
        .overall_band(Band::new(overall_band).for_presentation())
        .word_count(word_count)
        .word_count_status(status)
        .criteria(criteria)
        .corrections(corrections)
        .annotations(annotations)
        .summary(summary)
        .origin(AssessmentOrigin::Backend)
        .build())
}

/// Applies score and feedback defaults to one criterion.
fn normalize_criterion(raw: RawCriterion) -> CriterionScore {
    let score = raw
        .score
        .as_ref()
        .and_then(Value::as_f64)
        .unwrap_or(NEUTRAL_CRITERION_SCORE);
    let feedback = raw
        .feedback
        .as_ref()
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(MISSING_FEEDBACK);
    CriterionScore::new(Band::new(score), feedback)
}
