#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Loose backend payloads and their validation
pub mod raw;
/// Strongly typed assessment results
pub mod results;
/// Task kinds and word-count rules
pub mod task;

pub use raw::{SchemaError, normalize, parse_payload, strip_code_fences};
pub use results::{
    Annotation, AnnotationKind, AssessmentOrigin, AssessmentResult, Band, Correction, Criteria,
    CriterionScore, DisplayColor,
};
pub use task::{EssayTask, TaskKind, WordCountStatus, count_words, word_count_status};
