#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

/// Essays shorter than this many words are rejected before any backend call.
pub const MIN_GRADABLE_WORDS: usize = 50;

/// Credentials shorter than this are rejected without a network round-trip.
pub const MIN_CREDENTIAL_LEN: usize = 20;

/// Number of most recent transcript turns sent with each tutoring request.
pub const HISTORY_WINDOW: usize = 6;

/// Attempt cap for a single tutoring `send`, first attempt included.
pub const MAX_TUTOR_ATTEMPTS: u32 = 3;

/// First backoff delay of the tutoring retry loop; doubles on each retry.
pub const TUTOR_BASE_DELAY: Duration = Duration::from_millis(2000);

/// Neutral score used when the backend omits a criterion score.
pub const NEUTRAL_CRITERION_SCORE: f64 = 5.0;

/// Feedback used when the backend omits a criterion's feedback.
pub const MISSING_FEEDBACK: &str = "No feedback provided.";

/// Summary used when the backend omits the summary.
pub const MISSING_SUMMARY: &str = "Assessment completed.";

/// Presentation clamp applied to every overall band.
pub const OVERALL_BAND_FLOOR: f64 = 4.0;

/// Upper end of the band scale.
pub const BAND_CEILING: f64 = 9.0;

/// Sampling temperature for grading calls.
pub const GRADING_TEMPERATURE: f32 = 0.2;

/// Sampling temperature for tutoring calls.
pub const TUTOR_TEMPERATURE: f32 = 0.6;

/// Default OpenAI-compatible base URL for grading.
pub const DEFAULT_GRADING_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";

/// Default model identifier for grading.
pub const DEFAULT_GRADING_MODEL: &str = "gemini-2.0-flash";

/// Default OpenAI-compatible base URL for tutoring.
pub const DEFAULT_TUTOR_ENDPOINT: &str = "https://api.deepseek.com";

/// Default model identifier for tutoring.
pub const DEFAULT_TUTOR_MODEL: &str = "deepseek-chat";

/// Message that opens a tutoring session with the welcome flow.
pub const TUTOR_OPENING_TRIGGER: &str =
    "Start the session now with the Welcome Message as defined in your instructions.";

/// Token asking the tutor for a structural hint.
pub const TUTOR_REQUEST_IDEA: &str = "REQUEST_IDEA";

/// Token asking the tutor for one model answer.
pub const TUTOR_REQUEST_EXAMPLE: &str = "REQUEST_EXAMPLE";

/// Separator between the tutor instruction and the learning material.
pub const LEARNING_MATERIAL_HEADER: &str = "\n\n=== LEARNING MATERIAL ===\n";
