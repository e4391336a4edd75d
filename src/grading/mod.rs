//! One-shot essay grading against the language-model backend.
//!
//! A grading call is user-initiated and stateless, so it is issued exactly
//! once: any failure goes straight back to the caller as a [`GradingError`].

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Offline assessment generator
pub mod fallback;

use std::sync::Arc;

use crate::{
    assessment::{
        AssessmentResult, EssayTask, SchemaError, WordCountStatus, count_words, normalize,
        parse_payload, word_count_status,
    },
    backend::{
        BackendError, ChatBackend, ChatRequest, ConversationTurn, Credential, CredentialError,
        ReplyFormat,
    },
    config,
    constants::{DEFAULT_GRADING_MODEL, GRADING_TEMPERATURE, MIN_GRADABLE_WORDS},
};

/// System instruction for grading calls.
pub const GRADING_SYSTEM_PROMPT: &str = include_str!("../prompts/grading_system.md");

/// Everything that can stop a grading request.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GradingError {
    /// Live grading was requested but no credential is available.
    #[error("no API key is configured for grading")]
    MissingCredential,
    /// The credential is implausibly short.
    #[error("the API key looks invalid ({length} characters)")]
    InvalidCredentialFormat {
        /// Character count of the rejected key.
        length: usize,
    },
    /// The essay is below the gradable floor.
    #[error("the essay has {words} words; at least {minimum} are needed for grading")]
    TooShortToGrade {
        /// Words counted.
        words:   usize,
        /// Required minimum.
        minimum: usize,
    },
    /// The backend answered with nothing.
    #[error("the grading service returned an empty response")]
    EmptyBackendResponse,
    /// The backend's payload broke the scoring contract.
    #[error("the grading service returned a malformed response: {0}")]
    MalformedBackendResponse(#[from] SchemaError),
    /// The backend rejected the credential.
    #[error("the grading service rejected the API key: {0}")]
    AuthenticationRejected(String),
    /// The account's quota is exhausted.
    #[error("the grading quota is exhausted: {0}")]
    QuotaExceeded(String),
    /// Too many requests.
    #[error("the grading service is rate limiting requests: {0}")]
    RateLimited(String),
    /// Network or generic backend fault.
    #[error("could not reach the grading service: {0}")]
    TransportFailure(String),
}

/// Broad error families, for choosing what to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing, malformed or rejected key.
    Credential,
    /// The essay itself cannot be graded.
    Input,
    /// The backend broke its response contract.
    Schema,
    /// Worth trying again later.
    Transient,
    /// The user must top up or wait for the quota window.
    Quota,
}

impl GradingError {
    /// Family this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            GradingError::MissingCredential
            | GradingError::InvalidCredentialFormat { .. }
            | GradingError::AuthenticationRejected(_) => ErrorCategory::Credential,
            GradingError::TooShortToGrade { .. } => ErrorCategory::Input,
            GradingError::EmptyBackendResponse | GradingError::MalformedBackendResponse(_) => {
                ErrorCategory::Schema
            }
            GradingError::RateLimited(_) | GradingError::TransportFailure(_) => {
                ErrorCategory::Transient
            }
            GradingError::QuotaExceeded(_) => ErrorCategory::Quota,
        }
    }

    /// Short, actionable advice for the user.
    pub fn user_hint(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Credential => "Check your API key in the settings.",
            ErrorCategory::Input => "Write more before submitting for grading.",
            ErrorCategory::Schema => "The grader returned an unusable answer. Please submit again.",
            ErrorCategory::Transient => "The grader is busy. Try again shortly.",
            ErrorCategory::Quota => "Your grading quota is used up. Top up or wait for it to reset.",
        }
    }
}

impl From<CredentialError> for GradingError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Missing => GradingError::MissingCredential,
            CredentialError::InvalidFormat { length } => {
                GradingError::InvalidCredentialFormat { length }
            }
        }
    }
}

impl From<BackendError> for GradingError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unauthorized(msg) => GradingError::AuthenticationRejected(msg),
            BackendError::QuotaExceeded(msg) => GradingError::QuotaExceeded(msg),
            BackendError::RateLimited(msg) => GradingError::RateLimited(msg),
            BackendError::EmptyReply => GradingError::EmptyBackendResponse,
            BackendError::Decode(msg) => {
                GradingError::MalformedBackendResponse(SchemaError::Shape(msg))
            }
            BackendError::Overloaded(msg) | BackendError::Transport(msg) => {
                GradingError::TransportFailure(msg)
            }
        }
    }
}

/// Grades essays, live when a credential resolves and offline otherwise.
#[derive(Clone)]
pub struct Grader {
    /// Transport for live grading.
    backend:            Arc<dyn ChatBackend>,
    /// Model identifier sent with each request.
    model:              String,
    /// Key used when the caller does not supply one.
    default_credential: Option<String>,
}

impl Grader {
    /// Creates a grader with no default credential.
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            model: DEFAULT_GRADING_MODEL.to_string(),
            default_credential: None,
        }
    }

    /// Creates a grader from the global configuration.
    pub fn from_config() -> Self {
        let cfg = config::get();
        Self {
            backend:            cfg.grading_backend(),
            model:              cfg.grading().model().to_string(),
            default_credential: cfg.grading().api_key().map(str::to_owned),
        }
    }

    /// Overrides the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the key used when callers pass none.
    pub fn with_default_credential(mut self, key: impl Into<String>) -> Self {
        self.default_credential = Some(key.into());
        self
    }

    /// Picks the caller's key, then the default; blank keys count as absent.
    fn resolve_credential<'a>(&'a self, supplied: Option<&'a str>) -> Option<&'a str> {
        supplied
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.default_credential
                    .as_deref()
                    .filter(|k| !k.trim().is_empty())
            })
    }

    /// Grades `essay`. Falls back to the offline generator when no credential
    /// resolves.
    pub async fn grade(
        &self,
        task: &EssayTask,
        essay: &str,
        credential: Option<&str>,
    ) -> Result<AssessmentResult, GradingError> {
        let (word_count, status) = precheck(task, essay)?;
        match self.resolve_credential(credential) {
            None => {
                tracing::info!("No grading credential configured; using offline assessment");
                Ok(fallback::generate(word_count, status))
            }
            Some(raw) => {
                let credential = Credential::parse(raw)?;
                self.grade_remote(task, essay, word_count, status, &credential)
                    .await
            }
        }
    }

    /// Grades `essay` against the backend only; a missing credential is an
    /// error rather than a reason to fall back.
    pub async fn grade_live(
        &self,
        task: &EssayTask,
        essay: &str,
        credential: Option<&str>,
    ) -> Result<AssessmentResult, GradingError> {
        let (word_count, status) = precheck(task, essay)?;
        let raw = self
            .resolve_credential(credential)
            .ok_or(GradingError::MissingCredential)?;
        let credential = Credential::parse(raw)?;
        self.grade_remote(task, essay, word_count, status, &credential)
            .await
    }

    /// Builds the single grading request for an essay.
    pub fn build_request(
        &self,
        task: &EssayTask,
        essay: &str,
        word_count: usize,
        status: WordCountStatus,
    ) -> ChatRequest {
        let optimal = task.optimal_range();
        let content = format!(
            include_str!("../prompts/grading_request.md"),
            TASK_LABEL = task.kind().label(),
            PROMPT = task.prompt(),
            ESSAY = essay,
            WORD_COUNT = word_count,
            OPTIMAL_MIN = optimal.start(),
            OPTIMAL_MAX = optimal.end(),
            STATUS = status,
        );

        ChatRequest::builder()
            .model(self.model.clone())
            .system(GRADING_SYSTEM_PROMPT)
            .turns(vec![ConversationTurn::user(content)])
            .temperature(GRADING_TEMPERATURE)
            .reply_format(ReplyFormat::JsonObject)
            .build()
    }

    /// Issues the one backend call and validates its reply.
    async fn grade_remote(
        &self,
        task: &EssayTask,
        essay: &str,
        word_count: usize,
        status: WordCountStatus,
        credential: &Credential,
    ) -> Result<AssessmentResult, GradingError> {
        let request = self.build_request(task, essay, word_count, status);
        tracing::info!(
            "Grading {} essay ({word_count} words, {status}) with {}",
            task.kind(),
            self.model
        );

        let reply = self
            .backend
            .complete(credential, &request)
            .await
            .inspect_err(|e| tracing::warn!("Grading call failed: {e}"))?;

        if reply.trim().is_empty() {
            return Err(GradingError::EmptyBackendResponse);
        }

        let raw = parse_payload(&reply).inspect_err(|e| {
            tracing::warn!("Grading reply failed to parse: {e}");
        })?;
        Ok(normalize(raw, word_count, status)
            .inspect_err(|e| tracing::warn!("Grading reply failed validation: {e}"))?)
    }
}

/// Counts words and enforces the gradable floor.
fn precheck(task: &EssayTask, essay: &str) -> Result<(usize, WordCountStatus), GradingError> {
    let words = count_words(essay);
    if words < MIN_GRADABLE_WORDS {
        return Err(GradingError::TooShortToGrade {
            words,
            minimum: MIN_GRADABLE_WORDS,
        });
    }
    Ok((words, word_count_status(task.kind(), words)))
}
