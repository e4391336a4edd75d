#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// OpenAI-compatible chat-completions transport
pub mod openai;

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::constants::MIN_CREDENTIAL_LEN;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The student.
    User,
    /// The model.
    Assistant,
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who wrote it.
    pub role:    Role,
    /// What was written.
    pub content: String,
}

impl ConversationTurn {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role:    Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role:    Role::Assistant,
            content: content.into(),
        }
    }
}

/// Shape the backend is asked to reply in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFormat {
    /// Free text.
    #[default]
    Text,
    /// A single JSON object.
    JsonObject,
}

/// A transport-agnostic chat request.
#[derive(Debug, Clone, PartialEq, bon::Builder)]
#[builder(on(String, into))]
pub struct ChatRequest {
    /// Model identifier.
    pub model:        String,
    /// System instruction sent ahead of the turns.
    pub system:       String,
    /// Conversation turns, oldest first.
    #[builder(default)]
    pub turns:        Vec<ConversationTurn>,
    /// Sampling temperature.
    pub temperature:  f32,
    /// Requested reply shape.
    #[builder(default)]
    pub reply_format: ReplyFormat,
}

/// A backend API key that passed the local plausibility check.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validates a raw key. Blank input is [`CredentialError::Missing`];
    /// anything shorter than the plausibility floor is
    /// [`CredentialError::InvalidFormat`].
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(CredentialError::Missing);
        }
        let length = key.chars().count();
        if length < MIN_CREDENTIAL_LEN {
            return Err(CredentialError::InvalidFormat { length });
        }
        Ok(Self(key.to_owned()))
    }

    /// Returns the key for use in an authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(<{} chars redacted>)", self.0.chars().count())
    }
}

/// Local credential problems, detected before any network call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// No key was supplied or configured.
    #[error("no API key is configured")]
    Missing,
    /// The key is too short to be real.
    #[error("API key looks invalid ({length} characters)")]
    InvalidFormat {
        /// Character count of the rejected key.
        length: usize,
    },
}

/// Failures reported by a [`ChatBackend`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend rejected the credential.
    #[error("credential rejected: {0}")]
    Unauthorized(String),
    /// The account's quota or balance is exhausted.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    /// Too many requests.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// The backend is overloaded or failing server-side.
    #[error("backend overloaded: {0}")]
    Overloaded(String),
    /// The backend answered without any content.
    #[error("backend returned an empty reply")]
    EmptyReply,
    /// The reply envelope could not be decoded.
    #[error("could not decode backend reply: {0}")]
    Decode(String),
    /// Network or other transport fault.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl BackendError {
    /// Classifies a non-success HTTP status and its body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let lower = body.to_ascii_lowercase();
        let detail = if body.trim().is_empty() {
            status.to_string()
        } else {
            format!("{status}: {}", body.trim())
        };
        let mentions_quota = lower.contains("quota")
            || lower.contains("insufficient")
            || lower.contains("billing");
        let mentions_bad_key = lower.contains("api_key_invalid")
            || (lower.contains("api key") && lower.contains("not valid"))
            || lower.contains("invalid api key");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized(detail),
            StatusCode::BAD_REQUEST if mentions_bad_key => BackendError::Unauthorized(detail),
            StatusCode::PAYMENT_REQUIRED => BackendError::QuotaExceeded(detail),
            StatusCode::TOO_MANY_REQUESTS if mentions_quota => BackendError::QuotaExceeded(detail),
            StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited(detail),
            s if s.is_server_error() => BackendError::Overloaded(detail),
            _ => BackendError::Transport(detail),
        }
    }
}

/// Outcome classes that drive retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureClass {
    /// Credential rejected; retrying cannot help.
    FatalAuth,
    /// Quota exhausted; the user has to act.
    FatalQuota,
    /// The reply envelope broke its contract.
    FatalSchema,
    /// Expected to clear up on retry.
    Transient,
}

impl FailureClass {
    /// Whether a retry may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureClass::Transient)
    }
}

impl Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FailureClass::FatalAuth => "fatal-auth",
            FailureClass::FatalQuota => "fatal-quota",
            FailureClass::FatalSchema => "fatal-schema",
            FailureClass::Transient => "transient",
        };
        f.write_str(label)
    }
}

/// Maps a backend failure to its retry class.
pub fn classify(error: &BackendError) -> FailureClass {
    match error {
        BackendError::Unauthorized(_) => FailureClass::FatalAuth,
        BackendError::QuotaExceeded(_) => FailureClass::FatalQuota,
        BackendError::Decode(_) => FailureClass::FatalSchema,
        BackendError::RateLimited(_)
        | BackendError::Overloaded(_)
        | BackendError::EmptyReply
        | BackendError::Transport(_) => FailureClass::Transient,
    }
}

/// A request/response language-model endpoint.
///
/// Implementations own timeouts; callers own retries.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends `request` authenticated with `credential` and returns the reply
    /// text.
    async fn complete(
        &self,
        credential: &Credential,
        request: &ChatRequest,
    ) -> Result<String, BackendError>;
}
