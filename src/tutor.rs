//! Stateful tutoring conversation over the language-model backend.
//!
//! The transcript is owned by one [`TutorSession`] and mutated only by
//! [`TutorSession::send`]: the user turn is appended, then either the
//! assistant reply is appended or the user turn is rolled back. Callers
//! always get a [`TutorReply`] they can show in the conversation; failures
//! are reported in-band.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{sync::Arc, time::Duration};

use crate::{
    backend::{
        BackendError, ChatBackend, ChatRequest, ConversationTurn, Credential, FailureClass,
        classify,
    },
    config,
    constants::{
        DEFAULT_TUTOR_MODEL, HISTORY_WINDOW, LEARNING_MATERIAL_HEADER, MAX_TUTOR_ATTEMPTS,
        TUTOR_BASE_DELAY, TUTOR_OPENING_TRIGGER, TUTOR_REQUEST_EXAMPLE, TUTOR_REQUEST_IDEA,
        TUTOR_TEMPERATURE,
    },
};

/// Default tutor instruction.
pub const DEFAULT_TUTOR_INSTRUCTION: &str = include_str!("prompts/tutor_system.md");

/// Reply shown when the backend rejects the credential.
pub const AUTH_FAILURE_MESSAGE: &str = "System Error: Invalid API Key. Please contact support.";

/// Reply shown when the account is out of quota.
pub const QUOTA_FAILURE_MESSAGE: &str =
    "System Error: the tutoring quota is used up. Please contact support.";

/// Reply shown when retries run out on a busy backend.
pub const BUSY_FAILURE_MESSAGE: &str =
    "System Error: the tutor is currently busy. Please try again in a minute.";

/// Reply shown when `send` is called before `start`.
pub const INACTIVE_MESSAGE: &str = "The tutoring session has not been started.";

/// Exponential backoff schedule for tutoring calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first included.
    max_attempts: u32,
    /// Delay before the first retry; doubles each retry.
    base_delay:   Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_TUTOR_ATTEMPTS,
            base_delay:   TUTOR_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy. At least one attempt is always made.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the attempt cap.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the first retry delay.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Knobs for a tutoring session.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorSettings {
    /// Model identifier.
    pub model:          String,
    /// Sampling temperature.
    pub temperature:    f32,
    /// Most recent turns sent with each request.
    pub history_window: usize,
    /// Retry schedule.
    pub retry:          RetryPolicy,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            model:          DEFAULT_TUTOR_MODEL.to_string(),
            temperature:    TUTOR_TEMPERATURE,
            history_window: HISTORY_WINDOW,
            retry:          RetryPolicy::default(),
        }
    }
}

/// Lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No instruction or material loaded yet.
    Uninitialized,
    /// Ready to exchange messages.
    Active {
        /// Instruction with the learning material appended.
        system_prompt: String,
    },
}

/// Why a `send` produced no assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorFailure {
    /// Class of the last error.
    pub class:    FailureClass,
    /// Attempts made.
    pub attempts: u32,
    /// Message to show in the conversation.
    pub message:  String,
    /// Last backend error.
    pub cause:    BackendError,
}

/// Result of one `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorReply {
    /// The assistant answered; the exchange is in the transcript.
    Assistant(String),
    /// The tutor is unavailable; the user turn was rolled back.
    Unavailable(TutorFailure),
    /// The session was not started; nothing was recorded.
    Inactive,
}

impl TutorReply {
    /// Text to display, whatever the outcome.
    pub fn text(&self) -> &str {
        match self {
            TutorReply::Assistant(text) => text,
            TutorReply::Unavailable(failure) => &failure.message,
            TutorReply::Inactive => INACTIVE_MESSAGE,
        }
    }

    /// Whether the assistant answered.
    pub fn is_success(&self) -> bool {
        matches!(self, TutorReply::Assistant(_))
    }
}

/// One tutoring conversation.
///
/// Not safe for concurrent `send`s; `&mut self` enforces that.
pub struct TutorSession {
    /// Transport.
    backend:    Arc<dyn ChatBackend>,
    /// Key sent with every call.
    credential: Credential,
    /// Model, window and retry settings.
    settings:   TutorSettings,
    /// Lifecycle state.
    state:      SessionState,
    /// Full conversation, including turns outside the window.
    transcript: Vec<ConversationTurn>,
}

impl TutorSession {
    /// Creates an uninitialized session.
    pub fn new(backend: Arc<dyn ChatBackend>, credential: Credential, settings: TutorSettings) -> Self {
        Self {
            backend,
            credential,
            settings,
            state: SessionState::Uninitialized,
            transcript: Vec::new(),
        }
    }

    /// Creates an uninitialized session from the global configuration.
    pub fn from_config(credential: Credential) -> Self {
        let cfg = config::get();
        let settings = TutorSettings {
            model:          cfg.tutor().model().to_string(),
            temperature:    TUTOR_TEMPERATURE,
            history_window: cfg.history_window(),
            retry:          cfg.retry_policy(),
        };
        Self::new(cfg.tutor_backend(), credential, settings)
    }

    /// Starts the session with the default instruction.
    pub fn start(&mut self, material: &str, history: Vec<ConversationTurn>) {
        self.start_with_instruction(DEFAULT_TUTOR_INSTRUCTION, material, history);
    }

    /// Starts the session: loads the instruction and learning material once
    /// and restores `history` as the transcript.
    pub fn start_with_instruction(
        &mut self,
        instruction: &str,
        material: &str,
        history: Vec<ConversationTurn>,
    ) {
        let system_prompt = format!("{instruction}{LEARNING_MATERIAL_HEADER}{material}");
        tracing::info!("Tutoring session started with {} restored turns", history.len());
        self.state = SessionState::Active { system_prompt };
        self.transcript = history;
    }

    /// Clears the transcript and returns to `Uninitialized`.
    pub fn reset(&mut self) {
        self.state = SessionState::Uninitialized;
        self.transcript.clear();
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether the session has been started.
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    /// Returns the full transcript.
    pub fn transcript(&self) -> &[ConversationTurn] {
        &self.transcript
    }

    /// Returns the session settings.
    pub fn settings(&self) -> &TutorSettings {
        &self.settings
    }

    /// Sends the welcome trigger.
    pub async fn open(&mut self) -> TutorReply {
        self.send(TUTOR_OPENING_TRIGGER).await
    }

    /// Asks for a structural hint on the current question.
    pub async fn request_idea(&mut self) -> TutorReply {
        self.send(TUTOR_REQUEST_IDEA).await
    }

    /// Asks for a model answer to the current question.
    pub async fn request_example(&mut self) -> TutorReply {
        self.send(TUTOR_REQUEST_EXAMPLE).await
    }

    /// Sends `message` and waits for the tutor's reply, retrying transient
    /// failures with exponential backoff.
    pub async fn send(&mut self, message: impl Into<String>) -> TutorReply {
        let SessionState::Active { system_prompt } = &self.state else {
            return TutorReply::Inactive;
        };

        self.transcript.push(ConversationTurn::user(message));
        let window_start = self
            .transcript
            .len()
            .saturating_sub(self.settings.history_window);
        let request = ChatRequest::builder()
            .model(self.settings.model.clone())
            .system(system_prompt.clone())
            .turns(self.transcript[window_start..].to_vec())
            .temperature(self.settings.temperature)
            .build();

        let policy = self.settings.retry;
        let mut attempt = 1;
        loop {
            match self.backend.complete(&self.credential, &request).await {
                Ok(reply) => {
                    self.transcript.push(ConversationTurn::assistant(reply.clone()));
                    return TutorReply::Assistant(reply);
                }
                Err(err) => {
                    let class = classify(&err);
                    tracing::warn!(
                        "Tutor call failed (attempt {attempt}/{}, {class}): {err}",
                        policy.max_attempts()
                    );

                    if class.is_retryable() && attempt < policy.max_attempts() {
                        let delay = policy.delay_after(attempt);
                        tracing::info!("Tutor busy; retrying in {}ms", delay.as_millis());
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    self.transcript.pop();
                    tracing::warn!("Rolled back unanswered user turn after {attempt} attempt(s)");
                    return TutorReply::Unavailable(TutorFailure {
                        class,
                        attempts: attempt,
                        message: failure_message(class, &err),
                        cause: err,
                    });
                }
            }
        }
    }
}

/// In-band message for a final failure.
fn failure_message(class: FailureClass, err: &BackendError) -> String {
    match (class, err) {
        (FailureClass::FatalAuth, _) => AUTH_FAILURE_MESSAGE.to_string(),
        (FailureClass::FatalQuota, _) => QUOTA_FAILURE_MESSAGE.to_string(),
        (_, BackendError::RateLimited(_) | BackendError::Overloaded(_)) => {
            BUSY_FAILURE_MESSAGE.to_string()
        }
        (_, other) => format!("Teacher Connection Error: {other}"),
    }
}
