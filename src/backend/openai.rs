#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::time::Duration;

use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    ResponseFormat,
};
use async_trait::async_trait;
use reqwest::Client;

use super::{BackendError, ChatBackend, ChatRequest, ConversationTurn, Credential, ReplyFormat, Role};

/// Chat-completions transport for any OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiBackend {
    /// Shared HTTP client.
    client:   Client,
    /// Base URL, without the `/chat/completions` suffix.
    api_base: String,
    /// Per-request timeout.
    timeout:  Duration,
}

impl OpenAiBackend {
    /// Creates a transport against `api_base`.
    pub fn new(client: Client, api_base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            timeout,
        }
    }

    /// Full chat-completions URL.
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// Converts one turn into the wire message type.
fn to_message(turn: &ConversationTurn) -> Result<ChatCompletionRequestMessage, BackendError> {
    let message = match turn.role {
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(turn.content.clone())
            .build()
            .map(Into::into),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(turn.content.clone())
            .build()
            .map(Into::into),
    };
    message.map_err(|e| BackendError::Transport(format!("could not build message: {e}")))
}

/// Builds the wire request for `request`.
pub fn to_openai_request(request: &ChatRequest) -> Result<CreateChatCompletionRequest, BackendError> {
    let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(request.turns.len() + 1);
    messages.push(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system.clone())
            .build()
            .map_err(|e| BackendError::Transport(format!("could not build message: {e}")))?
            .into(),
    );
    for turn in &request.turns {
        messages.push(to_message(turn)?);
    }

    let mut args = CreateChatCompletionRequestArgs::default();
    args.model(request.model.clone())
        .messages(messages)
        .temperature(request.temperature);
    if request.reply_format == ReplyFormat::JsonObject {
        args.response_format(ResponseFormat::JsonObject);
    }
    args.build()
        .map_err(|e| BackendError::Transport(format!("could not build request: {e}")))
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(
        &self,
        credential: &Credential,
        request: &ChatRequest,
    ) -> Result<String, BackendError> {
        let body = to_openai_request(request)?;
        tracing::debug!(
            "POST {} model={} turns={}",
            self.endpoint(),
            request.model,
            request.turns.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(credential.expose())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status, &text));
        }

        let parsed: CreateChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(BackendError::EmptyReply)
    }
}
