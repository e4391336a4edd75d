#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bandmark::backend::{BackendError, ChatBackend, ChatRequest, Credential};
use serde_json::{Value, json};
use tokio::time::Instant;

/// A key long enough to pass the local plausibility check.
pub const TEST_KEY: &str = "test-key-0123456789abcdefghij";

/// Backend that replays scripted replies and records every call.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    calls:   Mutex<Vec<(Instant, ChatRequest)>>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = Result<String, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls:   Mutex::new(Vec::new()),
        })
    }

    /// A backend with no scripted replies; every call fails.
    pub fn silent() -> Arc<Self> {
        Self::new(Vec::<Result<String, BackendError>>::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(
        &self,
        _credential: &Credential,
        request: &ChatRequest,
    ) -> Result<String, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), request.clone()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("script exhausted".into())))
    }
}

/// An essay of exactly `words` words.
pub fn essay(words: usize) -> String {
    let vocabulary = ["people", "believe", "technology", "is", "very", "important", "today"];
    (0..words)
        .map(|i| vocabulary[i % vocabulary.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// A grading payload that satisfies the scoring contract.
pub fn valid_payload() -> Value {
    json!({
        "overall_band": 6.5,
        "word_count": 999,
        "word_count_status": "Optimal",
        "criteria": {
            "task_response": { "score": 6.5, "feedback": "Addresses all parts." },
            "coherence_cohesion": { "score": 7.0, "feedback": "Logical progression." },
            "lexical_resource": { "score": 6.0, "feedback": "Adequate range." },
            "grammatical_range": { "score": 6.5, "feedback": "Mix of structures." }
        },
        "corrections": [
            {
                "original_sentence": "people thinks",
                "corrected_sentence": "people think",
                "explanation": "Agreement."
            }
        ],
        "annotations": [
            {
                "original_text": "very important",
                "type": "vocabulary_upgrade",
                "correction": "crucial",
                "explanation": "More precise.",
                "ui_color": "red"
            }
        ],
        "summary": "A competent answer."
    })
}
