#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use postgrest::Postgrest;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{assessment::AssessmentResult, backend::ConversationTurn, config};

/// Save/load collaborator for assessments and tutoring transcripts.
#[async_trait]
pub trait Store: Send + Sync {
    /// Saves `result` under `submission_id`, replacing any previous value.
    async fn save_assessment(&self, submission_id: &str, result: &AssessmentResult) -> Result<()>;

    /// Loads the assessment saved under `submission_id`.
    async fn load_assessment(&self, submission_id: &str) -> Result<Option<AssessmentResult>>;

    /// Saves `turns` as the transcript of `user_id`, replacing any previous
    /// one.
    async fn save_transcript(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()>;

    /// Loads the transcript of `user_id`; empty when none was saved.
    async fn load_transcript(&self, user_id: &str) -> Result<Vec<ConversationTurn>>;
}

/// Returns the Supabase-backed store when configured, otherwise an in-memory
/// one.
pub fn from_config() -> Arc<dyn Store> {
    match config::postgrest_client() {
        Some(client) => {
            tracing::info!("Persisting to Supabase");
            Arc::new(PostgrestStore::new(client))
        }
        None => {
            tracing::info!("Supabase not configured; results are kept in memory only");
            Arc::new(MemoryStore::default())
        }
    }
}

/// Process-local store that keeps JSON blobs in maps.
#[derive(Default)]
pub struct MemoryStore {
    /// Serialized assessments by submission id.
    assessments: Mutex<HashMap<String, String>>,
    /// Serialized transcripts by user id.
    transcripts: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn save_assessment(&self, submission_id: &str, result: &AssessmentResult) -> Result<()> {
        let blob = serde_json::to_string(result).context("Failed to serialize assessment")?;
        self.assessments
            .lock()
            .await
            .insert(submission_id.to_owned(), blob);
        Ok(())
    }

    async fn load_assessment(&self, submission_id: &str) -> Result<Option<AssessmentResult>> {
        self.assessments
            .lock()
            .await
            .get(submission_id)
            .map(|blob| serde_json::from_str(blob).context("Stored assessment is corrupt"))
            .transpose()
    }

    async fn save_transcript(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        let blob = serde_json::to_string(turns).context("Failed to serialize transcript")?;
        self.transcripts
            .lock()
            .await
            .insert(user_id.to_owned(), blob);
        Ok(())
    }

    async fn load_transcript(&self, user_id: &str) -> Result<Vec<ConversationTurn>> {
        match self.transcripts.lock().await.get(user_id) {
            Some(blob) => serde_json::from_str(blob).context("Stored transcript is corrupt"),
            None => Ok(Vec::new()),
        }
    }
}

/// Row of the `assessments` table.
#[derive(Serialize, Deserialize)]
struct AssessmentRow {
    /// Submission id.
    id:      String,
    /// Assessment as JSON.
    payload: AssessmentResult,
}

/// Row of the `transcripts` table.
#[derive(Serialize, Deserialize)]
struct TranscriptRow {
    /// Owner of the conversation.
    user_id: String,
    /// Turns as JSON.
    turns:   Vec<ConversationTurn>,
}

/// Supabase PostgREST store using the `assessments` and `transcripts` tables.
pub struct PostgrestStore {
    /// PostgREST client with the API key header set.
    client: Postgrest,
}

impl PostgrestStore {
    /// Wraps a configured client.
    pub fn new(client: Postgrest) -> Self {
        Self { client }
    }

    /// Upserts a JSON body into `table`, resolving conflicts on `key`.
    async fn upsert(&self, table: &str, key: &str, body: String) -> Result<()> {
        let response = self
            .client
            .from(table)
            .upsert(body)
            .on_conflict(key)
            .execute()
            .await
            .with_context(|| format!("Failed to write to Supabase table `{table}`"))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("Supabase rejected write to `{table}` ({status}): {text}");
        }
        Ok(())
    }

    /// Selects the rows of `table` whose `key` equals `value`.
    async fn select<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        key: &str,
        value: &str,
    ) -> Result<Vec<T>> {
        let response = self
            .client
            .from(table)
            .select("*")
            .eq(key, value)
            .execute()
            .await
            .with_context(|| format!("Failed to read from Supabase table `{table}`"))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("Supabase rejected read from `{table}` ({status}): {text}");
        }
        let text = response
            .text()
            .await
            .with_context(|| format!("Could not read response body from `{table}`"))?;
        serde_json::from_str(&text).with_context(|| format!("Unexpected rows from `{table}`"))
    }
}

#[async_trait]
impl Store for PostgrestStore {
    async fn save_assessment(&self, submission_id: &str, result: &AssessmentResult) -> Result<()> {
        let row = AssessmentRow {
            id:      submission_id.to_owned(),
            payload: result.clone(),
        };
        self.upsert("assessments", "id", serde_json::to_string(&row)?)
            .await
    }

    async fn load_assessment(&self, submission_id: &str) -> Result<Option<AssessmentResult>> {
        let rows: Vec<AssessmentRow> = self.select("assessments", "id", submission_id).await?;
        Ok(rows.into_iter().next().map(|row| row.payload))
    }

    async fn save_transcript(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<()> {
        let row = TranscriptRow {
            user_id: user_id.to_owned(),
            turns:   turns.to_vec(),
        };
        self.upsert("transcripts", "user_id", serde_json::to_string(&row)?)
            .await
    }

    async fn load_transcript(&self, user_id: &str) -> Result<Vec<ConversationTurn>> {
        let rows: Vec<TranscriptRow> = self.select("transcripts", "user_id", user_id).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.turns)
            .unwrap_or_default())
    }
}
