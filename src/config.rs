#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};

use anyhow::{Context, Result};
use postgrest::Postgrest;
use reqwest::Client;
use state::InitCell;

use crate::{
    backend::{ChatBackend, openai::OpenAiBackend},
    constants::{
        DEFAULT_GRADING_ENDPOINT, DEFAULT_GRADING_MODEL, DEFAULT_TUTOR_ENDPOINT,
        DEFAULT_TUTOR_MODEL, HISTORY_WINDOW, MAX_TUTOR_ATTEMPTS, TUTOR_BASE_DELAY,
    },
    tutor::RetryPolicy,
};

/// Supabase credentials loaded from the environment, if available.
#[derive(Clone)]
struct SupabaseEnv {
    /// Fully qualified PostgREST endpoint.
    rest_endpoint: String,
    /// API key used for PostgREST requests.
    api_key:       String,
}

impl SupabaseEnv {
    /// Builds a Supabase credential bundle from environment-provided values.
    fn new(url: String, key: String) -> Self {
        let rest_endpoint = format!("{}/rest/v1", url.trim_end_matches('/'));
        Self {
            rest_endpoint,
            api_key: key,
        }
    }
}

/// Reads the first non-blank value among `names`.
fn first_env(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
}

/// Endpoint, model and optional key for one OpenAI-compatible backend.
#[derive(Clone)]
pub struct BackendEnv {
    /// Base URL for the OpenAI-compatible API.
    api_base: String,
    /// Model identifier.
    model:    String,
    /// API key, if one is configured.
    api_key:  Option<String>,
}

impl BackendEnv {
    /// Reads a backend configuration, falling back to the given defaults.
    fn from_env(
        endpoint_var: &str,
        model_var: &str,
        key_vars: &[&str],
        default_endpoint: &str,
        default_model: &str,
    ) -> Self {
        Self {
            api_base: first_env(&[endpoint_var]).unwrap_or_else(|| default_endpoint.to_string()),
            model:    first_env(&[model_var]).unwrap_or_else(|| default_model.to_string()),
            api_key:  first_env(key_vars),
        }
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the API key, if configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
}

/// Runtime configuration shared across the crate.
pub struct ConfigState {
    /// Supabase credentials, if configured.
    supabase:       Option<SupabaseEnv>,
    /// Lazily constructed Supabase PostgREST client.
    postgrest:      InitCell<Postgrest>,
    /// Shared reqwest HTTP client reused across backends.
    http_client:    Client,
    /// Per-request timeout handed to the transports.
    http_timeout:   Duration,
    /// Grading backend settings.
    grading:        BackendEnv,
    /// Tutoring backend settings.
    tutor:          BackendEnv,
    /// Turns sent with each tutoring request.
    history_window: usize,
    /// Tutoring retry schedule.
    retry:          RetryPolicy,
}

impl ConfigState {
    /// Construct a new configuration instance from the environment.
    fn new() -> Result<Self> {
        let supabase =
            match (std::env::var("SUPABASE_URL").ok(), std::env::var("SUPABASE_ANON_KEY").ok()) {
                (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                    Some(SupabaseEnv::new(url, key))
                }
                _ => None,
            };

        let http_client = Client::builder()
            // Avoid macOS dynamic store lookups that fail in sandboxed environments.
            .no_proxy()
            .build()
            .context("Failed to construct shared HTTP client")?;

        let grading = BackendEnv::from_env(
            "BANDMARK_GRADING_ENDPOINT",
            "BANDMARK_GRADING_MODEL",
            &["BANDMARK_GRADING_API_KEY", "GEMINI_API_KEY", "API_KEY"],
            DEFAULT_GRADING_ENDPOINT,
            DEFAULT_GRADING_MODEL,
        );
        let mut tutor = BackendEnv::from_env(
            "BANDMARK_TUTOR_ENDPOINT",
            "BANDMARK_TUTOR_MODEL",
            &["BANDMARK_TUTOR_API_KEY", "DEEPSEEK_API_KEY"],
            DEFAULT_TUTOR_ENDPOINT,
            DEFAULT_TUTOR_MODEL,
        );
        if tutor.api_key.is_none() {
            tutor.api_key = grading.api_key.clone();
        }

        let retry = RetryPolicy::new(
            read_number("BANDMARK_RETRY_ATTEMPTS", MAX_TUTOR_ATTEMPTS),
            Duration::from_millis(read_number(
                "BANDMARK_RETRY_BASE_MS",
                TUTOR_BASE_DELAY.as_millis() as u64,
            )),
        );

        Ok(Self {
            supabase,
            postgrest: InitCell::new(),
            http_client,
            http_timeout: Duration::from_secs(read_number("BANDMARK_HTTP_TIMEOUT_SECS", 60)),
            grading,
            tutor,
            history_window: read_number("BANDMARK_HISTORY_WINDOW", HISTORY_WINDOW).max(1),
            retry,
        })
    }

    /// Returns the configured PostgREST client if credentials are available.
    pub fn postgrest(&self) -> Option<Postgrest> {
        if let Some(client) = self.postgrest.try_get() {
            return Some(client.clone());
        }

        let creds = self.supabase.as_ref()?;
        let client = Postgrest::new(creds.rest_endpoint.clone())
            .insert_header("apikey", creds.api_key.clone())
            .insert_header("Authorization", format!("Bearer {}", creds.api_key));
        self.postgrest.set(client);
        Some(self.postgrest.get().clone())
    }

    /// Returns a clone of the shared reqwest HTTP client.
    pub fn http_client(&self) -> Client {
        self.http_client.clone()
    }

    /// Returns the grading backend settings.
    pub fn grading(&self) -> &BackendEnv {
        &self.grading
    }

    /// Returns the tutoring backend settings.
    pub fn tutor(&self) -> &BackendEnv {
        &self.tutor
    }

    /// Builds the transport for grading calls.
    pub fn grading_backend(&self) -> Arc<dyn ChatBackend> {
        Arc::new(OpenAiBackend::new(
            self.http_client(),
            self.grading.api_base.clone(),
            self.http_timeout,
        ))
    }

    /// Builds the transport for tutoring calls.
    pub fn tutor_backend(&self) -> Arc<dyn ChatBackend> {
        Arc::new(OpenAiBackend::new(
            self.http_client(),
            self.tutor.api_base.clone(),
            self.http_timeout,
        ))
    }

    /// Returns the tutoring history window.
    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Returns the tutoring retry schedule.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Ensure the global configuration has been initialized and return a handle.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let mut guard = slot().lock().expect("config slot poisoned");
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = Arc::new(ConfigState::new()?);
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}

/// Returns the active configuration, initializing it on demand.
pub fn get() -> ConfigHandle {
    ensure_initialized().expect("configuration initialization failed")
}

/// Returns the configured PostgREST client, if Supabase has been configured.
pub fn postgrest_client() -> Option<Postgrest> {
    get().postgrest()
}

/// Returns the configured tutoring API key, if any.
pub fn tutor_api_key() -> Option<String> {
    get().tutor().api_key().map(str::to_owned)
}

/// Parses an environment variable, falling back to `default` when parsing
/// fails or the variable is missing.
fn read_number<T: std::str::FromStr>(env: &str, default: T) -> T {
    std::env::var(env)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}
