//! Supabase HTTP client shared by the auth provider and the entries store.

use homeops_config::{Config, CoreResult};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Keys Supabase uses for a human-readable error, most specific first.
const ERROR_MESSAGE_KEYS: [&str; 4] = ["msg", "error_description", "message", "error"];

/// Length and digest of a response body, for logs that must not carry its
/// contents.
pub(crate) fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Pull the error text out of a GoTrue or PostgREST error body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ERROR_MESSAGE_KEYS
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(String::from)
}

/// Supabase project endpoint plus its publishable key.
#[derive(Clone)]
pub struct SupabaseClient {
    http_client: reqwest::Client,
    api_url: String,
    anon_key: String,
}

impl SupabaseClient {
    /// Create a new Supabase client.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project API URL (e.g., `https://xyz.supabase.co`)
    /// * `anon_key` - The Supabase anonymous API key
    pub fn new(api_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            http_client: reqwest::Client::new(),
            api_url,
            anon_key: anon_key.into(),
        }
    }

    /// Build a client from the `supabase_url` and `supabase_anon_key` settings.
    pub fn from_config(config: &Config) -> CoreResult<Self> {
        let url = config.supabase_url()?;
        let anon_key = config.supabase_anon_key()?;
        Ok(Self::new(url.as_str(), anon_key))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub(crate) fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Build the REST API URL for a table.
    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    /// Build a GoTrue URL, e.g. `auth_url("logout")`.
    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.api_url, path)
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
