//! PostgREST-backed record store over the `entries` table.

use crate::client::{error_message, summarize_response_body, SupabaseClient};
use async_trait::async_trait;
use homeops_sync::{NewRecord, Record, RecordStore, Session, StoreError};
use reqwest::StatusCode;
use tracing::{debug, error};

const ENTRIES_TABLE: &str = "entries";
const ENTRY_COLUMNS: &str = "id,created_at,type,title,value,notes";

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::Decode(err.to_string())
    } else {
        StoreError::Transport(err.to_string())
    }
}

pub struct SupabaseRecordStore {
    client: SupabaseClient,
}

impl SupabaseRecordStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Check HTTP response for errors.
    async fn check_response(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!(
            status = status.as_u16(),
            body_summary = %summarize_response_body(&body),
            operation,
            "Supabase request failed"
        );
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
            _ => StoreError::Supabase {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl RecordStore for SupabaseRecordStore {
    async fn list_records(&self, session: &Session) -> Result<Vec<Record>, StoreError> {
        let url = format!(
            "{}?select={}&order=created_at.desc",
            self.client.rest_url(ENTRIES_TABLE),
            ENTRY_COLUMNS
        );

        debug!(user_id = %session.user_id, "Fetching entries from Supabase");

        let response = self
            .client
            .http()
            .get(&url)
            .header("apikey", self.client.anon_key())
            .header("Authorization", format!("Bearer {}", session.access_token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;

        let response = self.check_response(response, "list_entries").await?;
        let records: Vec<Record> = response.json().await.map_err(transport_error)?;

        debug!(count = records.len(), "Fetched entries");
        Ok(records)
    }

    async fn create_record(
        &self,
        session: &Session,
        record: NewRecord,
    ) -> Result<Record, StoreError> {
        let url = format!(
            "{}?select={}",
            self.client.rest_url(ENTRIES_TABLE),
            ENTRY_COLUMNS
        );

        debug!(user_id = %session.user_id, category = %record.category, "Inserting entry");

        let response = self
            .client
            .http()
            .post(&url)
            .header("apikey", self.client.anon_key())
            .header("Authorization", format!("Bearer {}", session.access_token))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(&[&record])
            .send()
            .await
            .map_err(transport_error)?;

        let response = self.check_response(response, "insert_entry").await?;
        let created: Vec<Record> = response.json().await.map_err(transport_error)?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }
}
