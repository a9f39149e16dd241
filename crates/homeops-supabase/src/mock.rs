//! In-memory collaborators for development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homeops_sync::{
    AuthError, Category, NewRecord, ProviderError, Record, RecordStore, Session, SessionEvents,
    SessionProvider, SessionSubscription, StoreError,
};
use parking_lot::Mutex;
use tracing::debug;

fn at(timestamp: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

/// The three sample entries every mock store starts with.
pub fn fixture_records() -> Vec<Record> {
    vec![
        Record {
            id: "1".to_string(),
            created_at: at("2025-01-01T09:00:00Z"),
            category: Category::Improvement,
            title: "Garage insulation".to_string(),
            value: Some(42.0),
            notes: Some("Added rigid foam".to_string()),
        },
        Record {
            id: "2".to_string(),
            created_at: at("2025-01-02T09:00:00Z"),
            category: Category::Fix,
            title: "Door seal".to_string(),
            value: Some(45.0),
            notes: None,
        },
        Record {
            id: "3".to_string(),
            created_at: at("2025-01-03T09:00:00Z"),
            category: Category::Todo,
            title: "Seal rim joists".to_string(),
            value: None,
            notes: Some("Add to weekend list".to_string()),
        },
    ]
}

/// Record store that serves the fixture and keeps created entries in memory.
pub struct MockRecordStore {
    records: Mutex<Vec<Record>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::with_records(fixture_records())
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn list_records(&self, session: &Session) -> Result<Vec<Record>, StoreError> {
        let records = self.records.lock().clone();
        debug!(user_id = %session.user_id, count = records.len(), "serving mock entries");
        Ok(records)
    }

    async fn create_record(
        &self,
        _session: &Session,
        record: NewRecord,
    ) -> Result<Record, StoreError> {
        let created = Record {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            category: record.category,
            title: record.title,
            value: record.value,
            notes: record.notes,
        };
        self.records.lock().push(created.clone());
        Ok(created)
    }
}

/// Session provider that signs in any non-empty email/password pair.
#[derive(Default)]
pub struct MockSessionProvider {
    session: Mutex<Option<Session>>,
    events: SessionEvents,
}

impl MockSessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out signed in as `session`.
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            events: SessionEvents::new(),
        }
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        Ok(self.session.lock().clone())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "Email and password are required".to_string(),
            ));
        }

        let session = Session::new(format!("mock-{}", email), uuid::Uuid::new_v4().to_string())
            .with_email(email);
        *self.session.lock() = Some(session.clone());
        self.events.emit(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.session.lock() = None;
        self.events.emit(None);
        Ok(())
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.events.subscribe()
    }
}
