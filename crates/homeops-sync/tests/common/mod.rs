#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use homeops_sync::{
    AuthError, Category, NewRecord, ProviderError, Record, RecordStore, Session, SessionEvents,
    SessionProvider, SessionSubscription, StoreError,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

type SignInReply = oneshot::Sender<Result<Option<Session>, AuthError>>;
type FetchReply = oneshot::Sender<Result<Vec<Record>, StoreError>>;

/// Session for `email`, keyed by the email so tests can tell users apart.
pub fn session_for(email: &str) -> Session {
    Session::new(format!("user-{}", email), format!("token-{}", email)).with_email(email)
}

/// The three entries the mock store serves, newest first.
pub fn fixture_records() -> Vec<Record> {
    vec![
        Record {
            id: "3".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 3, 9, 0, 0).unwrap(),
            category: Category::Todo,
            title: "Seal rim joists".to_string(),
            value: None,
            notes: Some("Add to weekend list".to_string()),
        },
        Record {
            id: "2".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap(),
            category: Category::Fix,
            title: "Door seal".to_string(),
            value: Some(45.0),
            notes: None,
        },
        Record {
            id: "1".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            category: Category::Improvement,
            title: "Garage insulation".to_string(),
            value: Some(42.0),
            notes: Some("Added rigid foam".to_string()),
        },
    ]
}

pub fn record(id: &str, title: &str) -> Record {
    Record {
        id: id.to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap(),
        category: Category::Repair,
        title: title.to_string(),
        value: None,
        notes: None,
    }
}

/// Poll `condition` until it holds, failing the test after about a second.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}

/// Run every task that can make progress.
///
/// Tests run on a paused clock, so the sleep only completes once the runtime
/// has gone idle: every fetch or event that could land has landed.
pub async fn drain() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Session provider whose every call is scripted by the test.
///
/// In gated mode each sign-in parks until [`resolve_sign_in`] answers it;
/// otherwise any credentials sign in at once. A successful sign-in emits the
/// session on the change feed before returning, as a real provider does.
///
/// [`resolve_sign_in`]: FakeSessionProvider::resolve_sign_in
pub struct FakeSessionProvider {
    events: SessionEvents,
    current: Mutex<Result<Option<Session>, ProviderError>>,
    lookup_gate: Mutex<Option<oneshot::Receiver<()>>>,
    gated: bool,
    parked_sign_ins: Mutex<HashMap<String, SignInReply>>,
    sign_out_error: Mutex<Option<AuthError>>,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl FakeSessionProvider {
    pub fn immediate() -> Arc<Self> {
        Arc::new(Self::build(false))
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self::build(true))
    }

    fn build(gated: bool) -> Self {
        Self {
            events: SessionEvents::new(),
            current: Mutex::new(Ok(None)),
            lookup_gate: Mutex::new(None),
            gated,
            parked_sign_ins: Mutex::new(HashMap::new()),
            sign_out_error: Mutex::new(None),
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_current(&self, current: Result<Option<Session>, ProviderError>) {
        *self.current.lock() = current;
    }

    /// Hold `current_session` until the returned sender fires.
    pub fn hold_lookup(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *self.lookup_gate.lock() = Some(gate);
        release
    }

    pub fn fail_sign_out(&self, error: AuthError) {
        *self.sign_out_error.lock() = Some(error);
    }

    pub fn emit(&self, session: Option<Session>) {
        self.events.emit(session);
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn is_parked(&self, email: &str) -> bool {
        self.parked_sign_ins.lock().contains_key(email)
    }

    /// Answer the parked sign-in for `email`.
    pub async fn resolve_sign_in(&self, email: &str, result: Result<Option<Session>, AuthError>) {
        wait_until(|| self.is_parked(email)).await;
        let reply = self.parked_sign_ins.lock().remove(email);
        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
    }
}

#[async_trait]
impl SessionProvider for FakeSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        let gate = self.lookup_gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.current.lock().clone()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<Option<Session>, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        let result = if self.gated {
            let (reply, answer) = oneshot::channel();
            self.parked_sign_ins.lock().insert(email.to_string(), reply);
            answer.await.unwrap_or(Err(AuthError::Unknown))
        } else {
            Ok(Some(session_for(email)))
        };

        if let Ok(Some(session)) = &result {
            *self.current.lock() = Ok(Some(session.clone()));
            self.events.emit(Some(session.clone()));
        }
        result
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.sign_out_error.lock().take() {
            return Err(error);
        }
        *self.current.lock() = Ok(None);
        self.events.emit(None);
        Ok(())
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.events.subscribe()
    }
}

/// Record store whose fetches park until the test answers them, so results
/// can land in any order.
#[derive(Default)]
pub struct GatedRecordStore {
    parked: Mutex<HashMap<String, Vec<FetchReply>>>,
    created: Mutex<Vec<NewRecord>>,
    fetches: AtomicUsize,
}

impl GatedRecordStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> Vec<NewRecord> {
        self.created.lock().clone()
    }

    pub fn parked_for(&self, session: &Session) -> usize {
        self.parked
            .lock()
            .get(&session.user_id)
            .map_or(0, Vec::len)
    }

    /// Answer the oldest parked fetch for `session`.
    pub async fn answer(&self, session: &Session, result: Result<Vec<Record>, StoreError>) {
        wait_until(|| self.parked_for(session) > 0).await;
        let reply = self
            .parked
            .lock()
            .get_mut(&session.user_id)
            .map(|queue| queue.remove(0));
        if let Some(reply) = reply {
            let _ = reply.send(result);
        }
    }
}

#[async_trait]
impl RecordStore for GatedRecordStore {
    async fn list_records(&self, session: &Session) -> Result<Vec<Record>, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let (reply, answer) = oneshot::channel();
        self.parked
            .lock()
            .entry(session.user_id.clone())
            .or_default()
            .push(reply);
        answer.await.unwrap_or(Err(StoreError::Unknown))
    }

    async fn create_record(
        &self,
        _session: &Session,
        new: NewRecord,
    ) -> Result<Record, StoreError> {
        let mut created = self.created.lock();
        let record = Record {
            id: format!("created-{}", created.len() + 1),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
            category: new.category,
            title: new.title.clone(),
            value: new.value,
            notes: new.notes.clone(),
        };
        created.push(new);
        Ok(record)
    }
}
