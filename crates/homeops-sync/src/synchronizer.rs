//! Data synchronizer: keeps the entry snapshot in step with the session.
//!
//! Each session change allocates a new fetch generation. A fetch result is
//! committed only if its generation is still the current one and the view is
//! still live; anything else is dropped without touching state. Completion
//! order of fetches does not matter.

use crate::sync_fsm::{SyncMachine, SyncMachineInput, SyncState};
use crate::{
    Liveness, NewRecord, Record, RecordStore, Session, SessionListener, StoreError, UserFacing,
    LOAD_FAILED,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Point-in-time view of the synchronizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub state: SyncState,
    pub generation: u64,
    pub records: Arc<[Record]>,
    pub is_loading: bool,
    pub error: Option<String>,
}

struct SyncInner {
    machine: SyncMachine,
    generation: u64,
    session: Option<Session>,
    records: Arc<[Record]>,
    error: Option<String>,
}

impl SyncInner {
    fn state(&self) -> SyncState {
        SyncState::from(self.machine.state())
    }

    fn snapshot(&self) -> SyncSnapshot {
        let state = self.state();
        SyncSnapshot {
            state,
            generation: self.generation,
            records: self.records.clone(),
            is_loading: state.is_loading(),
            error: self.error.clone(),
        }
    }

    fn transition(&mut self, input: SyncMachineInput) {
        let from = self.state();
        match self.machine.consume(&input) {
            Ok(_) => debug!(
                from = ?from,
                to = ?self.state(),
                generation = self.generation,
                "sync state transition"
            ),
            Err(_) => warn!(
                input = ?input,
                state = ?from,
                "ignoring impossible sync transition"
            ),
        }
    }
}

pub struct DataSynchronizer {
    store: Arc<dyn RecordStore>,
    inner: Mutex<SyncInner>,
    liveness: Liveness,
    changed: watch::Sender<u64>,
    this: Weak<DataSynchronizer>,
}

impl DataSynchronizer {
    pub fn new(store: Arc<dyn RecordStore>, liveness: Liveness) -> Arc<Self> {
        let (changed, _) = watch::channel(0);
        Arc::new_cyclic(|this| Self {
            store,
            inner: Mutex::new(SyncInner {
                machine: SyncMachine::new(),
                generation: 0,
                session: None,
                records: Arc::from(Vec::new()),
                error: None,
            }),
            liveness,
            changed,
            this: this.clone(),
        })
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.inner.lock().snapshot()
    }

    pub fn records(&self) -> Arc<[Record]> {
        self.inner.lock().records.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().state().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.inner.lock().error.clone()
    }

    /// Receiver that ticks after every committed mutation.
    pub fn changed(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    /// React to a session value. Returns the generation of the fetch that was
    /// started, if any.
    pub fn set_session(&self, session: Option<&Session>) -> Option<u64> {
        if !self.liveness.is_alive() {
            return None;
        }

        let mut inner = self.inner.lock();
        let started = match session {
            Some(session) => Some(self.start_fetch(&mut inner, session.clone())),
            None => {
                inner.generation += 1;
                inner.session = None;
                inner.transition(SyncMachineInput::SessionAbsent);
                inner.records = Arc::from(Vec::new());
                inner.error = None;
                info!(generation = inner.generation, "signed out, entries cleared");
                None
            }
        };
        self.notify(&inner);
        started
    }

    /// Refetch for the current session under a new generation.
    pub fn reload(&self) -> Option<u64> {
        if !self.liveness.is_alive() {
            return None;
        }

        let mut inner = self.inner.lock();
        let session = inner.session.clone()?;
        let generation = self.start_fetch(&mut inner, session);
        self.notify(&inner);
        Some(generation)
    }

    /// Create an entry for the current session, then reload so the snapshot
    /// reflects store order.
    pub async fn create_record(&self, record: NewRecord) -> Result<Record, StoreError> {
        let session = self
            .inner
            .lock()
            .session
            .clone()
            .ok_or(StoreError::Unauthenticated)?;

        let created = self.store.create_record(&session, record).await?;
        debug!(record_id = %created.id, "entry created");

        if self.liveness.is_alive() {
            let mut inner = self.inner.lock();
            if inner.session.as_ref() == Some(&session) {
                self.start_fetch(&mut inner, session);
                self.notify(&inner);
            }
        }

        Ok(created)
    }

    /// Wait until no fetch is outstanding and return the resulting snapshot.
    pub async fn settled(&self) -> SyncSnapshot {
        let mut changed = self.changed();
        loop {
            let snapshot = self.snapshot();
            if !snapshot.is_loading || !self.liveness.is_alive() {
                return snapshot;
            }
            if changed.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }

    /// Invalidate every outstanding generation. Called at teardown, after the
    /// liveness flag is revoked.
    pub fn invalidate(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        debug!(generation = inner.generation, "outstanding fetches invalidated");
    }

    fn start_fetch(&self, inner: &mut SyncInner, session: Session) -> u64 {
        inner.generation += 1;
        let generation = inner.generation;
        inner.transition(SyncMachineInput::SessionPresent);
        inner.session = Some(session.clone());
        inner.records = Arc::from(Vec::new());
        inner.error = None;

        debug!(generation, user_id = %session.user_id, "fetching entries");

        let store = self.store.clone();
        let this = self.this.clone();
        tokio::spawn(async move {
            let result = store.list_records(&session).await;
            if let Some(this) = this.upgrade() {
                this.commit(generation, result);
            }
        });

        generation
    }

    fn commit(&self, generation: u64, result: Result<Vec<Record>, StoreError>) -> bool {
        let mut inner = self.inner.lock();

        if !self.liveness.is_alive() || inner.generation != generation {
            debug!(
                generation,
                current = inner.generation,
                "discarding stale fetch result"
            );
            return false;
        }

        match result {
            Ok(records) => {
                info!(generation, count = records.len(), "entries loaded");
                inner.transition(SyncMachineInput::FetchSucceeded);
                inner.records = Arc::from(records);
                inner.error = None;
            }
            Err(error) => {
                warn!(generation, error = %error, "entry fetch failed");
                inner.transition(SyncMachineInput::FetchFailed);
                inner.records = Arc::from(Vec::new());
                inner.error = Some(error.user_message(LOAD_FAILED));
            }
        }

        self.notify(&inner);
        true
    }

    fn notify(&self, inner: &SyncInner) {
        self.changed.send_replace(inner.generation);
    }
}

impl SessionListener for DataSynchronizer {
    fn on_session_change(&self, session: Option<&Session>) {
        self.set_session(session);
    }
}
