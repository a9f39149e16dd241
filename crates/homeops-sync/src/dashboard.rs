//! The dashboard view model.
//!
//! Owns one [`Liveness`] shared by the watcher, synchronizer and form. The
//! watcher notifies the synchronizer first, then the form.

use crate::{
    CredentialDraft, CredentialForm, DataSynchronizer, Liveness, NewRecord, Record, RecordStore,
    Session, SessionProvider, SessionWatcher, SignOutOutcome, StoreError, SubmitOutcome,
    SubscriptionHandle, SyncSnapshot, UserFacing, SESSION_UNAVAILABLE,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Dashboard {
    watcher: Arc<SessionWatcher>,
    synchronizer: Arc<DataSynchronizer>,
    form: Arc<CredentialForm>,
    liveness: Liveness,
    subscription: Mutex<Option<SubscriptionHandle>>,
}

impl Dashboard {
    pub fn new(provider: Arc<dyn SessionProvider>, store: Arc<dyn RecordStore>) -> Self {
        let liveness = Liveness::new();
        let watcher = SessionWatcher::new(provider.clone(), liveness.clone());
        let synchronizer = DataSynchronizer::new(store, liveness.clone());
        let form = CredentialForm::new(provider, liveness.clone());

        watcher.add_listener(synchronizer.clone());
        watcher.add_listener(form.clone());

        Self {
            watcher,
            synchronizer,
            form,
            liveness,
            subscription: Mutex::new(None),
        }
    }

    /// Subscribe to session changes, then look up the current session.
    ///
    /// A lookup failure is shown on the auth error slot; the dashboard stays
    /// signed out and usable.
    pub async fn start(&self) {
        if !self.liveness.is_alive() {
            return;
        }
        let handle = self.watcher.subscribe();
        *self.subscription.lock() = Some(handle);

        if let Err(error) = self.watcher.initialize().await {
            self.form.report_error(error.user_message(SESSION_UNAVAILABLE));
        }
        debug!(signed_in = self.watcher.current().is_some(), "dashboard started");
    }

    pub fn session(&self) -> Option<Session> {
        self.watcher.current()
    }

    pub fn records(&self) -> Arc<[Record]> {
        self.synchronizer.records()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        self.synchronizer.snapshot()
    }

    pub fn is_auth_loading(&self) -> bool {
        self.watcher.is_initializing() || self.form.is_pending() || self.form.is_signing_out()
    }

    pub fn is_data_loading(&self) -> bool {
        self.synchronizer.is_loading()
    }

    pub fn auth_error(&self) -> Option<String> {
        self.form.error()
    }

    pub fn data_error(&self) -> Option<String> {
        self.synchronizer.error()
    }

    pub fn draft(&self) -> CredentialDraft {
        self.form.draft()
    }

    pub fn set_email(&self, email: impl Into<String>) {
        self.form.set_email(email);
    }

    pub fn set_password(&self, password: impl Into<String>) {
        self.form.set_password(password);
    }

    /// Sign in. A returned session is applied right away; the provider's own
    /// change event for it is then an identical value and ignored.
    pub async fn submit(&self, email: &str, password: &str) -> SubmitOutcome {
        let outcome = self.form.submit(email, password).await;
        if let SubmitOutcome::SignedIn(Some(session)) = &outcome {
            self.watcher.accept(Some(session.clone()));
        }
        outcome
    }

    pub async fn request_sign_out(&self) -> SignOutOutcome {
        let outcome = self.form.request_sign_out().await;
        if outcome == SignOutOutcome::SignedOut {
            self.watcher.accept(None);
        }
        outcome
    }

    pub fn reload(&self) -> Option<u64> {
        self.synchronizer.reload()
    }

    pub async fn create_record(&self, record: NewRecord) -> Result<Record, StoreError> {
        self.synchronizer.create_record(record).await
    }

    /// Wait for the current fetch, if any, to land.
    pub async fn settled(&self) -> SyncSnapshot {
        self.synchronizer.settled().await
    }

    /// Stop applying results. Idempotent.
    pub fn teardown(&self) {
        if !self.liveness.is_alive() {
            return;
        }
        self.liveness.revoke();
        if let Some(handle) = self.subscription.lock().take() {
            handle.unsubscribe();
        }
        self.synchronizer.invalidate();
        self.form.invalidate();
        info!("dashboard torn down");
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.teardown();
    }
}
