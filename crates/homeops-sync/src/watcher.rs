//! Session watcher: the single writer of the current session.
//!
//! The watcher seeds itself from [`SessionProvider::current_session`], then
//! follows the provider's change feed. Every accepted change overwrites the
//! cached session and is pushed synchronously to each [`SessionListener`], in
//! registration order.

use crate::{Liveness, ProviderError, Session, SessionProvider};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Receives every session transition the watcher accepts.
pub trait SessionListener: Send + Sync {
    fn on_session_change(&self, session: Option<&Session>);
}

/// Handle to the watcher's provider subscription.
///
/// Cloning shares the same subscription. Once [`unsubscribe`] returns, no
/// further event is applied, including events already queued.
///
/// [`unsubscribe`]: SubscriptionHandle::unsubscribe
#[derive(Clone)]
pub struct SubscriptionHandle {
    /// `true` while events may be applied. Held for the whole apply.
    open: Arc<Mutex<bool>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SubscriptionHandle {
    fn new() -> Self {
        Self {
            open: Arc::new(Mutex::new(true)),
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_active(&self) -> bool {
        *self.open.lock()
    }

    pub fn unsubscribe(&self) {
        *self.open.lock() = false;
        if let Some(task) = self.task.lock().take() {
            // Dropping the pump future drops the provider subscription.
            task.abort();
        }
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

#[derive(Default)]
struct WatcherState {
    current: Option<Session>,
    /// A value has been established by initialization or an event.
    settled: bool,
    initializing: bool,
    /// Count of accepted changes; used to detect events that overtook `initialize`.
    accepted: u64,
    listeners: Vec<Arc<dyn SessionListener>>,
    subscription: Option<SubscriptionHandle>,
}

pub struct SessionWatcher {
    provider: Arc<dyn SessionProvider>,
    state: Mutex<WatcherState>,
    liveness: Liveness,
    this: Weak<SessionWatcher>,
}

impl SessionWatcher {
    pub fn new(provider: Arc<dyn SessionProvider>, liveness: Liveness) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            provider,
            state: Mutex::new(WatcherState::default()),
            liveness,
            this: this.clone(),
        })
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.state.lock().listeners.push(listener);
    }

    pub fn current(&self) -> Option<Session> {
        self.state.lock().current.clone()
    }

    pub fn is_initializing(&self) -> bool {
        self.state.lock().initializing
    }

    /// Ask the provider for the current session once.
    ///
    /// On failure the session is treated as absent and the error is returned
    /// for display; there is no retry. If a change event was accepted while
    /// the lookup was in flight, the event wins and the lookup is discarded.
    pub async fn initialize(&self) -> Result<Option<Session>, ProviderError> {
        let accepted_before = {
            let mut state = self.state.lock();
            state.initializing = true;
            state.accepted
        };

        let result = self.provider.current_session().await;

        let mut state = self.state.lock();
        state.initializing = false;

        if !self.liveness.is_alive() {
            debug!("watcher torn down during initialization, discarding session lookup");
            return result;
        }

        if state.accepted != accepted_before {
            debug!("session change arrived during initialization, keeping the newer session");
            return Ok(state.current.clone());
        }

        match result {
            Ok(session) => {
                info!(
                    signed_in = session.is_some(),
                    "session initialized"
                );
                Self::store(&mut state, session.clone());
                Ok(session)
            }
            Err(error) => {
                warn!(error = %error, "session lookup failed, treating as signed out");
                Self::store(&mut state, None);
                Err(error)
            }
        }
    }

    /// Subscribe to the provider's change feed.
    ///
    /// Calling this again while the subscription is active returns the same
    /// handle. Must be called from within a Tokio runtime.
    pub fn subscribe(&self) -> SubscriptionHandle {
        let mut state = self.state.lock();
        if let Some(existing) = state.subscription.as_ref().filter(|h| h.is_active()) {
            return existing.clone();
        }

        let handle = SubscriptionHandle::new();
        let mut feed = self.provider.on_session_change();
        let open = handle.open.clone();
        let watcher = self.this.clone();

        let task = tokio::spawn(async move {
            while let Some(session) = feed.recv().await {
                let gate = open.lock();
                if !*gate {
                    break;
                }
                let Some(watcher) = watcher.upgrade() else {
                    break;
                };
                watcher.accept(session);
                drop(gate);
            }
            debug!("session change feed closed");
        });

        *handle.task.lock() = Some(task);
        state.subscription = Some(handle.clone());
        debug!("subscribed to session changes");
        handle
    }

    /// Apply a session value. Returns `false` when nothing changed or the
    /// view is gone.
    pub fn accept(&self, session: Option<Session>) -> bool {
        if !self.liveness.is_alive() {
            return false;
        }

        let mut state = self.state.lock();
        if state.settled && state.current == session {
            return false;
        }

        debug!(
            signed_in = session.is_some(),
            "session change accepted"
        );
        state.accepted += 1;
        Self::store(&mut state, session);
        true
    }

    fn store(state: &mut WatcherState, session: Option<Session>) {
        state.current = session;
        state.settled = true;
        for listener in &state.listeners {
            listener.on_session_change(state.current.as_ref());
        }
    }
}
