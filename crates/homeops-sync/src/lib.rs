//! Session-gated data synchronization for the HomeOps dashboard.
//!
//! This crate keeps a view consistent with two independently changing facts:
//! whether the user is signed in, and the list of entries that user owns.
//!
//! - [`SessionWatcher`] caches the current session and fans change events out
//!   to listeners, in order.
//! - [`DataSynchronizer`] loads entries whenever the session changes, tagging
//!   every fetch with a generation so that stale results are dropped.
//! - [`CredentialForm`] owns the email/password draft and drives sign-in and
//!   sign-out through the [`SessionProvider`].
//! - [`Dashboard`] wires the three together over one [`Liveness`] flag and
//!   exposes the fields a view renders.
//!
//! The session provider and record store are collaborators behind the
//! [`SessionProvider`] and [`RecordStore`] traits; see `homeops-supabase` for
//! the live and mock implementations.

mod credential_form;
mod dashboard;
mod error;
mod events;
mod liveness;
mod provider;
mod sync_fsm;
mod synchronizer;
mod types;
mod watcher;

pub use credential_form::{CredentialForm, SignOutOutcome, SubmitOutcome};
pub use dashboard::Dashboard;
pub use error::{
    AuthError, ProviderError, StoreError, UserFacing, LOAD_FAILED, SESSION_UNAVAILABLE,
    SIGN_IN_FAILED, SIGN_OUT_FAILED,
};
pub use events::{SessionEvents, SessionSubscription};
pub use liveness::Liveness;
pub use provider::{RecordStore, SessionProvider};
pub use sync_fsm::sync_machine;
pub use sync_fsm::{SyncMachine, SyncMachineInput, SyncMachineState, SyncState};
pub use synchronizer::{DataSynchronizer, SyncSnapshot};
pub use types::{Category, CredentialDraft, NewRecord, ParseCategoryError, Record, Session};
pub use watcher::{SessionListener, SessionWatcher, SubscriptionHandle};
