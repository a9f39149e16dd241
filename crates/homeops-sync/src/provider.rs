//! Collaborator contracts consumed by the core.

use crate::events::SessionSubscription;
use crate::{AuthError, NewRecord, ProviderError, Record, Session, StoreError};
use async_trait::async_trait;

/// Supplies the current session and announces session changes.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The session the provider currently holds, if any.
    async fn current_session(&self) -> Result<Option<Session>, ProviderError>;

    /// Authenticate with email and password.
    ///
    /// The new session is also announced on the change feed; the returned
    /// value is a convenience copy.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Register for change events, delivered in emission order.
    ///
    /// Dropping or unsubscribing the returned subscription deregisters it.
    fn on_session_change(&self) -> SessionSubscription;
}

/// Supplies the entries owned by a session's principal.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Entries in store order.
    async fn list_records(&self, session: &Session) -> Result<Vec<Record>, StoreError>;

    async fn create_record(
        &self,
        session: &Session,
        record: NewRecord,
    ) -> Result<Record, StoreError>;
}
