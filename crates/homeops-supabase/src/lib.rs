//! Session provider and record store implementations for `homeops-sync`.
//!
//! `live` mode talks to a Supabase project: GoTrue for password sign-in and
//! PostgREST for the `entries` table. `mock` mode serves the sample entries
//! from memory and signs in any non-empty credentials.

mod auth;
mod client;
mod entries;
mod mock;

pub use auth::SupabaseSessionProvider;
pub use client::SupabaseClient;
pub use entries::SupabaseRecordStore;
pub use mock::{fixture_records, MockRecordStore, MockSessionProvider};

use homeops_config::{Config, CoreResult, StoreMode};
use homeops_sync::{RecordStore, SessionProvider};
use std::sync::Arc;
use tracing::info;

/// The two collaborators a dashboard needs.
#[derive(Clone)]
pub struct Collaborators {
    pub sessions: Arc<dyn SessionProvider>,
    pub store: Arc<dyn RecordStore>,
}

/// Build the collaborators for the configured store mode.
///
/// Live mode fails if the Supabase URL or key is missing or malformed.
pub fn connect(config: &Config) -> CoreResult<Collaborators> {
    config.validate()?;

    let collaborators = match config.store_mode {
        StoreMode::Mock => Collaborators {
            sessions: Arc::new(MockSessionProvider::new()),
            store: Arc::new(MockRecordStore::new()),
        },
        StoreMode::Live => {
            let client = SupabaseClient::from_config(config)?;
            Collaborators {
                sessions: Arc::new(SupabaseSessionProvider::new(client.clone())),
                store: Arc::new(SupabaseRecordStore::new(client)),
            }
        }
    };

    info!(store_mode = %config.store_mode, "collaborators ready");
    Ok(collaborators)
}
