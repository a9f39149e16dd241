//! Data synchronizer state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!                 SessionPresent
//! ┌─────────────┐ ─────────────────► ┌─────────────┐
//! │  SignedOut  │                    │   Loading   │ ◄─┐ SessionPresent
//! │  (initial)  │ ◄───────────────── └──────┬──────┘ ──┘ (new generation)
//! └─────────────┘   SessionAbsent           │
//!        ▲                    FetchSucceeded │ FetchFailed
//!        │                                  ▼
//!        │ SessionAbsent     ┌─────────────┐   ┌─────────────┐
//!        └────────────────── │   Loaded    │   │   Failed    │
//!                            └─────────────┘   └─────────────┘
//!                          SessionPresent from either ─► Loading
//! ```
//!
//! Every state accepts `SessionPresent` and `SessionAbsent`. Fetch outcomes
//! are only accepted while `Loading`; the synchronizer filters stale
//! generations before they reach the machine.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub sync_machine(SignedOut)

    SignedOut => {
        SessionPresent => Loading,
        SessionAbsent => SignedOut
    },
    Loading => {
        SessionPresent => Loading,
        SessionAbsent => SignedOut,
        FetchSucceeded => Loaded,
        FetchFailed => Failed
    },
    Loaded => {
        SessionPresent => Loading,
        SessionAbsent => SignedOut
    },
    Failed => {
        SessionPresent => Loading,
        SessionAbsent => SignedOut
    }
}

pub use sync_machine::Input as SyncMachineInput;
pub use sync_machine::State as SyncMachineState;
pub use sync_machine::StateMachine as SyncMachine;

/// Synchronizer state for views and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// No session: no entries, no error.
    SignedOut,
    /// A fetch for the current generation is outstanding.
    Loading,
    /// The current generation's entries are on display.
    Loaded,
    /// The current generation's fetch failed.
    Failed,
}

impl SyncState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SyncState::Loading)
    }
}

impl From<&SyncMachineState> for SyncState {
    fn from(state: &SyncMachineState) -> Self {
        match state {
            SyncMachineState::SignedOut => SyncState::SignedOut,
            SyncMachineState::Loading => SyncState::Loading,
            SyncMachineState::Loaded => SyncState::Loaded,
            SyncMachineState::Failed => SyncState::Failed,
        }
    }
}
