//! Error types, one per concern.
//!
//! None of these are fatal: each is localized to the operation that produced
//! it and surfaces as a single inline message through [`UserFacing`].

use thiserror::Error;

/// Generic label shown when a sign-in failure carries no text.
pub const SIGN_IN_FAILED: &str = "Sign-in failed";
/// Generic label shown when a sign-out failure carries no text.
pub const SIGN_OUT_FAILED: &str = "Sign-out failed";
/// Generic label shown when a fetch failure carries no text.
pub const LOAD_FAILED: &str = "Failed to load entries";
/// Generic label shown when the session lookup fails without text.
pub const SESSION_UNAVAILABLE: &str = "Unable to determine session";

/// The session provider could not say whether anyone is signed in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("{0}")]
    Unavailable(String),

    /// Failure without a usable description.
    #[error("session lookup failed")]
    Unknown,
}

/// Sign-in or sign-out was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Bad email or password
    #[error("{0}")]
    InvalidCredentials(String),

    /// The auth server answered with a non-success status
    #[error("Auth request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Network or transport failure
    #[error("Auth transport error: {0}")]
    Transport(String),

    /// Response could not be decoded
    #[error("Auth response invalid: {0}")]
    Decode(String),

    /// Failure without a usable description.
    #[error("auth request failed")]
    Unknown,
}

/// Fetching or creating entries was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No session to fetch entries for
    #[error("Not signed in")]
    Unauthenticated,

    /// The store refused the session (401/403)
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The store answered with a non-success status
    #[error("Store error ({status}): {message}")]
    Supabase { status: u16, message: String },

    /// Network or transport failure
    #[error("Store transport error: {0}")]
    Transport(String),

    /// Response could not be decoded
    #[error("Store response invalid: {0}")]
    Decode(String),

    /// Failure without a usable description.
    #[error("store request failed")]
    Unknown,
}

/// Derives the one message a view shows for a failure.
pub trait UserFacing {
    /// The failure's own text, if it has any.
    fn text(&self) -> Option<&str>;

    /// The failure's text if non-blank, else `fallback`.
    fn user_message(&self, fallback: &str) -> String {
        self.text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

impl UserFacing for ProviderError {
    fn text(&self) -> Option<&str> {
        match self {
            ProviderError::Unavailable(message) => Some(message.as_str()),
            ProviderError::Unknown => None,
        }
    }
}

impl UserFacing for AuthError {
    fn text(&self) -> Option<&str> {
        match self {
            AuthError::InvalidCredentials(message)
            | AuthError::Rejected { message, .. }
            | AuthError::Transport(message)
            | AuthError::Decode(message) => Some(message.as_str()),
            AuthError::Unknown => None,
        }
    }
}

impl UserFacing for StoreError {
    fn text(&self) -> Option<&str> {
        match self {
            StoreError::Unauthenticated => Some("Not signed in"),
            StoreError::Unauthorized(message)
            | StoreError::Supabase { message, .. }
            | StoreError::Transport(message)
            | StoreError::Decode(message) => Some(message.as_str()),
            StoreError::Unknown => None,
        }
    }
}
