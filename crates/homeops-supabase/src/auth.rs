//! GoTrue-backed session provider.
//!
//! Sessions are kept in memory only. Sign-in announces the new session on the
//! change feed; sign-out and expiry announce absence. Expiry is noticed either
//! by a timer armed at sign-in or by the next `current_session` lookup,
//! whichever comes first.

use crate::client::{error_message, summarize_response_body, SupabaseClient};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use homeops_sync::{
    AuthError, ProviderError, Session, SessionEvents, SessionProvider, SessionSubscription,
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
    expires_in: i64,
    user: LoginUser,
}

#[derive(Deserialize)]
struct LoginUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl LoginResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let mut session = Session::new(self.user.id, self.access_token)
            .with_expires_at(now + Duration::seconds(self.expires_in));
        if let Some(email) = self.user.email {
            session = session.with_email(email);
        }
        session
    }
}

fn transport_error(err: reqwest::Error) -> AuthError {
    if err.is_decode() {
        AuthError::Decode(err.to_string())
    } else {
        AuthError::Transport(err.to_string())
    }
}

/// Clear `cached` if it still holds `session`, then announce absence.
fn expire_if_current(
    cached: &Mutex<Option<Session>>,
    events: &SessionEvents,
    session: &Session,
) -> bool {
    let expired = {
        let mut current = cached.lock();
        if current.as_ref() == Some(session) {
            *current = None;
            true
        } else {
            false
        }
    };

    if expired {
        info!(user_id = %session.user_id, "Supabase session expired");
        events.emit(None);
    }
    expired
}

pub struct SupabaseSessionProvider {
    client: SupabaseClient,
    session: Arc<Mutex<Option<Session>>>,
    events: Arc<SessionEvents>,
    expiry_timer: Mutex<Option<JoinHandle<()>>>,
}

impl SupabaseSessionProvider {
    pub fn new(client: SupabaseClient) -> Self {
        Self {
            client,
            session: Arc::new(Mutex::new(None)),
            events: Arc::new(SessionEvents::new()),
            expiry_timer: Mutex::new(None),
        }
    }

    fn replace_session(&self, session: Option<Session>) {
        *self.session.lock() = session.clone();
        self.arm_expiry(session.as_ref());
        self.events.emit(session);
    }

    /// Replace the expiry timer with one for `session`, if it expires.
    fn arm_expiry(&self, session: Option<&Session>) {
        if let Some(previous) = self.expiry_timer.lock().take() {
            previous.abort();
        }
        let Some((session, expires_at)) =
            session.and_then(|s| s.expires_at.map(|at| (s.clone(), at)))
        else {
            return;
        };

        let remaining = (expires_at - Utc::now()).to_std().unwrap_or_default();
        let cached = self.session.clone();
        let events = self.events.clone();
        debug!(user_id = %session.user_id, expires_at = %expires_at, "expiry timer armed");

        let timer = tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            expire_if_current(&cached, &events, &session);
        });
        *self.expiry_timer.lock() = Some(timer);
    }
}

impl Drop for SupabaseSessionProvider {
    fn drop(&mut self) {
        if let Some(timer) = self.expiry_timer.get_mut().take() {
            timer.abort();
        }
    }
}

#[async_trait]
impl SessionProvider for SupabaseSessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, ProviderError> {
        let current = self.session.lock().clone();
        match current {
            Some(session) if session.is_expired_at(Utc::now()) => {
                debug!("cached session expired, dropping it");
                expire_if_current(&self.session, &self.events, &session);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Session>, AuthError> {
        let url = self.client.auth_url("token?grant_type=password");

        let response = self
            .client
            .http()
            .post(&url)
            .header("apikey", self.client.anon_key())
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body_summary = %summarize_response_body(&body),
                "Supabase login rejected"
            );
            let message = error_message(&body).unwrap_or_default();
            return Err(match status {
                StatusCode::BAD_REQUEST
                | StatusCode::UNAUTHORIZED
                | StatusCode::UNPROCESSABLE_ENTITY => AuthError::InvalidCredentials(message),
                _ => AuthError::Rejected {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let data: LoginResponse = response.json().await.map_err(transport_error)?;
        let session = data.into_session(Utc::now());

        info!(
            user_id = %session.user_id,
            expires_at = ?session.expires_at,
            "Supabase login successful"
        );

        self.replace_session(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let current = self.session.lock().clone();
        let Some(session) = current else {
            debug!("sign-out without a session");
            self.replace_session(None);
            return Ok(());
        };

        let response = self
            .client
            .http()
            .post(self.client.auth_url("logout"))
            .header("apikey", self.client.anon_key())
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        // An already-invalid token means the server holds no session either.
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            error!(
                status = status.as_u16(),
                body_summary = %summarize_response_body(&body),
                "Supabase logout failed"
            );
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or_default(),
            });
        }

        info!(user_id = %session.user_id, "Supabase logout successful");
        self.replace_session(None);
        Ok(())
    }

    fn on_session_change(&self) -> SessionSubscription {
        self.events.subscribe()
    }
}
