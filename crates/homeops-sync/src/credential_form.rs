//! Credential form controller: the email/password draft plus sign-in and
//! sign-out actions.

use crate::{
    CredentialDraft, Liveness, Session, SessionListener, SessionProvider, UserFacing,
    SIGN_IN_FAILED, SIGN_OUT_FAILED,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of [`CredentialForm::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The provider accepted the credentials. The draft has been cleared.
    SignedIn(Option<Session>),
    /// The provider refused. Carries the message now shown on the form.
    Rejected(String),
    /// The same credentials are already being submitted; nothing was sent.
    AlreadyPending,
    /// A newer submission or teardown made this result irrelevant.
    Superseded,
}

/// Result of [`CredentialForm::request_sign_out`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutOutcome {
    SignedOut,
    Rejected(String),
    AlreadyPending,
    Superseded,
}

struct PendingAttempt {
    attempt: u64,
    email: String,
    password: String,
}

#[derive(Default)]
struct FormState {
    draft: CredentialDraft,
    pending: Option<PendingAttempt>,
    attempt: u64,
    signing_out: Option<u64>,
    sign_out_attempt: u64,
    error: Option<String>,
}

pub struct CredentialForm {
    provider: Arc<dyn SessionProvider>,
    state: Mutex<FormState>,
    liveness: Liveness,
}

impl CredentialForm {
    pub fn new(provider: Arc<dyn SessionProvider>, liveness: Liveness) -> Arc<Self> {
        Arc::new(Self {
            provider,
            state: Mutex::new(FormState::default()),
            liveness,
        })
    }

    pub fn set_email(&self, email: impl Into<String>) {
        self.state.lock().draft.email = email.into();
    }

    pub fn set_password(&self, password: impl Into<String>) {
        self.state.lock().draft.password = password.into();
    }

    pub fn draft(&self) -> CredentialDraft {
        self.state.lock().draft.clone()
    }

    /// A sign-in is outstanding.
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub fn is_signing_out(&self) -> bool {
        self.state.lock().signing_out.is_some()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Show `message` in the form's error slot.
    pub fn report_error(&self, message: impl Into<String>) {
        if self.liveness.is_alive() {
            self.state.lock().error = Some(message.into());
        }
    }

    /// Sign in with `email` and `password`.
    ///
    /// The draft takes the submitted values and any earlier error is cleared
    /// before the provider is called.
    pub async fn submit(&self, email: &str, password: &str) -> SubmitOutcome {
        let attempt = {
            let mut state = self.state.lock();
            if let Some(pending) = &state.pending {
                if pending.email == email && pending.password == password {
                    debug!(attempt = pending.attempt, "sign-in already pending");
                    return SubmitOutcome::AlreadyPending;
                }
                debug!(attempt = pending.attempt, "superseding pending sign-in");
            }

            state.attempt += 1;
            let attempt = state.attempt;
            state.pending = Some(PendingAttempt {
                attempt,
                email: email.to_string(),
                password: password.to_string(),
            });
            state.draft = CredentialDraft::new(email, password);
            state.error = None;
            attempt
        };

        info!(attempt, "signing in");
        let result = self.provider.sign_in_with_password(email, password).await;

        let mut state = self.state.lock();
        if !self.liveness.is_alive() || state.attempt != attempt {
            debug!(attempt, "discarding superseded sign-in result");
            return SubmitOutcome::Superseded;
        }
        state.pending = None;

        match result {
            Ok(session) => {
                info!(attempt, "sign-in succeeded");
                state.draft.clear();
                state.error = None;
                SubmitOutcome::SignedIn(session)
            }
            Err(error) => {
                warn!(attempt, error = %error, "sign-in rejected");
                let message = error.user_message(SIGN_IN_FAILED);
                state.error = Some(message.clone());
                SubmitOutcome::Rejected(message)
            }
        }
    }

    /// Submit whatever the draft currently holds.
    pub async fn submit_draft(&self) -> SubmitOutcome {
        let draft = self.draft();
        self.submit(&draft.email, &draft.password).await
    }

    pub async fn request_sign_out(&self) -> SignOutOutcome {
        let attempt = {
            let mut state = self.state.lock();
            if state.signing_out.is_some() {
                return SignOutOutcome::AlreadyPending;
            }
            state.sign_out_attempt += 1;
            state.signing_out = Some(state.sign_out_attempt);
            state.error = None;
            state.sign_out_attempt
        };

        info!(attempt, "signing out");
        let result = self.provider.sign_out().await;

        let mut state = self.state.lock();
        if !self.liveness.is_alive() || state.signing_out != Some(attempt) {
            return SignOutOutcome::Superseded;
        }
        state.signing_out = None;

        match result {
            Ok(()) => {
                state.draft.clear();
                state.error = None;
                SignOutOutcome::SignedOut
            }
            Err(error) => {
                warn!(attempt, error = %error, "sign-out rejected");
                let message = error.user_message(SIGN_OUT_FAILED);
                state.error = Some(message.clone());
                SignOutOutcome::Rejected(message)
            }
        }
    }

    /// Make every outstanding action's result stale. Called at teardown.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.attempt += 1;
        state.pending = None;
        state.signing_out = None;
    }
}

/// Session loss clears the draft and the auth error slot. The synchronizer
/// clears the data error on its own.
impl SessionListener for CredentialForm {
    fn on_session_change(&self, session: Option<&Session>) {
        if session.is_some() || !self.liveness.is_alive() {
            return;
        }
        let mut state = self.state.lock();
        state.draft.clear();
        state.error = None;
    }
}
