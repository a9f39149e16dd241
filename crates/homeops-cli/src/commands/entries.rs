//! Entry commands: sign in, wait for the dashboard to settle, print.

use crate::output::{self, OutputFormat};
use crate::Credentials;
use anyhow::{bail, Context, Result};
use homeops_config::Config;
use homeops_sync::{Dashboard, NewRecord, SubmitOutcome, SyncSnapshot};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, info};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// List entries for the signed-in user.
pub async fn list(config: &Config, credentials: Credentials, format: &OutputFormat) -> Result<()> {
    let dashboard = open_dashboard(config, credentials, format).await?;
    let snapshot = settle(&dashboard).await?;

    output::print_records(&snapshot.records, format);
    dashboard.teardown();
    Ok(())
}

/// Create an entry, then list entries including it.
pub async fn add(
    config: &Config,
    credentials: Credentials,
    record: NewRecord,
    format: &OutputFormat,
) -> Result<()> {
    let dashboard = open_dashboard(config, credentials, format).await?;
    settle(&dashboard).await?;

    let created = dashboard
        .create_record(record)
        .await
        .context("Failed to create entry")?;
    info!(record_id = %created.id, "entry created");
    output::print_success(&format!("Added: {}", output::format_record(&created)), format);

    let snapshot = settle(&dashboard).await?;
    output::print_records(&snapshot.records, format);
    dashboard.teardown();
    Ok(())
}

/// Build and start a dashboard, signing in if no session exists yet.
async fn open_dashboard(
    config: &Config,
    credentials: Credentials,
    format: &OutputFormat,
) -> Result<Dashboard> {
    let collaborators = homeops_supabase::connect(config)?;
    let dashboard = Dashboard::new(collaborators.sessions, collaborators.store);
    dashboard.start().await;

    if let Some(error) = dashboard.auth_error() {
        output::print_error(&error, format);
    }

    if dashboard.session().is_none() {
        let (email, password) = prompt_missing(credentials)?;
        dashboard.set_email(email.as_str());
        dashboard.set_password(password.as_str());

        match dashboard.submit(&email, &password).await {
            SubmitOutcome::SignedIn(_) => {
                debug!("signed in");
            }
            SubmitOutcome::Rejected(message) => bail!("Sign-in failed: {}", message),
            SubmitOutcome::AlreadyPending | SubmitOutcome::Superseded => {
                bail!("Sign-in did not complete")
            }
        }
    }

    match dashboard.session() {
        Some(session) => {
            let who = session.email.as_deref().unwrap_or(&session.user_id);
            output::print_success(&format!("Signed in as {}", who), format);
            Ok(dashboard)
        }
        None => bail!("Not signed in"),
    }
}

async fn settle(dashboard: &Dashboard) -> Result<SyncSnapshot> {
    let snapshot = tokio::time::timeout(SETTLE_TIMEOUT, dashboard.settled())
        .await
        .context("Timed out waiting for entries")?;

    if let Some(error) = &snapshot.error {
        bail!("{}", error);
    }
    Ok(snapshot)
}

/// Fill in whatever the flags and environment did not provide.
fn prompt_missing(credentials: Credentials) -> Result<(String, String)> {
    let email = match credentials.email.filter(|e| !e.trim().is_empty()) {
        Some(email) => email,
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            let mut email = String::new();
            io::stdin().read_line(&mut email)?;
            email.trim().to_string()
        }
    };
    if email.is_empty() {
        bail!("Email is required");
    }

    let password = match credentials.password.filter(|p| !p.is_empty()) {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ")?,
    };
    if password.is_empty() {
        bail!("Password is required");
    }

    Ok((email, password))
}
