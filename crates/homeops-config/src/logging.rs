//! Logging initialization.
//!
//! Everything logs through `tracing` macros. The subscriber installed here
//! decides where lines go:
//!
//! - [`LogFormat::Compact`]: human-readable lines on stderr.
//! - [`LogFormat::Json`]: structured JSONL appended to
//!   `~/.homeops/logs/homeops.jsonl`, one flushed line per event, so
//!   `tail -f ... | jq` works while the CLI is running.
//!
//! `RUST_LOG` always wins over the configured level.

use crate::{CoreError, CoreResult, Paths};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Append-only file writer, flushed after every write.
#[derive(Clone)]
struct JsonlWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl JsonlWriter {
    fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for JsonlWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for JsonlWriter {
    type Writer = JsonlWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already installed or the log file cannot be
/// opened.
pub fn init_logging(level: &str, format: LogFormat, paths: &Paths) -> CoreResult<()> {
    let installed = match format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(env_filter(level))
            .with_target(true)
            .compact()
            .with_writer(io::stderr)
            .try_init(),
        LogFormat::Json => {
            let log_path = paths.log_file();
            let writer = JsonlWriter::open(&log_path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .json()
                .with_current_span(false)
                .with_writer(writer)
                .try_init()
        }
    };

    installed.map_err(|e| CoreError::Logging(e.to_string()))?;

    tracing::debug!(format = ?format, default_level = level, "logging initialized");
    Ok(())
}
