//! Event log shared by every device worker
//!
//! Workers hold cheap clones of an [`EventLog`] handle and send entries over a
//! channel to one writer thread. The writer forwards each entry to `tracing` and
//! keeps it, timestamped, for report consumers. Entries from one sender arrive in
//! the order they were sent; a snapshot request travels down the same channel, so
//! it sees everything its caller logged before asking.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Notice => "notice",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub device: Option<String>,
    pub message: String,
}

enum Command {
    Append(LogEntry),
    Snapshot(Sender<Vec<LogEntry>>),
}

/// Handle to the event log writer
#[derive(Clone)]
pub struct EventLog {
    tx: Option<Sender<Command>>,
}

impl EventLog {
    /// Start a writer thread and return the first handle to it.
    ///
    /// The thread exits once every handle has been dropped.
    pub fn spawn() -> std::io::Result<(Self, JoinHandle<Vec<LogEntry>>)> {
        let (tx, rx) = mpsc::channel();
        let writer = thread::Builder::new()
            .name("event-log".to_string())
            .spawn(move || run_writer(rx))?;
        Ok((Self { tx: Some(tx) }, writer))
    }

    /// A handle that forwards to `tracing` and keeps nothing
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn is_retaining(&self) -> bool {
        self.tx.is_some()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.append(level, None, message.into());
    }

    pub fn device(&self, level: LogLevel, device: &str, message: impl Into<String>) {
        self.append(level, Some(device.to_string()), message.into());
    }

    fn append(&self, level: LogLevel, device: Option<String>, message: String) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            device,
            message,
        };

        match &self.tx {
            Some(tx) => {
                if let Err(mpsc::SendError(Command::Append(entry))) = tx.send(Command::Append(entry)) {
                    // Writer is gone; keep the line visible anyway
                    emit(&entry);
                }
            }
            None => emit(&entry),
        }
    }

    /// Every retained entry so far, in arrival order
    pub fn entries(&self) -> Vec<LogEntry> {
        let Some(tx) = &self.tx else {
            return Vec::new();
        };

        let (reply_tx, reply_rx) = mpsc::channel();
        if tx.send(Command::Snapshot(reply_tx)).is_err() {
            return Vec::new();
        }
        reply_rx.recv().unwrap_or_default()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("retaining", &self.is_retaining())
            .finish()
    }
}

fn run_writer(rx: Receiver<Command>) -> Vec<LogEntry> {
    let mut entries = Vec::new();
    for command in rx {
        match command {
            Command::Append(entry) => {
                emit(&entry);
                entries.push(entry);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(entries.clone());
            }
        }
    }
    entries
}

fn emit(entry: &LogEntry) {
    let device = entry.device.as_deref().unwrap_or("-");
    match entry.level {
        LogLevel::Debug => tracing::debug!(device, "{}", entry.message),
        LogLevel::Info | LogLevel::Notice => tracing::info!(device, "{}", entry.message),
        LogLevel::Warning => tracing::warn!(device, "{}", entry.message),
        LogLevel::Error | LogLevel::Fatal => {
            tracing::error!(device, severity = entry.level.label(), "{}", entry.message)
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `debug` selects the level. With a log file
/// the returned guard must be held until exit so buffered lines are flushed.
pub fn init_tracing(debug: bool, logfile: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match logfile {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("log file path {} has no file name", path.display()))?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))?;
            Ok(None)
        }
    }
}
