//! Output log and debug log.
//!
//! The output log records every received line for later reading. The debug
//! log is a `tracing` subscriber writing to a file, since the terminal itself
//! belongs to the console while it runs.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug)]
pub enum LogFileError {
    Open {
        path: PathBuf,
        error: std::io::Error,
    },
    Write(std::io::Error),
    SubscriberInstalled,
}

impl std::fmt::Display for LogFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFileError::Open { path, error } => {
                write!(f, "could not open log file `{}`: {error}", path.display())
            }
            LogFileError::Write(error) => write!(f, "log write failed: {error}"),
            LogFileError::SubscriberInstalled => {
                write!(f, "a debug log subscriber is already installed")
            }
        }
    }
}

impl std::error::Error for LogFileError {}

impl From<std::io::Error> for LogFileError {
    fn from(value: std::io::Error) -> Self {
        Self::Write(value)
    }
}

/// Commented block written at the top of both log files.
pub fn session_header(program: &str, settings: &[(String, String)]) -> String {
    let mut lines = vec![
        "#".to_owned(),
        format!("# {program} log file"),
        format!("# Opened at {}", iso_timestamp(Local::now())),
        "# Settings:".to_owned(),
    ];
    lines.extend(
        settings
            .iter()
            .map(|(key, value)| format!("#   {key}: {value}")),
    );
    lines.push("#".to_owned());
    lines.push("#".to_owned());
    let mut header = lines.join("\n");
    header.push('\n');
    header
}

pub fn iso_timestamp(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn open_append(path: &Path) -> Result<File, LogFileError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|error| LogFileError::Open {
            path: path.to_path_buf(),
            error,
        })
}

/// Append-only record of received lines.
#[derive(Debug)]
pub struct OutputLog {
    file: File,
    path: PathBuf,
}

impl OutputLog {
    pub fn open(path: &Path, header: &str) -> Result<Self, LogFileError> {
        let mut file = open_append(path)?;
        file.write_all(header.as_bytes())?;
        file.flush()?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `at` is present only when timestamps are enabled for the session.
    pub fn write_line(&mut self, text: &str, at: Option<DateTime<Local>>) -> Result<(), LogFileError> {
        let record = match at {
            Some(at) => format!("{}: {}\n", iso_timestamp(at), text.trim_end()),
            None => format!("{}\n", text.trim_end()),
        };
        self.file.write_all(record.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }
}

/// Installs the global debug subscriber writing to `path`. Filtering follows
/// `RUST_LOG`, defaulting to `debug`.
pub fn init_debug_log(path: &Path, header: &str) -> Result<(), LogFileError> {
    let mut file = open_append(path)?;
    file.write_all(header.as_bytes())?;
    file.flush()?;
    debug_subscriber(file)
        .try_init()
        .map_err(|_| LogFileError::SubscriberInstalled)
}

pub fn debug_subscriber(file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let fmt_layer = fmt::layer()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_thread_names(true);

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
