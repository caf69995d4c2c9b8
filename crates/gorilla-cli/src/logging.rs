//! Logging initialization for the CLI.
//!
//! Logging is owned by the CLI crate; the library crates only emit
//! `tracing` events. Human-readable or JSON lines go to stderr, and an
//! optional diagnostic log file is written when enabled from the
//! environment.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gorilla_client::paths;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enables the diagnostic log file.
pub const DEBUG_ENV: &str = "GORILLA_UI_DEBUG";

/// Fallback switch shared with the other Gorilla tools.
pub const SHARED_DEBUG_ENV: &str = "GORILLA_DEBUG";

/// Overrides the diagnostic log path.
pub const LOG_PATH_ENV: &str = "GORILLA_UI_LOG_PATH";

/// Overrides the rotation threshold in bytes.
pub const LOG_MAX_BYTES_ENV: &str = "GORILLA_UI_LOG_MAX_BYTES";

/// Default rotation threshold (10 MiB).
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Diagnostic file logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub max_bytes: u64,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: paths::log_file_path(),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl DiagnosticsConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = [DEBUG_ENV, SHARED_DEBUG_ENV]
            .into_iter()
            .any(|key| get(key).is_some_and(|v| is_truthy(&v)));

        let path = get(LOG_PATH_ENV)
            .filter(|p| !p.trim().is_empty())
            .map_or_else(paths::log_file_path, |p| PathBuf::from(p.trim()));

        let max_bytes = get(LOG_MAX_BYTES_ENV)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_BYTES);

        Self {
            enabled,
            path,
            max_bytes,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Append-only log file that rotates to `<path>.1` once it reaches
/// `max_bytes`.
///
/// Failures are swallowed so logging never affects a call.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    file: Option<File>,
}

impl RotatingFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            file: None,
        }
    }

    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.rotate_if_full()?;

        let file = match &mut self.file {
            Some(file) => file,
            None => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)?;
                self.file.insert(file)
            }
        };
        file.write_all(buf)
    }

    fn rotate_if_full(&mut self) -> io::Result<()> {
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        if len < self.max_bytes {
            return Ok(());
        }

        // Close before renaming; Windows refuses to move an open file.
        self.file = None;
        let backup = backup_path(&self.path);
        let _ = fs::remove_file(&backup);
        fs::rename(&self.path, backup)
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = &mut self.file {
            let _ = file.flush();
        }
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".1");
    PathBuf::from(name)
}

/// Initialize the tracing subscriber.
///
/// # Arguments
/// * `verbosity` - 0 = INFO, 1 = DEBUG, 2+ = TRACE
/// * `json` - If true, output JSON lines to stderr
/// * `diagnostics` - When enabled, DEBUG and above are also appended to the
///   rotating log file
///
/// # Panics
/// Panics if the subscriber cannot be initialized (e.g., called twice).
pub fn init(verbosity: u8, json: bool, diagnostics: &DiagnosticsConfig) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Support RUST_LOG env var, with verbosity flag as override
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"))
        .add_directive(level.into());
    for target in ["gorilla_client", "gorilla_pipe"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    let file_layer = diagnostics.enabled.then(|| {
        let writer = RotatingFile::new(&diagnostics.path, diagnostics.max_bytes);
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(writer))
            .with_filter(LevelFilter::DEBUG)
    });

    let subscriber = tracing_subscriber::registry().with(file_layer);

    if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(io::stderr)
                    .with_filter(filter),
            )
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(io::stderr)
                    .with_filter(filter),
            )
            .init();
    }
}
