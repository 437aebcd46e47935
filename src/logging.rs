//! Logging infrastructure using tracing + tracing-subscriber
//!
//! The logger is an explicit [`DiagnosticsLog`] value built once in
//! `main` and handed to the reporter. No global subscriber is installed;
//! code that should log runs inside [`DiagnosticsLog::in_scope`].
//!
//! Features:
//! - Append-only log file (never rotated or truncated)
//! - Optional JSON format
//! - Optional stderr mirror for `-v`/`-vv`
//! - Per-module overrides via RUST_LOG

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{Dispatch, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

/// Logger instance for one program run.
///
/// Holds the dispatcher and the file writer guard. Dropping it flushes
/// any buffered log lines.
pub struct DiagnosticsLog {
    dispatch: Dispatch,
    file: Option<PathBuf>,
    _file_guard: Option<WorkerGuard>,
}

impl DiagnosticsLog {
    /// Wrap an already-built dispatcher (no file, nothing to flush)
    pub fn from_dispatch(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            file: None,
            _file_guard: None,
        }
    }

    /// Logger that discards everything
    pub fn disabled() -> Self {
        Self::from_dispatch(Dispatch::none())
    }

    /// The dispatcher events are routed to
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Path of the log file, if file logging is enabled
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Run `f` with this logger as the current dispatcher
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

/// Build the logger from settings and CLI verbosity
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<DiagnosticsLog> {
    let level = determine_level(settings, verbose, quiet);
    let env_filter = build_env_filter(level);

    let (file_layer, file_guard, file) = match settings.file {
        Some(ref log_file) => {
            let path = PathBuf::from(log_file);
            let (writer, guard) = open_log_file(&path)?;
            let layer = build_writer_layer(writer, settings.json_format);
            (Some(layer), Some(guard), Some(path))
        }
        None => (None, None, None),
    };

    // Mirror to stderr only when asked; stdout carries the report
    let console_layer = (verbose > 0).then(|| build_console_layer());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer);

    let log = DiagnosticsLog {
        dispatch: Dispatch::new(subscriber),
        file,
        _file_guard: file_guard,
    };

    log.in_scope(|| {
        tracing::debug!(
            level = %level,
            file = ?log.file(),
            json = settings.json_format,
            "Logging initialized"
        )
    });

    Ok(log)
}

/// Build a dispatcher writing formatted lines to any writer
pub fn dispatch_with_writer<W>(writer: W, level: Level, json_format: bool) -> Dispatch
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::new(level.to_string().to_lowercase()))
        .with(build_writer_layer(writer, json_format));
    Dispatch::new(subscriber)
}

/// Determine the effective log level based on settings and CLI flags
fn determine_level(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => parse_level(&settings.level),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Parse a log level string
fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Build the environment filter; RUST_LOG wins when set
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()))
}

/// Open the log file in append mode, creating its directory if needed
fn open_log_file(path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory).map_err(|e| Error::LogFile {
        path: path.to_path_buf(),
        message: format!("cannot create directory '{}': {}", directory.display(), e),
    })?;

    let file_name = path.file_name().ok_or_else(|| Error::LogFile {
        path: path.to_path_buf(),
        message: "path has no file name".to_string(),
    })?;

    // Open once up front so permission problems surface as a start-up error
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::LogFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let appender = tracing_appender::rolling::never(directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// Build a formatting layer for a writer (file or capture buffer)
fn build_writer_layer<S, W>(writer: W, json_format: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if json_format {
        Box::new(
            fmt::layer()
                .json()
                .with_writer(writer)
                .with_target(false)
                .with_current_span(false)
                .with_ansi(false),
        )
    } else {
        Box::new(
            fmt::layer()
                .with_writer(writer)
                .with_target(false)
                .with_thread_ids(false)
                .with_ansi(false),
        )
    }
}

/// Build the stderr mirror layer
fn build_console_layer<S>() -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    Box::new(
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_ansi(true)
            .compact(),
    )
}

// ─────────────────────────────────────────────────────────────────
// In-memory capture
// ─────────────────────────────────────────────────────────────────

/// Shared in-memory log sink
#[derive(Debug, Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Everything written so far
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level("invalid"), Level::INFO);
    }

    #[test]
    fn test_determine_level() {
        let settings = LoggingSettings::default();
        assert_eq!(determine_level(&settings, 0, true), Level::ERROR);
        assert_eq!(determine_level(&settings, 0, false), Level::INFO);
        assert_eq!(determine_level(&settings, 1, false), Level::DEBUG);
        assert_eq!(determine_level(&settings, 2, false), Level::TRACE);
    }

    #[test]
    fn test_capture_dispatch_records_events() {
        let capture = LogCapture::default();
        let log = DiagnosticsLog::from_dispatch(dispatch_with_writer(capture.clone(), Level::INFO, false));

        log.in_scope(|| {
            tracing::error!("Error retrieving GPU info: driver missing");
            tracing::debug!("filtered out");
        });

        let contents = capture.contents();
        assert!(contents.contains("ERROR"));
        assert!(contents.contains("Error retrieving GPU info: driver missing"));
        assert!(!contents.contains("filtered out"));
    }

    #[test]
    fn test_capture_json_format() {
        let capture = LogCapture::default();
        let log = DiagnosticsLog::from_dispatch(dispatch_with_writer(capture.clone(), Level::INFO, true));

        log.in_scope(|| tracing::warn!(metric = "gpu", "sensor missing"));

        let line = capture.contents();
        let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["fields"]["message"], "sensor missing");
    }

    #[test]
    fn test_disabled_log_swallows_events() {
        let log = DiagnosticsLog::disabled();
        log.in_scope(|| tracing::error!("nobody hears this"));
        assert!(log.file().is_none());
    }

    #[test]
    fn test_file_log_appends() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("diagnostics.log");
        fs::create_dir_all(log_path.parent().unwrap()).unwrap();
        fs::write(&log_path, "earlier run\n").unwrap();

        let settings = LoggingSettings {
            file: Some(log_path.to_string_lossy().to_string()),
            ..Default::default()
        };

        {
            let log = init_logging(&settings, 0, false).unwrap();
            assert_eq!(log.file(), Some(log_path.as_path()));
            log.in_scope(|| tracing::error!("Error retrieving disk info: test"));
        }

        let contents = fs::read_to_string(&log_path).unwrap();
        assert!(contents.starts_with("earlier run\n"));
        assert!(contents.contains("Error retrieving disk info: test"));
    }

    #[test]
    fn test_file_log_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("nested").join("diag.log");

        let settings = LoggingSettings {
            file: Some(log_path.to_string_lossy().to_string()),
            ..Default::default()
        };

        let log = init_logging(&settings, 0, true).unwrap();
        drop(log);
        assert!(log_path.exists());
    }
}
