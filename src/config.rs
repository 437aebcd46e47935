//! Configuration system for HealthMetrix
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (HEALTHMETRIX_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Valid log level names
const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Logging configuration
    pub logging: LoggingSettings,

    /// Diagnostics run settings
    pub diagnostics: DiagnosticsSettings,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (unset = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Enable JSON formatted log lines
    pub json_format: bool,
}

/// Diagnostics run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSettings {
    /// Disk I/O sampling window in seconds
    pub sample_window_secs: f64,

    /// Filesystem reported under "Disk" and "Disk Health"
    pub mount_point: String,

    /// Show the start-up progress bar
    pub show_progress: bool,

    /// Number of progress bar ticks
    pub progress_steps: u32,

    /// Delay per progress tick in milliseconds
    pub progress_step_ms: u64,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("diagnostics.log".to_string()),
            json_format: false,
        }
    }
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            sample_window_secs: 1.0,
            mount_point: default_mount_point().to_string(),
            show_progress: true,
            progress_steps: 100,
            progress_step_ms: 10,
        }
    }
}

/// Root filesystem of the current platform
fn default_mount_point() -> &'static str {
    if cfg!(windows) {
        "C:\\"
    } else {
        "/"
    }
}

impl DiagnosticsSettings {
    /// Sampling window as a `Duration`
    pub fn sample_window(&self) -> Duration {
        Duration::from_secs_f64(self.sample_window_secs)
    }

    /// Delay per progress tick as a `Duration`
    pub fn progress_step(&self) -> Duration {
        Duration::from_millis(self.progress_step_ms)
    }
}

impl HealthConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let config = Self::load_unvalidated(config_path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load file and environment layers without validating.
    ///
    /// Callers that layer command-line values on top must call
    /// [`HealthConfig::validate`] once those are applied.
    pub fn load_unvalidated(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::find_config_file(config_path)? {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        config.expand_paths();

        Ok(config)
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration file");
        let content = fs::read_to_string(path).map_err(|source| Error::IoRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // An explicit path must exist
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::config_not_found(path));
        }

        let search_paths = [
            Some(PathBuf::from("healthmetrix.toml")),
            dirs::config_dir().map(|p| p.join("healthmetrix").join("config.toml")),
            dirs::home_dir().map(|p| p.join(".healthmetrix").join("config.toml")),
            Some(PathBuf::from("/etc/healthmetrix/config.toml")),
        ];

        for path in search_paths.into_iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Logging settings
        if let Ok(val) = std::env::var("HEALTHMETRIX_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("HEALTHMETRIX_LOG_FILE") {
            self.logging.file = if val.is_empty() { None } else { Some(val) };
        }
        if let Ok(val) = std::env::var("HEALTHMETRIX_LOG_JSON") {
            self.logging.json_format = parse_bool(&val);
        }

        // Diagnostics settings
        if let Ok(val) = std::env::var("HEALTHMETRIX_SAMPLE_WINDOW_SECS") {
            if let Ok(n) = val.parse() {
                self.diagnostics.sample_window_secs = n;
            }
        }
        if let Ok(val) = std::env::var("HEALTHMETRIX_MOUNT_POINT") {
            self.diagnostics.mount_point = val;
        }
        if let Ok(val) = std::env::var("HEALTHMETRIX_SHOW_PROGRESS") {
            self.diagnostics.show_progress = parse_bool(&val);
        }
    }

    /// Expand ~ and environment variables in paths
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
        self.diagnostics.mount_point = expand_path(&self.diagnostics.mount_point);
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !VALID_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    VALID_LEVELS.join(", ")
                ),
            ));
        }

        let window = self.diagnostics.sample_window_secs;
        if !window.is_finite() || window <= 0.0 || window > 60.0 {
            return Err(Error::config_field_invalid(
                "diagnostics.sample_window_secs",
                format!("Sample window must be between 0 and 60 seconds, got {}", window),
            ));
        }

        if self.diagnostics.mount_point.is_empty() {
            return Err(Error::config_field_invalid(
                "diagnostics.mount_point",
                "Mount point cannot be empty",
            ));
        }

        if self.diagnostics.progress_steps == 0 {
            return Err(Error::config_field_invalid(
                "diagnostics.progress_steps",
                "progress_steps must be at least 1",
            ));
        }

        Ok(())
    }

    /// Log file path, if file logging is enabled
    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_ref().map(PathBuf::from)
    }
}

/// Interpret "true"/"1"/"yes" as true
fn parse_bool(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

/// Expand ~ and environment variables in paths
pub fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".healthmetrix")
                .join("config.toml")
        });

    if config_path.exists() && !force {
        return Err(Error::ConfigValidation {
            message: format!(
                "Configuration file already exists: {}. Use --force to overwrite.",
                config_path.display()
            ),
            field: None,
        });
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::IoWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&config_path, generate_default_config()).map_err(|source| Error::IoWrite {
        path: config_path.clone(),
        source,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    format!(
        r#"# HealthMetrix Configuration

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Append-only log file (comment out to disable file logging)
file = "diagnostics.log"

# Write log lines as JSON
json_format = false

[diagnostics]
# Disk I/O sampling window in seconds
sample_window_secs = 1.0

# Filesystem reported under "Disk" and "Disk Health"
mount_point = {mount:?}

# Show the start-up progress bar
show_progress = true

# Progress bar ticks and delay per tick (milliseconds)
progress_steps = 100
progress_step_ms = 10
"#,
        mount = default_mount_point()
    )
}
