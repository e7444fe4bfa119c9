//! Logging
//!
//! Structured logging through `tracing`. The storage core emits `debug` and
//! `trace` events only; the CLI logs each command and its failures. Command
//! output owns stdout, so logs go to stderr unless configured otherwise.
//!
//! Settings are resolved in two steps: [`LogSettings::resolve`] merges the
//! configuration with the `TIMELINE_LOG*` environment overrides, then
//! [`init_logging`] installs a subscriber for the result.

use crate::config::xdg::APP_NAME;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const ENV_FILTER: &str = "TIMELINE_LOG";
const ENV_FILE: &str = "TIMELINE_LOG_FILE";
const ENV_FORMAT: &str = "TIMELINE_LOG_FORMAT";
const ENV_OUTPUT: &str = "TIMELINE_LOG_OUTPUT";
const ENV_MODULES: &str = "TIMELINE_LOG_MODULES";

/// Line format of log events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Where log events are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogOutput {
    #[serde(rename = "stdout")]
    Stdout,
    #[default]
    #[serde(rename = "stderr")]
    Stderr,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "file+stderr")]
    FileAndStderr,
    /// stdout and stderr
    #[serde(rename = "both")]
    Both,
}

impl LogOutput {
    fn writes_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::FileAndStderr)
    }
}

impl FromStr for LogOutput {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "file+stderr" => Ok(LogOutput::FileAndStderr),
            "both" => Ok(LogOutput::Both),
            other => Err(ApiError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                other
            ))),
        }
    }
}

impl fmt::Display for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogOutput::Stdout => "stdout",
            LogOutput::Stderr => "stderr",
            LogOutput::File => "file",
            LogOutput::FileAndStderr => "file+stderr",
            LogOutput::Both => "both",
        };
        f.write_str(name)
    }
}

/// Logging section of the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// trace, debug, info, warn, error or off
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file when the output includes a file; unset means the platform default
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// ANSI colors, text format on a terminal stream only
    #[serde(default = "default_true")]
    pub color: bool,

    /// Per-module levels, e.g. `timeline::store = "trace"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_level(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file: None,
            color: true,
            modules: HashMap::new(),
        }
    }
}

/// Effective logging settings after environment overrides
#[derive(Debug)]
pub struct LogSettings {
    pub filter: EnvFilter,
    pub format: LogFormat,
    pub output: LogOutput,
    pub file: Option<PathBuf>,
    pub color: bool,
}

impl LogSettings {
    /// Merge `config` with the environment. `None` is a disabled logger.
    pub fn resolve(config: &LoggingConfig) -> Result<Option<Self>, ApiError> {
        if !config.enabled {
            return Ok(None);
        }

        let format = match non_empty_env(ENV_FORMAT) {
            Some(value) => value.parse()?,
            None => config.format,
        };
        let output = match non_empty_env(ENV_OUTPUT) {
            Some(value) => value.parse()?,
            None => config.output,
        };
        let file = if output.writes_file() {
            Some(resolve_log_file_path(None, config.file.clone())?)
        } else {
            None
        };

        Ok(Some(Self {
            filter: build_filter(config)?,
            format,
            output,
            file,
            color: config.color && !output.writes_file(),
        }))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Log file path: CLI flag, then `TIMELINE_LOG_FILE`, then config, then the
/// platform state directory (cache directory where there is none).
pub fn resolve_log_file_path(
    cli_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
) -> Result<PathBuf, ApiError> {
    let explicit = cli_file
        .into_iter()
        .chain(non_empty_env(ENV_FILE).map(PathBuf::from))
        .chain(config_file)
        .find(|p| !p.as_os_str().is_empty());
    if let Some(path) = explicit {
        return Ok(path);
    }

    let dirs = directories::ProjectDirs::from("", "", APP_NAME).ok_or_else(|| {
        ApiError::ConfigError("Could not determine a directory for the log file".to_string())
    })?;
    let dir = dirs.state_dir().unwrap_or_else(|| dirs.cache_dir());
    Ok(dir.join("timeline.log"))
}

/// `TIMELINE_LOG` replaces the configured filter entirely; otherwise the
/// level plus per-module directives from config and `TIMELINE_LOG_MODULES`.
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, ApiError> {
    if let Ok(filter) = EnvFilter::try_from_env(ENV_FILTER) {
        return Ok(filter);
    }
    if config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let env_modules = non_empty_env(ENV_MODULES).unwrap_or_default();
    let env_pairs = env_modules
        .split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(module, level)| (module.trim().to_string(), level.trim().to_string()));
    let config_pairs = config
        .modules
        .iter()
        .map(|(module, level)| (module.clone(), level.clone()));

    let mut filter = EnvFilter::new(&config.level);
    for (module, level) in config_pairs.chain(env_pairs) {
        let directive = format!("{}={}", module, level)
            .parse::<Directive>()
            .map_err(|e| {
                ApiError::ConfigError(format!("Invalid log directive {}={}: {}", module, level, e))
            })?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

fn make_writer(settings: &LogSettings) -> Result<BoxMakeWriter, ApiError> {
    let open_file = || -> Result<Arc<std::fs::File>, ApiError> {
        let path = settings
            .file
            .as_ref()
            .ok_or_else(|| ApiError::ConfigError("No log file resolved".to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                ApiError::ConfigError(format!("Failed to open log file {}: {}", path.display(), e))
            })?;
        Ok(Arc::new(file))
    };

    Ok(match settings.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::Both => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        LogOutput::File => BoxMakeWriter::new(open_file()?),
        LogOutput::FileAndStderr => BoxMakeWriter::new(open_file()?.and(std::io::stderr)),
    })
}

/// Install the global subscriber for `config` with environment overrides.
///
/// Fails instead of panicking if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ApiError> {
    let installed = match LogSettings::resolve(config)? {
        None => Registry::default().with(EnvFilter::new("off")).try_init(),
        Some(settings) => {
            let writer = make_writer(&settings)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(writer);
            let registry = Registry::default().with(settings.filter);
            match settings.format {
                LogFormat::Json => registry.with(layer.json()).try_init(),
                LogFormat::Text => registry.with(layer.with_ansi(settings.color)).try_init(),
            }
        }
    };
    installed.map_err(|e| ApiError::ConfigError(format!("Failed to install logger: {}", e)))
}
