//! CLI Tooling
//!
//! Command-line interface for the timeline and photo stores. Every command
//! answers with a JSON envelope (`{"ok": true}` or `{"ok": false, "error":
//! ...}`) unless a text format is requested.

use crate::config::{ConfigLoader, TimelineConfig};
use crate::error::{ApiError, StoreError};
use crate::logging::LoggingConfig;
use crate::record::Timeline;
use crate::store::{PhotoStore, TimelineStore};
use crate::views::{self, Base, CompactResponse, GetResponse, ListEntry, ListResponse};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Timeline CLI - store timelines of dots and their photos
#[derive(Parser)]
#[command(name = "timeline")]
#[command(about = "Store timelines of dots and their photos")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Timeline store directory (overrides config)
    #[arg(long)]
    pub timelines_path: Option<PathBuf>,

    /// Photo store directory (overrides config)
    #[arg(long)]
    pub photos_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Store a timeline, creating or replacing it
    Put {
        /// Timeline ID
        id: String,
        /// JSON file holding the timeline (default: stdin)
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show a timeline
    Get {
        /// Timeline ID
        id: String,
        /// Output format (json or text)
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Delete a whole timeline
    Del {
        /// Timeline ID
        id: String,
    },
    /// Delete one dot from a timeline
    DelDot {
        /// Timeline ID
        id: String,
        /// Dot ID
        dot_id: String,
    },
    /// Photo commands (put, get, del)
    Photo {
        #[command(subcommand)]
        command: PhotoCommands,
    },
    /// List stored timelines or photos
    List {
        /// List photos instead of timelines
        #[arg(long)]
        photos: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Reclaim space in the timeline or photo store
    Compact {
        /// Compact the photo store instead of the timeline store
        #[arg(long)]
        photos: bool,
    },
    /// Print the resolved configuration
    Config,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PhotoCommands {
    /// Store a photo from a file
    Put {
        /// Photo ID
        id: String,
        /// File holding the photo bytes
        file: PathBuf,
    },
    /// Write a stored photo to a file
    Get {
        /// Photo ID
        id: String,
        /// Destination file
        out: PathBuf,
    },
    /// Delete a photo
    Del {
        /// Photo ID
        id: String,
    },
}

/// Stable name of a command for log events
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Put { .. } => "put",
        Commands::Get { .. } => "get",
        Commands::Del { .. } => "del",
        Commands::DelDot { .. } => "del-dot",
        Commands::Photo { command } => match command {
            PhotoCommands::Put { .. } => "photo.put",
            PhotoCommands::Get { .. } => "photo.get",
            PhotoCommands::Del { .. } => "photo.del",
        },
        Commands::List { .. } => "list",
        Commands::Compact { .. } => "compact",
        Commands::Config => "config",
    }
}

fn require_id(id: &str) -> Result<&str, ApiError> {
    if id.is_empty() {
        return Err(ApiError::InvalidInput("no ID provided".to_string()));
    }
    Ok(id)
}

/// CLI context holding the resolved configuration and both stores
pub struct CliContext {
    config: TimelineConfig,
    timelines: TimelineStore,
    photos: PhotoStore,
}

impl CliContext {
    /// Load configuration for `cli` and apply its flag overrides.
    pub fn new(cli: &Cli) -> Result<Self, ApiError> {
        let mut config = match &cli.config {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        apply_overrides(&mut config, cli)?;
        Self::from_config(config)
    }

    pub fn from_config(config: TimelineConfig) -> Result<Self, ApiError> {
        let (timelines, photos) = config.storage.open_stores()?;
        Ok(Self {
            config,
            timelines,
            photos,
        })
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn logging_config(&self) -> &LoggingConfig {
        &self.config.logging
    }

    pub fn timelines(&self) -> &TimelineStore {
        &self.timelines
    }

    pub fn photos(&self) -> &PhotoStore {
        &self.photos
    }

    /// Execute a command and render its successful response.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let result = self.execute_inner(command);
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Put { id, file } => {
                let id = require_id(id)?;
                let body = read_input(file.as_deref())?;
                let mut timeline: Timeline = serde_json::from_slice(&body)?;
                if timeline.id.is_empty() {
                    timeline.id = id.to_string();
                }
                self.timelines.put(id, &timeline)?;
                Ok(views::ok_json())
            }
            Commands::Get { id, format } => {
                let id = require_id(id)?;
                let timeline = self.timelines.get(id)?;
                match format.as_str() {
                    "json" => Ok(views::to_json(&GetResponse {
                        base: Base::ok(),
                        timeline,
                    })),
                    "text" => Ok(views::format_timeline_text(id, &timeline)),
                    other => Err(invalid_format(other)),
                }
            }
            Commands::Del { id } => {
                self.timelines.delete_whole(require_id(id)?)?;
                Ok(views::ok_json())
            }
            Commands::DelDot { id, dot_id } => {
                let id = require_id(id)?;
                if dot_id.is_empty() {
                    return Err(ApiError::InvalidInput("no dot ID provided".to_string()));
                }
                self.timelines.delete_dot(id, dot_id)?;
                Ok(views::ok_json())
            }
            Commands::Photo { command } => self.execute_photo(command),
            Commands::List { photos, format } => {
                let entries = if *photos {
                    self.list_photos()?
                } else {
                    self.list_timelines()?
                };
                match format.as_str() {
                    "json" => Ok(views::to_json(&ListResponse {
                        base: Base::ok(),
                        entries,
                    })),
                    "text" => Ok(views::format_list_text(&entries, *photos)),
                    other => Err(invalid_format(other)),
                }
            }
            Commands::Compact { photos } => {
                let report = if *photos {
                    self.photos.compact()?
                } else {
                    self.timelines.compact()?
                };
                Ok(views::to_json(&CompactResponse {
                    base: Base::ok(),
                    report,
                }))
            }
            Commands::Config => toml::to_string_pretty(&self.config).map_err(|e| {
                ApiError::ConfigError(format!("Failed to serialize config: {}", e))
            }),
        }
    }

    fn execute_photo(&self, command: &PhotoCommands) -> Result<String, ApiError> {
        match command {
            PhotoCommands::Put { id, file } => {
                let id = require_id(id)?;
                let bytes = std::fs::read(file)?;
                self.photos.put(id, &bytes)?;
            }
            PhotoCommands::Get { id, out } => {
                let bytes = self.photos.get(require_id(id)?)?;
                std::fs::write(out, bytes)?;
            }
            PhotoCommands::Del { id } => {
                self.photos.delete(require_id(id)?)?;
            }
        }
        Ok(views::ok_json())
    }

    fn list_timelines(&self) -> Result<Vec<ListEntry>, ApiError> {
        let codec = *self.timelines.codec();
        let mut entries = Vec::new();
        self.timelines.fold(|key, value| {
            // A listing reports undecodable records instead of failing on them
            let (alias, dots) = match codec.decode(value) {
                Ok(timeline) => (timeline.alias, Some(timeline.dots.len())),
                Err(e) => {
                    tracing::warn!(key = %views::display_key(key), "Undecodable timeline: {}", e);
                    (None, None)
                }
            };
            entries.push(ListEntry {
                id: views::display_key(key),
                alias,
                dots,
                bytes: value.len(),
            });
            Ok::<_, StoreError>(())
        })?;
        Ok(entries)
    }

    fn list_photos(&self) -> Result<Vec<ListEntry>, ApiError> {
        let mut entries = Vec::new();
        self.photos.fold(|key, value| {
            entries.push(ListEntry {
                id: views::display_key(key),
                alias: None,
                dots: None,
                bytes: value.len(),
            });
            Ok::<_, StoreError>(())
        })?;
        Ok(entries)
    }
}

fn invalid_format(format: &str) -> ApiError {
    ApiError::InvalidInput(format!(
        "Invalid output format: {} (must be 'json' or 'text')",
        format
    ))
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>, ApiError> {
    match file {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut body = Vec::new();
            std::io::stdin().read_to_end(&mut body)?;
            Ok(body)
        }
    }
}

/// Apply command-line flags on top of the loaded configuration.
fn apply_overrides(config: &mut TimelineConfig, cli: &Cli) -> Result<(), ApiError> {
    if let Some(path) = &cli.timelines_path {
        config.storage.timelines_path = Some(path.clone());
    }
    if let Some(path) = &cli.photos_path {
        config.storage.photos_path = Some(path.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.parse()?;
    }
    if let Some(output) = &cli.log_output {
        config.logging.output = output.parse()?;
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }
    Ok(())
}
