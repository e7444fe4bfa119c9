//! Default layer: the lowest-precedence values every other source overrides.

use crate::record::codec::DEFAULT_MAX_RECORD_BYTES;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Start a builder seeded with the built-in defaults.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("storage.handle_mode", "per_operation")?
        .set_default("storage.serialize_writes", false)?
        .set_default("storage.max_record_bytes", DEFAULT_MAX_RECORD_BYTES as i64)?
        .set_default("logging.enabled", true)?
        .set_default("logging.level", "info")
}
