//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{CirrusConfig, CodecConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &CirrusConfig) -> ConfigResult<()> {
    validate_codec_config(&config.codec)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates codec settings.
fn validate_codec_config(codec: &CodecConfig) -> ConfigResult<()> {
    let prefix = &codec.property_prefix;
    if prefix.is_empty() {
        return Err(ConfigError::missing_field("codec.property_prefix"));
    }
    if prefix.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ConfigError::validation(format!(
            "Property prefix '{prefix}' must not contain whitespace"
        )));
    }
    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter target: '{module}'"
        )));
    }

    Ok(())
}
