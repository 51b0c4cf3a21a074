//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cirrus_core::{ContentMode, DEFAULT_PROPERTY_PREFIX, SpecVersion, VersionPolicy};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CirrusConfig {
    /// Codec defaults shared by every format and transport.
    #[serde(default)]
    pub codec: CodecConfig,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Codec
// =============================================================================

/// Codec configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodecConfig {
    /// Version assumed for documents that carry no version member.
    #[serde(default)]
    pub default_spec_version: SpecVersion,

    /// How a missing version member is handled.
    #[serde(default)]
    pub version_policy: VersionPolicy,

    /// Namespace prefix for binary-mode transport properties.
    #[serde(default = "default_property_prefix")]
    pub property_prefix: String,

    /// Content mode used when sending.
    #[serde(default)]
    pub content_mode: ContentMode,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            default_spec_version: SpecVersion::default(),
            version_policy: VersionPolicy::default(),
            property_prefix: default_property_prefix(),
            content_mode: ContentMode::default(),
        }
    }
}

fn default_property_prefix() -> String {
    DEFAULT_PROPERTY_PREFIX.to_string()
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Rotation schedule for file output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Log file, required when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-module levels, e.g. `cirrus_format_json = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_config() {
        let yaml = r#"
codec:
  default_spec_version: "0.3"
  version_policy: strict
  property_prefix: "ce-"
  content_mode: binary
logging:
  level: debug
  output: stderr
  filters:
    cirrus_core: trace
"#;
        let config: CirrusConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.codec.default_spec_version, SpecVersion::V0_3);
        assert_eq!(config.codec.version_policy, VersionPolicy::Strict);
        assert_eq!(config.codec.property_prefix, "ce-");
        assert_eq!(config.codec.content_mode, ContentMode::Binary);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.output, LogOutput::Stderr);
        assert_eq!(config.logging.filters.get("cirrus_core"), Some(&LogLevel::Trace));
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: CirrusConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, CirrusConfig::default());
        assert_eq!(config.codec.property_prefix, DEFAULT_PROPERTY_PREFIX);
        assert_eq!(config.codec.default_spec_version, SpecVersion::V1_0);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let result: Result<CirrusConfig, _> =
            serde_yaml::from_str("codec:\n  default_spec_version: \"9.9\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = CirrusConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["codec"]["default_spec_version"], "1.0");
        assert_eq!(json["codec"]["version_policy"], "lenient");
        assert_eq!(json["logging"]["level"], "info");
    }
}
