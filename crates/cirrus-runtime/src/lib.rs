//! Cirrus Runtime - configuration and logging for Cirrus codecs.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `CirrusConfig`)
//! - Logging setup over `tracing-subscriber` (`LoggingBuilder`)
//! - Codec construction from configuration (`Codecs`)
//!
//! ```ignore
//! use cirrus_runtime::{Codecs, config::load_config, logging};
//!
//! let config = load_config()?;
//! logging::init_from_config(&config.logging);
//!
//! let codecs = Codecs::from_config(&config.codec);
//! let codec = codecs.message_codec::<serde_json::Value>();
//! let message = codec.to_message(&event, codecs.content_mode())?;
//! ```

pub mod codecs;
pub mod config;
pub mod logging;

// Re-exports
pub use codecs::Codecs;
pub use config::{
    CirrusConfig, CodecConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig,
};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
