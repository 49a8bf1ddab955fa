//! Decoder and session configuration.
//!
//! Every field has a default, so a partial JSON document is enough:
//!
//! ```
//! use apiwire::DecoderConfig;
//!
//! let config = DecoderConfig::from_json(r#"{ "max_word_length": 4096 }"#).unwrap();
//! assert_eq!(config.max_word_length, 4096);
//! assert_eq!(config.read_buffer_size, apiwire::config::DEFAULT_READ_BUFFER_SIZE);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default maximum word length (64 MiB).
pub const DEFAULT_MAX_WORD_LENGTH: u32 = 64 * 1024 * 1024;

/// Default read buffer size for the session loop (64 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Default capacity of the session command channel.
pub const DEFAULT_COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Configuration shared by [`Decoder`](crate::Decoder) and [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Largest word a length descriptor may declare before the stream is
    /// treated as malformed.
    pub max_word_length: u32,
    /// Bytes requested per read in the session loop.
    pub read_buffer_size: usize,
    /// Capacity of the register/unregister command channel.
    pub command_channel_capacity: usize,
}

impl DecoderConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the maximum word length.
    pub fn max_word_length(mut self, max: u32) -> Self {
        self.max_word_length = max;
        self
    }

    /// Set the session read buffer size.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set the session command channel capacity.
    pub fn command_channel_capacity(mut self, capacity: usize) -> Self {
        self.command_channel_capacity = capacity;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_word_length: DEFAULT_MAX_WORD_LENGTH,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            command_channel_capacity: DEFAULT_COMMAND_CHANNEL_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DecoderConfig::default();
        assert_eq!(config.max_word_length, DEFAULT_MAX_WORD_LENGTH);
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
        assert_eq!(
            config.command_channel_capacity,
            DEFAULT_COMMAND_CHANNEL_CAPACITY
        );
    }

    #[test]
    fn test_builder_setters() {
        let config = DecoderConfig::new()
            .max_word_length(1024)
            .read_buffer_size(512)
            .command_channel_capacity(8);

        assert_eq!(config.max_word_length, 1024);
        assert_eq!(config.read_buffer_size, 512);
        assert_eq!(config.command_channel_capacity, 8);
    }

    #[test]
    fn test_from_json_partial() {
        let config = DecoderConfig::from_json(r#"{"read_buffer_size": 128}"#).unwrap();
        assert_eq!(config.read_buffer_size, 128);
        assert_eq!(config.max_word_length, DEFAULT_MAX_WORD_LENGTH);
    }

    #[test]
    fn test_from_json_invalid() {
        let result = DecoderConfig::from_json("{ not json");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("JSON error"));
    }
}
