//! Configuration schema types for `pxa.toml`
//!
//! Defines the structure and validation rules for export configuration.

use crate::compress::DEFAULT_COMPRESSION_LEVEL;
use crate::export::{AsepriteOptions, GifOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// GIF export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifConfig {
    /// Number of times the animation repeats; 0 loops forever
    #[serde(default)]
    pub loop_count: u16,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self { loop_count: 0 }
    }
}

impl GifConfig {
    pub fn options(&self) -> GifOptions {
        GifOptions { loop_count: self.loop_count }
    }
}

/// Aseprite export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsepriteConfig {
    /// zlib level for cel payloads (0-9)
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
    /// Name of the single exported layer
    #[serde(default = "default_layer_name")]
    pub layer_name: String,
}

fn default_compression_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

fn default_layer_name() -> String {
    "Layer 1".to_string()
}

impl Default for AsepriteConfig {
    fn default() -> Self {
        Self { compression_level: default_compression_level(), layer_name: default_layer_name() }
    }
}

impl AsepriteConfig {
    pub fn options(&self) -> AsepriteOptions {
        AsepriteOptions { layer_name: self.layer_name.clone() }
    }
}

/// Output location settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory exported files are written to when no `-o` is given
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir() }
    }
}

/// Complete pxa.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PxaConfig {
    #[serde(default)]
    pub gif: GifConfig,
    #[serde(default)]
    pub aseprite: AsepriteConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "aseprite.compression_level")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pxa.toml: '{}' {}", self.field, self.message)
    }
}

impl PxaConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.aseprite.compression_level > 9 {
            errors.push(ConfigValidationError {
                field: "aseprite.compression_level".to_string(),
                message: "must be between 0 and 9".to_string(),
            });
        }

        if self.aseprite.layer_name.is_empty() {
            errors.push(ConfigValidationError {
                field: "aseprite.layer_name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.aseprite.layer_name.len() > u16::MAX as usize {
            errors.push(ConfigValidationError {
                field: "aseprite.layer_name".to_string(),
                message: "must be at most 65535 bytes".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
