//! Configuration loading and discovery for `pxa.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::PxaConfig;
use log::debug;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file searched for.
pub const CONFIG_FILE_NAME: &str = "pxa.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse pxa.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override GIF loop count
    pub loop_count: Option<u16>,
    /// Override cel compression level
    pub compression_level: Option<u32>,
    /// Override output directory
    pub output_dir: Option<PathBuf>,
}

/// Find pxa.toml by walking up from the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find pxa.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        // Reached root, no config found
        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a pxa.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the default
/// configuration.
pub fn load_config(path: Option<&Path>) -> Result<PxaConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(PxaConfig::default()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<PxaConfig, ConfigError> {
    debug!("loading config from {}", path.display());
    let contents = fs::read_to_string(path)?;
    let config: PxaConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut PxaConfig, overrides: &CliOverrides) {
    if let Some(loop_count) = overrides.loop_count {
        config.gif.loop_count = loop_count;
    }
    if let Some(level) = overrides.compression_level {
        config.aseprite.compression_level = level;
    }
    if let Some(ref dir) = overrides.output_dir {
        config.output.dir = dir.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(contents.as_bytes())
            .expect("should write config content");
        config_path
    }

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "[gif]\nloop_count = 1");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "");

        let subdir = temp.path().join("art").join("walk");
        fs::create_dir_all(&subdir).expect("should create subdirectories");

        let found = find_config_from(subdir);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_load_config_from_path() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "[aseprite]\ncompression_level = 1");

        let config = load_config(Some(&config_path)).unwrap();
        assert_eq!(config.aseprite.compression_level, 1);
        assert_eq!(config.gif.loop_count, 0);
    }

    #[test]
    fn test_load_config_validation_failure() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "[aseprite]\ncompression_level = 42");

        let err = load_config(Some(&config_path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("compression_level"));
    }

    #[test]
    fn test_load_config_parse_failure() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = write_config(temp.path(), "[gif\nloop_count = ");
        assert!(matches!(load_config(Some(&config_path)), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let temp = TempDir::new().expect("should create temp dir");
        let missing = temp.path().join("nope.toml");
        assert!(matches!(load_config(Some(&missing)), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = PxaConfig::default();
        let overrides = CliOverrides {
            loop_count: Some(2),
            output_dir: Some(PathBuf::from("dist")),
            ..Default::default()
        };
        merge_cli_overrides(&mut config, &overrides);
        assert_eq!(config.gif.loop_count, 2);
        assert_eq!(config.aseprite.compression_level, 6);
        assert_eq!(config.output.dir, PathBuf::from("dist"));
    }
}
