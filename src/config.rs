//! Configuration file handling for dreamgen.
//!
//! Loads configuration from `~/.config/dreamgen/config.toml` or a custom path.
//! The API key itself never lives here; it comes from the environment.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "generations";

/// Configuration file structure for dreamgen.
/// Loaded from ~/.config/dreamgen/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory where downloaded assets are written.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PollConfig {
    /// Delay between status checks, in seconds.
    pub interval_secs: Option<u64>,
    /// Overall wait limit, in seconds. Unset means wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("dreamgen").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/dreamgen/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert!(config.output.dir.is_none());
        assert!(config.poll.interval_secs.is_none());
        assert!(config.poll.timeout_secs.is_none());
    }

    #[test]
    fn test_load_parses_all_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[output]\ndir = \"/tmp/renders\"\n\n[poll]\ninterval_secs = 5\ntimeout_secs = 600"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.output.dir, Some(PathBuf::from("/tmp/renders")));
        assert_eq!(config.poll.interval_secs, Some(5));
        assert_eq!(config.poll.timeout_secs, Some(600));
    }

    #[test]
    fn test_load_partial_file_uses_defaults_for_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[poll]\ninterval_secs = 10").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.output.dir.is_none());
        assert_eq!(config.poll.interval_secs, Some(10));
        assert!(config.poll.timeout_secs.is_none());
    }

    #[test]
    fn test_load_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml = =").unwrap();

        let result = Config::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
