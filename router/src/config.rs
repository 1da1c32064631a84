//! Router configuration.
//!
//! Every field has a default, so a YAML file only needs the keys it changes.
//!
//! # Example YAML
//!
//! ```yaml
//! flag_prefix: "-"
//! capture_prefix: ":"
//! match_timeout_ms: 250
//! fail_on_unhandled: false
//! root_scoped_duplicates: false
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for tokenizing, registration and matching.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use cmdln_router::RouterConfig;
///
/// let config: RouterConfig = serde_yaml::from_str("match_timeout_ms: 50").unwrap();
/// assert_eq!(config.match_timeout(), Duration::from_millis(50));
/// assert_eq!(config.flag_prefix, '-');
/// assert!(!config.fail_on_unhandled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Character that marks a token as a flag.
    pub flag_prefix: char,
    /// Character that marks a pattern segment as a named capture.
    pub capture_prefix: char,
    /// Upper bound, in milliseconds, on each candidate matcher.
    pub match_timeout_ms: u64,
    /// Record unrecognized flags as a dispatch error and skip routing.
    pub fail_on_unhandled: bool,
    /// Only reject duplicate patterns that share a root word.
    pub root_scoped_duplicates: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            flag_prefix: '-',
            capture_prefix: ':',
            match_timeout_ms: 250,
            fail_on_unhandled: false,
            root_scoped_duplicates: false,
        }
    }
}

impl RouterConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::ConfigError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::ConfigError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::ConfigError::Io) if the file cannot be written,
    /// or [`Yaml`](crate::ConfigError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Per-candidate matching bound as a [`Duration`].
    pub fn match_timeout(&self) -> Duration {
        Duration::from_millis(self.match_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.flag_prefix, '-');
        assert_eq!(config.capture_prefix, ':');
        assert_eq!(config.match_timeout(), Duration::from_millis(250));
        assert!(!config.root_scoped_duplicates);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "fail_on_unhandled: true\ncapture_prefix: \"@\"\n";
        let config: RouterConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.fail_on_unhandled);
        assert_eq!(config.capture_prefix, '@');
        assert_eq!(config.match_timeout_ms, 250);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.yml");

        let config = RouterConfig {
            match_timeout_ms: 10,
            root_scoped_duplicates: true,
            ..RouterConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = RouterConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RouterConfig::load(dir.path().join("absent.yml")).unwrap_err();
        assert!(matches!(err, crate::ConfigError::Io(_)));
    }
}
