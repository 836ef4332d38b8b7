//! Configuration management for mdon

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, MdError, Result};

/// Default Mastodon post length limit, used when the config does not set one
pub const DEFAULT_MAX_CHARACTERS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Instance URL, e.g. "https://mastodon.social" or just "mastodon.social"
    pub server: Option<String>,

    /// Access token given inline
    pub access_token: Option<String>,

    /// Path to a file holding the access token (used when `access_token` is unset)
    pub token_file: Option<String>,

    #[serde(default = "default_max_characters")]
    pub max_characters: usize,

    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: None,
            access_token: None,
            token_file: None,
            max_characters: DEFAULT_MAX_CHARACTERS,
            color: true,
        }
    }
}

fn default_max_characters() -> usize {
    DEFAULT_MAX_CHARACTERS
}

fn default_color() -> bool {
    true
}

impl Config {
    /// Load configuration, honoring an explicit path from the command line
    ///
    /// Environment overrides (`MD_SERVER`, `MD_ACCESS_TOKEN`) are applied after
    /// the file is read, then the result is validated. When no file exists but
    /// both variables are set, the defaults plus the environment are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(explicit) {
            Ok(config_path) => {
                tracing::debug!(path = %config_path.display(), "loading config");
                Self::load_from_path(&config_path)?
            }
            Err(MdError::Config(ConfigError::NotFound(looked))) if env_has_credentials() => {
                tracing::debug!(looked = %looked, "no config file, using environment");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(server) = std::env::var("MD_SERVER") {
            self.server = Some(server);
        }
        if let Ok(token) = std::env::var("MD_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
    }

    /// Check that a server and some token source are present
    pub fn validate(&self) -> Result<()> {
        match self.server.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => {}
            _ => return Err(ConfigError::MissingField("server".to_string()).into()),
        }

        let has_inline = self
            .access_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_inline && self.token_file.is_none() {
            return Err(
                ConfigError::MissingField("access_token or token_file".to_string()).into(),
            );
        }

        Ok(())
    }
}

/// Whether `MD_SERVER` and `MD_ACCESS_TOKEN` are both set and non-blank
fn env_has_credentials() -> bool {
    let set = |name: &str| std::env::var(name).is_ok_and(|v| !v.trim().is_empty());
    set("MD_SERVER") && set("MD_ACCESS_TOKEN")
}

/// Candidate config locations, in lookup order, when no explicit path is given
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(".mastodon.toml")];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".mastodon.toml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("md").join("config.toml"));
    }
    paths
}

/// Resolve the configuration file path
///
/// An explicit path always wins, then `MD_CONFIG`, then the first existing
/// file from [`config_search_paths`].
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("MD_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let candidates = config_search_paths();
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }

    let looked = candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(ConfigError::NotFound(looked).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MdError;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_path_full() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
server = "https://example.social"
access_token = "abc"
max_characters = 1000
color = false
"#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.server.as_deref(), Some("https://example.social"));
        assert_eq!(config.access_token.as_deref(), Some("abc"));
        assert_eq!(config.max_characters, 1000);
        assert!(!config.color);
    }

    #[test]
    fn test_load_from_path_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
server = "example.social"
token_file = "~/.config/md/token"
"#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.max_characters, DEFAULT_MAX_CHARACTERS);
        assert!(config.color);
        assert!(config.access_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_path_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "server = [unterminated");

        let result = Config::load_from_path(&path);
        assert!(matches!(
            result,
            Err(MdError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Config::load_from_path(&dir.path().join("nope.toml"));
        assert!(matches!(
            result,
            Err(MdError::Config(ConfigError::ReadError(_)))
        ));
    }

    #[test]
    fn test_validate_missing_server() {
        let config: Config = toml::from_str(r#"access_token = "abc""#).unwrap();
        match config.validate() {
            Err(MdError::Config(ConfigError::MissingField(field))) => assert_eq!(field, "server"),
            other => panic!("Expected missing server, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_missing_token() {
        let config: Config = toml::from_str(
            r#"
server = "example.social"
access_token = "   "
"#,
        )
        .unwrap();
        match config.validate() {
            Err(MdError::Config(ConfigError::MissingField(field))) => {
                assert!(field.contains("access_token"))
            }
            other => panic!("Expected missing token, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_explicit_path_wins() {
        let explicit = PathBuf::from("/somewhere/else.toml");
        let resolved = resolve_config_path(Some(&explicit)).unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    #[serial]
    fn test_resolve_from_env_var() {
        std::env::set_var("MD_CONFIG", "/tmp/md-test-config.toml");
        let resolved = resolve_config_path(None).unwrap();
        std::env::remove_var("MD_CONFIG");
        assert_eq!(resolved, PathBuf::from("/tmp/md-test-config.toml"));
    }

    #[test]
    #[serial]
    fn test_load_applies_env_overrides() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
server = "file.social"
access_token = "from-file"
"#,
        );

        std::env::set_var("MD_SERVER", "env.social");
        std::env::set_var("MD_ACCESS_TOKEN", "from-env");
        let result = Config::load(Some(&path));
        std::env::remove_var("MD_SERVER");
        std::env::remove_var("MD_ACCESS_TOKEN");

        let config = result.unwrap();
        assert_eq!(config.server.as_deref(), Some("env.social"));
        assert_eq!(config.access_token.as_deref(), Some("from-env"));
    }

    #[test]
    #[serial]
    fn test_env_has_credentials_needs_both() {
        std::env::remove_var("MD_ACCESS_TOKEN");
        std::env::set_var("MD_SERVER", "env.social");
        let server_only = env_has_credentials();

        std::env::set_var("MD_ACCESS_TOKEN", "  ");
        let blank_token = env_has_credentials();

        std::env::set_var("MD_ACCESS_TOKEN", "from-env");
        let both = env_has_credentials();

        std::env::remove_var("MD_SERVER");
        std::env::remove_var("MD_ACCESS_TOKEN");

        assert!(!server_only);
        assert!(!blank_token);
        assert!(both);
    }

    #[test]
    fn test_default_config_has_no_credentials() {
        let config = Config::default();
        assert_eq!(config.max_characters, DEFAULT_MAX_CHARACTERS);
        assert!(config.color);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_search_paths_start_with_working_dir() {
        let paths = config_search_paths();
        assert_eq!(paths[0], PathBuf::from(".mastodon.toml"));
    }
}
