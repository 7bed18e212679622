//! TOML-based configuration for the wire-protocol client.
//!
//! Sensitive values (the repository password) are stored as an `_env`
//! field naming an environment variable, the same convention the teacher
//! crate's `SvnConfig` uses for `password_env`. The actual secret is
//! resolved at runtime via [`DavConfig::resolve_env_vars`], never stored
//! in the TOML file itself.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// Top-level configuration for an `RaSession` / `CommitEditor` client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DavConfig {
    /// Repository root URL (e.g. `https://svn.example.com/repo`).
    pub url: String,

    /// Username for HTTP authentication.
    pub username: String,

    /// Environment variable holding the password.
    #[serde(default)]
    pub password_env: Option<String>,

    /// Resolved password, populated by `resolve_env_vars`. Never
    /// (de)serialized directly.
    #[serde(skip)]
    pub password: Option<String>,

    /// Request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Prefer svndiff version 1 (zlib-compressed) when the server offers
    /// it, advertised via `Accept-Encoding: svndiff1;q=0.9,svndiff;q=0.8`.
    #[serde(default = "default_true")]
    pub prefer_compressed_svndiff: bool,

    /// Directory used to spool large reporter bodies and textdelta
    /// payloads to disk rather than memory.
    #[serde(default = "default_spool_dir")]
    pub spool_dir: PathBuf,

    /// Request a resource-walk tail on update reports.
    #[serde(default)]
    pub resource_walk: bool,
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_spool_dir() -> PathBuf {
    std::env::temp_dir()
}

impl DavConfig {
    /// Minimal configuration pointing at `url`, all other fields defaulted.
    pub fn new(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password_env: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            prefer_compressed_svndiff: default_true(),
            spool_dir: default_spool_dir(),
            resource_walk: false,
        }
    }

    /// Load a [`DavConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading dav configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: DavConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("dav configuration parsed successfully");
        Ok(config)
    }

    /// Resolve `password_env` from the environment. A missing variable is
    /// logged but not treated as fatal here -- callers that require a
    /// password decide that for themselves, since a read-only RA session
    /// against an anonymous-read repository may not need one at all.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");
        if let Some(ref env_name) = self.password_env {
            self.password = resolve_optional_env(env_name, "dav.password_env");
        }
        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate required fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "url".into(),
                detail: "repository URL must not be empty".into(),
            });
        }
        if self.username.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "username".into(),
                detail: "username must not be empty".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }
        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset or
/// empty.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
url = "https://svn.example.com/repo"
username = "svnuser"
password_env = "SVN_PASSWORD"
timeout_secs = 120
prefer_compressed_svndiff = true
resource_walk = true
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: DavConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.url, "https://svn.example.com/repo");
        assert_eq!(config.username, "svnuser");
        assert_eq!(config.timeout_secs, 120);
        assert!(config.resource_walk);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dav.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = DavConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.username, "svnuser");
    }

    #[test]
    fn test_file_not_found() {
        let result = DavConfig::load_from_file("/nonexistent/dav.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let mut config: DavConfig = toml::from_str(sample_toml()).unwrap();
        config.url = String::new();
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "url"
        ));
    }

    #[test]
    fn test_resolve_env_vars() {
        std::env::set_var("TEST_DAV_PW", "s3cret");

        let toml_str = r#"
url = "https://svn.example.com/repo"
username = "user"
password_env = "TEST_DAV_PW"
"#;
        let mut config: DavConfig = toml::from_str(toml_str).unwrap();
        config.resolve_env_vars().unwrap();

        assert_eq!(config.password.as_deref(), Some("s3cret"));

        std::env::remove_var("TEST_DAV_PW");
    }

    #[test]
    fn test_defaults() {
        let minimal = r#"
url = "https://svn.example.com/repo"
username = "user"
"#;
        let config: DavConfig = toml::from_str(minimal).unwrap();
        assert_eq!(config.timeout_secs, 300);
        assert!(config.prefer_compressed_svndiff);
        assert!(!config.resource_walk);
    }
}
