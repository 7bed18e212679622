//! Error taxonomy for the primitives crate.
//!
//! Each subsystem in `svnedit-core` gets its own `thiserror`-derived error
//! type; [`CoreError`] unifies them for callers that want a single error
//! type, the same shape the teacher crate uses for its top-level
//! `CoreError`.

use thiserror::Error;

/// Unified error type for `svnedit-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Errors from [`crate::path::RepoPath`] canonicalization.
#[derive(Debug, Error)]
pub enum PathError {
    /// A path component was empty (e.g. from a leading/embedded `//`).
    #[error("path '{0}' contains an empty component")]
    EmptyComponent(String),

    /// A path contained a `.` or `..` component.
    #[error("path '{0}' is not canonical: contains '.' or '..'")]
    NotCanonical(String),

    /// A non-root path ended in a trailing slash.
    #[error("path '{0}' has a trailing slash but is not the root")]
    TrailingSlash(String),
}

/// Errors from [`crate::property`] handling.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// A property name was empty.
    #[error("property name must not be empty")]
    EmptyName,
}

/// Errors from [`crate::checksum`].
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// A transmitted checksum did not match the computed one.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },

    /// A checksum string was not 32 hex characters.
    #[error("malformed MD5 checksum: '{0}'")]
    Malformed(String),
}

/// Errors from [`crate::stream`] adapters.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Errors from [`crate::config`] loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error(
        "required environment variable '{var}' is not set (referenced by config field '{field}')"
    )]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ChecksumError::Mismatch {
            expected: "abc".into(),
            actual: "def".into(),
        };
        assert!(err.to_string().contains("expected abc"));

        let err = ConfigError::EnvVarMissing {
            var: "SVN_PASSWORD".into(),
            field: "dav.password_env".into(),
        };
        assert!(err.to_string().contains("SVN_PASSWORD"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let path_err = PathError::EmptyComponent("/a//b".into());
        let core_err: CoreError = path_err.into();
        assert!(matches!(core_err, CoreError::Path(_)));
    }
}
