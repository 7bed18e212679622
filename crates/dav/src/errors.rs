//! Error taxonomy for the WebDAV/DeltaV wire protocol (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DavError {
    #[error("malformed repository URL: {0}")]
    MalformedUrl(String),

    #[error("path '{0}' is not in canonical form")]
    NonCanonicalPath(String),

    #[error("malformed XML in server response: {0}")]
    MalformedXml(String),

    #[error("unexpected XML element '{element}' where '{expected}' was required")]
    UnexpectedElement { element: String, expected: String },

    #[error("checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch { path: String, expected: String, actual: String },

    #[error("authentication required or rejected by server")]
    Unauthorized,

    #[error("not found: {path}")]
    NotFound { path: String },

    #[error("'{path}' already exists")]
    AlreadyExists { path: String },

    #[error("'{path}' is out of date")]
    OutOfDate { path: String },

    #[error("conflict at '{path}'")]
    Conflict { path: String },

    #[error("lock error: {0}")]
    LockError(String),

    #[error("server does not support report '{report}'")]
    UnsupportedFeature { report: String },

    #[error("the server's pre-revprop-change hook rejected the commit: {0}")]
    RevpropHookFailed(String),

    #[error("the server has no pre-revprop-change hook installed")]
    RevpropHookMissing,

    #[error("unexpected HTTP status {status} for '{path}'")]
    UnexpectedStatus { status: u16, path: String },

    #[error(transparent)]
    Editor(#[from] svnedit_editor::errors::EditorError),

    #[error(transparent)]
    Reporter(#[from] svnedit_editor::errors::ReporterError),

    #[error(transparent)]
    Svndiff(#[from] svnedit_delta::SvndiffError),

    #[error(transparent)]
    Core(#[from] svnedit_core::errors::CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DavError {
    /// Map an HTTP status code from a DAV response into the corresponding
    /// error, per spec.md §7's status-code table. Returns `None` for
    /// success codes; callers check status before calling this.
    pub fn from_status(status: reqwest::StatusCode, path: &str) -> Option<Self> {
        use reqwest::StatusCode as S;
        match status {
            S::UNAUTHORIZED | S::FORBIDDEN => Some(DavError::Unauthorized),
            S::NOT_FOUND => Some(DavError::NotFound { path: path.to_string() }),
            S::CONFLICT => Some(DavError::OutOfDate { path: path.to_string() }),
            S::LOCKED => Some(DavError::LockError(format!("'{path}' is locked"))),
            S::NOT_IMPLEMENTED => Some(DavError::UnsupportedFeature { report: path.to_string() }),
            s if s.is_success() => None,
            s => Some(DavError::UnexpectedStatus {
                status: s.as_u16(),
                path: path.to_string(),
            }),
        }
    }
}
