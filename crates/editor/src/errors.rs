//! Error taxonomy for the editor and reporter vocabulary.

use thiserror::Error;

use crate::baton::Baton;

/// Errors a [`crate::editor::TreeDeltaEditor`] drive can raise. Covers
/// both the structural baton-lifetime invariants of spec.md §3/§4.3 and a
/// catch-all for whatever a concrete editor's own transport or storage
/// layer raises (`Wire`), so the trait itself stays non-generic over the
/// concrete error type the way the source's function-pointer vtable is
/// not parameterized by error type either.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("baton {0} used after it was already closed")]
    BatonAlreadyClosed(Baton),

    #[error("baton {0} is not open")]
    BatonNotOpen(Baton),

    #[error("parent baton {0} is not open")]
    ParentNotOpen(Baton),

    #[error("a file is already open under parent {0}; files within one directory cannot overlap")]
    FileAlreadyOpenInParent(Baton),

    #[error("open_root called more than once in a single drive")]
    RootAlreadyOpened,

    #[error("close_edit called with open batons still outstanding")]
    OpenBatonAtClose,

    #[error(transparent)]
    Checksum(#[from] svnedit_core::errors::ChecksumError),

    #[error(transparent)]
    Svndiff(#[from] svnedit_delta::SvndiffError),

    #[error("wire transport error: {0}")]
    Wire(Box<dyn std::error::Error + Send + Sync>),
}

impl EditorError {
    /// Wrap an arbitrary transport/storage error (e.g. a remote
    /// `CommitEditor`'s HTTP failures) as an [`EditorError`] without
    /// making the editor trait generic over error type.
    pub fn wire<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        EditorError::Wire(Box::new(err))
    }
}

/// Errors from driving or consuming a [`crate::reporter::Reporter`].
#[derive(Debug, Error)]
pub enum ReporterError {
    /// The first `set_path`/`link_path` call in a report was not for the
    /// empty (anchor) path.
    #[error("the first reporter entry must target the anchor path, got '{0}'")]
    AnchorNotFirst(String),

    /// A reporter call arrived after `finish_report`/`abort_report` already
    /// consumed the reporter.
    #[error("reporter was already finished or aborted")]
    AlreadyFinished,

    #[error("reporter I/O error: {0}")]
    Io(#[from] std::io::Error),
}
