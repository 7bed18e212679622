//! Baton identifiers.
//!
//! The source's per-call `void *` batons become a tagged sum over opaque
//! indices: the root baton is a unit variant (there is exactly one per
//! drive); directory and file batons carry an index into whatever arena
//! the concrete editor (or [`crate::recorder::DriveRecorder`]) uses to
//! track them.

use std::fmt;

/// Index of an open directory, scoped to one drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirId(pub usize);

/// Index of an open file, scoped to one drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

/// An opaque handle identifying an open directory or file during a
/// tree-delta drive. The root baton is produced by `open_root` and is
/// distinguished from every other directory baton since it has no
/// parent and is consumed by exactly one terminal call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Baton {
    Root,
    Dir(DirId),
    File(FileId),
}

impl fmt::Display for Baton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Baton::Root => write!(f, "root"),
            Baton::Dir(id) => write!(f, "dir#{}", id.0),
            Baton::File(id) => write!(f, "file#{}", id.0),
        }
    }
}

/// The copy-source of an `add_directory`/`add_file` call: the new node is
/// derived from this revision's node at this repository-relative path
/// (accepted in repository-relative form per spec.md's Open Questions
/// resolution; a URL fallback parser lives in `svnedit-dav` for interop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFrom {
    pub path: String,
    pub rev: svnedit_core::Revision,
}
