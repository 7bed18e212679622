//! svnedit-editor: the tree-delta editor vocabulary (C3), baton lifetime
//! tracking, and the reporter (C4) -- the two halves of the commit/update
//! drive that do not themselves speak HTTP.
//!
//! `svnedit-dav` drives a [`TreeDeltaEditor`] implementation from parsed
//! update-report XML on the update path, and implements one itself on the
//! commit path; this crate owns the vocabulary and the invariants both
//! directions share.

pub mod asyncify;
pub mod baton;
pub mod editor;
pub mod errors;
pub mod fixture;
pub mod recorder;
pub mod reporter;

pub use asyncify::AsyncTreeDeltaEditor;
pub use baton::{Baton, CopyFrom, DirId, FileId};
pub use editor::{ComposeEditor, DefaultEditor, TreeDeltaEditor};
pub use errors::{EditorError, ReporterError};
pub use recorder::DriveRecorder;
pub use reporter::{EntryKind, InMemoryReporter, ReportEntry, Reporter, SpooledReporter};
