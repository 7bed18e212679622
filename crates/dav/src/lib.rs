//! svnedit-dav: the WebDAV/DeltaV wire protocol (C5) -- session bootstrap,
//! the update REPORT, the commit choreography, and the ancillary REPORTs
//! (get-locations, get-locks, dated-rev, file-revs, get-location-segments).
//!
//! This crate is the only one in the workspace that speaks HTTP; it drives
//! the synchronous `svnedit_editor::TreeDeltaEditor` vocabulary from async
//! wire code in both directions -- `report::apply_update_report` parses a
//! server response and calls a `TreeDeltaEditor` directly, while
//! `commit::CommitEditor` *implements* that trait by blocking on DeltaV
//! requests, so either a recorded working-copy drive or a real commit can
//! sit on the other side of the same interface.

pub mod ancillary;
pub mod commit;
pub mod errors;
pub mod propname;
pub mod report;
pub mod session;
pub mod xml_util;

pub use ancillary::{FileRevEntry, LocationEntry, LocationSegment, LockEntry};
pub use commit::{CommitEditor, CommitInfo, StaticVersionUrls, VersionUrlSource};
pub use errors::DavError;
pub use report::{
    apply_update_report, parse_update_report, ParsedUpdateReport, PropChange, ResourceEntry, UpdateReportNode,
    UpdateReportRequest, WcPropSink, WC_PROP_VERSION_URL,
};
pub use session::RaSession;
