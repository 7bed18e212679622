//! svnedit-core: byte-string/stream primitives, canonical paths, revisions,
//! properties, the unified error taxonomy, and wire-client configuration
//! shared by every other crate in the workspace.
//!
//! This crate is the C1 "stream & byte-string primitives" component of the
//! commit/update protocol engine, plus the ambient stack (errors, config)
//! that every other component builds on.

pub mod bytestring;
pub mod checksum;
pub mod config;
pub mod errors;
pub mod path;
pub mod property;
pub mod stream;

pub use bytestring::{ByteBuf, ByteString};
pub use checksum::Md5Checksum;
pub use config::DavConfig;
pub use errors::{ConfigError, CoreError};
pub use path::{RepoPath, Revision, INVALID_REVISION};
pub use property::{NodeKind, PropNamespace, Property};
