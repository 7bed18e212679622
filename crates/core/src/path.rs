//! Canonical repository paths and revision numbers.

use std::fmt;

use crate::errors::PathError;

/// A distinguished sentinel meaning "unspecified / youngest / head"
/// depending on context. Revisions are monotonic within a repository,
/// starting at 0.
pub const INVALID_REVISION: Revision = Revision(-1);

/// A signed 64-bit revision number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub i64);

impl Revision {
    pub fn new(n: i64) -> Self {
        Self(n)
    }

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for Revision {
    fn default() -> Self {
        INVALID_REVISION
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            write!(f, "INVALID_REVISION")
        }
    }
}

impl From<i64> for Revision {
    fn from(n: i64) -> Self {
        Self(n)
    }
}

/// A canonical, forward-slash-separated repository path.
///
/// Canonical form: no `.` or `..` components, no `//`, no trailing `/`
/// except for the root path `/` itself. Repository-absolute paths
/// conventionally lead with `/`; reporter-relative paths may be empty
/// (denoting the operation's anchor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoPath(String);

impl RepoPath {
    /// The repository root, `/`.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// The empty (anchor-relative) path used by reporter entries.
    pub fn anchor() -> Self {
        Self(String::new())
    }

    /// Parse and canonicalize `s`, rejecting `.`/`..` components, `//`,
    /// and (for non-root paths) a trailing slash.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Ok(Self::anchor());
        }
        if s == "/" {
            return Ok(Self::root());
        }
        if s.ends_with('/') {
            return Err(PathError::TrailingSlash(s.to_string()));
        }

        let leading_slash = s.starts_with('/');
        let body = if leading_slash { &s[1..] } else { s };

        for component in body.split('/') {
            if component.is_empty() {
                return Err(PathError::EmptyComponent(s.to_string()));
            }
            if component == "." || component == ".." {
                return Err(PathError::NotCanonical(s.to_string()));
            }
        }

        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn is_anchor(&self) -> bool {
        self.0.is_empty()
    }

    /// The final path component (the "basename"), or the whole path if it
    /// has no `/`.
    pub fn basename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Join a child component onto this path.
    pub fn join(&self, child: &str) -> RepoPath {
        if self.is_anchor() {
            RepoPath(child.to_string())
        } else if self.is_root() {
            RepoPath(format!("/{child}"))
        } else {
            RepoPath(format!("{}/{child}", self.0))
        }
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_only_path_ending_in_slash() {
        assert!(RepoPath::parse("/").unwrap().is_root());
        assert!(RepoPath::parse("/trunk/").is_err());
    }

    #[test]
    fn test_rejects_dot_and_dotdot() {
        assert!(RepoPath::parse("/trunk/./foo").is_err());
        assert!(RepoPath::parse("/trunk/../foo").is_err());
    }

    #[test]
    fn test_rejects_double_slash() {
        assert!(RepoPath::parse("/trunk//foo").is_err());
    }

    #[test]
    fn test_anchor_is_empty_path() {
        let anchor = RepoPath::parse("").unwrap();
        assert!(anchor.is_anchor());
    }

    #[test]
    fn test_join() {
        let root = RepoPath::root();
        assert_eq!(root.join("trunk").as_str(), "/trunk");
        let anchor = RepoPath::anchor();
        assert_eq!(anchor.join("sub").as_str(), "sub");
    }

    #[test]
    fn test_basename() {
        let p = RepoPath::parse("/trunk/src/main.rs").unwrap();
        assert_eq!(p.basename(), "main.rs");
    }

    #[test]
    fn test_invalid_revision_sentinel() {
        assert!(!INVALID_REVISION.is_valid());
        assert!(Revision::new(0).is_valid());
    }
}
