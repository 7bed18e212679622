//! Properties, node kinds, and the property-namespace model used by the
//! wire protocol's PROPPATCH/PROPFIND encoding.

use crate::bytestring::ByteString;
use crate::errors::PropertyError;

/// One of `{file, directory, none, unknown}`. `None_` is the explicit
/// "does not exist" value, distinct from "absent" (exists but withheld,
/// e.g. by authorization — modeled separately by the editor's
/// `absent_directory`/`absent_file` operations).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
    None_,
    Unknown,
}

/// A `{name, value}` property. Names starting with `svn:` are reserved and
/// interpreted by core or server; all other names are opaque and
/// user-defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: ByteString,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<ByteString>) -> Result<Self, PropertyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PropertyError::EmptyName);
        }
        Ok(Self {
            name,
            value: value.into(),
        })
    }

    /// `true` for reserved, core/server-interpreted names (`svn:...`).
    pub fn is_reserved(&self) -> bool {
        self.name.starts_with("svn:")
    }

    /// Revision properties (`svn:log`, `svn:author`, `svn:date`) apply to
    /// a revision as a whole rather than to a specific node.
    pub fn is_revision_property(&self) -> bool {
        matches!(self.name.as_str(), "svn:log" | "svn:author" | "svn:date")
    }

    /// `true` if `value` can be emitted as CDATA on the wire verbatim: no
    /// control characters other than TAB/CR/LF, and valid UTF-8.
    pub fn value_is_xml_safe(&self) -> bool {
        is_xml_safe(self.value.as_bytes())
    }
}

/// Whether `bytes` can be emitted as XML CDATA verbatim: valid UTF-8, no
/// control characters except TAB (0x09), CR (0x0D), LF (0x0A), and no
/// embedded NULs.
pub fn is_xml_safe(bytes: &[u8]) -> bool {
    let text = match std::str::from_utf8(bytes) {
        Ok(t) => t,
        Err(_) => return false,
    };
    text.chars().all(|c| {
        let code = c as u32;
        code == 0x09 || code == 0x0A || code == 0x0D || !c.is_control()
    })
}

/// The wire distinguishes three property namespaces. Conversion to/from
/// strings happens only at the XML boundary (`svnedit-dav`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropNamespace {
    /// `svn:`-prefixed names, emitted with the prefix stripped under
    /// `SVN_DAV_PROP_NS_SVN`.
    Svn,
    /// User-defined names, emitted verbatim under `SVN_DAV_PROP_NS_CUSTOM`.
    Custom,
    /// Protocol-only DeltaV/WebDAV properties (`DAV:` namespace).
    Dav,
}

impl PropNamespace {
    /// Classify a property name into its wire namespace.
    pub fn classify(name: &str) -> Self {
        if name.starts_with("svn:") {
            PropNamespace::Svn
        } else {
            PropNamespace::Custom
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_and_revision_props() {
        let p = Property::new("svn:log", "fix bug").unwrap();
        assert!(p.is_reserved());
        assert!(p.is_revision_property());

        let p = Property::new("myapp:owner", "alice").unwrap();
        assert!(!p.is_reserved());
        assert!(!p.is_revision_property());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(Property::new("", "value").is_err());
    }

    #[test]
    fn test_xml_safety() {
        assert!(is_xml_safe(b"hello\tworld\n"));
        assert!(!is_xml_safe(b"hello\x00world"));
        assert!(!is_xml_safe(b"hello\x01world"));
        assert!(!is_xml_safe(&[0xff, 0xfe]));
    }

    #[test]
    fn test_namespace_classification() {
        assert_eq!(PropNamespace::classify("svn:mergeinfo"), PropNamespace::Svn);
        assert_eq!(PropNamespace::classify("myapp:x"), PropNamespace::Custom);
    }
}
