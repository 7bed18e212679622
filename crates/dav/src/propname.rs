//! Property-namespace wire encoding (spec.md §4.5.1/§6, DESIGN NOTES
//! "dynamic property namespaces").
//!
//! `svn:`-prefixed names are emitted under the `SVN_DAV_PROP_NS_SVN`
//! namespace with the prefix stripped; everything else under
//! `SVN_DAV_PROP_NS_CUSTOM`. Values that fail the XML-safety test are
//! base64-encoded with `encoding="base64"` rather than embedded as CDATA.

use svnedit_core::property::{is_xml_safe, PropNamespace};
use svnedit_core::ByteString;

use crate::xml_util::xml_escape;

pub const NS_SVN: &str = "http://subversion.tigris.org/xmlns/svn/";
pub const NS_CUSTOM: &str = "http://subversion.tigris.org/xmlns/custom/";
pub const NS_DAV: &str = "DAV:";

/// The wire-namespace prefix and local name for a property name.
pub fn wire_name(name: &str) -> (&'static str, &str) {
    match PropNamespace::classify(name) {
        PropNamespace::Svn => ("S", name.strip_prefix("svn:").unwrap_or(name)),
        PropNamespace::Custom => ("C", name),
        PropNamespace::Dav => ("D", name),
    }
}

/// Render one `<S:set>`/PROPPATCH property element: `<prefix:local
/// [V:encoding="base64"]>value</prefix:local>`.
pub fn render_prop_element(name: &str, value: &ByteString) -> String {
    let (prefix, local) = wire_name(name);
    if is_xml_safe(value.as_bytes()) {
        format!(
            "<{prefix}:{local}>{}</{prefix}:{local}>",
            xml_escape(&value.to_string_lossy())
        )
    } else {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(value.as_bytes());
        format!("<{prefix}:{local} V:encoding=\"base64\">{encoded}</{prefix}:{local}>")
    }
}

/// Render a `<D:remove><D:prop><prefix:local/></D:prop></D:remove>` element
/// for a property deletion.
pub fn render_prop_removal(name: &str) -> String {
    let (prefix, local) = wire_name(name);
    format!("<D:remove><D:prop><{prefix}:{local}/></D:prop></D:remove>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_name_strips_svn_prefix() {
        assert_eq!(wire_name("svn:mergeinfo"), ("S", "mergeinfo"));
        assert_eq!(wire_name("myapp:owner"), ("C", "myapp:owner"));
    }

    #[test]
    fn test_render_xml_safe_value_inline() {
        let rendered = render_prop_element("svn:log", &ByteString::from("fix the thing"));
        assert_eq!(rendered, "<S:log>fix the thing</S:log>");
    }

    #[test]
    fn test_render_unsafe_value_base64() {
        let rendered = render_prop_element("custom:bin", &ByteString::from_bytes(vec![0u8, 1, 2, 0xff]));
        assert!(rendered.contains("V:encoding=\"base64\""));
    }

    #[test]
    fn test_render_prop_removal() {
        assert_eq!(
            render_prop_removal("svn:ignore"),
            "<D:remove><D:prop><S:ignore/></D:prop></D:remove>"
        );
    }
}
