//! Small roxmltree helpers for reading REPORT/PROPFIND response bodies, and
//! `std::fmt::Write`-based helpers for building the small set of outbound
//! XML document shapes this crate sends (REPORT/PROPPATCH/MERGE bodies).
//!
//! Grounded on the pack's own SVN XML client
//! (`sellmerfud-svu/src/svn.rs`'s `get_attr`/`get_child`/`get_child_text`
//! helpers), adapted from `svn --xml` CLI output parsing to DAV response
//! parsing.

use roxmltree::Node;

use crate::errors::DavError;

pub fn attr<'a>(node: &Node<'a, 'a>, name: &str) -> Option<&'a str> {
    node.attribute(name)
}

pub fn attr_or_default<'a>(node: &Node<'a, 'a>, name: &str) -> &'a str {
    node.attribute(name).unwrap_or_default()
}

pub fn text(node: &Node) -> String {
    node.text().unwrap_or_default().to_string()
}

pub fn child<'a, 'i>(node: &Node<'a, 'i>, tag: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|c| c.is_element() && c.tag_name().name() == tag)
}

pub fn child_text(node: &Node, tag: &str) -> Option<String> {
    child(node, tag).map(|c| text(&c))
}

pub fn children<'a, 'i>(node: &Node<'a, 'i>, tag: &str) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.children().filter(move |c| c.is_element() && c.tag_name().name() == tag)
}

pub fn parse_document(body: &str) -> Result<roxmltree::Document<'_>, DavError> {
    roxmltree::Document::parse(body).map_err(|e| DavError::MalformedXml(e.to_string()))
}

pub fn require_child<'a, 'i>(node: &Node<'a, 'i>, tag: &str) -> Result<Node<'a, 'i>, DavError> {
    child(node, tag).ok_or_else(|| DavError::UnexpectedElement {
        element: "(missing)".to_string(),
        expected: tag.to_string(),
    })
}

/// Escape text for inclusion in an XML element body or attribute value.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_navigate_simple_document() {
        let body = r#"<?xml version="1.0"?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/repo/!svn/ver/5/trunk</D:href>
    <D:propstat>
      <D:prop><D:version-name>5</D:version-name></D:prop>
    </D:propstat>
  </D:response>
</D:multistatus>"#;
        let doc = parse_document(body).unwrap();
        let response = child(&doc.root_element(), "response").unwrap();
        assert_eq!(child_text(&response, "href").unwrap(), "/repo/!svn/ver/5/trunk");
        let propstat = child(&response, "propstat").unwrap();
        let prop = child(&propstat, "prop").unwrap();
        assert_eq!(child_text(&prop, "version-name").unwrap(), "5");
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a & b <c>"), "a &amp; b &lt;c&gt;");
    }
}
