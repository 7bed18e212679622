//! The ancillary REPORTs (spec.md §4.5.5-§4.5.7 / SPEC_FULL §8.5):
//! `get-locations`, `get-locks`, `dated-rev`, `file-revs`, and
//! `get-location-segments`. Each follows the same request-builder +
//! two-pass `roxmltree` parse idiom as the update-report in
//! [`crate::report`], just with a flat response shape instead of a tree.

use std::fmt::Write as _;

use tracing::instrument;

use svnedit_core::{ByteString, RepoPath, Revision};

use crate::errors::DavError;
use crate::report::PropChange;
use crate::session::{check_status, RaSession};
use crate::xml_util::{attr, attr_or_default, child_text, children, parse_document, text};

fn report_method() -> reqwest::Method {
    reqwest::Method::from_bytes(b"REPORT").expect("REPORT is a valid HTTP method token")
}

fn parse_rfc3339(s: Option<String>) -> Option<chrono::DateTime<chrono::Utc>> {
    s.and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

/// One revision at which `path` (as given to `get_locations`) existed at a
/// particular repository location -- answers "where did this path live at
/// revision N", accounting for renames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationEntry {
    pub revision: Revision,
    pub path: String,
}

/// One lock held somewhere under a path, as reported by `get-locks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockEntry {
    pub path: String,
    pub token: String,
    pub owner: Option<String>,
    pub comment: Option<String>,
    pub creation_date: Option<chrono::DateTime<chrono::Utc>>,
    pub expiration_date: Option<chrono::DateTime<chrono::Utc>>,
}

/// One revision's worth of history for a single file, as reported by
/// `file-revs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRevEntry {
    pub path: String,
    pub revision: Revision,
    pub rev_props: Vec<(String, ByteString)>,
    pub prop_changes: Vec<PropChange>,
    /// The svndiff bytes carrying this revision's content relative to the
    /// previously emitted `FileRevEntry`, if the server included one (it
    /// may omit content when only properties changed).
    pub txdelta: Option<Vec<u8>>,
}

/// One contiguous range over which `path` (at `peg_rev`) lived at a single
/// location, as reported by `get-location-segments`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSegment {
    pub path: Option<String>,
    pub range_start: Revision,
    pub range_end: Revision,
}

impl RaSession {
    /// Where did `path` (as it exists at `peg_rev`) live at each revision in
    /// `target_revs`?
    #[instrument(skip(self, target_revs))]
    pub async fn get_locations(
        &self,
        path: &RepoPath,
        peg_rev: Revision,
        target_revs: &[Revision],
    ) -> Result<Vec<LocationEntry>, DavError> {
        let mut body = String::new();
        let _ = write!(
            body,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <S:get-locations xmlns:S=\"svn:\"><S:path>{path}</S:path><S:peg-revision>{}</S:peg-revision>",
            peg_rev.get(),
        );
        for rev in target_revs {
            let _ = writeln!(body, "<S:location-revision>{}</S:location-revision>", rev.get());
        }
        body.push_str("</S:get-locations>\n");

        let url = format!("{}/!svn/vcc/default", self.repos_root());
        let resp = self
            .request(report_method(), &url)
            .header("Depth", "0")
            .body(body)
            .send()
            .await?;
        check_status(&resp, &url)?;
        let body_text = resp.text().await?;
        let doc = parse_document(&body_text)?;
        let root = doc.root_element();
        let mut out = Vec::new();
        for node in children(&root, "location") {
            let revision = attr(&node, "rev")
                .and_then(|s| s.parse::<i64>().ok())
                .map(Revision::new)
                .ok_or_else(|| DavError::MalformedXml("get-locations response entry missing rev".into()))?;
            out.push(LocationEntry {
                revision,
                path: attr_or_default(&node, "path").to_string(),
            });
        }
        Ok(out)
    }

    /// The youngest revision no newer than `date` (an ISO-8601 timestamp).
    #[instrument(skip(self))]
    pub async fn dated_rev(&self, date: &str) -> Result<Revision, DavError> {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <S:dated-rev-report xmlns:S=\"svn:\"><S:creationdate>{date}</S:creationdate></S:dated-rev-report>\n"
        );
        let url = format!("{}/!svn/vcc/default", self.repos_root());
        let resp = self
            .request(report_method(), &url)
            .header("Depth", "0")
            .body(body)
            .send()
            .await?;
        check_status(&resp, &url)?;
        let body_text = resp.text().await?;
        let doc = parse_document(&body_text)?;
        let root = doc.root_element();
        let version_name =
            child_text(&root, "version-name").ok_or_else(|| DavError::MalformedXml("dated-rev-report missing version-name".into()))?;
        version_name
            .parse::<i64>()
            .map(Revision::new)
            .map_err(|_| DavError::MalformedXml(format!("non-numeric version-name '{version_name}'")))
    }

    /// Every lock at or under `path`.
    #[instrument(skip(self))]
    pub async fn get_locks(&self, path: &RepoPath) -> Result<Vec<LockEntry>, DavError> {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <S:get-locks-report xmlns:S=\"svn:\"><S:path>{path}</S:path></S:get-locks-report>\n"
        );
        let url = format!("{}{}", self.repos_root(), path);
        let resp = self
            .request(report_method(), &url)
            .header("Depth", "infinity")
            .body(body)
            .send()
            .await?;
        check_status(&resp, &url)?;
        let body_text = resp.text().await?;
        let doc = parse_document(&body_text)?;
        let root = doc.root_element();
        let mut out = Vec::new();
        for node in children(&root, "lock") {
            let path = child_text(&node, "path").unwrap_or_default();
            let token = child_text(&node, "token").ok_or_else(|| DavError::MalformedXml("lock entry missing token".into()))?;
            out.push(LockEntry {
                path,
                token,
                owner: child_text(&node, "owner"),
                comment: child_text(&node, "comment"),
                creation_date: parse_rfc3339(child_text(&node, "creationdate")),
                expiration_date: parse_rfc3339(child_text(&node, "expirationdate")),
            });
        }
        Ok(out)
    }

    /// Per-revision history of `path` between `start_rev` and `end_rev`
    /// (inclusive, server-ordered), each with any revision/file property
    /// changes and, when content changed, a base64-decoded svndiff against
    /// the previous entry's reconstructed text.
    #[instrument(skip(self))]
    pub async fn file_revs(
        &self,
        path: &RepoPath,
        start_rev: Revision,
        end_rev: Revision,
    ) -> Result<Vec<FileRevEntry>, DavError> {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <S:file-revs-report xmlns:S=\"svn:\"><S:path>{path}</S:path>\
             <S:start-revision>{}</S:start-revision><S:end-revision>{}</S:end-revision></S:file-revs-report>\n",
            start_rev.get(),
            end_rev.get(),
        );
        let url = format!("{}/!svn/vcc/default", self.repos_root());
        let resp = self
            .request(report_method(), &url)
            .header("Depth", "0")
            .body(body)
            .send()
            .await?;
        check_status(&resp, &url)?;
        let body_text = resp.text().await?;
        let doc = parse_document(&body_text)?;
        let root = doc.root_element();
        let mut out = Vec::new();
        for node in children(&root, "file-rev") {
            let revision = attr(&node, "rev")
                .and_then(|s| s.parse::<i64>().ok())
                .map(Revision::new)
                .ok_or_else(|| DavError::MalformedXml("file-rev entry missing rev".into()))?;
            let entry_path = attr_or_default(&node, "path").to_string();

            let mut rev_props = Vec::new();
            for prop_node in children(&node, "rev-prop") {
                let name = attr_or_default(&prop_node, "name").to_string();
                rev_props.push((name, ByteString::from(text(&prop_node))));
            }

            let mut prop_changes = Vec::new();
            for set_node in children(&node, "set-prop") {
                let name = attr_or_default(&set_node, "name").to_string();
                prop_changes.push(PropChange::Set(name, ByteString::from(text(&set_node))));
            }
            for remove_node in children(&node, "remove-prop") {
                prop_changes.push(PropChange::Remove(attr_or_default(&remove_node, "name").to_string()));
            }

            let txdelta = child_text(&node, "txdelta")
                .map(|b64| svnedit_core::stream::base64_decode(b64.trim()))
                .transpose()
                .map_err(|e| DavError::MalformedXml(format!("bad base64 in <S:txdelta>: {e}")))?;

            out.push(FileRevEntry {
                path: entry_path,
                revision,
                rev_props,
                prop_changes,
                txdelta,
            });
        }
        Ok(out)
    }

    /// The contiguous location segments covering `path` as of `peg_rev`,
    /// between `start_rev` and `end_rev`.
    #[instrument(skip(self))]
    pub async fn get_location_segments(
        &self,
        path: &RepoPath,
        peg_rev: Revision,
        start_rev: Revision,
        end_rev: Revision,
    ) -> Result<Vec<LocationSegment>, DavError> {
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <S:get-location-segments-report xmlns:S=\"svn:\"><S:path>{path}</S:path>\
             <S:peg-revision>{}</S:peg-revision><S:start-revision>{}</S:start-revision>\
             <S:end-revision>{}</S:end-revision></S:get-location-segments-report>\n",
            peg_rev.get(),
            start_rev.get(),
            end_rev.get(),
        );
        let url = format!("{}/!svn/vcc/default", self.repos_root());
        let resp = self
            .request(report_method(), &url)
            .header("Depth", "0")
            .body(body)
            .send()
            .await?;
        check_status(&resp, &url)?;
        let body_text = resp.text().await?;
        let doc = parse_document(&body_text)?;
        let root = doc.root_element();
        let mut out = Vec::new();
        for node in children(&root, "location-segment") {
            let range_start = attr(&node, "range-start")
                .and_then(|s| s.parse::<i64>().ok())
                .map(Revision::new)
                .ok_or_else(|| DavError::MalformedXml("location-segment missing range-start".into()))?;
            let range_end = attr(&node, "range-end")
                .and_then(|s| s.parse::<i64>().ok())
                .map(Revision::new)
                .ok_or_else(|| DavError::MalformedXml("location-segment missing range-end".into()))?;
            out.push(LocationSegment {
                path: attr(&node, "path").map(str::to_string),
                range_start,
                range_end,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get_locations_response() {
        let body = r#"<?xml version="1.0"?>
<S:get-locations-report xmlns:S="svn:">
  <S:location rev="10" path="/trunk/foo.txt"/>
  <S:location rev="5" path="/branches/old/foo.txt"/>
</S:get-locations-report>"#;
        let doc = parse_document(body).unwrap();
        let root = doc.root_element();
        let entries: Vec<_> = children(&root, "location").collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(attr(&entries[0], "rev"), Some("10"));
    }

    #[test]
    fn test_parse_dated_rev_response() {
        let body = r#"<?xml version="1.0"?>
<S:dated-rev-report xmlns:S="svn:"><S:version-name>42</S:version-name></S:dated-rev-report>"#;
        let doc = parse_document(body).unwrap();
        let root = doc.root_element();
        assert_eq!(child_text(&root, "version-name").unwrap(), "42");
    }

    #[test]
    fn test_parse_get_locks_response() {
        let body = r#"<?xml version="1.0"?>
<S:get-locks-report xmlns:S="svn:">
  <S:lock>
    <S:path>/trunk/locked.txt</S:path>
    <S:token>opaquelocktoken:abc-123</S:token>
    <S:owner>alice</S:owner>
  </S:lock>
</S:get-locks-report>"#;
        let doc = parse_document(body).unwrap();
        let root = doc.root_element();
        let lock = children(&root, "lock").next().unwrap();
        assert_eq!(child_text(&lock, "path").unwrap(), "/trunk/locked.txt");
        assert_eq!(child_text(&lock, "owner").unwrap(), "alice");
        assert!(child_text(&lock, "comment").is_none());
    }

    #[test]
    fn test_parse_file_revs_response_with_txdelta() {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"SVN\x00windowbytes");
        let body = format!(
            r#"<?xml version="1.0"?>
<S:file-revs-report xmlns:S="svn:">
  <S:file-rev path="/trunk/foo.txt" rev="7">
    <S:rev-prop name="svn:author">alice</S:rev-prop>
    <S:set-prop name="svn:eol-style">native</S:set-prop>
    <S:txdelta>{encoded}</S:txdelta>
  </S:file-rev>
</S:file-revs-report>"#
        );
        let doc = parse_document(&body).unwrap();
        let root = doc.root_element();
        let node = children(&root, "file-rev").next().unwrap();
        assert_eq!(attr_or_default(&node, "rev"), "7");
        let rev_prop = children(&node, "rev-prop").next().unwrap();
        assert_eq!(attr_or_default(&rev_prop, "name"), "svn:author");
        assert_eq!(text(&rev_prop), "alice");
    }

    #[test]
    fn test_parse_location_segments_response() {
        let body = r#"<?xml version="1.0"?>
<S:get-location-segments-report xmlns:S="svn:">
  <S:location-segment range-start="1" range-end="9" path="/trunk/foo.txt"/>
  <S:location-segment range-start="10" range-end="15"/>
</S:get-location-segments-report>"#;
        let doc = parse_document(body).unwrap();
        let root = doc.root_element();
        let segments: Vec<_> = children(&root, "location-segment").collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(attr(&segments[1], "path"), None);
    }
}
