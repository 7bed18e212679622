//! URL discovery and baseline resolution (spec.md §4.5.1 / SPEC_FULL §8.2).
//!
//! An `RaSession` is opened against an arbitrary URL somewhere inside a
//! repository; `open` walks up the path, PROPFINDing for the
//! version-controlled-configuration resource, until it finds the
//! repository root and the path's repository-relative suffix.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

use svnedit_core::{DavConfig, Revision};

use crate::errors::DavError;
use crate::xml_util::{child, child_text, parse_document};

const PROPFIND_VCC_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:version-controlled-configuration/>
    <D:resourcetype/>
    <D:baseline-relative-path xmlns:S="http://subversion.tigris.org/xmlns/dav/"/>
  </D:prop>
</D:propfind>"#;

const PROPFIND_BASELINE_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:checked-in/>
  </D:prop>
</D:propfind>"#;

const PROPFIND_VERSION_NAME_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:baseline-collection/>
    <D:version-name/>
  </D:prop>
</D:propfind>"#;

const OPTIONS_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:options xmlns:D="DAV:">
  <D:activity-collection-set/>
</D:options>"#;

fn propfind_method() -> Method {
    Method::from_bytes(b"PROPFIND").expect("PROPFIND is a valid HTTP method token")
}

/// An open session against one repository, holding the resolved repository
/// root URL and the path (relative to that root) the session was opened
/// against.
pub struct RaSession {
    http: reqwest::Client,
    /// The DAV root URL (e.g. `https://svn.example.com/repo/!svn/vcc/default`'s
    /// parent collection), with no trailing slash.
    repos_root: String,
    /// The repository-relative path the session was opened against
    /// (leading slash, no trailing slash except for the empty root path).
    session_path: String,
    config: DavConfig,
}

impl RaSession {
    /// Discover the repository root and open a session against `url`.
    #[instrument(skip(config))]
    pub async fn open(url: &str, config: DavConfig) -> Result<Self, DavError> {
        let url = url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(DavError::MalformedUrl(url));
        }

        let http = build_client(&config)?;

        let mut probe = url.clone();
        let mut chopped_suffix = String::new();
        loop {
            match propfind_vcc(&http, &config, &probe).await {
                Ok(baseline_relative_path) => {
                    let session_path = format!("/{baseline_relative_path}{chopped_suffix}");
                    info!(repos_root = %probe, session_path = %session_path, "opened RA session");
                    return Ok(Self {
                        http,
                        repos_root: probe,
                        session_path,
                        config,
                    });
                }
                Err(DavError::NotFound { .. }) => {
                    let (parent, popped) = pop_path_component(&probe)
                        .ok_or_else(|| DavError::MalformedUrl(url.clone()))?;
                    chopped_suffix = format!("/{popped}{chopped_suffix}");
                    probe = parent;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn repos_root(&self) -> &str {
        &self.repos_root
    }

    pub fn session_path(&self) -> &str {
        &self.session_path
    }

    pub fn config(&self) -> &DavConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Start a request against `url`, attaching HTTP basic auth when the
    /// session was configured with a username. Every outbound request in
    /// this crate goes through this instead of `self.http().request(...)`
    /// directly so authentication stays centralized.
    pub(crate) fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        if self.config.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.config.username, self.config.password.as_deref())
        }
    }

    /// The youngest baseline (HEAD) revision.
    #[instrument(skip(self))]
    pub async fn latest_baseline(&self) -> Result<Revision, DavError> {
        self.baseline_inner(None).await
    }

    /// The baseline at a specific revision, via a DeltaV `Label:` header.
    #[instrument(skip(self))]
    pub async fn baseline_at(&self, rev: Revision) -> Result<Revision, DavError> {
        self.baseline_inner(Some(rev)).await
    }

    async fn baseline_inner(&self, rev: Option<Revision>) -> Result<Revision, DavError> {
        let baseline_url = self.checked_in_baseline_url(rev).await?;
        let req = self
            .request(propfind_method(), &baseline_url)
            .header("Depth", "0")
            .body(PROPFIND_VERSION_NAME_BODY);
        let resp = req.send().await?;
        check_status(&resp, &baseline_url)?;
        let body = resp.text().await?;
        let doc = parse_document(&body)?;
        let response = child(&doc.root_element(), "response").ok_or_else(|| DavError::MalformedXml("no <D:response>".into()))?;
        let propstat = child(&response, "propstat").ok_or_else(|| DavError::MalformedXml("no <D:propstat>".into()))?;
        let prop = child(&propstat, "prop").ok_or_else(|| DavError::MalformedXml("no <D:prop>".into()))?;
        let version_name = child_text(&prop, "version-name").ok_or_else(|| DavError::MalformedXml("no <D:version-name>".into()))?;
        let rev: i64 = version_name
            .parse()
            .map_err(|_| DavError::MalformedXml(format!("non-numeric version-name '{version_name}'")))?;
        Ok(Revision::new(rev))
    }

    /// Resolve the `DAV:checked-in` href off the version-controlled
    /// configuration resource, i.e. the URL of the baseline (HEAD, or a
    /// specific revision via `Label:`). Shared by `baseline_inner` (which
    /// needs the `version-name` off that URL) and commit choreography
    /// (which CHECKOUTs it directly to start a transaction).
    pub(crate) async fn checked_in_baseline_url(&self, rev: Option<Revision>) -> Result<String, DavError> {
        let vcc_url = format!("{}/!svn/vcc/default", self.repos_root);
        let mut req = self
            .request(propfind_method(), &vcc_url)
            .header("Depth", "0")
            .body(PROPFIND_BASELINE_BODY);
        if let Some(rev) = rev {
            req = req.header("Label", rev.get().to_string());
        }
        let resp = req.send().await?;
        check_status(&resp, &vcc_url)?;
        let body = resp.text().await?;
        let doc = parse_document(&body)?;
        let response = child(&doc.root_element(), "response").ok_or_else(|| DavError::MalformedXml("no <D:response>".into()))?;
        let propstat = child(&response, "propstat").ok_or_else(|| DavError::MalformedXml("no <D:propstat>".into()))?;
        let prop = child(&propstat, "prop").ok_or_else(|| DavError::MalformedXml("no <D:prop>".into()))?;
        let checked_in = child(&prop, "checked-in").ok_or_else(|| DavError::MalformedXml("no <D:checked-in>".into()))?;
        let href = child_text(&checked_in, "href").ok_or_else(|| DavError::MalformedXml("no <D:href> in checked-in".into()))?;
        Ok(format!("{}{}", self.base_origin(), href))
    }

    /// Discover the activity-collection URL via an `OPTIONS` request against
    /// the repository root, per spec.md §4.5.3 step 1. The server advertises
    /// it as one or more `DAV:activity-collection-set` hrefs; the first is
    /// used as the parent collection for new activities.
    #[instrument(skip(self))]
    pub(crate) async fn activity_collection(&self) -> Result<String, DavError> {
        let resp = self
            .request(Method::OPTIONS, &self.repos_root)
            .header("Content-Type", "text/xml")
            .body(OPTIONS_BODY)
            .send()
            .await?;
        check_status(&resp, &self.repos_root)?;
        let body = resp.text().await?;
        let href = parse_activity_collection_href(&body)?;
        Ok(format!("{}{}", self.base_origin(), href))
    }

    fn base_origin(&self) -> String {
        // repos_root is an absolute URL; the href returned by the server is
        // site-absolute, so reattach it to the scheme+authority only.
        if let Some(pos) = self.repos_root.find("://") {
            if let Some(slash) = self.repos_root[pos + 3..].find('/') {
                return self.repos_root[..pos + 3 + slash].to_string();
            }
        }
        self.repos_root.clone()
    }

    /// Turn a site-absolute href (as returned in a `Location` header or a
    /// `D:href` element) into a full URL. Hrefs that are already absolute
    /// are returned unchanged.
    pub(crate) fn resolve(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.base_origin(), href)
        }
    }
}

fn build_client(config: &DavConfig) -> Result<reqwest::Client, DavError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("svnedit/0.1"));
    headers.insert(
        "Accept-Encoding",
        HeaderValue::from_static(if config.prefer_compressed_svndiff {
            "svndiff1;q=0.9,svndiff;q=0.8"
        } else {
            "svndiff"
        }),
    );
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(std::time::Duration::from_secs(config.timeout_secs));
    if !config.username.is_empty() {
        debug!(username = %config.username, "configuring HTTP basic auth");
    }
    builder = builder.cookie_store(false);
    let client = builder.build().map_err(DavError::Http)?;
    Ok(client)
}

async fn propfind_vcc(http: &reqwest::Client, config: &DavConfig, url: &str) -> Result<String, DavError> {
    let mut builder = http.request(propfind_method(), url).header("Depth", "0").body(PROPFIND_VCC_BODY);
    if !config.username.is_empty() {
        builder = builder.basic_auth(&config.username, config.password.as_deref());
    }
    let resp = builder.send().await?;
    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(DavError::NotFound { path: url.to_string() });
    }
    check_status(&resp, url)?;
    let body = resp.text().await?;
    let doc = parse_document(&body)?;
    let response = child(&doc.root_element(), "response").ok_or_else(|| DavError::MalformedXml("no <D:response>".into()))?;
    let propstat = child(&response, "propstat").ok_or_else(|| DavError::MalformedXml("no <D:propstat>".into()))?;
    let prop = child(&propstat, "prop").ok_or_else(|| DavError::MalformedXml("no <D:prop>".into()))?;
    child_text(&prop, "baseline-relative-path")
        .ok_or_else(|| DavError::MalformedXml("no <S:baseline-relative-path>".into()))
}

fn parse_activity_collection_href(body: &str) -> Result<String, DavError> {
    let doc = parse_document(body)?;
    let set = child(&doc.root_element(), "activity-collection-set")
        .ok_or_else(|| DavError::MalformedXml("no <D:activity-collection-set> in OPTIONS response".into()))?;
    child_text(&set, "href")
        .ok_or_else(|| DavError::MalformedXml("no <D:href> in activity-collection-set".into()))
}

fn pop_path_component(url: &str) -> Option<(String, String)> {
    let pos = url.find("://")?;
    let after_scheme = pos + 3;
    let authority_end = url[after_scheme..].find('/').map(|p| after_scheme + p)?;
    if authority_end >= url.len() {
        return None;
    }
    let path = &url[authority_end..];
    let last_slash = path.rfind('/')?;
    if last_slash == 0 {
        return None;
    }
    let popped = path[last_slash + 1..].to_string();
    let parent = url[..authority_end + last_slash].to_string();
    Some((parent, popped))
}

pub(crate) fn check_status(resp: &reqwest::Response, path: &str) -> Result<(), DavError> {
    if let Some(err) = DavError::from_status(resp.status(), path) {
        warn!(status = %resp.status(), path, "non-success DAV response");
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_path_component() {
        let (parent, popped) = pop_path_component("https://svn.example.com/repo/trunk/src").unwrap();
        assert_eq!(parent, "https://svn.example.com/repo/trunk");
        assert_eq!(popped, "src");
    }

    #[test]
    fn test_pop_path_component_stops_at_root() {
        assert!(pop_path_component("https://svn.example.com/repo").is_none());
    }

    #[test]
    fn test_parse_activity_collection_href() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<D:options-response xmlns:D="DAV:">
  <D:activity-collection-set>
    <D:href>/repo/!svn/act/</D:href>
  </D:activity-collection-set>
</D:options-response>"#;
        assert_eq!(parse_activity_collection_href(body).unwrap(), "/repo/!svn/act/");
    }

    #[test]
    fn test_parse_activity_collection_href_missing() {
        let body = r#"<?xml version="1.0"?><D:options-response xmlns:D="DAV:"/>"#;
        assert!(parse_activity_collection_href(body).is_err());
    }

    #[test]
    fn test_base_origin_from_full_url() {
        let session = RaSession {
            http: reqwest::Client::new(),
            repos_root: "https://svn.example.com/repo".to_string(),
            session_path: "/".to_string(),
            config: DavConfig::new("https://svn.example.com/repo", "user"),
        };
        assert_eq!(session.base_origin(), "https://svn.example.com");
    }
}
