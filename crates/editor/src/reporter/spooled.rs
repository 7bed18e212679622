//! A reporter that spools its accumulated `<S:entry>`/`<S:missing>` XML
//! fragments to a temporary file rather than holding them in memory,
//! required for very large working copies (spec.md §4.4). The finished
//! spool file is what `svnedit-dav` reads the REPORT body from on
//! `finish_report`.

use std::io::Write;
use std::path::Path;

use svnedit_core::Revision;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{EntryKind, Reporter, ReportEntry, ReporterState};
use crate::errors::ReporterError;

pub struct SpooledReporter {
    spool: NamedTempFile,
    entries: Vec<ReportEntry>,
    state: ReporterState,
}

impl SpooledReporter {
    /// Create a reporter whose spool file lives in `spool_dir`.
    pub fn new(spool_dir: &Path) -> Result<Self, ReporterError> {
        std::fs::create_dir_all(spool_dir)?;
        let spool = NamedTempFile::new_in(spool_dir)?;
        Ok(Self {
            spool,
            entries: Vec::new(),
            state: ReporterState::default(),
        })
    }

    /// Path to the spool file. Valid to call at any point before
    /// `finish_report` consumes the reporter.
    pub fn spool_path(&self) -> &Path {
        self.spool.path()
    }

    fn write_entry_fragment(&mut self, entry: &ReportEntry) -> Result<(), ReporterError> {
        match &entry.kind {
            EntryKind::Delete => {
                writeln!(self.spool, "<S:missing>{}</S:missing>", xml_escape(&entry.path))?;
            }
            EntryKind::Set => {
                write!(
                    self.spool,
                    "<S:entry rev=\"{}\"",
                    entry.rev.get()
                )?;
                self.write_common_attrs(entry)?;
                writeln!(self.spool, ">{}</S:entry>", xml_escape(&entry.path))?;
            }
            EntryKind::Link { url } => {
                write!(
                    self.spool,
                    "<S:entry rev=\"{}\" linkpath=\"{}\"",
                    entry.rev.get(),
                    xml_escape(url)
                )?;
                self.write_common_attrs(entry)?;
                writeln!(self.spool, ">{}</S:entry>", xml_escape(&entry.path))?;
            }
        }
        Ok(())
    }

    fn write_common_attrs(&mut self, entry: &ReportEntry) -> Result<(), ReporterError> {
        if entry.start_empty {
            write!(self.spool, " start-empty=\"true\"")?;
        }
        if let Some(token) = &entry.lock_token {
            write!(self.spool, " lock-token=\"{}\"", xml_escape(token))?;
        }
        Ok(())
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl Reporter for SpooledReporter {
    fn set_path(
        &mut self,
        path: &str,
        rev: Revision,
        start_empty: bool,
        lock_token: Option<String>,
    ) -> Result<(), ReporterError> {
        self.state.check_entry(path)?;
        let entry = ReportEntry {
            path: path.to_string(),
            kind: EntryKind::Set,
            rev,
            start_empty,
            lock_token,
        };
        self.write_entry_fragment(&entry)?;
        self.entries.push(entry);
        Ok(())
    }

    fn link_path(
        &mut self,
        path: &str,
        url: &str,
        rev: Revision,
        start_empty: bool,
        lock_token: Option<String>,
    ) -> Result<(), ReporterError> {
        self.state.check_entry(path)?;
        let entry = ReportEntry {
            path: path.to_string(),
            kind: EntryKind::Link { url: url.to_string() },
            rev,
            start_empty,
            lock_token,
        };
        self.write_entry_fragment(&entry)?;
        self.entries.push(entry);
        Ok(())
    }

    fn delete_path(&mut self, path: &str) -> Result<(), ReporterError> {
        self.state.check_entry(path)?;
        let entry = ReportEntry {
            path: path.to_string(),
            kind: EntryKind::Delete,
            rev: Revision::from(-1),
            start_empty: false,
            lock_token: None,
        };
        self.write_entry_fragment(&entry)?;
        self.entries.push(entry);
        Ok(())
    }

    fn finish_report(mut self: Box<Self>) -> Result<Vec<ReportEntry>, ReporterError> {
        self.state.check_finish()?;
        self.spool.flush()?;
        debug!(spool_path = %self.spool.path().display(), entries = self.entries.len(), "reporter spool finished");
        Ok(self.entries)
    }

    fn abort_report(mut self: Box<Self>) -> Result<(), ReporterError> {
        self.state.check_finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spools_entries_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = SpooledReporter::new(dir.path()).unwrap();
        reporter.set_path("", Revision::new(5), false, None).unwrap();
        reporter
            .set_path("sub", Revision::new(3), true, Some("opaquelocktoken:x".into()))
            .unwrap();
        let spool_path = reporter.spool_path().to_path_buf();

        let entries = Box::new(reporter).finish_report().unwrap();
        assert_eq!(entries.len(), 2);

        let contents = std::fs::read_to_string(&spool_path).unwrap();
        assert!(contents.contains("<S:entry rev=\"5\">"));
        assert!(contents.contains("start-empty=\"true\""));
        assert!(contents.contains("lock-token=\"opaquelocktoken:x\""));
    }

    #[test]
    fn test_anchor_must_be_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = SpooledReporter::new(dir.path()).unwrap();
        let err = reporter
            .set_path("sub", Revision::new(1), false, None)
            .unwrap_err();
        assert!(matches!(err, ReporterError::AnchorNotFirst(_)));
    }

    #[test]
    fn test_xml_escaping_in_spooled_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut reporter = SpooledReporter::new(dir.path()).unwrap();
        reporter.set_path("", Revision::new(1), false, None).unwrap();
        reporter
            .link_path("a&b", "http://host/a&b", Revision::new(1), false, None)
            .unwrap();
        let spool_path = reporter.spool_path().to_path_buf();
        Box::new(reporter).finish_report().unwrap();
        let contents = std::fs::read_to_string(&spool_path).unwrap();
        assert!(contents.contains("a&amp;b"));
    }
}
