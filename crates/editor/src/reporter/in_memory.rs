//! An in-memory reporter, used directly in unit tests and embedded into
//! `svnedit-dav` before spooling for small working copies.

use svnedit_core::Revision;

use super::{EntryKind, Reporter, ReportEntry, ReporterState};
use crate::errors::ReporterError;

#[derive(Debug, Default)]
pub struct InMemoryReporter {
    entries: Vec<ReportEntry>,
    state: ReporterState,
}

impl InMemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for InMemoryReporter {
    fn set_path(
        &mut self,
        path: &str,
        rev: Revision,
        start_empty: bool,
        lock_token: Option<String>,
    ) -> Result<(), ReporterError> {
        self.state.check_entry(path)?;
        self.entries.push(ReportEntry {
            path: path.to_string(),
            kind: EntryKind::Set,
            rev,
            start_empty,
            lock_token,
        });
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
        self.entries.push(ReportEntry {
            path: path.to_string(),
            kind: EntryKind::Link { url: url.to_string() },
            rev,
            start_empty,
            lock_token,
        });
        Ok(())
    }

    fn delete_path(&mut self, path: &str) -> Result<(), ReporterError> {
        self.state.check_entry(path)?;
        self.entries.push(ReportEntry {
            path: path.to_string(),
            kind: EntryKind::Delete,
            rev: Revision::from(-1),
            start_empty: false,
            lock_token: None,
        });
        Ok(())
    }

    fn finish_report(mut self: Box<Self>) -> Result<Vec<ReportEntry>, ReporterError> {
        self.state.check_finish()?;
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
    fn test_anchor_must_be_first() {
        let mut reporter = InMemoryReporter::new();
        let err = reporter
            .set_path("trunk/sub", Revision::new(5), false, None)
            .unwrap_err();
        assert!(matches!(err, ReporterError::AnchorNotFirst(_)));
    }

    #[test]
    fn test_accumulates_entries_in_order() {
        let mut reporter: Box<dyn Reporter> = Box::new(InMemoryReporter::new());
        reporter.set_path("", Revision::new(5), false, None).unwrap();
        reporter
            .link_path("sub", "http://host/repo/other/sub", Revision::new(5), false, None)
            .unwrap();
        reporter.delete_path("gone").unwrap();

        let entries = reporter.finish_report().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].path, "");
        assert!(matches!(entries[1].kind, EntryKind::Link { .. }));
        assert!(matches!(entries[2].kind, EntryKind::Delete));
    }

    #[test]
    fn test_finish_consumes_reporter() {
        let mut reporter: Box<dyn Reporter> = Box::new(InMemoryReporter::new());
        reporter.set_path("", Revision::new(1), false, None).unwrap();
        let entries = reporter.finish_report().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_lock_token_carried() {
        let mut reporter: Box<dyn Reporter> = Box::new(InMemoryReporter::new());
        reporter.set_path("", Revision::new(1), false, None).unwrap();
        reporter
            .set_path("locked.txt", Revision::new(1), false, Some("opaquelocktoken:abc".into()))
            .unwrap();
        let entries = reporter.finish_report().unwrap();
        assert_eq!(entries[1].lock_token.as_deref(), Some("opaquelocktoken:abc"));
    }
}
