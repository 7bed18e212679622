//! `DriveRecorder`: wraps an editor and validates the baton-lifetime
//! invariants of spec.md §3/§4.3 (the "Editor baton lifetime" testable
//! property, §8.3) while forwarding every call to the wrapped editor.

use std::collections::HashMap;

use svnedit_core::{ByteString, RepoPath, Revision};

use crate::baton::{Baton, CopyFrom};
use crate::editor::TreeDeltaEditor;
use crate::errors::EditorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatonState {
    Open,
    Closed,
}

/// Wraps an inner [`TreeDeltaEditor`], recording every baton handed out
/// and every baton consumed, and rejecting a drive that violates:
///
/// - a baton used after its close;
/// - a non-root baton whose parent was not open when the baton was
///   produced;
/// - a baton closed more than once;
/// - more than one open file per parent directory at a time;
/// - `close_edit` called while batons remain open.
pub struct DriveRecorder<E> {
    inner: E,
    states: HashMap<Baton, BatonState>,
    parents: HashMap<Baton, Baton>,
    open_file_in: HashMap<Baton, Baton>,
    root_opened: bool,
    finished: bool,
}

impl<E: TreeDeltaEditor> DriveRecorder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            states: HashMap::new(),
            parents: HashMap::new(),
            open_file_in: HashMap::new(),
            root_opened: false,
            finished: false,
        }
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    /// Every non-root baton handed out has been closed exactly once.
    pub fn all_closed(&self) -> bool {
        self.states.values().all(|s| *s == BatonState::Closed)
    }

    fn require_open(&self, baton: Baton) -> Result<(), EditorError> {
        if baton == Baton::Root {
            return match self.states.get(&Baton::Root) {
                Some(BatonState::Open) => Ok(()),
                Some(BatonState::Closed) => Err(EditorError::BatonAlreadyClosed(baton)),
                None => Err(EditorError::BatonNotOpen(baton)),
            };
        }
        match self.states.get(&baton) {
            Some(BatonState::Open) => Ok(()),
            Some(BatonState::Closed) => Err(EditorError::BatonAlreadyClosed(baton)),
            None => Err(EditorError::BatonNotOpen(baton)),
        }
    }

    fn record_open(&mut self, baton: Baton, parent: Baton) {
        self.states.insert(baton, BatonState::Open);
        self.parents.insert(baton, parent);
    }

    fn record_close(&mut self, baton: Baton) {
        self.states.insert(baton, BatonState::Closed);
    }
}

impl<E: TreeDeltaEditor> TreeDeltaEditor for DriveRecorder<E> {
    fn set_target_revision(&mut self, rev: Revision) -> Result<(), EditorError> {
        self.inner.set_target_revision(rev)
    }

    fn open_root(&mut self, base_rev: Revision) -> Result<Baton, EditorError> {
        if self.root_opened {
            return Err(EditorError::RootAlreadyOpened);
        }
        self.root_opened = true;
        let baton = self.inner.open_root(base_rev)?;
        self.states.insert(baton, BatonState::Open);
        Ok(baton)
    }

    fn delete_entry(&mut self, path: &RepoPath, rev: Revision, parent: Baton) -> Result<(), EditorError> {
        self.require_open(parent)?;
        self.inner.delete_entry(path, rev, parent)
    }

    fn add_directory(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError> {
        self.require_open(parent)?;
        let baton = self.inner.add_directory(path, parent, copy_from)?;
        self.record_open(baton, parent);
        Ok(baton)
    }

    fn open_directory(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        base_rev: Revision,
    ) -> Result<Baton, EditorError> {
        self.require_open(parent)?;
        let baton = self.inner.open_directory(path, parent, base_rev)?;
        self.record_open(baton, parent);
        Ok(baton)
    }

    fn change_dir_prop(&mut self, dir: Baton, name: &str, value: Option<ByteString>) -> Result<(), EditorError> {
        self.require_open(dir)?;
        self.inner.change_dir_prop(dir, name, value)
    }

    fn close_directory(&mut self, dir: Baton) -> Result<(), EditorError> {
        self.require_open(dir)?;
        self.inner.close_directory(dir)?;
        self.record_close(dir);
        Ok(())
    }

    fn absent_directory(&mut self, path: &RepoPath, parent: Baton) -> Result<(), EditorError> {
        self.require_open(parent)?;
        self.inner.absent_directory(path, parent)
    }

    fn add_file(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError> {
        self.require_open(parent)?;
        if self.open_file_in.contains_key(&parent) {
            return Err(EditorError::FileAlreadyOpenInParent(parent));
        }
        let baton = self.inner.add_file(path, parent, copy_from)?;
        self.record_open(baton, parent);
        self.open_file_in.insert(parent, baton);
        Ok(baton)
    }

    fn open_file(&mut self, path: &RepoPath, parent: Baton, base_rev: Revision) -> Result<Baton, EditorError> {
        self.require_open(parent)?;
        if self.open_file_in.contains_key(&parent) {
            return Err(EditorError::FileAlreadyOpenInParent(parent));
        }
        let baton = self.inner.open_file(path, parent, base_rev)?;
        self.record_open(baton, parent);
        self.open_file_in.insert(parent, baton);
        Ok(baton)
    }

    fn apply_textdelta(
        &mut self,
        file: Baton,
        base_checksum: Option<&str>,
    ) -> Result<Box<dyn std::io::Write + '_>, EditorError> {
        self.require_open(file)?;
        self.inner.apply_textdelta(file, base_checksum)
    }

    fn change_file_prop(&mut self, file: Baton, name: &str, value: Option<ByteString>) -> Result<(), EditorError> {
        self.require_open(file)?;
        self.inner.change_file_prop(file, name, value)
    }

    fn close_file(&mut self, file: Baton, result_checksum: Option<&str>) -> Result<(), EditorError> {
        self.require_open(file)?;
        self.inner.close_file(file, result_checksum)?;
        self.record_close(file);
        if let Some(&parent) = self.parents.get(&file) {
            self.open_file_in.remove(&parent);
        }
        Ok(())
    }

    fn absent_file(&mut self, path: &RepoPath, parent: Baton) -> Result<(), EditorError> {
        self.require_open(parent)?;
        self.inner.absent_file(path, parent)
    }

    fn close_edit(&mut self) -> Result<(), EditorError> {
        if !self.all_closed() {
            return Err(EditorError::OpenBatonAtClose);
        }
        self.finished = true;
        self.inner.close_edit()
    }

    fn abort_edit(&mut self) -> Result<(), EditorError> {
        self.finished = true;
        self.inner.abort_edit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::DefaultEditor;

    #[test]
    fn test_well_formed_drive_passes() {
        let mut rec = DriveRecorder::new(DefaultEditor::new());
        let root = rec.open_root(Revision::new(1)).unwrap();
        let dir = rec
            .add_directory(&RepoPath::parse("/trunk").unwrap(), root, None)
            .unwrap();
        let file = rec
            .add_file(&RepoPath::parse("/trunk/a.txt").unwrap(), dir, None)
            .unwrap();
        rec.close_file(file, None).unwrap();
        rec.close_directory(dir).unwrap();
        rec.close_directory(root).unwrap();
        rec.close_edit().unwrap();
    }

    #[test]
    fn test_baton_used_after_close_rejected() {
        let mut rec = DriveRecorder::new(DefaultEditor::new());
        let root = rec.open_root(Revision::new(1)).unwrap();
        let dir = rec
            .add_directory(&RepoPath::parse("/trunk").unwrap(), root, None)
            .unwrap();
        rec.close_directory(dir).unwrap();
        let err = rec.change_dir_prop(dir, "svn:ignore", None).unwrap_err();
        assert!(matches!(err, EditorError::BatonAlreadyClosed(_)));
    }

    #[test]
    fn test_second_open_root_rejected() {
        let mut rec = DriveRecorder::new(DefaultEditor::new());
        rec.open_root(Revision::new(1)).unwrap();
        let err = rec.open_root(Revision::new(1)).unwrap_err();
        assert!(matches!(err, EditorError::RootAlreadyOpened));
    }

    #[test]
    fn test_overlapping_files_in_same_parent_rejected() {
        let mut rec = DriveRecorder::new(DefaultEditor::new());
        let root = rec.open_root(Revision::new(1)).unwrap();
        rec.add_file(&RepoPath::parse("/a.txt").unwrap(), root, None)
            .unwrap();
        let err = rec
            .add_file(&RepoPath::parse("/b.txt").unwrap(), root, None)
            .unwrap_err();
        assert!(matches!(err, EditorError::FileAlreadyOpenInParent(_)));
    }

    #[test]
    fn test_close_edit_with_open_baton_rejected() {
        let mut rec = DriveRecorder::new(DefaultEditor::new());
        let root = rec.open_root(Revision::new(1)).unwrap();
        rec.add_directory(&RepoPath::parse("/trunk").unwrap(), root, None)
            .unwrap();
        let err = rec.close_edit().unwrap_err();
        assert!(matches!(err, EditorError::OpenBatonAtClose));
    }

    #[test]
    fn test_parent_not_open_rejected() {
        let mut rec = DriveRecorder::new(DefaultEditor::new());
        let root = rec.open_root(Revision::new(1)).unwrap();
        let dir = rec
            .add_directory(&RepoPath::parse("/trunk").unwrap(), root, None)
            .unwrap();
        rec.close_directory(dir).unwrap();
        let err = rec
            .add_file(&RepoPath::parse("/trunk/a.txt").unwrap(), dir, None)
            .unwrap_err();
        assert!(matches!(err, EditorError::BatonAlreadyClosed(_)));
    }
}
