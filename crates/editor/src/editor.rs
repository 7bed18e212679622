//! The tree-delta editor vocabulary (C3): one trait method per operation
//! in spec.md §3, a default no-op implementation, and sequential
//! composition of two editors.

use svnedit_core::{ByteString, RepoPath, Revision};

use crate::baton::{Baton, CopyFrom};
use crate::errors::EditorError;

/// A table of handlers for the tree-delta operation set. Every method has
/// a default no-op body returning success, so a real editor overrides
/// only the operations it cares about -- the Rust analogue of the
/// source's "default editor" of blanket no-op function pointers.
///
/// Drive-order invariants (spec.md §3/§4.3), enforced by
/// [`crate::recorder::DriveRecorder`] rather than by this trait itself:
/// exactly one `open_root` before any other non-`set_target_revision`
/// call; every call naming a directory baton as parent occurs between
/// that baton's open and its `close_directory`; file batons likewise
/// between open and `close_file`; at most one open file per directory at
/// a time; the drive terminates with exactly one of `close_edit` or
/// `abort_edit`.
pub trait TreeDeltaEditor {
    /// Called at most once, before any other operation, announcing the
    /// revision this drive is updating the recipient to.
    fn set_target_revision(&mut self, _rev: Revision) -> Result<(), EditorError> {
        Ok(())
    }

    /// Open the root of the tree being edited, at `base_rev`.
    fn open_root(&mut self, base_rev: Revision) -> Result<Baton, EditorError>;

    /// The entry at `path` (a child of `parent`) no longer exists in the
    /// target tree.
    fn delete_entry(
        &mut self,
        _path: &RepoPath,
        _rev: Revision,
        _parent: Baton,
    ) -> Result<(), EditorError> {
        Ok(())
    }

    /// Add a new directory at `path` under `parent`, optionally as a copy
    /// of `copy_from`.
    fn add_directory(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError>;

    /// Open an existing directory at `path` under `parent`, at `base_rev`.
    fn open_directory(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        base_rev: Revision,
    ) -> Result<Baton, EditorError>;

    /// Set (`Some`) or delete (`None`) a property on an open directory.
    fn change_dir_prop(
        &mut self,
        _dir: Baton,
        _name: &str,
        _value: Option<ByteString>,
    ) -> Result<(), EditorError> {
        Ok(())
    }

    fn close_directory(&mut self, _dir: Baton) -> Result<(), EditorError> {
        Ok(())
    }

    /// The node at `path` exists in the target tree but is being withheld
    /// (typically by authorization). Not a deletion: recipients must
    /// preserve any prior local presence or mark the entry inaccessible.
    fn absent_directory(&mut self, _path: &RepoPath, _parent: Baton) -> Result<(), EditorError> {
        Ok(())
    }

    fn add_file(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError>;

    fn open_file(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        base_rev: Revision,
    ) -> Result<Baton, EditorError>;

    /// Begin a text-delta application to `file`. Returns a sink that the
    /// driver writes raw svndiff stream bytes into (see
    /// `svnedit_delta::SvndiffParser`); the default no-op implementation
    /// discards everything written to it.
    fn apply_textdelta(
        &mut self,
        _file: Baton,
        _base_checksum: Option<&str>,
    ) -> Result<Box<dyn std::io::Write + '_>, EditorError> {
        Ok(Box::new(std::io::sink()))
    }

    fn change_file_prop(
        &mut self,
        _file: Baton,
        _name: &str,
        _value: Option<ByteString>,
    ) -> Result<(), EditorError> {
        Ok(())
    }

    fn close_file(
        &mut self,
        _file: Baton,
        _result_checksum: Option<&str>,
    ) -> Result<(), EditorError> {
        Ok(())
    }

    fn absent_file(&mut self, _path: &RepoPath, _parent: Baton) -> Result<(), EditorError> {
        Ok(())
    }

    /// Terminate the drive successfully. Exactly one of `close_edit` or
    /// `abort_edit` ends a drive.
    fn close_edit(&mut self) -> Result<(), EditorError> {
        Ok(())
    }

    /// Terminate the drive on failure. The receiving editor must treat
    /// all open batons as abandoned; the driver makes no further calls.
    fn abort_edit(&mut self) -> Result<(), EditorError> {
        Ok(())
    }
}

/// A fully no-op editor: every operation succeeds and does nothing,
/// allocating fresh, ever-increasing baton indices so a drive against it
/// remains well-formed. Useful as a base for wrapping editors that only
/// care about a subset of calls, or as a drive-order conformance target
/// in tests.
#[derive(Debug, Default)]
pub struct DefaultEditor {
    next_dir: usize,
    next_file: usize,
}

impl DefaultEditor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TreeDeltaEditor for DefaultEditor {
    fn open_root(&mut self, _base_rev: Revision) -> Result<Baton, EditorError> {
        Ok(Baton::Root)
    }

    fn add_directory(
        &mut self,
        _path: &RepoPath,
        _parent: Baton,
        _copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError> {
        let id = self.next_dir;
        self.next_dir += 1;
        Ok(Baton::Dir(crate::baton::DirId(id)))
    }

    fn open_directory(
        &mut self,
        _path: &RepoPath,
        _parent: Baton,
        _base_rev: Revision,
    ) -> Result<Baton, EditorError> {
        let id = self.next_dir;
        self.next_dir += 1;
        Ok(Baton::Dir(crate::baton::DirId(id)))
    }

    fn add_file(
        &mut self,
        _path: &RepoPath,
        _parent: Baton,
        _copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError> {
        let id = self.next_file;
        self.next_file += 1;
        Ok(Baton::File(crate::baton::FileId(id)))
    }

    fn open_file(
        &mut self,
        _path: &RepoPath,
        _parent: Baton,
        _base_rev: Revision,
    ) -> Result<Baton, EditorError> {
        let id = self.next_file;
        self.next_file += 1;
        Ok(Baton::File(crate::baton::FileId(id)))
    }
}

/// Sequential composition of two editors: every call on the composite
/// invokes `a` then `b` in order, with the composite baton a pair of each
/// inner editor's baton. Used to build trace/progress editors that wrap a
/// real update or commit editor.
pub struct ComposeEditor<A, B> {
    a: A,
    b: B,
    /// Batons returned by `a`, indexed by the baton the composite handed
    /// out for the same call (the composite's own baton numbering mirrors
    /// `a`'s, since `a` is always driven first and its baton shape -- one
    /// root, then ever-increasing dir/file indices -- is reused).
    b_batons: std::collections::HashMap<Baton, Baton>,
}

impl<A, B> ComposeEditor<A, B> {
    pub fn new(a: A, b: B) -> Self {
        Self {
            a,
            b,
            b_batons: std::collections::HashMap::new(),
        }
    }

    pub fn into_inner(self) -> (A, B) {
        (self.a, self.b)
    }
}

impl<A, B> TreeDeltaEditor for ComposeEditor<A, B>
where
    A: TreeDeltaEditor,
    B: TreeDeltaEditor,
{
    fn set_target_revision(&mut self, rev: Revision) -> Result<(), EditorError> {
        self.a.set_target_revision(rev)?;
        self.b.set_target_revision(rev)
    }

    fn open_root(&mut self, base_rev: Revision) -> Result<Baton, EditorError> {
        let a_baton = self.a.open_root(base_rev)?;
        let b_baton = self.b.open_root(base_rev)?;
        self.b_batons.insert(a_baton, b_baton);
        Ok(a_baton)
    }

    fn delete_entry(&mut self, path: &RepoPath, rev: Revision, parent: Baton) -> Result<(), EditorError> {
        let b_parent = self.b_baton(parent)?;
        self.a.delete_entry(path, rev, parent)?;
        self.b.delete_entry(path, rev, b_parent)
    }

    fn add_directory(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError> {
        let b_parent = self.b_baton(parent)?;
        let a_baton = self.a.add_directory(path, parent, copy_from.clone())?;
        let b_baton = self.b.add_directory(path, b_parent, copy_from)?;
        self.b_batons.insert(a_baton, b_baton);
        Ok(a_baton)
    }

    fn open_directory(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        base_rev: Revision,
    ) -> Result<Baton, EditorError> {
        let b_parent = self.b_baton(parent)?;
        let a_baton = self.a.open_directory(path, parent, base_rev)?;
        let b_baton = self.b.open_directory(path, b_parent, base_rev)?;
        self.b_batons.insert(a_baton, b_baton);
        Ok(a_baton)
    }

    fn change_dir_prop(
        &mut self,
        dir: Baton,
        name: &str,
        value: Option<ByteString>,
    ) -> Result<(), EditorError> {
        let b_dir = self.b_baton(dir)?;
        self.a.change_dir_prop(dir, name, value.clone())?;
        self.b.change_dir_prop(b_dir, name, value)
    }

    fn close_directory(&mut self, dir: Baton) -> Result<(), EditorError> {
        let b_dir = self.b_baton(dir)?;
        self.a.close_directory(dir)?;
        self.b.close_directory(b_dir)
    }

    fn absent_directory(&mut self, path: &RepoPath, parent: Baton) -> Result<(), EditorError> {
        let b_parent = self.b_baton(parent)?;
        self.a.absent_directory(path, parent)?;
        self.b.absent_directory(path, b_parent)
    }

    fn add_file(
        &mut self,
        path: &RepoPath,
        parent: Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError> {
        let b_parent = self.b_baton(parent)?;
        let a_baton = self.a.add_file(path, parent, copy_from.clone())?;
        let b_baton = self.b.add_file(path, b_parent, copy_from)?;
        self.b_batons.insert(a_baton, b_baton);
        Ok(a_baton)
    }

    fn open_file(&mut self, path: &RepoPath, parent: Baton, base_rev: Revision) -> Result<Baton, EditorError> {
        let b_parent = self.b_baton(parent)?;
        let a_baton = self.a.open_file(path, parent, base_rev)?;
        let b_baton = self.b.open_file(path, b_parent, base_rev)?;
        self.b_batons.insert(a_baton, b_baton);
        Ok(a_baton)
    }

    fn apply_textdelta(
        &mut self,
        file: Baton,
        base_checksum: Option<&str>,
    ) -> Result<Box<dyn std::io::Write + '_>, EditorError> {
        // Composing two independent byte sinks requires buffering: drain
        // `a`'s sink and mirror the bytes into `b`'s sink on drop.
        let b_file = self.b_baton(file)?;
        let a_sink = self.a.apply_textdelta(file, base_checksum)?;
        let b_sink = self.b.apply_textdelta(b_file, base_checksum)?;
        Ok(Box::new(TeeWrite { a: a_sink, b: b_sink }))
    }

    fn change_file_prop(&mut self, file: Baton, name: &str, value: Option<ByteString>) -> Result<(), EditorError> {
        let b_file = self.b_baton(file)?;
        self.a.change_file_prop(file, name, value.clone())?;
        self.b.change_file_prop(b_file, name, value)
    }

    fn close_file(&mut self, file: Baton, result_checksum: Option<&str>) -> Result<(), EditorError> {
        let b_file = self.b_baton(file)?;
        self.a.close_file(file, result_checksum)?;
        self.b.close_file(b_file, result_checksum)
    }

    fn absent_file(&mut self, path: &RepoPath, parent: Baton) -> Result<(), EditorError> {
        let b_parent = self.b_baton(parent)?;
        self.a.absent_file(path, parent)?;
        self.b.absent_file(path, b_parent)
    }

    fn close_edit(&mut self) -> Result<(), EditorError> {
        self.a.close_edit()?;
        self.b.close_edit()
    }

    fn abort_edit(&mut self) -> Result<(), EditorError> {
        self.a.abort_edit()?;
        self.b.abort_edit()
    }
}

impl<A, B> ComposeEditor<A, B> {
    fn b_baton(&self, a_baton: Baton) -> Result<Baton, EditorError> {
        if a_baton == Baton::Root {
            return Ok(Baton::Root);
        }
        self.b_batons
            .get(&a_baton)
            .copied()
            .ok_or(EditorError::BatonNotOpen(a_baton))
    }
}

struct TeeWrite<'a> {
    a: Box<dyn std::io::Write + 'a>,
    b: Box<dyn std::io::Write + 'a>,
}

impl std::io::Write for TeeWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.a.write_all(buf)?;
        self.b.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.a.flush()?;
        self.b.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_editor_hands_out_distinct_batons() {
        let mut editor = DefaultEditor::new();
        let root = editor.open_root(Revision::new(0)).unwrap();
        assert_eq!(root, Baton::Root);
        let d1 = editor
            .add_directory(&RepoPath::parse("/trunk").unwrap(), root, None)
            .unwrap();
        let d2 = editor
            .add_directory(&RepoPath::parse("/branches").unwrap(), root, None)
            .unwrap();
        assert_ne!(d1, d2);
        editor.close_directory(d1).unwrap();
        editor.close_directory(d2).unwrap();
        editor.close_directory(root).unwrap();
        editor.close_edit().unwrap();
    }

    #[test]
    fn test_compose_editor_drives_both_in_order() {
        // Using two DefaultEditors only proves that composition itself is
        // well-formed; `ComposeEditor` is normally used with an inner
        // editor and a tracing/progress wrapper.
        let mut composite = ComposeEditor::new(DefaultEditor::new(), DefaultEditor::new());
        let root = composite.open_root(Revision::new(0)).unwrap();
        let dir = composite
            .add_directory(&RepoPath::parse("/trunk").unwrap(), root, None)
            .unwrap();
        composite.close_directory(dir).unwrap();
        composite.close_directory(root).unwrap();
        composite.close_edit().unwrap();
    }
}
