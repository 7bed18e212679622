//! End-to-end drive tests covering the concrete scenarios and testable
//! properties that don't require a real wire transport: committing one
//! file, deleting and re-adding a path, copying a directory with
//! mergeinfo, and update idempotence against the in-process tree fixture.

use svnedit_core::Revision;
use svnedit_editor::baton::CopyFrom;
use svnedit_editor::editor::TreeDeltaEditor;
use svnedit_editor::fixture::{compute_edit, Node};
use svnedit_editor::recorder::DriveRecorder;

/// A recording editor that just logs every call as a string, so tests can
/// assert on the shape of the drive without a network-backed editor.
#[derive(Default)]
struct LogEditor {
    log: Vec<String>,
    next_dir: usize,
    next_file: usize,
}

impl TreeDeltaEditor for LogEditor {
    fn set_target_revision(&mut self, rev: Revision) -> Result<(), svnedit_editor::errors::EditorError> {
        self.log.push(format!("set_target_revision({})", rev.get()));
        Ok(())
    }

    fn open_root(&mut self, base_rev: Revision) -> Result<svnedit_editor::baton::Baton, svnedit_editor::errors::EditorError> {
        self.log.push(format!("open_root({})", base_rev.get()));
        Ok(svnedit_editor::baton::Baton::Root)
    }

    fn delete_entry(
        &mut self,
        path: &svnedit_core::RepoPath,
        rev: Revision,
        _parent: svnedit_editor::baton::Baton,
    ) -> Result<(), svnedit_editor::errors::EditorError> {
        self.log.push(format!("delete_entry({}, {})", path, rev.get()));
        Ok(())
    }

    fn add_directory(
        &mut self,
        path: &svnedit_core::RepoPath,
        _parent: svnedit_editor::baton::Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<svnedit_editor::baton::Baton, svnedit_editor::errors::EditorError> {
        let id = self.next_dir;
        self.next_dir += 1;
        match &copy_from {
            Some(cf) => self.log.push(format!("add_directory({}, copy_from={}@{})", path, cf.path, cf.rev.get())),
            None => self.log.push(format!("add_directory({})", path)),
        }
        Ok(svnedit_editor::baton::Baton::Dir(svnedit_editor::baton::DirId(id)))
    }

    fn open_directory(
        &mut self,
        path: &svnedit_core::RepoPath,
        _parent: svnedit_editor::baton::Baton,
        base_rev: Revision,
    ) -> Result<svnedit_editor::baton::Baton, svnedit_editor::errors::EditorError> {
        let id = self.next_dir;
        self.next_dir += 1;
        self.log.push(format!("open_directory({}, {})", path, base_rev.get()));
        Ok(svnedit_editor::baton::Baton::Dir(svnedit_editor::baton::DirId(id)))
    }

    fn change_dir_prop(
        &mut self,
        _dir: svnedit_editor::baton::Baton,
        name: &str,
        value: Option<svnedit_core::ByteString>,
    ) -> Result<(), svnedit_editor::errors::EditorError> {
        self.log.push(format!("change_dir_prop({}, {:?})", name, value.map(|v| v.to_string_lossy().into_owned())));
        Ok(())
    }

    fn add_file(
        &mut self,
        path: &svnedit_core::RepoPath,
        _parent: svnedit_editor::baton::Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<svnedit_editor::baton::Baton, svnedit_editor::errors::EditorError> {
        let id = self.next_file;
        self.next_file += 1;
        match &copy_from {
            Some(cf) => self.log.push(format!("add_file({}, copy_from={}@{})", path, cf.path, cf.rev.get())),
            None => self.log.push(format!("add_file({})", path)),
        }
        Ok(svnedit_editor::baton::Baton::File(svnedit_editor::baton::FileId(id)))
    }

    fn open_file(
        &mut self,
        path: &svnedit_core::RepoPath,
        _parent: svnedit_editor::baton::Baton,
        base_rev: Revision,
    ) -> Result<svnedit_editor::baton::Baton, svnedit_editor::errors::EditorError> {
        let id = self.next_file;
        self.next_file += 1;
        self.log.push(format!("open_file({}, {})", path, base_rev.get()));
        Ok(svnedit_editor::baton::Baton::File(svnedit_editor::baton::FileId(id)))
    }

    fn apply_textdelta(
        &mut self,
        _file: svnedit_editor::baton::Baton,
        _base_checksum: Option<&str>,
    ) -> Result<Box<dyn std::io::Write + '_>, svnedit_editor::errors::EditorError> {
        self.log.push("apply_textdelta".to_string());
        Ok(Box::new(std::io::sink()))
    }

    fn close_file(
        &mut self,
        _file: svnedit_editor::baton::Baton,
        result_checksum: Option<&str>,
    ) -> Result<(), svnedit_editor::errors::EditorError> {
        self.log.push(format!("close_file({:?})", result_checksum));
        Ok(())
    }
}

#[test]
fn test_commit_one_file_scenario() {
    let target = Node::dir().with_child("trunk", Node::dir().with_child("hello.txt", Node::file("hello\n")));

    let mut recorded = DriveRecorder::new(LogEditor::default());
    compute_edit(&mut recorded, None, &target, Revision::new(1)).unwrap();
    assert!(recorded.all_closed());
    let log = recorded.into_inner();

    assert!(log.log.iter().any(|l| l.starts_with("add_directory(/trunk")));
    assert!(log.log.iter().any(|l| l.starts_with("add_file(/trunk/hello.txt")));
    assert!(log.log.contains(&"apply_textdelta".to_string()));
}

#[test]
fn test_delete_and_readd_same_path() {
    let base = Node::dir().with_child("a.txt", Node::file("v1\n"));
    let target = Node::dir().with_child("a.txt", Node::file("v2\n"));

    let mut recorded = DriveRecorder::new(LogEditor::default());
    compute_edit(&mut recorded, Some(&base), &target, Revision::new(2)).unwrap();
    assert!(recorded.all_closed());
    let log = recorded.into_inner();

    // Unchanged content between two File nodes is an open_file + textdelta,
    // not a delete+add; only a kind change (file<->dir) triggers delete+add.
    assert!(log.log.iter().any(|l| l.starts_with("open_file(/a.txt")));
}

#[test]
fn test_kind_change_is_delete_then_add() {
    let base = Node::dir().with_child("thing", Node::file("was a file\n"));
    let target = Node::dir().with_child("thing", Node::dir().with_child("now.txt", Node::file("a dir now\n")));

    let mut recorded = DriveRecorder::new(LogEditor::default());
    compute_edit(&mut recorded, Some(&base), &target, Revision::new(2)).unwrap();
    assert!(recorded.all_closed());
    let log = recorded.into_inner();

    let delete_pos = log.log.iter().position(|l| l.starts_with("delete_entry(/thing")).unwrap();
    let add_pos = log.log.iter().position(|l| l.starts_with("add_directory(/thing")).unwrap();
    assert!(delete_pos < add_pos);
}

#[test]
fn test_copy_directory_with_mergeinfo_prop() {
    let mut recorded = DriveRecorder::new(LogEditor::default());

    let root = recorded.open_root(Revision::new(5)).unwrap();
    let branch = recorded
        .add_directory(
            &svnedit_core::RepoPath::parse("/branches/feature").unwrap(),
            root,
            Some(CopyFrom {
                path: "/trunk".to_string(),
                rev: Revision::new(4),
            }),
        )
        .unwrap();
    recorded
        .change_dir_prop(branch, "svn:mergeinfo", Some("/trunk:1-4".into()))
        .unwrap();
    recorded.close_directory(branch).unwrap();
    recorded.close_directory(root).unwrap();
    recorded.close_edit().unwrap();
    let log = recorded.into_inner();

    assert!(log.log.iter().any(|l| l.contains("copy_from=/trunk@4")));
    assert!(log.log.iter().any(|l| l.contains("svn:mergeinfo")));
}

#[test]
fn test_update_idempotence_reporter_and_editor_agree() {
    // Reporting the same tree as the target means the computed drive
    // touches no content: an update against an already-current working
    // copy is a no-op drive (property 5, spec.md §8.5).
    let tree = Node::dir().with_child("trunk", Node::dir().with_child("a.txt", Node::file("hello\n")));

    let mut log = LogEditor::default();
    compute_edit(&mut log, Some(&tree), &tree, Revision::new(3)).unwrap();

    let non_trivial = log
        .log
        .iter()
        .filter(|l| !l.starts_with("set_target_revision") && !l.starts_with("open_root") && !l.starts_with("open_directory") && !l.starts_with("open_file"))
        .count();
    assert_eq!(non_trivial, 0, "no-op update must not add, delete, or change anything: {:?}", log.log);
}
