//! An in-process tree fixture used to test the editor/reporter contract
//! without going over the wire: a tiny in-memory "repository" of
//! immutable revisions, and a function that drives an arbitrary
//! [`TreeDeltaEditor`] with the delta between two tree snapshots.
//!
//! This stands in for the full repository backend (FSFS/BDB), which is
//! out of this core's scope; it exists purely so
//! `svnedit-editor`/`svnedit-dav`'s integration tests can exercise
//! properties 4-5 and the concrete scenarios of spec.md §8 in-process.

use std::collections::BTreeMap;

use svnedit_core::{ByteString, RepoPath, Revision};
use svnedit_delta::{encode_stream, EncoderConfig};

use crate::baton::Baton;
use crate::editor::TreeDeltaEditor;
use crate::errors::EditorError;

/// One node of an in-memory tree: a directory with named children, or a
/// file with content. Both kinds carry properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir {
        props: BTreeMap<String, Vec<u8>>,
        children: BTreeMap<String, Node>,
    },
    File {
        props: BTreeMap<String, Vec<u8>>,
        content: Vec<u8>,
    },
}

impl Node {
    pub fn dir() -> Self {
        Node::Dir {
            props: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn file(content: impl Into<Vec<u8>>) -> Self {
        Node::File {
            props: BTreeMap::new(),
            content: content.into(),
        }
    }

    pub fn with_child(mut self, name: &str, child: Node) -> Self {
        if let Node::Dir { children, .. } = &mut self {
            children.insert(name.to_string(), child);
        }
        self
    }

    pub fn with_prop(mut self, name: &str, value: impl Into<Vec<u8>>) -> Self {
        let props = match &mut self {
            Node::Dir { props, .. } | Node::File { props, .. } => props,
        };
        props.insert(name.to_string(), value.into());
        self
    }
}

/// An append-only in-memory repository: a `Vec` of immutable root-node
/// snapshots indexed by revision number.
#[derive(Debug, Default)]
pub struct InMemoryRepo {
    revisions: Vec<Node>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            revisions: vec![Node::dir()],
        }
    }

    /// Commit `tree` as the next revision, returning its number.
    pub fn commit(&mut self, tree: Node) -> Revision {
        self.revisions.push(tree);
        Revision::new((self.revisions.len() - 1) as i64)
    }

    pub fn head(&self) -> Revision {
        Revision::new((self.revisions.len() - 1) as i64)
    }

    pub fn tree_at(&self, rev: Revision) -> &Node {
        &self.revisions[rev.get() as usize]
    }
}

/// Drive `editor` with the tree-delta that transforms `base` (or an empty
/// tree, if `None`) into `target`, at `target_rev`.
pub fn compute_edit(
    editor: &mut dyn TreeDeltaEditor,
    base: Option<&Node>,
    target: &Node,
    target_rev: Revision,
) -> Result<(), EditorError> {
    let empty = Node::dir();
    let base = base.unwrap_or(&empty);

    editor.set_target_revision(target_rev)?;
    let root = editor.open_root(target_rev)?;
    diff_dir(editor, &RepoPath::root(), root, base, target, target_rev)?;
    editor.close_directory(root)?;
    editor.close_edit()?;
    Ok(())
}

fn node_children(node: &Node) -> &BTreeMap<String, Node> {
    match node {
        Node::Dir { children, .. } => children,
        Node::File { .. } => panic!("expected directory node"),
    }
}

fn node_props(node: &Node) -> &BTreeMap<String, Vec<u8>> {
    match node {
        Node::Dir { props, .. } | Node::File { props, .. } => props,
    }
}

fn diff_dir(
    editor: &mut dyn TreeDeltaEditor,
    path: &RepoPath,
    dir_baton: Baton,
    base: &Node,
    target: &Node,
    target_rev: Revision,
) -> Result<(), EditorError> {
    let empty = BTreeMap::new();
    let base_children = match base {
        Node::Dir { children, .. } => children,
        Node::File { .. } => &empty,
    };
    let target_children = node_children(target);

    for name in base_children.keys() {
        if !target_children.contains_key(name) {
            editor.delete_entry(&path.join(name), target_rev, dir_baton)?;
        }
    }

    for (name, target_child) in target_children {
        let child_path = path.join(name);
        match base_children.get(name) {
            None => add_node(editor, &child_path, dir_baton, target_child, target_rev)?,
            Some(base_child) => {
                if std::mem::discriminant(base_child) != std::mem::discriminant(target_child) {
                    editor.delete_entry(&child_path, target_rev, dir_baton)?;
                    add_node(editor, &child_path, dir_baton, target_child, target_rev)?;
                } else {
                    open_node(editor, &child_path, dir_baton, base_child, target_child, target_rev)?;
                }
            }
        }
    }
    diff_props(editor, dir_baton, node_props(base), node_props(target), true)
}

fn add_node(
    editor: &mut dyn TreeDeltaEditor,
    path: &RepoPath,
    parent: Baton,
    target: &Node,
    target_rev: Revision,
) -> Result<(), EditorError> {
    match target {
        Node::Dir { .. } => {
            let baton = editor.add_directory(path, parent, None)?;
            diff_dir(editor, path, baton, &Node::dir(), target, target_rev)?;
            editor.close_directory(baton)?;
        }
        Node::File { content, props } => {
            let baton = editor.add_file(path, parent, None)?;
            send_text(editor, baton, &[], content)?;
            for (name, value) in props {
                editor.change_file_prop(baton, name, Some(ByteString::from(value.clone())))?;
            }
            let checksum = svnedit_core::Md5Checksum::of(content);
            editor.close_file(baton, Some(checksum.as_str()))?;
        }
    }
    Ok(())
}

fn open_node(
    editor: &mut dyn TreeDeltaEditor,
    path: &RepoPath,
    parent: Baton,
    base: &Node,
    target: &Node,
    target_rev: Revision,
) -> Result<(), EditorError> {
    match (base, target) {
        (Node::Dir { .. }, Node::Dir { .. }) => {
            let baton = editor.open_directory(path, parent, target_rev)?;
            diff_dir(editor, path, baton, base, target, target_rev)?;
            editor.close_directory(baton)?;
        }
        (Node::File { content: base_content, props: base_props }, Node::File { content, props }) => {
            let baton = editor.open_file(path, parent, target_rev)?;
            if base_content != content {
                send_text(editor, baton, base_content, content)?;
            }
            diff_props(editor, baton, base_props, props, false)?;
            let checksum = svnedit_core::Md5Checksum::of(content);
            editor.close_file(baton, Some(checksum.as_str()))?;
        }
        _ => unreachable!("kind changes are handled by delete+add in diff_dir"),
    }
    Ok(())
}

fn send_text(editor: &mut dyn TreeDeltaEditor, file: Baton, base: &[u8], target: &[u8]) -> Result<(), EditorError> {
    let base_checksum = svnedit_core::Md5Checksum::of(base);
    let mut sink = editor.apply_textdelta(file, Some(base_checksum.as_str()))?;
    let stream = encode_stream(base, target, &EncoderConfig::default(), 0);
    std::io::Write::write_all(&mut sink, &stream).map_err(EditorError::wire)?;
    Ok(())
}

fn diff_props(
    editor: &mut dyn TreeDeltaEditor,
    baton: Baton,
    base: &BTreeMap<String, Vec<u8>>,
    target: &BTreeMap<String, Vec<u8>>,
    is_dir: bool,
) -> Result<(), EditorError> {
    for name in base.keys() {
        if !target.contains_key(name) {
            set_prop(editor, baton, name, None, is_dir)?;
        }
    }
    for (name, value) in target {
        if base.get(name) != Some(value) {
            set_prop(editor, baton, name, Some(ByteString::from(value.clone())), is_dir)?;
        }
    }
    Ok(())
}

fn set_prop(
    editor: &mut dyn TreeDeltaEditor,
    baton: Baton,
    name: &str,
    value: Option<ByteString>,
    is_dir: bool,
) -> Result<(), EditorError> {
    if is_dir {
        editor.change_dir_prop(baton, name, value)
    } else {
        editor.change_file_prop(baton, name, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::DefaultEditor;
    use crate::recorder::DriveRecorder;

    #[test]
    fn test_compute_edit_against_default_editor_is_well_formed() {
        let target = Node::dir().with_child("trunk", Node::dir().with_child("a.txt", Node::file("hello\n")));
        let mut rec = DriveRecorder::new(DefaultEditor::new());
        compute_edit(&mut rec, None, &target, Revision::new(1)).unwrap();
        assert!(rec.all_closed());
    }

    #[test]
    fn test_update_idempotence_produces_empty_drive() {
        // Recording editor that counts non-trivial calls (anything besides
        // set_target_revision/open_root/close_directory/close_edit).
        #[derive(Default)]
        struct CountNonTrivial(usize);
        impl TreeDeltaEditor for CountNonTrivial {
            fn open_root(&mut self, _: Revision) -> Result<Baton, EditorError> {
                Ok(Baton::Root)
            }
            fn add_directory(&mut self, _: &RepoPath, _: Baton, _: Option<crate::baton::CopyFrom>) -> Result<Baton, EditorError> {
                self.0 += 1;
                Ok(Baton::Dir(crate::baton::DirId(self.0)))
            }
            fn open_directory(&mut self, _: &RepoPath, _: Baton, _: Revision) -> Result<Baton, EditorError> {
                Ok(Baton::Dir(crate::baton::DirId(999)))
            }
            fn add_file(&mut self, _: &RepoPath, _: Baton, _: Option<crate::baton::CopyFrom>) -> Result<Baton, EditorError> {
                self.0 += 1;
                Ok(Baton::File(crate::baton::FileId(self.0)))
            }
            fn open_file(&mut self, _: &RepoPath, _: Baton, _: Revision) -> Result<Baton, EditorError> {
                Ok(Baton::File(crate::baton::FileId(999)))
            }
            fn delete_entry(&mut self, _: &RepoPath, _: Revision, _: Baton) -> Result<(), EditorError> {
                self.0 += 1;
                Ok(())
            }
            fn change_dir_prop(&mut self, _: Baton, _: &str, _: Option<ByteString>) -> Result<(), EditorError> {
                self.0 += 1;
                Ok(())
            }
            fn change_file_prop(&mut self, _: Baton, _: &str, _: Option<ByteString>) -> Result<(), EditorError> {
                self.0 += 1;
                Ok(())
            }
        }

        let target = Node::dir().with_child("trunk", Node::dir().with_child("a.txt", Node::file("hello\n")));

        let mut counter = CountNonTrivial::default();
        compute_edit(&mut counter, Some(&target), &target, Revision::new(1)).unwrap();
        assert_eq!(counter.0, 0, "update to the same tree must be a no-op drive");
    }
}
