//! Drives a synchronous [`TreeDeltaEditor`] from async wire-protocol code.
//!
//! `svnedit-dav`'s update path parses a REPORT response body with
//! `roxmltree` (synchronous) but receives it over a `reqwest` streaming
//! body (async); rather than making [`TreeDeltaEditor`] itself async (which
//! would force every trivial in-memory editor, including
//! [`crate::editor::DefaultEditor`] and [`crate::recorder::DriveRecorder`],
//! to pay for `.await` points it never needs), the wire layer buffers one
//! XML node's worth of work and hands it to the inner editor on a blocking
//! task. This wrapper is that hand-off point.

use std::io::Write;
use std::sync::Arc;

use tokio::sync::Mutex;

use svnedit_core::{ByteString, RepoPath, Revision};

use crate::baton::{Baton, CopyFrom};
use crate::editor::TreeDeltaEditor;
use crate::errors::EditorError;

/// Wraps an `E: TreeDeltaEditor` so each operation can be awaited from
/// async code. Every call borrows the inner editor under a
/// [`tokio::sync::Mutex`] and runs it on a blocking task, since a real
/// editor (a `CommitEditor` making blocking HTTP calls, or a
/// `DriveRecorder` wrapping one) may itself block.
pub struct AsyncTreeDeltaEditor<E> {
    inner: Arc<Mutex<E>>,
}

impl<E> Clone for AsyncTreeDeltaEditor<E> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<E: TreeDeltaEditor + Send + 'static> AsyncTreeDeltaEditor<E> {
    pub fn new(inner: E) -> Self {
        Self { inner: Arc::new(Mutex::new(inner)) }
    }

    /// Unwrap back to the inner editor. Fails if another clone of this
    /// handle (or a task still driving it) is outstanding.
    pub fn try_into_inner(self) -> Result<E, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner()),
            Err(inner) => Err(Self { inner }),
        }
    }

    pub async fn set_target_revision(&self, rev: Revision) -> Result<(), EditorError> {
        self.run(move |e| e.set_target_revision(rev)).await
    }

    pub async fn open_root(&self, base_rev: Revision) -> Result<Baton, EditorError> {
        self.run(move |e| e.open_root(base_rev)).await
    }

    pub async fn delete_entry(&self, path: RepoPath, rev: Revision, parent: Baton) -> Result<(), EditorError> {
        self.run(move |e| e.delete_entry(&path, rev, parent)).await
    }

    pub async fn add_directory(
        &self,
        path: RepoPath,
        parent: Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError> {
        self.run(move |e| e.add_directory(&path, parent, copy_from)).await
    }

    pub async fn open_directory(
        &self,
        path: RepoPath,
        parent: Baton,
        base_rev: Revision,
    ) -> Result<Baton, EditorError> {
        self.run(move |e| e.open_directory(&path, parent, base_rev)).await
    }

    pub async fn change_dir_prop(
        &self,
        dir: Baton,
        name: String,
        value: Option<ByteString>,
    ) -> Result<(), EditorError> {
        self.run(move |e| e.change_dir_prop(dir, &name, value)).await
    }

    pub async fn close_directory(&self, dir: Baton) -> Result<(), EditorError> {
        self.run(move |e| e.close_directory(dir)).await
    }

    pub async fn absent_directory(&self, path: RepoPath, parent: Baton) -> Result<(), EditorError> {
        self.run(move |e| e.absent_directory(&path, parent)).await
    }

    pub async fn add_file(
        &self,
        path: RepoPath,
        parent: Baton,
        copy_from: Option<CopyFrom>,
    ) -> Result<Baton, EditorError> {
        self.run(move |e| e.add_file(&path, parent, copy_from)).await
    }

    pub async fn open_file(&self, path: RepoPath, parent: Baton, base_rev: Revision) -> Result<Baton, EditorError> {
        self.run(move |e| e.open_file(&path, parent, base_rev)).await
    }

    /// Unlike the other calls, the svndiff bytes are already fully
    /// buffered by the time this is invoked: the async wire layer reads
    /// a complete `<S:txdelta>` element's base64-decoded body before
    /// handing it off, rather than streaming it through a writer across
    /// the async/blocking boundary.
    pub async fn apply_textdelta(
        &self,
        file: Baton,
        base_checksum: Option<String>,
        svndiff: Vec<u8>,
    ) -> Result<(), EditorError> {
        self.run(move |e| {
            let mut sink = e.apply_textdelta(file, base_checksum.as_deref())?;
            sink.write_all(&svndiff).map_err(EditorError::wire)
        })
        .await
    }

    pub async fn change_file_prop(
        &self,
        file: Baton,
        name: String,
        value: Option<ByteString>,
    ) -> Result<(), EditorError> {
        self.run(move |e| e.change_file_prop(file, &name, value)).await
    }

    pub async fn close_file(&self, file: Baton, result_checksum: Option<String>) -> Result<(), EditorError> {
        self.run(move |e| e.close_file(file, result_checksum.as_deref())).await
    }

    pub async fn absent_file(&self, path: RepoPath, parent: Baton) -> Result<(), EditorError> {
        self.run(move |e| e.absent_file(&path, parent)).await
    }

    pub async fn close_edit(&self) -> Result<(), EditorError> {
        self.run(|e| e.close_edit()).await
    }

    pub async fn abort_edit(&self) -> Result<(), EditorError> {
        self.run(|e| e.abort_edit()).await
    }

    async fn run<F, T>(&self, f: F) -> Result<T, EditorError>
    where
        F: FnOnce(&mut E) -> Result<T, EditorError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = inner.blocking_lock();
            f(&mut guard)
        })
        .await
        .map_err(EditorError::wire)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::DefaultEditor;

    #[tokio::test]
    async fn test_async_drive_mirrors_sync_default_editor() {
        let editor = AsyncTreeDeltaEditor::new(DefaultEditor::new());
        let root = editor.open_root(Revision::new(1)).await.unwrap();
        let dir = editor
            .add_directory(RepoPath::parse("/trunk").unwrap(), root, None)
            .await
            .unwrap();
        editor.close_directory(dir).await.unwrap();
        editor.close_directory(root).await.unwrap();
        editor.close_edit().await.unwrap();
    }

    #[tokio::test]
    async fn test_try_into_inner_succeeds_with_no_outstanding_clones() {
        let editor = AsyncTreeDeltaEditor::new(DefaultEditor::new());
        editor.open_root(Revision::new(0)).await.unwrap();
        assert!(editor.try_into_inner().is_ok());
    }
}
