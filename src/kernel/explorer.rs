//! 文件浏览器：打开的文件、未保存状态与保存流程
//!
//! The explorer owns the project tree and the open-file list. Saves and
//! structural edits commit to the tree first, then fan out to the runtime
//! mirror and the persistence store through [`CommitHooks`].

use ropey::Rope;
use thiserror::Error;

use crate::kernel::services::adapters::RuntimeSession;
use crate::kernel::services::ports::{PersistenceError, RuntimeError, TemplateStore};
use crate::models::{FileIdAllocator, FileNode, FileTree, FileTreeError, NodeId, TemplateItem};

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error(transparent)]
    Tree(#[from] FileTreeError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("missing {0}")]
    Validation(&'static str),
    #[error("no open file with id `{0}`")]
    NotOpen(String),
}

impl ExplorerError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotOpen(_) | Self::Tree(FileTreeError::NotFound(_))
        )
    }
}

/// An open tab. `node` is `None` for a file that is not attached to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    pub id: String,
    pub node: Option<NodeId>,
    pub filename: String,
    pub extension: String,
    pub content: String,
    pub original_content: String,
    pub has_unsaved_changes: bool,
}

impl OpenFile {
    fn new(id: String, node: Option<NodeId>, file: &FileNode) -> Self {
        Self {
            id,
            node,
            filename: file.filename.clone(),
            extension: file.extension.clone(),
            content: file.content.clone(),
            original_content: file.content.clone(),
            has_unsaved_changes: false,
        }
    }

    pub fn display_name(&self) -> String {
        crate::models::display_name(&self.filename, &self.extension)
    }

    /// The file as the tree last saw it.
    fn committed(&self) -> FileNode {
        FileNode::new(&self.filename, &self.extension, &self.original_content)
    }

    fn set_content(&mut self, content: String) {
        self.has_unsaved_changes = content != self.original_content;
        self.content = content;
    }
}

/// Collaborators notified after a committed change.
#[derive(Clone, Copy)]
pub struct CommitHooks<'a> {
    pub runtime: &'a RuntimeSession,
    pub persistence: &'a dyn TemplateStore,
}

/// A committed change plus the runtime mirror failure, if any. Mirror
/// failures never undo the change.
#[derive(Debug)]
pub struct Mirrored<T> {
    pub value: T,
    pub mirror_error: Option<RuntimeError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub path: String,
    /// `false` when no runtime was running to receive the write.
    pub mirrored: bool,
}

#[derive(Debug, Default)]
pub struct SaveReport {
    pub saved: Vec<SaveOutcome>,
    pub failed: Vec<(String, ExplorerError)>,
}

impl SaveReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExplorerSummary {
    pub open_files: usize,
    pub has_unsaved_changes: bool,
}

pub struct FileExplorer {
    tree: FileTree,
    open_files: Vec<OpenFile>,
    active_file_id: Option<String>,
    ids: FileIdAllocator,
}

impl FileExplorer {
    pub fn new(tree: FileTree) -> Self {
        Self {
            tree,
            open_files: Vec::new(),
            active_file_id: None,
            ids: FileIdAllocator::new(),
        }
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    /// Swaps the whole project. Every open handle is dropped.
    pub fn set_tree(&mut self, tree: FileTree) {
        self.close_all_files();
        self.tree = tree;
    }

    pub fn open_files(&self) -> &[OpenFile] {
        &self.open_files
    }

    pub fn active_file_id(&self) -> Option<&str> {
        self.active_file_id.as_deref()
    }

    pub fn active_file(&self) -> Option<&OpenFile> {
        self.get(self.active_file_id.as_deref()?)
    }

    pub fn get(&self, id: &str) -> Option<&OpenFile> {
        self.open_files.iter().find(|f| f.id == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.open_files.iter().position(|f| f.id == id)
    }

    pub fn summary(&self) -> ExplorerSummary {
        ExplorerSummary {
            open_files: self.open_files.len(),
            has_unsaved_changes: self.open_files.iter().any(|f| f.has_unsaved_changes),
        }
    }

    pub fn id_for(&mut self, node: NodeId) -> Result<String, ExplorerError> {
        let file = self
            .tree
            .file(node)
            .ok_or_else(|| FileTreeError::NotFound(format!("{node:?}")))?;
        Ok(self.ids.generate_id(&self.tree, Some(node), file))
    }

    /// Opens a tree file, or activates its tab when already open.
    pub fn open_file(&mut self, node: NodeId) -> Result<String, ExplorerError> {
        if let Some(existing) = self.open_files.iter().find(|f| f.node == Some(node)) {
            let id = existing.id.clone();
            self.active_file_id = Some(id.clone());
            return Ok(id);
        }

        let id = self.id_for(node)?;
        if self.index_of(&id).is_none() {
            let file = self
                .tree
                .file(node)
                .ok_or_else(|| FileTreeError::NotFound(id.clone()))?;
            self.open_files.push(OpenFile::new(id.clone(), Some(node), file));
        }
        self.active_file_id = Some(id.clone());
        Ok(id)
    }

    pub fn open_path(&mut self, path: &str) -> Result<String, ExplorerError> {
        let node = self
            .tree
            .navigate(path)
            .filter(|&id| self.tree.file(id).is_some())
            .ok_or_else(|| FileTreeError::NotFound(path.to_string()))?;
        self.open_file(node)
    }

    /// Opens a file by value. A unique match in the tree opens that node;
    /// anything else gets a fallback id and stays detached until saved.
    pub fn open_file_value(&mut self, file: FileNode) -> Result<String, ExplorerError> {
        if let Some(existing) = self
            .open_files
            .iter()
            .find(|f| f.node.is_none() && f.committed() == file)
        {
            let id = existing.id.clone();
            self.active_file_id = Some(id.clone());
            return Ok(id);
        }
        let id = self.ids.generate_id(&self.tree, None, &file);
        if let Some(node) = self.tree.navigate(&id).filter(|&n| self.tree.file(n).is_some()) {
            return self.open_file(node);
        }
        if self.index_of(&id).is_none() {
            self.open_files.push(OpenFile::new(id.clone(), None, &file));
        }
        self.active_file_id = Some(id.clone());
        Ok(id)
    }

    /// Closes a tab, discarding unsaved edits. Activation moves to the next
    /// tab, or the previous one when the last tab closes.
    pub fn close_file(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.close_at(index);
                true
            }
            None => false,
        }
    }

    fn close_at(&mut self, index: usize) {
        let closed = self.open_files.remove(index);
        if self.active_file_id.as_deref() != Some(closed.id.as_str()) {
            return;
        }
        let neighbor = self
            .open_files
            .get(index)
            .or_else(|| index.checked_sub(1).and_then(|i| self.open_files.get(i)));
        self.active_file_id = neighbor.map(|f| f.id.clone());
    }

    pub fn close_all_files(&mut self) {
        self.open_files.clear();
        self.active_file_id = None;
    }

    pub fn set_active_file(&mut self, id: &str) -> Result<(), ExplorerError> {
        if self.index_of(id).is_none() {
            return Err(ExplorerError::NotOpen(id.to_string()));
        }
        self.active_file_id = Some(id.to_string());
        Ok(())
    }

    /// Edits the tab only; the tree keeps the committed content.
    pub fn update_content(&mut self, id: &str, content: String) -> Result<(), ExplorerError> {
        let file = self
            .open_files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ExplorerError::NotOpen(id.to_string()))?;
        file.set_content(content);
        Ok(())
    }

    /// Inserts `code` as new line(s) before zero-based `line` of the active
    /// file, or appends it when `line` is `None` or past the end.
    pub fn insert_code(&mut self, code: &str, line: Option<usize>) -> Result<(), ExplorerError> {
        let id = self
            .active_file_id
            .clone()
            .ok_or(ExplorerError::Validation("active file"))?;
        let file = self
            .open_files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ExplorerError::NotOpen(id.clone()))?;

        let mut rope = Rope::from_str(&file.content);
        let lines = rope.len_lines();
        match line.filter(|&l| l < lines) {
            Some(line) => {
                let at = rope.line_to_char(line);
                rope.insert(at, &format!("{code}\n"));
            }
            None => {
                let end = rope.len_chars();
                rope.insert(end, &format!("\n{code}"));
            }
        }
        file.set_content(rope.to_string());
        Ok(())
    }

    /// Commits one tab: runtime mirror, tree, then persistence.
    ///
    /// Nothing changes when the path cannot be resolved. A runtime write
    /// failure leaves the tab dirty and the tree untouched; a persistence
    /// failure rolls the tree back.
    pub async fn save(
        &mut self,
        id: &str,
        hooks: CommitHooks<'_>,
    ) -> Result<SaveOutcome, ExplorerError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| ExplorerError::NotOpen(id.to_string()))?;
        let handle = &self.open_files[index];
        let path = self.tree.resolve_path(handle.node, &handle.committed())?;
        let node = match handle.node.filter(|&n| self.tree.file(n).is_some()) {
            Some(node) => node,
            None => self
                .tree
                .navigate(&path)
                .ok_or_else(|| FileTreeError::NotFound(path.clone()))?,
        };
        let content = handle.content.clone();

        let mirrored = match hooks.runtime.write_file(&path, &content).await {
            Ok(()) => true,
            Err(RuntimeError::Unavailable) => {
                tracing::debug!(path = %path, "runtime not running, save not mirrored");
                false
            }
            Err(e) => return Err(e.into()),
        };

        let previous = self.tree.set_content(node, content.clone())?;
        if let Err(e) = self.persist(hooks).await {
            tracing::warn!(path = %path, error = %e, "persisting save failed, reverting tree");
            let _ = self.tree.set_content(node, previous);
            return Err(e);
        }

        if let Some(handle) = self.open_files.iter_mut().find(|f| f.id == id) {
            if handle.node.is_none() {
                handle.node = self.tree.navigate(&path);
            }
            handle.original_content = content;
            handle.has_unsaved_changes = handle.content != handle.original_content;
        }
        tracing::info!(path = %path, mirrored, "file saved");
        Ok(SaveOutcome { path, mirrored })
    }

    /// Saves every dirty tab one after another, in tab order. Failures are
    /// collected and do not stop the remaining saves.
    pub async fn save_all(&mut self, hooks: CommitHooks<'_>) -> SaveReport {
        let dirty: Vec<String> = self
            .open_files
            .iter()
            .filter(|f| f.has_unsaved_changes)
            .map(|f| f.id.clone())
            .collect();

        let mut report = SaveReport::default();
        for id in dirty {
            match self.save(&id, hooks).await {
                Ok(outcome) => report.saved.push(outcome),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "save failed");
                    report.failed.push((id, e));
                }
            }
        }
        report
    }

    pub async fn add_file(
        &mut self,
        parent_path: &str,
        file: FileNode,
        hooks: CommitHooks<'_>,
    ) -> Result<Mirrored<NodeId>, ExplorerError> {
        let node = self.tree.add_file(parent_path, file)?;
        let mirror_error = self.mirror_files(node, hooks).await;
        self.persist(hooks).await?;
        Ok(Mirrored {
            value: node,
            mirror_error,
        })
    }

    pub async fn add_folder(
        &mut self,
        parent_path: &str,
        name: &str,
        hooks: CommitHooks<'_>,
    ) -> Result<Mirrored<NodeId>, ExplorerError> {
        let node = self.tree.add_folder(parent_path, name)?;
        let mut mirror_error = None;
        if let Some(path) = self.tree.path_of(node) {
            mirror_error = mirror_result(hooks.runtime.create_dir(&path).await);
        }
        self.persist(hooks).await?;
        Ok(Mirrored {
            value: node,
            mirror_error,
        })
    }

    pub async fn delete_file(
        &mut self,
        parent_path: &str,
        node: NodeId,
        hooks: CommitHooks<'_>,
    ) -> Result<FileNode, ExplorerError> {
        let removed = self.tree.delete_file(parent_path, node)?;
        self.close_dangling();
        self.persist(hooks).await?;
        Ok(removed)
    }

    pub async fn delete_folder(
        &mut self,
        parent_path: &str,
        node: NodeId,
        hooks: CommitHooks<'_>,
    ) -> Result<(), ExplorerError> {
        self.tree.delete_folder(parent_path, node)?;
        self.close_dangling();
        self.persist(hooks).await?;
        Ok(())
    }

    pub async fn rename_file(
        &mut self,
        parent_path: &str,
        node: NodeId,
        new_filename: &str,
        new_extension: &str,
        hooks: CommitHooks<'_>,
    ) -> Result<Mirrored<()>, ExplorerError> {
        self.tree
            .rename_file(parent_path, node, new_filename, new_extension)?;
        self.rekey_under(node);
        let mirror_error = self.mirror_files(node, hooks).await;
        self.persist(hooks).await?;
        Ok(Mirrored {
            value: (),
            mirror_error,
        })
    }

    pub async fn rename_folder(
        &mut self,
        parent_path: &str,
        node: NodeId,
        new_name: &str,
        hooks: CommitHooks<'_>,
    ) -> Result<Mirrored<()>, ExplorerError> {
        self.tree.rename_folder(parent_path, node, new_name)?;
        self.rekey_under(node);
        let mirror_error = self.mirror_files(node, hooks).await;
        self.persist(hooks).await?;
        Ok(Mirrored {
            value: (),
            mirror_error,
        })
    }

    /// Writes `node` (a file) or every file below it (a folder) into the
    /// runtime. Returns the first failure.
    async fn mirror_files(&self, node: NodeId, hooks: CommitHooks<'_>) -> Option<RuntimeError> {
        let mut first_error = None;
        for id in self.tree.files() {
            if id != node && !self.tree.is_descendant_of(id, node) {
                continue;
            }
            let (Some(path), Some(file)) = (self.tree.path_of(id), self.tree.file(id)) else {
                continue;
            };
            let error = mirror_result(hooks.runtime.write_file(&path, &file.content).await);
            if first_error.is_none() {
                first_error = error;
            }
        }
        first_error
    }

    async fn persist(&mut self, hooks: CommitHooks<'_>) -> Result<(), ExplorerError> {
        let template = self.tree.to_template();
        if let Some(canonical) = hooks.persistence.save_template(&template).await? {
            self.adopt(&canonical);
        }
        Ok(())
    }

    /// Replaces the tree with a canonical copy and re-links open tabs by path.
    /// Tabs whose path no longer exists are closed like any other tab.
    pub fn adopt(&mut self, template: &TemplateItem) {
        let next = FileTree::from_template(template);
        let targets: Vec<Option<Option<NodeId>>> = self
            .open_files
            .iter()
            .map(|handle| match handle.node {
                None => Some(None),
                Some(old) => self
                    .tree
                    .path_of(old)
                    .and_then(|path| next.navigate(&path))
                    .filter(|&n| next.file(n).is_some())
                    .map(Some),
            })
            .collect();

        self.tree = next;
        // Back to front, so a closed tab's neighbor is always a surviving one.
        for (index, target) in targets.into_iter().enumerate().rev() {
            match target {
                Some(node) => self.open_files[index].node = node,
                None => {
                    tracing::debug!(
                        id = %self.open_files[index].id,
                        "tab dropped by canonical tree"
                    );
                    self.close_at(index);
                }
            }
        }
    }

    fn close_dangling(&mut self) {
        while let Some(index) = self.open_files.iter().position(|f| {
            f.node
                .is_some_and(|node| self.tree.file(node).is_none())
        }) {
            self.close_at(index);
        }
    }

    /// Re-derives ids of tabs at or below `node` after a rename.
    fn rekey_under(&mut self, node: NodeId) {
        for handle in &mut self.open_files {
            let Some(own) = handle.node else {
                continue;
            };
            if own != node && !self.tree.is_descendant_of(own, node) {
                continue;
            }
            let (Some(path), Some(file)) = (self.tree.path_of(own), self.tree.file(own)) else {
                continue;
            };
            handle.filename = file.filename.clone();
            handle.extension = file.extension.clone();
            if handle.id != path {
                if self.active_file_id.as_deref() == Some(handle.id.as_str()) {
                    self.active_file_id = Some(path.clone());
                }
                handle.id = path;
            }
        }
    }
}

/// `Unavailable` only means there is nothing to mirror into.
fn mirror_result(result: Result<(), RuntimeError>) -> Option<RuntimeError> {
    match result {
        Ok(()) | Err(RuntimeError::Unavailable) => None,
        Err(e) => Some(e),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/explorer.rs"]
mod tests;
