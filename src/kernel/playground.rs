//! 会话：文件浏览器、运行时与 AI 补全的组合
//!
//! One `Playground` per open project. It owns the explorer and the
//! suggestion pipeline and holds the runtime session and the persistence
//! store by reference-counted handle, so several front ends may share them.

use std::sync::Arc;

use crate::kernel::explorer::{
    CommitHooks, ExplorerError, FileExplorer, Mirrored, SaveOutcome, SaveReport,
};
use crate::kernel::services::adapters::{RuntimeSession, RuntimeStatus, SessionMessage};
use crate::kernel::services::ports::{EditorSurface, RuntimeError, Settings, TemplateStore};
use crate::kernel::suggestion::{InlineSuggestions, Transition};
use crate::models::{FileNode, FileTree, NodeId};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub open_files: usize,
    pub has_unsaved_changes: bool,
    pub runtime: RuntimeStatus,
    pub suggestions_enabled: bool,
}

pub struct Playground {
    explorer: FileExplorer,
    runtime: Arc<RuntimeSession>,
    store: Arc<dyn TemplateStore>,
    suggestions: InlineSuggestions,
}

impl Playground {
    pub fn new(
        tree: FileTree,
        runtime: Arc<RuntimeSession>,
        store: Arc<dyn TemplateStore>,
        settings: &Settings,
    ) -> Self {
        Self {
            explorer: FileExplorer::new(tree),
            runtime,
            store,
            suggestions: InlineSuggestions::new(settings.suggestions.clone()),
        }
    }

    pub fn explorer(&self) -> &FileExplorer {
        &self.explorer
    }

    pub fn runtime(&self) -> &Arc<RuntimeSession> {
        &self.runtime
    }

    pub fn suggestions(&self) -> &InlineSuggestions {
        &self.suggestions
    }

    pub fn suggestions_mut(&mut self) -> &mut InlineSuggestions {
        &mut self.suggestions
    }

    fn parts(&mut self) -> (&mut FileExplorer, CommitHooks<'_>) {
        (
            &mut self.explorer,
            CommitHooks {
                runtime: &self.runtime,
                persistence: self.store.as_ref(),
            },
        )
    }

    /// Boots the runtime (or joins a boot in progress) and writes the whole
    /// project into it.
    pub async fn boot_and_mount(&self) -> Result<usize, RuntimeError> {
        self.runtime.boot().await?;
        self.runtime.mount_tree(self.explorer.tree()).await
    }

    pub async fn teardown(&mut self) {
        self.explorer.close_all_files();
        self.runtime.teardown().await;
    }

    pub fn open_path(
        &mut self,
        path: &str,
        editor: &mut dyn EditorSurface,
    ) -> Result<String, ExplorerError> {
        let before = self.explorer.active_file_id().map(str::to_string);
        let id = self.explorer.open_path(path)?;
        if before.as_deref() != Some(id.as_str()) {
            self.suggestions.expire(editor);
        }
        Ok(id)
    }

    pub fn open_file(
        &mut self,
        node: NodeId,
        editor: &mut dyn EditorSurface,
    ) -> Result<String, ExplorerError> {
        let before = self.explorer.active_file_id().map(str::to_string);
        let id = self.explorer.open_file(node)?;
        if before.as_deref() != Some(id.as_str()) {
            self.suggestions.expire(editor);
        }
        Ok(id)
    }

    pub fn set_active_file(
        &mut self,
        id: &str,
        editor: &mut dyn EditorSurface,
    ) -> Result<(), ExplorerError> {
        if self.explorer.active_file_id() == Some(id) {
            return Ok(());
        }
        self.explorer.set_active_file(id)?;
        self.suggestions.expire(editor);
        Ok(())
    }

    pub fn close_file(&mut self, id: &str, editor: &mut dyn EditorSurface) -> bool {
        let was_active = self.explorer.active_file_id() == Some(id);
        let closed = self.explorer.close_file(id);
        if closed && was_active {
            self.suggestions.expire(editor);
        }
        closed
    }

    pub fn close_all_files(&mut self, editor: &mut dyn EditorSurface) {
        self.explorer.close_all_files();
        self.suggestions.expire(editor);
    }

    pub fn update_content(&mut self, id: &str, content: String) -> Result<(), ExplorerError> {
        self.explorer.update_content(id, content)
    }

    pub fn insert_code(&mut self, code: &str, line: Option<usize>) -> Result<(), ExplorerError> {
        self.explorer.insert_code(code, line)
    }

    /// Saves `id`, or the active file when `id` is `None`.
    pub async fn save(&mut self, id: Option<&str>) -> Result<SaveOutcome, ExplorerError> {
        let id = match id {
            Some(id) => id.to_string(),
            None => self
                .explorer
                .active_file_id()
                .map(str::to_string)
                .ok_or(ExplorerError::Validation("file id"))?,
        };
        let (explorer, hooks) = self.parts();
        explorer.save(&id, hooks).await
    }

    pub async fn save_all(&mut self) -> SaveReport {
        let (explorer, hooks) = self.parts();
        explorer.save_all(hooks).await
    }

    pub async fn add_file(
        &mut self,
        parent_path: &str,
        file: FileNode,
    ) -> Result<Mirrored<NodeId>, ExplorerError> {
        let (explorer, hooks) = self.parts();
        explorer.add_file(parent_path, file, hooks).await
    }

    pub async fn add_folder(
        &mut self,
        parent_path: &str,
        name: &str,
    ) -> Result<Mirrored<NodeId>, ExplorerError> {
        let (explorer, hooks) = self.parts();
        explorer.add_folder(parent_path, name, hooks).await
    }

    pub async fn delete_file(
        &mut self,
        parent_path: &str,
        node: NodeId,
    ) -> Result<FileNode, ExplorerError> {
        let (explorer, hooks) = self.parts();
        explorer.delete_file(parent_path, node, hooks).await
    }

    pub async fn delete_folder(
        &mut self,
        parent_path: &str,
        node: NodeId,
    ) -> Result<(), ExplorerError> {
        let (explorer, hooks) = self.parts();
        explorer.delete_folder(parent_path, node, hooks).await
    }

    pub async fn rename_file(
        &mut self,
        parent_path: &str,
        node: NodeId,
        new_filename: &str,
        new_extension: &str,
    ) -> Result<Mirrored<()>, ExplorerError> {
        let (explorer, hooks) = self.parts();
        explorer
            .rename_file(parent_path, node, new_filename, new_extension, hooks)
            .await
    }

    pub async fn rename_folder(
        &mut self,
        parent_path: &str,
        node: NodeId,
        new_name: &str,
    ) -> Result<Mirrored<()>, ExplorerError> {
        let (explorer, hooks) = self.parts();
        explorer
            .rename_folder(parent_path, node, new_name, hooks)
            .await
    }

    /// Feeds a message posted by the async runtime back into the session.
    pub fn handle_message(
        &mut self,
        message: SessionMessage,
        editor: &mut dyn EditorSurface,
    ) -> Transition {
        match message {
            SessionMessage::SuggestionReady { ticket, outcome } => {
                self.suggestions.on_fetch_result(ticket, outcome, editor)
            }
        }
    }

    pub async fn summary(&self) -> SessionSummary {
        let explorer = self.explorer.summary();
        SessionSummary {
            open_files: explorer.open_files,
            has_unsaved_changes: explorer.has_unsaved_changes,
            runtime: self.runtime.status().await,
            suggestions_enabled: self.suggestions.is_enabled(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/playground.rs"]
mod tests;
