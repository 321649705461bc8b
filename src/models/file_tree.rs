//! 虚拟文件树：路径身份解析与结构编辑

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

new_key_type! { pub struct NodeId; }

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Folder,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileTreeError {
    #[error("missing {0}")]
    Validation(&'static str),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("`{name}` already exists in `{parent}`")]
    NameConflict { parent: String, name: String },
    #[error("`{name}` matches several files: {candidates:?}")]
    IdentityConflict {
        name: String,
        candidates: Vec<String>,
    },
    #[error("not a folder: {0}")]
    NotAFolder(String),
}

pub type Result<T> = std::result::Result<T, FileTreeError>;

/// A file leaf. Its identity is the path it sits at, not a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub filename: String,
    #[serde(rename = "fileExtension", default)]
    pub extension: String,
    #[serde(default)]
    pub content: String,
}

impl FileNode {
    pub fn new(
        filename: impl Into<String>,
        extension: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            extension: extension.into(),
            content: content.into(),
        }
    }

    pub fn display_name(&self) -> String {
        display_name(&self.filename, &self.extension)
    }

    pub fn same_name(&self, filename: &str, extension: &str) -> bool {
        self.filename == filename && self.extension == extension
    }
}

pub fn display_name(filename: &str, extension: &str) -> String {
    if extension.is_empty() {
        filename.to_string()
    } else {
        format!("{filename}.{extension}")
    }
}

/// Persisted shape of a project: `{ folderName, items }` with file leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateItem {
    Folder(TemplateFolder),
    File(FileNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFolder {
    pub folder_name: String,
    #[serde(default)]
    pub items: Vec<TemplateItem>,
}

#[derive(Debug, Clone)]
enum NodeData {
    File(FileNode),
    Folder { name: String, items: Vec<NodeId> },
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    data: NodeData,
}

#[derive(Debug, Clone)]
pub struct FileTree {
    arena: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl FileTree {
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node {
            parent: None,
            data: NodeData::Folder {
                name: root_name.into(),
                items: Vec::new(),
            },
        });
        Self { arena, root }
    }

    /// Degenerate project made of one bare file.
    pub fn single_file(file: FileNode) -> Self {
        let mut arena = SlotMap::with_key();
        let root = arena.insert(Node {
            parent: None,
            data: NodeData::File(file),
        });
        Self { arena, root }
    }

    pub fn from_template(template: &TemplateItem) -> Self {
        match template {
            TemplateItem::File(file) => Self::single_file(file.clone()),
            TemplateItem::Folder(folder) => {
                let mut tree = Self::new(folder.folder_name.clone());
                let root = tree.root;
                tree.attach_template_items(root, &folder.items);
                tree
            }
        }
    }

    fn attach_template_items(&mut self, parent: NodeId, items: &[TemplateItem]) {
        for item in items {
            match item {
                TemplateItem::File(file) => {
                    self.push_child(parent, NodeData::File(file.clone()));
                }
                TemplateItem::Folder(folder) => {
                    let id = self.push_child(
                        parent,
                        NodeData::Folder {
                            name: folder.folder_name.clone(),
                            items: Vec::new(),
                        },
                    );
                    self.attach_template_items(id, &folder.items);
                }
            }
        }
    }

    pub fn to_template(&self) -> TemplateItem {
        self.template_of(self.root)
    }

    fn template_of(&self, id: NodeId) -> TemplateItem {
        match &self.arena[id].data {
            NodeData::File(file) => TemplateItem::File(file.clone()),
            NodeData::Folder { name, items } => TemplateItem::Folder(TemplateFolder {
                folder_name: name.clone(),
                items: items.iter().map(|&child| self.template_of(child)).collect(),
            }),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.arena.get(id).map(|node| match node.data {
            NodeData::File(_) => NodeKind::File,
            NodeData::Folder { .. } => NodeKind::Folder,
        })
    }

    pub fn file(&self, id: NodeId) -> Option<&FileNode> {
        match &self.arena.get(id)?.data {
            NodeData::File(file) => Some(file),
            NodeData::Folder { .. } => None,
        }
    }

    pub fn folder_name(&self, id: NodeId) -> Option<&str> {
        match &self.arena.get(id)?.data {
            NodeData::Folder { name, .. } => Some(name),
            NodeData::File(_) => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.arena.get(id).map(|node| &node.data) {
            Some(NodeData::Folder { items, .. }) => items,
            _ => &[],
        }
    }

    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Files in depth-first, left-to-right order.
    pub fn files(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match &self.arena[id].data {
                NodeData::File(_) => out.push(id),
                NodeData::Folder { items, .. } => stack.extend(items.iter().rev().copied()),
            }
        }
        out
    }

    fn segment(&self, id: NodeId) -> String {
        match &self.arena[id].data {
            NodeData::File(file) => file.display_name(),
            NodeData::Folder { name, .. } => name.clone(),
        }
    }

    /// Slash-joined path below the root; the root folder itself is `""`.
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        self.arena.get(id)?;
        if id == self.root {
            return Some(match &self.arena[id].data {
                NodeData::File(file) => file.display_name(),
                NodeData::Folder { .. } => String::new(),
            });
        }

        let mut components = Vec::new();
        let mut current = id;
        while let Some(parent) = self.arena[current].parent {
            components.push(self.segment(current));
            current = parent;
        }
        components.reverse();
        Some(components.join("/"))
    }

    pub fn navigate(&self, path: &str) -> Option<NodeId> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Some(self.root);
        }
        if let NodeData::File(file) = &self.arena[self.root].data {
            return (file.display_name() == path).then_some(self.root);
        }

        let mut current = self.root;
        for segment in path.split('/') {
            current = self
                .children(current)
                .iter()
                .copied()
                .find(|&child| self.segment(child) == segment)?;
        }
        Some(current)
    }

    /// Two passes: the node itself if it is still attached, then a unique
    /// `(filename, extension, content)` match.
    pub fn resolve_path(&self, node: Option<NodeId>, probe: &FileNode) -> Result<String> {
        if let Some(id) = node {
            if self.file(id).is_some() {
                if let Some(path) = self.path_of(id) {
                    return Ok(path);
                }
            }
        }

        let matches = self.find_by_value(probe);
        match matches.as_slice() {
            [] => Err(FileTreeError::NotFound(probe.display_name())),
            [only] => self
                .path_of(*only)
                .ok_or_else(|| FileTreeError::NotFound(probe.display_name())),
            many => Err(FileTreeError::IdentityConflict {
                name: probe.display_name(),
                candidates: many.iter().filter_map(|&id| self.path_of(id)).collect(),
            }),
        }
    }

    pub fn find_by_value(&self, probe: &FileNode) -> Vec<NodeId> {
        self.files()
            .into_iter()
            .filter(|&id| self.file(id) == Some(probe))
            .collect()
    }

    pub fn find_by_name(&self, filename: &str, extension: &str) -> Vec<NodeId> {
        self.files()
            .into_iter()
            .filter(|&id| {
                self.file(id)
                    .is_some_and(|file| file.same_name(filename, extension))
            })
            .collect()
    }

    pub fn folder_at(&self, parent_path: &str) -> Result<NodeId> {
        let id = self
            .navigate(parent_path)
            .ok_or_else(|| FileTreeError::NotFound(parent_path.to_string()))?;
        match self.kind(id) {
            Some(NodeKind::Folder) => Ok(id),
            _ => Err(FileTreeError::NotAFolder(parent_path.to_string())),
        }
    }

    fn child_of(&self, parent_path: &str, node: NodeId, kind: NodeKind) -> Result<NodeId> {
        let parent = self.folder_at(parent_path)?;
        let attached = self.parent(node) == Some(parent) && self.kind(node) == Some(kind);
        if attached {
            Ok(parent)
        } else {
            let missing = self
                .path_of(node)
                .unwrap_or_else(|| join_path(parent_path, &format!("{node:?}")));
            Err(FileTreeError::NotFound(missing))
        }
    }

    fn push_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.arena.insert(Node {
            parent: Some(parent),
            data,
        });
        if let NodeData::Folder { items, .. } = &mut self.arena[parent].data {
            items.push(id);
        }
        id
    }

    fn file_name_taken(
        &self,
        parent: NodeId,
        filename: &str,
        extension: &str,
        skip: Option<NodeId>,
    ) -> bool {
        self.children(parent).iter().any(|&child| {
            Some(child) != skip
                && self
                    .file(child)
                    .is_some_and(|file| file.same_name(filename, extension))
        })
    }

    fn folder_name_taken(&self, parent: NodeId, name: &str, skip: Option<NodeId>) -> bool {
        self.children(parent)
            .iter()
            .any(|&child| Some(child) != skip && self.folder_name(child) == Some(name))
    }

    pub fn add_file(&mut self, parent_path: &str, file: FileNode) -> Result<NodeId> {
        if file.filename.is_empty() {
            return Err(FileTreeError::Validation("filename"));
        }
        let parent = self.folder_at(parent_path)?;
        if self.file_name_taken(parent, &file.filename, &file.extension, None) {
            return Err(FileTreeError::NameConflict {
                parent: parent_path.to_string(),
                name: file.display_name(),
            });
        }
        Ok(self.push_child(parent, NodeData::File(file)))
    }

    pub fn add_folder(&mut self, parent_path: &str, name: &str) -> Result<NodeId> {
        if name.is_empty() {
            return Err(FileTreeError::Validation("folder name"));
        }
        let parent = self.folder_at(parent_path)?;
        if self.folder_name_taken(parent, name, None) {
            return Err(FileTreeError::NameConflict {
                parent: parent_path.to_string(),
                name: name.to_string(),
            });
        }
        Ok(self.push_child(
            parent,
            NodeData::Folder {
                name: name.to_string(),
                items: Vec::new(),
            },
        ))
    }

    pub fn delete_file(&mut self, parent_path: &str, node: NodeId) -> Result<FileNode> {
        let parent = self.child_of(parent_path, node, NodeKind::File)?;
        let file = self.file(node).cloned().unwrap_or_default();
        self.detach(parent, node);
        Ok(file)
    }

    pub fn delete_folder(&mut self, parent_path: &str, node: NodeId) -> Result<()> {
        let parent = self.child_of(parent_path, node, NodeKind::Folder)?;
        self.detach(parent, node);
        Ok(())
    }

    pub fn rename_file(
        &mut self,
        parent_path: &str,
        node: NodeId,
        new_filename: &str,
        new_extension: &str,
    ) -> Result<()> {
        if new_filename.is_empty() {
            return Err(FileTreeError::Validation("filename"));
        }
        let parent = self.child_of(parent_path, node, NodeKind::File)?;
        if self.file_name_taken(parent, new_filename, new_extension, Some(node)) {
            return Err(FileTreeError::NameConflict {
                parent: parent_path.to_string(),
                name: display_name(new_filename, new_extension),
            });
        }
        if let NodeData::File(file) = &mut self.arena[node].data {
            file.filename = new_filename.to_string();
            file.extension = new_extension.to_string();
        }
        Ok(())
    }

    pub fn rename_folder(&mut self, parent_path: &str, node: NodeId, new_name: &str) -> Result<()> {
        if new_name.is_empty() {
            return Err(FileTreeError::Validation("folder name"));
        }
        let parent = self.child_of(parent_path, node, NodeKind::Folder)?;
        if self.folder_name_taken(parent, new_name, Some(node)) {
            return Err(FileTreeError::NameConflict {
                parent: parent_path.to_string(),
                name: new_name.to_string(),
            });
        }
        if let NodeData::Folder { name, .. } = &mut self.arena[node].data {
            *name = new_name.to_string();
        }
        Ok(())
    }

    /// Replaces a file's content and hands back the previous one.
    pub fn set_content(&mut self, node: NodeId, content: String) -> Result<String> {
        match self.arena.get_mut(node).map(|n| &mut n.data) {
            Some(NodeData::File(file)) => Ok(std::mem::replace(&mut file.content, content)),
            _ => Err(FileTreeError::NotFound(format!("{node:?}"))),
        }
    }

    fn detach(&mut self, parent: NodeId, node: NodeId) {
        if let NodeData::Folder { items, .. } = &mut self.arena[parent].data {
            items.retain(|&child| child != node);
        }
        self.recursive_remove(node);
    }

    fn recursive_remove(&mut self, id: NodeId) {
        if let Some(node) = self.arena.remove(id) {
            if let NodeData::Folder { items, .. } = node.data {
                for child in items {
                    self.recursive_remove(child);
                }
            }
        }
    }
}

pub fn join_path(parent: &str, name: &str) -> String {
    let parent = parent.trim_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/file_tree.rs"]
mod tests;
