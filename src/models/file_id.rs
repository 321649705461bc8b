//! Stable ids for open files.
//!
//! Precedence, first hit wins:
//! 1. the node's own path when it is still attached to the tree;
//! 2. the path of the single `(filename, extension, content)` match;
//! 3. when several files match by value, a hash cannot tell them apart, so a
//!    synthetic id (session counter + random suffix) is issued;
//! 4. otherwise `<path>-<content hash>`, where `<path>` is the first file with
//!    the same name (or the bare display name), unless that id was already
//!    handed out or is the path of an attached node, in which case step 3
//!    applies.

use rustc_hash::{FxHashSet, FxHasher};
use std::hash::Hasher;
use uuid::Uuid;

use super::file_tree::{FileNode, FileTree, FileTreeError, NodeId};

#[derive(Debug, Default)]
pub struct FileIdAllocator {
    counter: u64,
    fallback_issued: FxHashSet<String>,
}

impl FileIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate_id(
        &mut self,
        tree: &FileTree,
        node: Option<NodeId>,
        file: &FileNode,
    ) -> String {
        match tree.resolve_path(node, file) {
            Ok(path) => return path,
            Err(FileTreeError::IdentityConflict { candidates, .. }) => {
                tracing::debug!(
                    name = %file.display_name(),
                    candidates = candidates.len(),
                    "identical files, issuing synthetic id"
                );
                return self.synthetic(file);
            }
            Err(_) => {}
        }

        let base = tree
            .find_by_name(&file.filename, &file.extension)
            .first()
            .and_then(|&id| tree.path_of(id))
            .unwrap_or_else(|| file.display_name());
        let hashed = format!("{base}-{}", content_hash(&file.content));
        if tree.navigate(&hashed).is_none() && self.fallback_issued.insert(hashed.clone()) {
            hashed
        } else {
            self.synthetic(file)
        }
    }

    fn synthetic(&mut self, file: &FileNode) -> String {
        self.counter += 1;
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}-{}", file.display_name(), self.counter, &suffix[..8])
    }
}

pub fn content_hash(content: &str) -> String {
    let mut hasher = FxHasher::default();
    hasher.write(content.as_bytes());
    format!("{:08x}", hasher.finish() as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/models/file_id.rs"]
mod tests;
