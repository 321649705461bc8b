//! 数据模型层

pub mod file_id;
pub mod file_tree;

pub use file_id::{content_hash, FileIdAllocator};
pub use file_tree::{
    display_name, join_path, FileNode, FileTree, FileTreeError, NodeId, NodeKind, TemplateFolder,
    TemplateItem,
};
