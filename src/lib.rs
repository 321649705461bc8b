//! playground - 浏览器编程工作区的会话引擎
//!
//! 模块结构：
//! - models: 数据模型（FileTree, FileNode, 文件 ID）
//! - kernel: 会话核心（FileExplorer, InlineSuggestions, Playground）
//! - kernel::services: 端口与适配器（运行时、持久化、补全接口、设置）

pub mod kernel;
pub mod models;
