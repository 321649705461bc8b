//! Sandboxed runtime filesystem contracts.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub const UTF8: &str = "utf-8";

/// Cloneable so a single boot outcome can be handed to every waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("runtime boot failed: {0}")]
    Boot(String),
    #[error("failed to write `{path}`: {message}")]
    Write { path: String, message: String },
    #[error("runtime is not running")]
    Unavailable,
}

impl RuntimeError {
    pub fn write(path: &str, message: impl ToString) -> Self {
        Self::Write {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
pub trait RuntimeFs: Send + Sync {
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<(), RuntimeError>;

    async fn write_file(&self, path: &str, content: &str, encoding: &str)
        -> Result<(), RuntimeError>;

    async fn teardown(&self) {}
}

#[async_trait]
pub trait RuntimeBooter: Send + Sync {
    async fn boot(&self) -> Result<Arc<dyn RuntimeFs>, RuntimeError>;
}
