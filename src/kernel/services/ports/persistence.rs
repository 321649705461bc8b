use async_trait::async_trait;
use thiserror::Error;

use crate::models::TemplateItem;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode template: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("template rejected: {0}")]
    Rejected(String),
}

/// Receives the whole tree after every committed change.
///
/// Calls must be idempotent. `Ok(Some(tree))` means the store holds a canonical
/// version the session should adopt; `Ok(None)` keeps the in-memory tree.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn save_template(
        &self,
        template: &TemplateItem,
    ) -> Result<Option<TemplateItem>, PersistenceError>;
}
