//! Template persistence in a single JSON file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::kernel::services::ports::{PersistenceError, TemplateStore};
use crate::models::TemplateItem;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<TemplateItem, PersistenceError> {
        let data = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[async_trait]
impl TemplateStore for JsonFileStore {
    async fn save_template(
        &self,
        template: &TemplateItem,
    ) -> Result<Option<TemplateItem>, PersistenceError> {
        let data = serde_json::to_string_pretty(template)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // Replace in one step so a reader never sees a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), "template saved");
        Ok(None)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/template_store.rs"]
mod tests;
