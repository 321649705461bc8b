//! Directory-backed runtime: mirrors the project onto the local disk.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::kernel::services::ports::{RuntimeBooter, RuntimeError, RuntimeFs, UTF8};

pub struct LocalDirRuntime {
    root: PathBuf,
}

impl LocalDirRuntime {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl RuntimeBooter for LocalDirRuntime {
    async fn boot(&self) -> Result<Arc<dyn RuntimeFs>, RuntimeError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            RuntimeError::Boot(format!("cannot prepare {}: {e}", self.root.display()))
        })?;
        tracing::info!(root = %self.root.display(), "local runtime booted");
        Ok(Arc::new(LocalDirFs {
            root: self.root.clone(),
        }))
    }
}

pub struct LocalDirFs {
    root: PathBuf,
}

impl LocalDirFs {
    /// Maps a project path under the root. Absolute paths and `..` are refused.
    fn resolve(&self, path: &str) -> Result<PathBuf, RuntimeError> {
        let relative = Path::new(path);
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(RuntimeError::write(path, "path escapes the runtime root")),
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl RuntimeFs for LocalDirFs {
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<(), RuntimeError> {
        let dir = self.resolve(path)?;
        let result = if recursive {
            tokio::fs::create_dir_all(&dir).await
        } else {
            tokio::fs::create_dir(&dir).await
        };
        result.map_err(|e| RuntimeError::write(path, e))
    }

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        encoding: &str,
    ) -> Result<(), RuntimeError> {
        if !encoding.eq_ignore_ascii_case(UTF8) {
            return Err(RuntimeError::write(
                path,
                format!("unsupported encoding {encoding}"),
            ));
        }
        let file = self.resolve(path)?;
        tokio::fs::write(&file, content)
            .await
            .map_err(|e| RuntimeError::write(path, e))
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/runtime/local.rs"]
mod tests;
