//! In-memory runtime filesystem. Records every operation it receives.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::kernel::services::ports::{RuntimeBooter, RuntimeError, RuntimeFs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsOp {
    Mkdir { path: String, recursive: bool },
    WriteFile { path: String, content: String },
}

#[derive(Debug, Default)]
struct MemoryFsState {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, String>,
    ops: Vec<FsOp>,
    torn_down: bool,
}

#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<MemoryFsState>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, path: &str) -> Option<String> {
        self.state.lock().ok()?.files.get(path).cloned()
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.state
            .lock()
            .map(|state| state.dirs.contains(path))
            .unwrap_or(false)
    }

    pub fn ops(&self) -> Vec<FsOp> {
        self.state
            .lock()
            .map(|state| state.ops.clone())
            .unwrap_or_default()
    }

    pub fn is_torn_down(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.torn_down)
            .unwrap_or(true)
    }

    fn with_state<T>(
        &self,
        path: &str,
        f: impl FnOnce(&mut MemoryFsState) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RuntimeError::write(path, "filesystem poisoned"))?;
        if state.torn_down {
            return Err(RuntimeError::Unavailable);
        }
        f(&mut state)
    }
}

fn parent_dir(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(dir, _)| dir)
}

#[async_trait]
impl RuntimeFs for MemoryFs {
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<(), RuntimeError> {
        self.with_state(path, |state| {
            state.ops.push(FsOp::Mkdir {
                path: path.to_string(),
                recursive,
            });
            if !recursive {
                if let Some(parent) = parent_dir(path) {
                    if !state.dirs.contains(parent) {
                        return Err(RuntimeError::write(path, "ENOENT: no such directory"));
                    }
                }
                state.dirs.insert(path.to_string());
                return Ok(());
            }

            let mut prefix = String::new();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                if !prefix.is_empty() {
                    prefix.push('/');
                }
                prefix.push_str(segment);
                state.dirs.insert(prefix.clone());
            }
            Ok(())
        })
    }

    async fn write_file(
        &self,
        path: &str,
        content: &str,
        _encoding: &str,
    ) -> Result<(), RuntimeError> {
        self.with_state(path, |state| {
            state.ops.push(FsOp::WriteFile {
                path: path.to_string(),
                content: content.to_string(),
            });
            if let Some(parent) = parent_dir(path) {
                if !state.dirs.contains(parent) {
                    return Err(RuntimeError::write(path, "ENOENT: no such directory"));
                }
            }
            state.files.insert(path.to_string(), content.to_string());
            Ok(())
        })
    }

    async fn teardown(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.torn_down = true;
        }
    }
}

/// Boots a fresh [`MemoryFs`] each time and keeps the latest for inspection.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    boots: AtomicUsize,
    current: Mutex<Option<Arc<MemoryFs>>>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boot_count(&self) -> usize {
        self.boots.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Option<Arc<MemoryFs>> {
        self.current.lock().ok()?.clone()
    }
}

#[async_trait]
impl RuntimeBooter for MemoryRuntime {
    async fn boot(&self) -> Result<Arc<dyn RuntimeFs>, RuntimeError> {
        self.boots.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers pile up on the shared boot.
        tokio::task::yield_now().await;
        let fs = Arc::new(MemoryFs::new());
        if let Ok(mut current) = self.current.lock() {
            *current = Some(Arc::clone(&fs));
        }
        Ok(fs)
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/runtime/memory.rs"]
mod tests;
