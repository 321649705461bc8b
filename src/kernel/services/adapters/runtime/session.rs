//! Runtime session: owns the single sandboxed runtime of a process.
//!
//! Boot is single-flight: whoever arrives while a boot is running awaits the
//! same shared outcome. A failed boot leaves the session idle so a later call
//! may retry; `teardown` clears everything so the next boot starts fresh.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::kernel::services::ports::{RuntimeBooter, RuntimeError, RuntimeFs, UTF8};
use crate::models::FileTree;

type BootOutcome = Result<Arc<dyn RuntimeFs>, RuntimeError>;
type SharedBoot = Shared<BoxFuture<'static, BootOutcome>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RuntimeStatus {
    Idle,
    Booting,
    Ready,
}

enum BootSlot {
    Idle,
    Booting { epoch: u64, boot: SharedBoot },
    Ready { epoch: u64, fs: Arc<dyn RuntimeFs> },
}

struct BootState {
    slot: BootSlot,
    epoch: u64,
    /// Epoch of a boot abandoned by `teardown` whose instance still has to be released.
    abandoned: Option<u64>,
}

pub struct RuntimeSession {
    booter: Arc<dyn RuntimeBooter>,
    state: Mutex<BootState>,
    write_gate: Mutex<()>,
}

impl RuntimeSession {
    pub fn new(booter: Arc<dyn RuntimeBooter>) -> Self {
        Self {
            booter,
            state: Mutex::new(BootState {
                slot: BootSlot::Idle,
                epoch: 0,
                abandoned: None,
            }),
            write_gate: Mutex::new(()),
        }
    }

    pub async fn status(&self) -> RuntimeStatus {
        match self.state.lock().await.slot {
            BootSlot::Idle => RuntimeStatus::Idle,
            BootSlot::Booting { .. } => RuntimeStatus::Booting,
            BootSlot::Ready { .. } => RuntimeStatus::Ready,
        }
    }

    pub async fn boot(&self) -> BootOutcome {
        let (epoch, boot) = {
            let mut state = self.state.lock().await;
            match &state.slot {
                BootSlot::Ready { fs, .. } => return Ok(Arc::clone(fs)),
                BootSlot::Booting { epoch, boot } => (*epoch, boot.clone()),
                BootSlot::Idle => {
                    state.epoch += 1;
                    let epoch = state.epoch;
                    let booter = Arc::clone(&self.booter);
                    let boot = async move { booter.boot().await }.boxed().shared();
                    state.slot = BootSlot::Booting {
                        epoch,
                        boot: boot.clone(),
                    };
                    tracing::info!(epoch, "booting runtime");
                    (epoch, boot)
                }
            }
        };

        let outcome = boot.await;
        self.settle(epoch, &outcome).await
    }

    async fn settle(&self, epoch: u64, outcome: &BootOutcome) -> BootOutcome {
        let mut state = self.state.lock().await;
        let current = matches!(&state.slot, BootSlot::Booting { epoch: e, .. } if *e == epoch);
        if !current {
            let Ok(fs) = outcome else {
                return outcome.clone();
            };
            if let BootSlot::Ready { epoch: ready, fs } = &state.slot {
                if *ready == epoch {
                    return Ok(Arc::clone(fs));
                }
            }
            if state.abandoned == Some(epoch) {
                state.abandoned = None;
                tracing::debug!(epoch, "releasing runtime booted after teardown");
                fs.teardown().await;
            }
            return Err(RuntimeError::Unavailable);
        }

        match outcome {
            Ok(fs) => {
                tracing::info!(epoch, "runtime ready");
                state.slot = BootSlot::Ready {
                    epoch,
                    fs: Arc::clone(fs),
                };
            }
            Err(e) => {
                tracing::warn!(epoch, error = %e, "runtime boot failed");
                state.slot = BootSlot::Idle;
            }
        }
        outcome.clone()
    }

    /// The running instance, awaiting an in-flight boot. `None` when idle.
    pub async fn running(&self) -> Option<BootOutcome> {
        let (epoch, boot) = {
            let state = self.state.lock().await;
            match &state.slot {
                BootSlot::Idle => return None,
                BootSlot::Ready { fs, .. } => return Some(Ok(Arc::clone(fs))),
                BootSlot::Booting { epoch, boot } => (*epoch, boot.clone()),
            }
        };
        let outcome = boot.await;
        Some(self.settle(epoch, &outcome).await)
    }

    pub async fn teardown(&self) {
        let previous = {
            let mut state = self.state.lock().await;
            let previous = std::mem::replace(&mut state.slot, BootSlot::Idle);
            if let BootSlot::Booting { epoch, .. } = &previous {
                state.abandoned = Some(*epoch);
            }
            // Any boot still in flight now belongs to a dead epoch.
            state.epoch += 1;
            previous
        };
        if let BootSlot::Ready { fs, .. } = previous {
            tracing::info!("tearing down runtime");
            fs.teardown().await;
        }
    }

    /// Creates every missing parent of `path`, then overwrites the file.
    ///
    /// Writes go through one gate, so a directory creation and its write are
    /// never interleaved with another write.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<(), RuntimeError> {
        let fs = match self.running().await {
            Some(fs) => fs?,
            None => return Err(RuntimeError::Unavailable),
        };

        let _gate = self.write_gate.lock().await;
        let result = async {
            if let Some((dir, _)) = path.rsplit_once('/') {
                if !dir.is_empty() {
                    fs.mkdir(dir, true).await?;
                }
            }
            fs.write_file(path, content, UTF8).await
        }
        .await;

        if let Err(e) = &result {
            tracing::warn!(path, error = %e, "runtime write failed");
        }
        result
    }

    pub async fn create_dir(&self, path: &str) -> Result<(), RuntimeError> {
        let fs = match self.running().await {
            Some(fs) => fs?,
            None => return Err(RuntimeError::Unavailable),
        };
        let _gate = self.write_gate.lock().await;
        fs.mkdir(path, true).await
    }

    /// Writes every file of `tree` in traversal order. Returns the file count.
    pub async fn mount_tree(&self, tree: &FileTree) -> Result<usize, RuntimeError> {
        let mut written = 0;
        for id in tree.files() {
            let (Some(path), Some(file)) = (tree.path_of(id), tree.file(id)) else {
                continue;
            };
            self.write_file(&path, &file.content).await?;
            written += 1;
        }
        tracing::info!(files = written, "mounted project into runtime");
        Ok(written)
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/runtime/session.rs"]
mod tests;
