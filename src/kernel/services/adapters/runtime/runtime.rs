use super::message::SessionMessage;
use crate::kernel::services::ports::{SuggestionError, SuggestionProvider};
use crate::kernel::suggestion::PendingFetch;
use futures::FutureExt;
use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::mpsc::Sender;
use std::sync::Arc;

pub struct AsyncRuntime {
    runtime: tokio::runtime::Runtime,
    tx: Sender<SessionMessage>,
}

impl AsyncRuntime {
    pub fn new(tx: Sender<SessionMessage>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .or_else(|e| {
                tracing::error!(
                    error = %e,
                    "Failed to create multi-thread tokio runtime, falling back to current-thread"
                );
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
            })?;
        Ok(Self { runtime, tx })
    }

    pub fn tokio_handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn suggestion_dispatcher(
        &self,
        provider: Arc<dyn SuggestionProvider>,
    ) -> SuggestionDispatcher {
        SuggestionDispatcher {
            handle: self.tokio_handle(),
            provider,
            tx: self.tx.clone(),
        }
    }
}

/// Runs suggestion fetches off the event loop and posts outcomes back as
/// [`SessionMessage::SuggestionReady`]. Nothing is cancelled in flight; the
/// receiver decides whether a result is still wanted.
#[derive(Clone)]
pub struct SuggestionDispatcher {
    handle: tokio::runtime::Handle,
    provider: Arc<dyn SuggestionProvider>,
    tx: Sender<SessionMessage>,
}

impl SuggestionDispatcher {
    pub fn dispatch(&self, fetch: PendingFetch) {
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let PendingFetch { ticket, request, .. } = fetch;
            let outcome = AssertUnwindSafe(provider.suggest(&request))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(SuggestionError::Network(
                        "suggestion provider panicked".to_string(),
                    ))
                });
            if let Err(e) = &outcome {
                tracing::warn!(file = %request.file_name, error = %e, "suggestion fetch failed");
            }
            let _ = tx.send(SessionMessage::SuggestionReady { ticket, outcome });
        });
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/runtime/runtime.rs"]
mod tests;
