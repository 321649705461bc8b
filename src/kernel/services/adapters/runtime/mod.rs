//! Runtime adapters: the sandboxed runtime session and its backends, plus the
//! async executor that runs IO and posts results back to the session.

mod local;
mod memory;
mod message;
mod runtime;
mod session;

pub use local::{LocalDirFs, LocalDirRuntime};
pub use memory::{FsOp, MemoryFs, MemoryRuntime};
pub use message::SessionMessage;
pub use runtime::{AsyncRuntime, SuggestionDispatcher};
pub use session::{RuntimeSession, RuntimeStatus};
