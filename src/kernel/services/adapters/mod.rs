//! Service adapters: OS/runtime specific implementations (IO/async).

pub mod dirs;
pub mod runtime;
pub mod settings;
pub mod suggestion_http;
pub mod template_store;

pub use dirs::{ensure_log_dir, get_log_dir, get_project_dir};
pub use runtime::{
    AsyncRuntime, FsOp, LocalDirFs, LocalDirRuntime, MemoryFs, MemoryRuntime, RuntimeSession,
    RuntimeStatus, SessionMessage, SuggestionDispatcher,
};
pub use settings::{ensure_settings_file, get_settings_path, load_settings, load_settings_from};
pub use suggestion_http::HttpSuggestionProvider;
pub use template_store::JsonFileStore;
