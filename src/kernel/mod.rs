//! Headless session core (explorer/suggestions/runtime services).

pub mod buffer;
pub mod explorer;
pub mod playground;
pub mod services;
pub mod suggestion;

pub use buffer::BufferEditor;
pub use explorer::{
    CommitHooks, ExplorerError, ExplorerSummary, FileExplorer, Mirrored, OpenFile, SaveOutcome,
    SaveReport,
};
pub use playground::{Playground, SessionSummary};
pub use suggestion::{InlineSuggestions, PendingFetch, SuggestionTicket, Transition};
