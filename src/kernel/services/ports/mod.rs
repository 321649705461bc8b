//! Service ports: traits + data contracts.

pub mod editor;
pub mod persistence;
pub mod runtime;
pub mod settings;
pub mod suggestion;

pub use editor::{
    ContentChange, CursorChange, CursorChangeReason, EditorSurface, GhostOverlay, GhostSpan,
    Position, TextEdit,
};
pub use persistence::{PersistenceError, TemplateStore};
pub use runtime::{RuntimeBooter, RuntimeError, RuntimeFs, UTF8};
pub use settings::{RuntimeSettings, Settings, SuggestionSettings};
pub use suggestion::{SuggestionError, SuggestionProvider, SuggestionRequest, SuggestionResponse};
