use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of the completion request. Cursor coordinates are zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub file_content: String,
    pub cursor_line: u32,
    pub cursor_column: u32,
    pub suggestion_type: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SuggestionError {
    #[error("network error: {0}")]
    Network(String),
    #[error("suggestion endpoint responded with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed suggestion response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Option<String>, SuggestionError>;
}
