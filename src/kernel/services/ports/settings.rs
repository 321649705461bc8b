use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub suggestions: SuggestionSettings,
    #[serde(default)]
    pub runtime: RuntimeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub suggestion_type: String,
    pub idle_delay_ms: u64,
    pub trigger_delay_ms: u64,
    pub trigger_characters: Vec<char>,
    /// Columns the caret may drift right of the anchor and still count.
    pub acceptance_tolerance: u32,
    pub accept_cooldown_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "http://localhost:3000/api/code-suggestion".to_string(),
            suggestion_type: "completion".to_string(),
            idle_delay_ms: 500,
            trigger_delay_ms: 300,
            trigger_characters: vec!['\n', '{', '.', '=', '(', ',', ':', ';'],
            acceptance_tolerance: 2,
            accept_cooldown_ms: 1000,
            request_timeout_ms: 30_000,
        }
    }
}

impl SuggestionSettings {
    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    pub fn trigger_delay(&self) -> Duration {
        Duration::from_millis(self.trigger_delay_ms)
    }

    pub fn accept_cooldown(&self) -> Duration {
        Duration::from_millis(self.accept_cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn is_trigger_character(&self, ch: char) -> bool {
        self.trigger_characters.contains(&ch)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Directory backing the local runtime; `None` keeps everything in memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_dir: Option<PathBuf>,
}
