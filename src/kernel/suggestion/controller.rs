//! Debounced completion requests.
//!
//! At most one request is authoritative at a time. Every fetch takes a new
//! generation; a response is only used when its ticket still matches the
//! request in flight and suggestions are still enabled when it lands.

use std::time::{Duration, Instant};

use crate::kernel::services::ports::{
    EditorSurface, Position, SuggestionError, SuggestionRequest, SuggestionSettings,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TriggerSource {
    Shortcut,
    CursorIdle,
    TriggerCharacter(char),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SuggestionTicket {
    generation: u64,
}

impl SuggestionTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// A request ready to be sent. `anchor` is the one-based cursor at send time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingFetch {
    pub ticket: SuggestionTicket,
    pub source: TriggerSource,
    pub request: SuggestionRequest,
    pub anchor: Position,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionState {
    pub text: String,
    pub anchor: Position,
}

pub struct SuggestionController {
    settings: SuggestionSettings,
    enabled: bool,
    generation: u64,
    in_flight: Option<(SuggestionTicket, Position)>,
    debounce: Option<(Instant, TriggerSource)>,
}

impl SuggestionController {
    pub fn new(settings: SuggestionSettings) -> Self {
        Self {
            enabled: settings.enabled,
            settings,
            generation: 0,
            in_flight: None,
            debounce: None,
        }
    }

    pub fn settings(&self) -> &SuggestionSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Invalidates anything in flight or scheduled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.generation += 1;
        self.in_flight = None;
        self.debounce = None;
        tracing::debug!(enabled, generation = self.generation, "suggestions toggled");
    }

    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    /// Replaces any pending timer with one for `source`.
    pub fn schedule(&mut self, source: TriggerSource, now: Instant) {
        if !self.enabled {
            return;
        }
        let delay = match source {
            TriggerSource::Shortcut => Duration::ZERO,
            TriggerSource::CursorIdle => self.settings.idle_delay(),
            TriggerSource::TriggerCharacter(_) => self.settings.trigger_delay(),
        };
        self.debounce = Some((now + delay, source));
    }

    /// Schedules for an edit that inserted `text`.
    pub fn schedule_for_insert(&mut self, text: &str, now: Instant) {
        let source = match text.chars().last() {
            Some(ch) if self.settings.is_trigger_character(ch) => {
                TriggerSource::TriggerCharacter(ch)
            }
            _ => TriggerSource::CursorIdle,
        };
        self.schedule(source, now);
    }

    pub fn cancel_scheduled(&mut self) {
        self.debounce = None;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounce.map(|(deadline, _)| deadline)
    }

    /// Takes the scheduled trigger once its quiet period is over.
    pub fn poll(&mut self, now: Instant) -> Option<TriggerSource> {
        match self.debounce {
            Some((deadline, source)) if deadline <= now => {
                self.debounce = None;
                Some(source)
            }
            _ => None,
        }
    }

    /// Captures the editor state into a request and marks it in flight.
    /// Returns `None` when suggestions are disabled.
    pub fn begin_fetch(
        &mut self,
        source: TriggerSource,
        kind: &str,
        editor: &dyn EditorSurface,
    ) -> Option<PendingFetch> {
        if !self.enabled {
            tracing::debug!("suggestions disabled, fetch skipped");
            return None;
        }

        self.generation += 1;
        let ticket = SuggestionTicket {
            generation: self.generation,
        };
        let anchor = editor.cursor();
        self.in_flight = Some((ticket, anchor));
        self.debounce = None;

        let request = SuggestionRequest {
            file_content: editor.text(),
            cursor_line: anchor.line.saturating_sub(1),
            cursor_column: anchor.column.saturating_sub(1),
            suggestion_type: kind.to_string(),
            file_name: editor.file_name(),
        };
        tracing::debug!(generation = ticket.generation, ?source, "suggestion fetch started");
        Some(PendingFetch {
            ticket,
            source,
            request,
            anchor,
        })
    }

    /// Settles a fetch. Stale tickets and anything arriving while disabled
    /// are dropped; failures and empty answers clear to no suggestion.
    pub fn finish_fetch(
        &mut self,
        ticket: SuggestionTicket,
        outcome: Result<Option<String>, SuggestionError>,
    ) -> Option<SuggestionState> {
        let anchor = match self.in_flight {
            Some((current, anchor)) if current == ticket => anchor,
            _ => {
                tracing::debug!(generation = ticket.generation, "stale suggestion dropped");
                return None;
            }
        };
        self.in_flight = None;

        if !self.enabled {
            return None;
        }

        match outcome {
            Ok(Some(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    tracing::debug!("empty suggestion");
                    return None;
                }
                Some(SuggestionState {
                    text: text.to_string(),
                    anchor,
                })
            }
            Ok(None) => {
                tracing::debug!("no suggestion received");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "suggestion request failed");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/suggestion/controller.rs"]
mod tests;
