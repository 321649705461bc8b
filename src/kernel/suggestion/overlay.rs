//! Ghost-text overlay and its acceptance state machine.
//!
//! `Idle -> Pending -> Shown -> (accepted | rejected | expired) -> Idle`.
//! A shown suggestion is bound to one anchor; the caret may drift at most
//! `tolerance` columns to the right of it on the same line.

use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use super::controller::{SuggestionState, SuggestionTicket};
use crate::kernel::services::ports::{
    ContentChange, EditorSurface, GhostOverlay, Position, SuggestionSettings, TextEdit,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OverlayPhase {
    Idle,
    Pending {
        ticket: SuggestionTicket,
    },
    Shown {
        suggestion: SuggestionState,
        overlay: GhostOverlay,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    CursorLeft,
    ManualEdit,
    Command,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Pending,
    Shown,
    /// A response arrived but was not worth showing.
    Discarded,
    Accepted { text: String },
    Rejected(RejectReason),
    Expired,
}

pub struct SuggestionOverlay {
    phase: OverlayPhase,
    tolerance: u32,
    cooldown: Duration,
    locked_until: Option<Instant>,
}

impl SuggestionOverlay {
    pub fn new(settings: &SuggestionSettings) -> Self {
        Self {
            phase: OverlayPhase::Idle,
            tolerance: settings.acceptance_tolerance,
            cooldown: settings.accept_cooldown(),
            locked_until: None,
        }
    }

    pub fn phase(&self) -> &OverlayPhase {
        &self.phase
    }

    pub fn is_shown(&self) -> bool {
        matches!(self.phase, OverlayPhase::Shown { .. })
    }

    pub fn suggestion(&self) -> Option<&SuggestionState> {
        match &self.phase {
            OverlayPhase::Shown { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }

    /// Whether a recent acceptance still swallows triggers and accepts.
    pub fn is_locked(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    pub fn in_window(&self, anchor: Position, cursor: Position) -> bool {
        cursor.line == anchor.line
            && cursor.column >= anchor.column
            && cursor.column <= anchor.column.saturating_add(self.tolerance)
    }

    /// Replaces whatever is showing with a fresh pending request.
    pub fn begin(
        &mut self,
        ticket: SuggestionTicket,
        editor: &mut dyn EditorSurface,
    ) -> Transition {
        if self.is_shown() {
            render(editor, None);
        }
        self.phase = OverlayPhase::Pending { ticket };
        Transition::Pending
    }

    /// Shows a response when it still belongs to the pending request and the
    /// caret has stayed inside the acceptance window.
    pub fn present(
        &mut self,
        ticket: SuggestionTicket,
        suggestion: Option<SuggestionState>,
        editor: &mut dyn EditorSurface,
    ) -> Transition {
        match &self.phase {
            OverlayPhase::Pending { ticket: pending } if *pending == ticket => {}
            _ => return Transition::Unchanged,
        }

        let Some(suggestion) = suggestion else {
            self.phase = OverlayPhase::Idle;
            return Transition::Discarded;
        };

        let cursor = editor.cursor();
        if !self.in_window(suggestion.anchor, cursor) {
            tracing::debug!(
                anchor = ?suggestion.anchor,
                cursor = ?cursor,
                "caret left the window, suggestion discarded"
            );
            self.phase = OverlayPhase::Idle;
            return Transition::Discarded;
        }

        let overlay = GhostOverlay::from_text(suggestion.anchor, &sanitize(&suggestion.text));
        render(editor, Some(&overlay));
        self.phase = OverlayPhase::Shown {
            suggestion,
            overlay,
        };
        Transition::Shown
    }

    pub fn on_cursor_changed(
        &mut self,
        position: Position,
        editor: &mut dyn EditorSurface,
    ) -> Transition {
        let left = self
            .suggestion()
            .is_some_and(|suggestion| !self.in_window(suggestion.anchor, position));
        if left {
            self.reject_with(RejectReason::CursorLeft, editor)
        } else {
            Transition::Unchanged
        }
    }

    /// An edit equal to the suggestion is its own insertion; anything else
    /// while shown is a manual edit.
    pub fn on_content_changed(
        &mut self,
        change: &ContentChange,
        now: Instant,
        editor: &mut dyn EditorSurface,
    ) -> Transition {
        let Some(suggestion) = self.suggestion() else {
            return Transition::Unchanged;
        };
        if change.text == suggestion.text || change.text == sanitize(&suggestion.text) {
            let text = change.text.clone();
            self.locked_until = Some(now + self.cooldown);
            render(editor, None);
            self.phase = OverlayPhase::Idle;
            editor.suggestion_accepted(&text);
            return Transition::Accepted { text };
        }
        self.reject_with(RejectReason::ManualEdit, editor)
    }

    /// Inserts the shown suggestion at its anchor. Guarded by a cooldown so a
    /// repeated accept cannot insert twice.
    pub fn accept(&mut self, now: Instant, editor: &mut dyn EditorSurface) -> Transition {
        if self.is_locked(now) {
            tracing::debug!("accept ignored during cooldown");
            return Transition::Unchanged;
        }
        let Some(suggestion) = self.suggestion() else {
            return Transition::Unchanged;
        };
        let anchor = suggestion.anchor;
        let text = sanitize(&suggestion.text);
        if !self.in_window(anchor, editor.cursor()) {
            return self.reject_with(RejectReason::CursorLeft, editor);
        }

        self.locked_until = Some(now + self.cooldown);
        editor.execute_edit(&TextEdit {
            start: anchor,
            end: anchor,
            text: text.clone(),
        });
        render(editor, None);
        editor.set_cursor(anchor.after_insert(&text));
        self.phase = OverlayPhase::Idle;
        editor.suggestion_accepted(&text);
        Transition::Accepted { text }
    }

    /// Drops the suggestion on request. A pending request is forgotten.
    pub fn reject(&mut self, editor: &mut dyn EditorSurface) -> Transition {
        match self.phase {
            OverlayPhase::Shown { .. } => self.reject_with(RejectReason::Command, editor),
            OverlayPhase::Pending { .. } => {
                self.phase = OverlayPhase::Idle;
                Transition::Discarded
            }
            OverlayPhase::Idle => Transition::Unchanged,
        }
    }

    /// Silently clears everything, e.g. on disable or when the file changes.
    pub fn expire(&mut self, editor: &mut dyn EditorSurface) -> Transition {
        match std::mem::replace(&mut self.phase, OverlayPhase::Idle) {
            OverlayPhase::Idle => Transition::Unchanged,
            OverlayPhase::Pending { .. } => Transition::Expired,
            OverlayPhase::Shown { .. } => {
                render(editor, None);
                Transition::Expired
            }
        }
    }

    fn reject_with(
        &mut self,
        reason: RejectReason,
        editor: &mut dyn EditorSurface,
    ) -> Transition {
        render(editor, None);
        self.phase = OverlayPhase::Idle;
        editor.suggestion_rejected();
        tracing::debug!(?reason, "suggestion rejected");
        Transition::Rejected(reason)
    }
}

/// Swaps decorations in one step and puts the caret back if that moved it.
fn render(editor: &mut dyn EditorSurface, overlay: Option<&GhostOverlay>) {
    let caret = editor.cursor();
    editor.replace_decorations(overlay);
    if editor.cursor() != caret {
        editor.set_cursor(caret);
    }
}

/// Drops carriage returns and leading `12:` line-number prefixes.
pub fn sanitize(text: &str) -> String {
    static LINE_NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    let text = text.replace('\r', "");
    match LINE_NUMBER.get_or_init(|| Regex::new(r"(?m)^\d+:[ \t]*").ok()) {
        Some(re) => re.replace_all(&text, "").into_owned(),
        None => text,
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/suggestion/overlay.rs"]
mod tests;
