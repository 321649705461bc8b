//! Inline AI suggestions: the request controller plus the overlay that shows
//! and applies its results. [`InlineSuggestions`] routes editor events into
//! both and is what a front end drives.

mod controller;
mod overlay;

use std::time::Instant;

pub use controller::{
    PendingFetch, SuggestionController, SuggestionState, SuggestionTicket, TriggerSource,
};
pub use overlay::{sanitize, OverlayPhase, RejectReason, SuggestionOverlay, Transition};

use crate::kernel::services::ports::{
    ContentChange, CursorChange, CursorChangeReason, EditorSurface, SuggestionError,
    SuggestionSettings,
};

pub struct InlineSuggestions {
    controller: SuggestionController,
    overlay: SuggestionOverlay,
}

impl InlineSuggestions {
    pub fn new(settings: SuggestionSettings) -> Self {
        let overlay = SuggestionOverlay::new(&settings);
        Self {
            controller: SuggestionController::new(settings),
            overlay,
        }
    }

    pub fn controller(&self) -> &SuggestionController {
        &self.controller
    }

    pub fn overlay(&self) -> &SuggestionOverlay {
        &self.overlay
    }

    pub fn phase(&self) -> &OverlayPhase {
        self.overlay.phase()
    }

    pub fn is_enabled(&self) -> bool {
        self.controller.is_enabled()
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_loading()
    }

    pub fn on_cursor_changed(
        &mut self,
        change: CursorChange,
        now: Instant,
        editor: &mut dyn EditorSurface,
    ) -> Transition {
        let transition = self.overlay.on_cursor_changed(change.position, editor);
        if change.reason == CursorChangeReason::Explicit {
            self.controller.schedule(TriggerSource::CursorIdle, now);
        }
        transition
    }

    pub fn on_content_changed(
        &mut self,
        change: &ContentChange,
        now: Instant,
        editor: &mut dyn EditorSurface,
    ) -> Transition {
        let transition = self.overlay.on_content_changed(change, now, editor);
        if !matches!(transition, Transition::Accepted { .. }) {
            self.controller.schedule_for_insert(&change.text, now);
        }
        transition
    }

    /// Fires the debounce timer when due. The returned fetch must be sent
    /// and its outcome handed to [`Self::on_fetch_result`].
    pub fn tick(
        &mut self,
        now: Instant,
        editor: &mut dyn EditorSurface,
    ) -> Option<PendingFetch> {
        if self.overlay.is_shown() || self.overlay.is_locked(now) {
            self.controller.cancel_scheduled();
            return None;
        }
        let source = self.controller.poll(now)?;
        self.start(source, editor)
    }

    /// Explicit shortcut: fetch right away, replacing anything on screen.
    pub fn trigger(
        &mut self,
        now: Instant,
        editor: &mut dyn EditorSurface,
    ) -> Option<PendingFetch> {
        if self.overlay.is_locked(now) {
            return None;
        }
        self.start(TriggerSource::Shortcut, editor)
    }

    fn start(
        &mut self,
        source: TriggerSource,
        editor: &mut dyn EditorSurface,
    ) -> Option<PendingFetch> {
        let kind = self.controller.settings().suggestion_type.clone();
        let fetch = self.controller.begin_fetch(source, &kind, editor)?;
        self.overlay.begin(fetch.ticket, editor);
        Some(fetch)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.controller.next_deadline()
    }

    pub fn on_fetch_result(
        &mut self,
        ticket: SuggestionTicket,
        outcome: Result<Option<String>, SuggestionError>,
        editor: &mut dyn EditorSurface,
    ) -> Transition {
        let suggestion = self.controller.finish_fetch(ticket, outcome);
        self.overlay.present(ticket, suggestion, editor)
    }

    pub fn accept(&mut self, now: Instant, editor: &mut dyn EditorSurface) -> Transition {
        self.overlay.accept(now, editor)
    }

    pub fn reject(&mut self, editor: &mut dyn EditorSurface) -> Transition {
        self.overlay.reject(editor)
    }

    /// Takes effect immediately, including for a response already on its way.
    pub fn set_enabled(&mut self, enabled: bool, editor: &mut dyn EditorSurface) {
        self.controller.set_enabled(enabled);
        self.overlay.expire(editor);
    }

    pub fn toggle(&mut self, editor: &mut dyn EditorSurface) -> bool {
        let enabled = self.controller.toggle();
        self.overlay.expire(editor);
        enabled
    }

    /// Clears the overlay without a reject callback, e.g. on a file switch.
    pub fn expire(&mut self, editor: &mut dyn EditorSurface) -> Transition {
        self.controller.cancel_scheduled();
        self.overlay.expire(editor)
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/suggestion/inline.rs"]
mod tests;
