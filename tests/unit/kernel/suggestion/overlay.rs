use super::*;
use crate::kernel::services::ports::SuggestionSettings;
use crate::kernel::suggestion::{SuggestionController, TriggerSource};
use crate::kernel::BufferEditor;

const SOURCE: &str = "l1\nl2\nl3\nl4\nconst x =\n";

struct Harness {
    controller: SuggestionController,
    overlay: SuggestionOverlay,
    editor: BufferEditor,
}

impl Harness {
    fn new() -> Self {
        let settings = SuggestionSettings::default();
        Self {
            overlay: SuggestionOverlay::new(&settings),
            controller: SuggestionController::new(settings),
            editor: BufferEditor::new("main.js", SOURCE),
        }
    }

    fn request_at(&mut self, anchor: Position) -> SuggestionTicket {
        self.editor.set_cursor(anchor);
        let fetch = self
            .controller
            .begin_fetch(TriggerSource::Shortcut, "completion", &self.editor)
            .unwrap();
        assert_eq!(self.overlay.begin(fetch.ticket, &mut self.editor), Transition::Pending);
        fetch.ticket
    }

    fn show(&mut self, anchor: Position, text: &str) {
        let ticket = self.request_at(anchor);
        let state = SuggestionState {
            text: text.to_string(),
            anchor,
        };
        let shown = self.overlay.present(ticket, Some(state), &mut self.editor);
        assert_eq!(shown, Transition::Shown);
    }
}

const ANCHOR: Position = Position::new(5, 10);

#[test]
fn test_present_renders_one_span_per_line() {
    let mut h = Harness::new();
    h.show(ANCHOR, "foo\nbar");

    let overlay = h.editor.decorations().unwrap();
    assert_eq!(overlay.anchor, ANCHOR);
    let rows: Vec<_> = overlay
        .spans
        .iter()
        .map(|s| (s.row_offset, s.text.as_str()))
        .collect();
    assert_eq!(rows, vec![(0, "foo"), (1, "bar")]);
    assert!(h.overlay.is_shown());
}

#[test]
fn test_stale_or_empty_responses_are_not_shown() {
    let mut h = Harness::new();
    let old = h.request_at(ANCHOR);
    let current = h.request_at(ANCHOR);

    let state = SuggestionState {
        text: "1;".to_string(),
        anchor: ANCHOR,
    };
    assert_eq!(
        h.overlay.present(old, Some(state), &mut h.editor),
        Transition::Unchanged
    );
    assert!(matches!(h.overlay.phase(), OverlayPhase::Pending { .. }));

    assert_eq!(
        h.overlay.present(current, None, &mut h.editor),
        Transition::Discarded
    );
    assert_eq!(h.overlay.phase(), &OverlayPhase::Idle);
    assert!(h.editor.decorations().is_none());
}

#[test]
fn test_response_after_caret_left_is_discarded() {
    let mut h = Harness::new();
    let ticket = h.request_at(ANCHOR);
    h.editor.set_cursor(Position::new(2, 1));

    let state = SuggestionState {
        text: "1;".to_string(),
        anchor: ANCHOR,
    };
    assert_eq!(
        h.overlay.present(ticket, Some(state), &mut h.editor),
        Transition::Discarded
    );
    assert!(h.editor.decorations().is_none());
    assert_eq!(h.editor.rejected_count(), 0);
}

#[test]
fn test_cursor_leaving_rejects_exactly_once() {
    let mut h = Harness::new();
    h.show(ANCHOR, "1;");

    let moved = Position::new(6, 1);
    h.editor.set_cursor(moved);
    assert_eq!(
        h.overlay.on_cursor_changed(moved, &mut h.editor),
        Transition::Rejected(RejectReason::CursorLeft)
    );
    assert_eq!(h.overlay.phase(), &OverlayPhase::Idle);
    assert!(h.editor.decorations().is_none());

    assert_eq!(
        h.overlay.on_cursor_changed(Position::new(1, 1), &mut h.editor),
        Transition::Unchanged
    );
    assert_eq!(h.editor.rejected_count(), 1);
}

#[test]
fn test_acceptance_window_tolerance() {
    let mut h = Harness::new();
    h.show(ANCHOR, "1;");

    for column in [10, 11, 12] {
        let within = Position::new(5, column);
        assert_eq!(
            h.overlay.on_cursor_changed(within, &mut h.editor),
            Transition::Unchanged
        );
    }
    assert!(h.overlay.is_shown());
    assert_eq!(
        h.overlay.on_cursor_changed(Position::new(5, 9), &mut h.editor),
        Transition::Rejected(RejectReason::CursorLeft)
    );

    h.show(ANCHOR, "1;");
    assert_eq!(
        h.overlay.on_cursor_changed(Position::new(5, 13), &mut h.editor),
        Transition::Rejected(RejectReason::CursorLeft)
    );
}

#[test]
fn test_accept_inserts_once_and_moves_caret() {
    let mut h = Harness::new();
    let now = Instant::now();
    h.show(ANCHOR, "foo\nbar");

    assert_eq!(
        h.overlay.accept(now, &mut h.editor),
        Transition::Accepted {
            text: "foo\nbar".to_string()
        }
    );
    assert_eq!(
        h.overlay.accept(now + Duration::from_millis(10), &mut h.editor),
        Transition::Unchanged
    );

    assert_eq!(h.editor.edits().len(), 1);
    assert_eq!(h.editor.text(), "l1\nl2\nl3\nl4\nconst x =foo\nbar\n");
    assert_eq!(h.editor.cursor(), Position::new(6, 4));
    assert_eq!(h.editor.accepted(), &["foo\nbar".to_string()]);
    assert!(h.editor.decorations().is_none());
    assert_eq!(h.overlay.phase(), &OverlayPhase::Idle);
}

#[test]
fn test_cooldown_blocks_accept_of_a_new_suggestion() {
    let mut h = Harness::new();
    let now = Instant::now();
    h.show(ANCHOR, "1;");
    h.overlay.accept(now, &mut h.editor);
    assert!(h.overlay.is_locked(now + Duration::from_millis(999)));

    let anchor = h.editor.cursor();
    h.show(anchor, "2;");
    assert_eq!(
        h.overlay.accept(now + Duration::from_millis(500), &mut h.editor),
        Transition::Unchanged
    );
    assert!(h.overlay.is_shown());

    assert!(!h.overlay.is_locked(now + Duration::from_secs(1)));
    assert!(matches!(
        h.overlay.accept(now + Duration::from_secs(1), &mut h.editor),
        Transition::Accepted { .. }
    ));
    assert_eq!(h.editor.edits().len(), 2);
}

#[test]
fn test_accept_outside_window_rejects() {
    let mut h = Harness::new();
    h.show(ANCHOR, "1;");
    h.editor.set_cursor(Position::new(1, 1));

    assert_eq!(
        h.overlay.accept(Instant::now(), &mut h.editor),
        Transition::Rejected(RejectReason::CursorLeft)
    );
    assert!(h.editor.edits().is_empty());
    assert_eq!(h.editor.rejected_count(), 1);
}

#[test]
fn test_own_insertion_counts_as_acceptance() {
    let mut h = Harness::new();
    let now = Instant::now();
    h.show(ANCHOR, "3:  total;");

    let change = ContentChange {
        start: ANCHOR,
        end: ANCHOR,
        text: "total;".to_string(),
    };
    assert_eq!(
        h.overlay.on_content_changed(&change, now, &mut h.editor),
        Transition::Accepted {
            text: "total;".to_string()
        }
    );
    assert!(h.editor.edits().is_empty());
    assert_eq!(h.editor.rejected_count(), 0);
    assert!(h.overlay.is_locked(now));
}

#[test]
fn test_manual_edit_rejects() {
    let mut h = Harness::new();
    h.show(ANCHOR, "1;");

    let change = ContentChange {
        start: ANCHOR,
        end: ANCHOR,
        text: "z".to_string(),
    };
    assert_eq!(
        h.overlay.on_content_changed(&change, Instant::now(), &mut h.editor),
        Transition::Rejected(RejectReason::ManualEdit)
    );
    assert_eq!(h.editor.rejected_count(), 1);

    // Edits with nothing shown are not the overlay's business.
    assert_eq!(
        h.overlay.on_content_changed(&change, Instant::now(), &mut h.editor),
        Transition::Unchanged
    );
}

#[test]
fn test_reject_and_expire() {
    let mut h = Harness::new();
    h.show(ANCHOR, "1;");
    assert_eq!(
        h.overlay.reject(&mut h.editor),
        Transition::Rejected(RejectReason::Command)
    );
    assert_eq!(h.overlay.reject(&mut h.editor), Transition::Unchanged);

    h.show(ANCHOR, "1;");
    assert_eq!(h.overlay.expire(&mut h.editor), Transition::Expired);
    assert!(h.editor.decorations().is_none());
    assert_eq!(h.editor.rejected_count(), 1);

    h.request_at(ANCHOR);
    assert_eq!(h.overlay.reject(&mut h.editor), Transition::Discarded);
}

#[test]
fn test_new_request_clears_shown_suggestion() {
    let mut h = Harness::new();
    h.show(ANCHOR, "1;");
    h.request_at(ANCHOR);
    assert!(h.editor.decorations().is_none());
    assert!(matches!(h.overlay.phase(), OverlayPhase::Pending { .. }));
}

/// Editor whose decoration updates drag the caret to the origin.
struct JumpyEditor {
    inner: BufferEditor,
}

impl EditorSurface for JumpyEditor {
    fn cursor(&self) -> Position {
        self.inner.cursor()
    }

    fn set_cursor(&mut self, position: Position) {
        self.inner.set_cursor(position);
    }

    fn text(&self) -> String {
        self.inner.text()
    }

    fn file_name(&self) -> String {
        self.inner.file_name()
    }

    fn replace_decorations(&mut self, overlay: Option<&GhostOverlay>) {
        self.inner.replace_decorations(overlay);
        self.inner.set_cursor(Position::new(1, 1));
    }

    fn execute_edit(&mut self, edit: &TextEdit) {
        self.inner.execute_edit(edit);
    }
}

#[test]
fn test_rendering_restores_the_caret() {
    let settings = SuggestionSettings::default();
    let mut controller = SuggestionController::new(settings.clone());
    let mut overlay = SuggestionOverlay::new(&settings);
    let mut editor = JumpyEditor {
        inner: BufferEditor::new("main.js", SOURCE),
    };
    editor.set_cursor(ANCHOR);

    let fetch = controller
        .begin_fetch(TriggerSource::Shortcut, "completion", &editor)
        .unwrap();
    overlay.begin(fetch.ticket, &mut editor);
    let state = SuggestionState {
        text: "1;".to_string(),
        anchor: ANCHOR,
    };
    assert_eq!(
        overlay.present(fetch.ticket, Some(state), &mut editor),
        Transition::Shown
    );
    assert_eq!(editor.cursor(), ANCHOR);

    overlay.expire(&mut editor);
    assert_eq!(editor.cursor(), ANCHOR);
}

#[test]
fn test_accept_leaves_caret_after_insertion_on_jumpy_renderer() {
    let settings = SuggestionSettings::default();
    let mut controller = SuggestionController::new(settings.clone());
    let mut overlay = SuggestionOverlay::new(&settings);
    let mut editor = JumpyEditor {
        inner: BufferEditor::new("main.js", SOURCE),
    };
    editor.set_cursor(ANCHOR);

    let fetch = controller
        .begin_fetch(TriggerSource::Shortcut, "completion", &editor)
        .unwrap();
    overlay.begin(fetch.ticket, &mut editor);
    let state = SuggestionState {
        text: "1;".to_string(),
        anchor: ANCHOR,
    };
    overlay.present(fetch.ticket, Some(state), &mut editor);

    assert!(matches!(
        overlay.accept(Instant::now(), &mut editor),
        Transition::Accepted { .. }
    ));
    assert_eq!(editor.cursor(), Position::new(5, 12));
    assert!(editor.inner.decorations().is_none());
    assert_eq!(editor.text(), "l1\nl2\nl3\nl4\nconst x =1;\n");
}

#[test]
fn test_sanitize_strips_line_numbers_and_carriage_returns() {
    assert_eq!(sanitize("1: foo\r\n2:\tbar"), "foo\nbar");
    assert_eq!(sanitize("12:baz"), "baz");
    assert_eq!(sanitize("a: 1"), "a: 1");
    assert_eq!(sanitize("x = 10: y"), "x = 10: y");
}
