//! Editor surface consumed by the inline suggestion overlay.
//!
//! Positions are one-based, matching what editor widgets report.

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Where the caret lands after `text` is inserted at `self`.
    pub fn after_insert(self, text: &str) -> Self {
        match text.rsplit_once('\n') {
            None => Self::new(self.line, self.column + text.chars().count() as u32),
            Some((head, tail)) => {
                let newlines = head.matches('\n').count() as u32 + 1;
                Self::new(self.line + newlines, tail.chars().count() as u32 + 1)
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CursorChangeReason {
    /// Moved by the user (click, arrows, shortcuts).
    Explicit,
    /// Moved as a side effect of an edit.
    Edit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CursorChange {
    pub position: Position,
    pub reason: CursorChangeReason,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentChange {
    pub start: Position,
    pub end: Position,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEdit {
    pub start: Position,
    pub end: Position,
    pub text: String,
}

/// One muted run of ghost text. `row_offset == 0` sits inline at `anchor`;
/// larger offsets are continuation rows rendered below the anchor line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GhostSpan {
    pub anchor: Position,
    pub row_offset: u32,
    pub text: String,
}

/// Renderer-agnostic description of a visible suggestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GhostOverlay {
    pub anchor: Position,
    pub spans: Vec<GhostSpan>,
}

impl GhostOverlay {
    pub fn from_text(anchor: Position, text: &str) -> Self {
        let spans = text
            .split('\n')
            .enumerate()
            .map(|(row, line)| GhostSpan {
                anchor,
                row_offset: row as u32,
                text: line.to_string(),
            })
            .collect();
        Self { anchor, spans }
    }
}

pub trait EditorSurface {
    fn cursor(&self) -> Position;

    fn set_cursor(&mut self, position: Position);

    fn text(&self) -> String;

    fn file_name(&self) -> String;

    /// Atomically swaps every ghost decoration for `overlay` (`None` clears).
    fn replace_decorations(&mut self, overlay: Option<&GhostOverlay>);

    fn execute_edit(&mut self, edit: &TextEdit);

    fn suggestion_accepted(&mut self, _text: &str) {}

    fn suggestion_rejected(&mut self) {}
}
