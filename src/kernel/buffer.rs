//! Rope-backed [`EditorSurface`] for headless hosts.

use ropey::{Rope, RopeSlice};

use crate::kernel::services::ports::{EditorSurface, GhostOverlay, Position, TextEdit};

pub struct BufferEditor {
    rope: Rope,
    file_name: String,
    cursor: Position,
    decorations: Option<GhostOverlay>,
    edits: Vec<TextEdit>,
    accepted: Vec<String>,
    rejected: usize,
}

impl BufferEditor {
    pub fn new(file_name: impl Into<String>, text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            file_name: file_name.into(),
            cursor: Position::new(1, 1),
            decorations: None,
            edits: Vec::new(),
            accepted: Vec::new(),
            rejected: 0,
        }
    }

    pub fn decorations(&self) -> Option<&GhostOverlay> {
        self.decorations.as_ref()
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    /// Char offset of a one-based position, clamped to the document.
    fn char_index(&self, position: Position) -> usize {
        let last_line = self.rope.len_lines().saturating_sub(1);
        let line = (position.line.saturating_sub(1) as usize).min(last_line);
        let start = self.rope.line_to_char(line);
        let column = position.column.saturating_sub(1) as usize;
        start + column.min(line_len_chars(self.rope.line(line)))
    }
}

fn line_len_chars(line: RopeSlice<'_>) -> usize {
    let mut len = 0usize;
    let mut it = line.chars().peekable();
    while let Some(ch) = it.next() {
        if ch == '\n' {
            break;
        }
        if ch == '\r' && matches!(it.peek(), Some('\n')) {
            break;
        }
        len += 1;
    }
    len
}

impl EditorSurface for BufferEditor {
    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_cursor(&mut self, position: Position) {
        self.cursor = position;
    }

    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn file_name(&self) -> String {
        self.file_name.clone()
    }

    fn replace_decorations(&mut self, overlay: Option<&GhostOverlay>) {
        self.decorations = overlay.cloned();
    }

    fn execute_edit(&mut self, edit: &TextEdit) {
        let mut start = self.char_index(edit.start);
        let mut end = self.char_index(edit.end);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        self.rope.remove(start..end);
        if !edit.text.is_empty() {
            self.rope.insert(start, &edit.text);
        }
        self.edits.push(edit.clone());
    }

    fn suggestion_accepted(&mut self, text: &str) {
        self.accepted.push(text.to_string());
    }

    fn suggestion_rejected(&mut self) {
        self.rejected += 1;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/buffer.rs"]
mod tests;
