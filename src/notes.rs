use unicode_width::UnicodeWidthStr;

/// Plain-text note being edited, with a byte cursor and unsaved flag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteBuffer {
    text: String,
    cursor: usize,
    dirty: bool,
}

impl NoteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer holding already-saved text, cursor at the end
    pub fn from_saved(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.len(),
            dirty: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
        self.dirty = true;
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
        self.dirty = true;
    }

    pub fn newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.text.remove(self.cursor);
            self.dirty = true;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
            self.dirty = true;
        }
    }

    pub fn move_left(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn move_line_start(&mut self) {
        self.cursor = self.line_start();
    }

    pub fn move_line_end(&mut self) {
        self.cursor = self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |i| self.cursor + i);
    }

    /// Cursor as (line, display column)
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let line = before.matches('\n').count();
        let column = before[self.line_start()..].width();
        (line, column)
    }

    fn line_start(&self) -> usize {
        self.text[..self.cursor].rfind('\n').map_or(0, |i| i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_marks_dirty() {
        let mut buf = NoteBuffer::new();
        assert!(!buf.is_dirty());
        buf.insert_str("hello");
        buf.newline();
        buf.insert_char('x');
        assert_eq!(buf.text(), "hello\nx");
        assert!(buf.is_dirty());
        buf.mark_saved();
        assert!(!buf.is_dirty());
    }

    #[test]
    fn backspace_handles_multibyte() {
        let mut buf = NoteBuffer::from_saved("講義");
        buf.backspace();
        assert_eq!(buf.text(), "講");
        assert!(buf.is_dirty());
    }

    #[test]
    fn backspace_at_start_is_clean_noop() {
        let mut buf = NoteBuffer::from_saved("");
        buf.backspace();
        assert!(!buf.is_dirty());
    }

    #[test]
    fn cursor_moves_and_inserts_mid_text() {
        let mut buf = NoteBuffer::from_saved("ac");
        buf.move_left();
        buf.insert_char('b');
        assert_eq!(buf.text(), "abc");
        buf.move_line_start();
        buf.delete();
        assert_eq!(buf.text(), "bc");
        buf.move_line_end();
        buf.move_right();
        buf.insert_char('!');
        assert_eq!(buf.text(), "bc!");
    }

    #[test]
    fn cursor_position_uses_display_width() {
        let mut buf = NoteBuffer::new();
        buf.insert_str("line one\n第3章");
        assert_eq!(buf.cursor_position(), (1, 5));
    }
}
