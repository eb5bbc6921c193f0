use ropey::Rope;
use std::cmp;
use std::ops::Range;

use crate::buffer::TextBuffer;

/// The note under edit: a rope plus cursor, viewport, and the snapshot of the
/// last loaded/saved content. Dirty state is derived by comparing the rope
/// against that snapshot, so typing a character and deleting it again leaves
/// the document clean.
pub struct Document {
    rope: Rope,
    original: String,
    cursor_line: usize,
    cursor_col: usize,
    viewport_offset: usize,
    viewport_height: usize,
    selection: Option<(usize, usize)>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            original: String::new(),
            cursor_line: 0,
            cursor_col: 0,
            viewport_offset: 0,
            viewport_height: 24,
            selection: None,
        }
    }

    /// Load new content, resetting cursor, viewport and the saved snapshot.
    pub fn set_text(&mut self, content: String) {
        self.rope = Rope::from_str(&content);
        self.original = content;
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.viewport_offset = 0;
        self.selection = None;
    }

    pub fn clear(&mut self) {
        self.set_text(String::new());
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    pub fn is_modified(&self) -> bool {
        self.rope != self.original.as_str()
    }

    pub fn mark_saved(&mut self) {
        self.original = self.rope.to_string();
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn cursor_position(&self) -> (usize, usize) {
        (self.cursor_line, self.cursor_col)
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height.max(1);
    }

    pub fn viewport_offset(&self) -> usize {
        self.viewport_offset
    }

    pub fn viewport_lines(&self) -> Vec<String> {
        let end_line = cmp::min(
            self.viewport_offset + self.viewport_height,
            self.rope.len_lines(),
        );
        (self.viewport_offset..end_line)
            .filter_map(|i| self.rope.get_line(i))
            .map(|line| line.to_string())
            .collect()
    }

    /// Byte offset of the cursor; the search anchor when the bar opens.
    pub fn caret_byte(&self) -> usize {
        let char_idx = self.caret_char();
        self.rope.char_to_byte(char_idx)
    }

    pub fn set_caret_byte(&mut self, byte: usize) {
        let byte = byte.min(self.rope.len_bytes());
        let char_idx = self.rope.byte_to_char(byte);
        self.cursor_line = self.rope.char_to_line(char_idx);
        self.cursor_col = char_idx - self.rope.line_to_char(self.cursor_line);
        self.adjust_viewport();
    }

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline();
            return;
        }
        let char_idx = self.caret_char();
        self.rope.insert_char(char_idx, c);
        self.cursor_col += 1;
        self.selection = None;
    }

    pub fn insert_newline(&mut self) {
        let char_idx = self.caret_char();
        self.rope.insert_char(char_idx, '\n');
        self.cursor_line += 1;
        self.cursor_col = 0;
        self.selection = None;
        self.adjust_viewport();
    }

    pub fn delete_char_backward(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
            let char_idx = self.caret_char();
            self.rope.remove(char_idx..char_idx + 1);
        } else if self.cursor_line > 0 {
            let newline_idx = self.rope.line_to_char(self.cursor_line) - 1;
            self.cursor_line -= 1;
            self.cursor_col = self.line_len_chars(self.cursor_line);
            self.rope.remove(newline_idx..newline_idx + 1);
            self.adjust_viewport();
        }
        self.selection = None;
    }

    pub fn delete_char_forward(&mut self) {
        let char_idx = self.caret_char();
        if char_idx < self.rope.len_chars() {
            self.rope.remove(char_idx..char_idx + 1);
        }
        self.selection = None;
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_len_chars(self.cursor_line);
            self.adjust_viewport();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.line_len_chars(self.cursor_line) {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.rope.len_lines() {
            self.cursor_line += 1;
            self.cursor_col = 0;
            self.adjust_viewport();
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.clamp_cursor_col();
            self.adjust_viewport();
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_line + 1 < self.rope.len_lines() {
            self.cursor_line += 1;
            self.clamp_cursor_col();
            self.adjust_viewport();
        }
    }

    pub fn move_to_line_start(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_to_line_end(&mut self) {
        self.cursor_col = self.line_len_chars(self.cursor_line);
    }

    pub fn move_to_start(&mut self) {
        self.cursor_line = 0;
        self.cursor_col = 0;
        self.adjust_viewport();
    }

    pub fn move_to_end(&mut self) {
        self.cursor_line = self.rope.len_lines().saturating_sub(1);
        self.cursor_col = self.line_len_chars(self.cursor_line);
        self.adjust_viewport();
    }

    pub fn page_up(&mut self) {
        self.cursor_line = self.cursor_line.saturating_sub(self.viewport_height);
        self.viewport_offset = self.viewport_offset.saturating_sub(self.viewport_height);
        self.clamp_cursor_col();
    }

    pub fn page_down(&mut self) {
        let max_line = self.rope.len_lines().saturating_sub(1);
        self.cursor_line = cmp::min(self.cursor_line + self.viewport_height, max_line);
        self.viewport_offset = cmp::min(
            self.viewport_offset + self.viewport_height,
            max_line.saturating_sub(self.viewport_height.saturating_sub(1)),
        );
        self.clamp_cursor_col();
    }

    /// The highlight expressed as (line, start column, end column), or None
    /// when there is no selection or it spans more than one line.
    pub fn selection_span(&self) -> Option<(usize, usize, usize)> {
        let (start, end) = self.selection?;
        if !self.is_byte_boundary(start) || !self.is_byte_boundary(end) {
            return None;
        }
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end);
        let line = self.rope.char_to_line(start_char);
        if self.rope.char_to_line(end_char) != line {
            return None;
        }
        let line_start = self.rope.line_to_char(line);
        Some((line, start_char - line_start, end_char - line_start))
    }

    fn caret_char(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor_line);
        line_start + self.cursor_col.min(self.line_len_chars(self.cursor_line))
    }

    fn line_len_chars(&self, line: usize) -> usize {
        match self.rope.get_line(line) {
            Some(slice) => {
                let len = slice.len_chars();
                if len > 0 && slice.char(len - 1) == '\n' {
                    len - 1
                } else {
                    len
                }
            }
            None => 0,
        }
    }

    fn clamp_cursor_col(&mut self) {
        self.cursor_col = cmp::min(self.cursor_col, self.line_len_chars(self.cursor_line));
    }

    fn adjust_viewport(&mut self) {
        if self.cursor_line < self.viewport_offset {
            self.viewport_offset = self.cursor_line;
        } else if self.cursor_line >= self.viewport_offset + self.viewport_height {
            self.viewport_offset = self.cursor_line.saturating_sub(self.viewport_height - 1);
        }
    }

    fn is_byte_boundary(&self, byte: usize) -> bool {
        if byte > self.rope.len_bytes() {
            return false;
        }
        self.rope.char_to_byte(self.rope.byte_to_char(byte)) == byte
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer for Document {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    fn slice(&self, range: Range<usize>) -> Option<String> {
        if range.start > range.end
            || !self.is_byte_boundary(range.start)
            || !self.is_byte_boundary(range.end)
        {
            return None;
        }
        let start = self.rope.byte_to_char(range.start);
        let end = self.rope.byte_to_char(range.end);
        Some(self.rope.slice(start..end).to_string())
    }

    fn replace_range(&mut self, range: Range<usize>, replacement: &str) -> bool {
        if range.start > range.end
            || !self.is_byte_boundary(range.start)
            || !self.is_byte_boundary(range.end)
        {
            return false;
        }
        let start = self.rope.byte_to_char(range.start);
        let end = self.rope.byte_to_char(range.end);
        self.rope.remove(start..end);
        self.rope.insert(start, replacement);
        self.selection = None;
        self.set_caret_byte(range.start + replacement.len());
        true
    }

    fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    fn select(&mut self, start: usize, end: usize) {
        self.selection = Some((start, end));
        self.set_caret_byte(start);
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }
}
