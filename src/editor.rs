//! Editable source buffer with a byte-offset selection.
use std::ops::Range;
use std::path::Path;

/// Source the buffer is reset to: an empty class with lifecycle stubs.
pub const TEMPLATE: &str = "\
using System;

public class sampleclass
{

    void Start()
    {

    }

    void Update()
    {

    }
}";

const TAB: &str = "    ";

#[derive(Debug, Clone)]
pub struct InputBuffer {
    text: String,
    selection: Range<usize>,
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::from_text(TEMPLATE)
    }
}

impl InputBuffer {
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let end = text.len();
        Self { text, selection: end..end }
    }

    pub fn load(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::from_text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        *self = Self::from_text(text);
    }

    pub fn reset_to_template(&mut self) {
        self.set_text(TEMPLATE);
    }

    /// Select `range`, clamped to the buffer and snapped back to char
    /// boundaries.
    pub fn select(&mut self, range: Range<usize>) {
        let start = self.floor_boundary(range.start);
        let end = self.floor_boundary(range.end.max(range.start));
        self.selection = start..end;
    }

    /// Replace the selection with four spaces and leave the caret after them.
    pub fn insert_tab(&mut self) {
        let Range { start, end } = self.selection.clone();
        self.text.replace_range(start..end, TAB);
        let caret = start + TAB.len();
        self.selection = caret..caret;
    }

    fn floor_boundary(&self, mut at: usize) -> usize {
        at = at.min(self.text.len());
        while !self.text.is_char_boundary(at) {
            at -= 1;
        }
        at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_replaces_selection_and_moves_caret() {
        let mut buf = InputBuffer::from_text("ab-cd");
        buf.select(2..3);
        buf.insert_tab();
        assert_eq!(buf.text(), "ab    cd");
        assert_eq!(buf.selection(), 6..6);
    }

    #[test]
    fn tab_at_caret_inserts() {
        let mut buf = InputBuffer::from_text("x");
        buf.select(0..0);
        buf.insert_tab();
        assert_eq!(buf.text(), "    x");
        assert_eq!(buf.selection(), 4..4);
    }

    #[test]
    fn selection_is_clamped_to_char_boundaries() {
        let mut buf = InputBuffer::from_text("é!");
        buf.select(1..99);
        assert_eq!(buf.selection(), 0..3);
    }

    #[test]
    fn reset_restores_template_with_hooks() {
        let mut buf = InputBuffer::from_text("garbage");
        buf.reset_to_template();
        assert_eq!(buf.text(), TEMPLATE);
        assert!(buf.text().contains("void Start()"));
        assert!(buf.text().contains("void Update()"));
    }
}
