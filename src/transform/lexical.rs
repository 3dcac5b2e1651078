//! Code / literal / comment classification.
//!
//! The passes are pattern driven, but each one has to know whether a match
//! sits in code or inside a string literal or comment. `Lexed` answers that
//! for byte offsets and provides the bracket matching the passes share.
//! Quote, slash and bracket bytes are ASCII, so every span boundary is a char
//! boundary.
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// Whole identifier words.
pub static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z_]\w*").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Code,
    Literal,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub range: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct Lexed<'a> {
    text: &'a str,
    spans: Vec<Span>,
}

impl<'a> Lexed<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, spans: scan(text) }
    }

    pub fn kind_at(&self, pos: usize) -> Option<SpanKind> {
        let ix = self.spans.partition_point(|s| s.range.end <= pos);
        self.spans
            .get(ix)
            .filter(|s| s.range.contains(&pos))
            .map(|s| s.kind)
    }

    pub fn is_code(&self, pos: usize) -> bool {
        self.kind_at(pos) == Some(SpanKind::Code)
    }

    /// First occurrence of `byte` at or after `from` that sits in code.
    pub fn find_code_byte(&self, from: usize, byte: u8) -> Option<usize> {
        let bytes = self.text.as_bytes();
        (from..bytes.len()).find(|&i| bytes[i] == byte && self.is_code(i))
    }

    /// Index of the bracket closing the one at `open`, counting only code.
    pub fn matching_close(&self, open: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        let (open_b, close_b) = match bytes.get(open)? {
            b'{' => (b'{', b'}'),
            b'(' => (b'(', b')'),
            b'[' => (b'[', b']'),
            _ => return None,
        };
        if !self.is_code(open) {
            return None;
        }
        let mut depth = 0usize;
        for span in self.spans.iter().filter(|s| s.kind == SpanKind::Code) {
            let start = span.range.start.max(open);
            if start >= span.range.end {
                continue;
            }
            for i in start..span.range.end {
                if bytes[i] == open_b {
                    depth += 1;
                } else if bytes[i] == close_b {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
            }
        }
        None
    }

    /// Brace depth in front of every byte (`depths[i]` counts the code `{`
    /// opened and not yet closed before offset `i`).
    pub fn brace_depths(&self) -> Vec<usize> {
        let bytes = self.text.as_bytes();
        let mut out = Vec::with_capacity(bytes.len() + 1);
        let mut depth = 0usize;
        for (i, b) in bytes.iter().enumerate() {
            out.push(depth);
            if self.is_code(i) {
                match b {
                    b'{' => depth += 1,
                    b'}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
        }
        out.push(depth);
        out
    }
}

pub fn scan(text: &str) -> Vec<Span> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut code_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let special = match bytes[i] {
            b'"' | b'\'' => Some((SpanKind::Literal, literal_end(bytes, i))),
            b'/' if bytes.get(i + 1) == Some(&b'/') => Some((SpanKind::Comment, line_end(bytes, i))),
            b'/' if bytes.get(i + 1) == Some(&b'*') => Some((SpanKind::Comment, block_end(bytes, i))),
            _ => None,
        };
        match special {
            Some((kind, end)) => {
                if code_start < i {
                    spans.push(Span { kind: SpanKind::Code, range: code_start..i });
                }
                spans.push(Span { kind, range: i..end });
                i = end;
                code_start = end;
            }
            None => i += 1,
        }
    }
    if code_start < bytes.len() {
        spans.push(Span { kind: SpanKind::Code, range: code_start..bytes.len() });
    }
    spans
}

/// Rewrite only the code segments of `text`; literals and comments pass
/// through verbatim.
pub fn map_code(text: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    for span in scan(text) {
        let piece = &text[span.range];
        match span.kind {
            SpanKind::Code => out.push_str(&rewrite(piece)),
            _ => out.push_str(piece),
        }
    }
    out
}

pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

// Unterminated literals stop at the end of the line.
fn literal_end(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| from + p)
}

fn block_end(bytes: &[u8], from: usize) -> usize {
    bytes[from + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(bytes.len(), |p| from + 2 + p + 2)
}
