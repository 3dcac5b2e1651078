//! Source-only syntax removal and field extraction.
//!
//! Everything here works on raw text: imports and attributes are dropped,
//! primitive field declarations at class-body depth are lifted out into
//! `FieldRecord`s, deeper declarations of the same shape become `let`
//! locals, and method headers lose their C-family return type.
use std::ops::Range;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::lexical::Lexed;
use crate::ir::{ClassDescriptor, FieldRecord};

static USING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*using\s+(?:static\s+)?[\w.]+\s*;?[ \t]*\r?\n?").unwrap()
});
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)\[[A-Za-z_][\w.]*(?:\([^)\n]*\))?\][ \t]*(\r?\n)?").unwrap()
});
static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:public|private|protected|internal|sealed|abstract|partial|static)\s+)*class\s+([A-Za-z_]\w*)").unwrap()
});
static CLASS_OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:public|private|protected|internal|sealed|abstract|partial|static)\s+)*class\s+([A-Za-z_]\w*)(?:\s*:\s*[\w.,<>\s]*?)?\s*\{").unwrap()
});
static FIELD_HEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:public|private|protected|internal|static|readonly|const)\s+)*(string|int|float|double|bool)\s+([A-Za-z_]\w*)\s*(=|;)").unwrap()
});
static INT_LITERAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());
static VAR_LOCAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bvar\s+([A-Za-z_]\w*)\s*=").unwrap()
});
static METHOD_HEAD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:public|private|protected|internal|static|override|virtual)\s+)*([A-Za-z_][\w<>\[\]]*)\s+([A-Za-z_]\w*)\s*\(\s*\)\s*\{").unwrap()
});

// Words that can sit in return-type position without being one.
const NOT_A_RETURN_TYPE: &[&str] = &["new", "return", "else", "class", "fn"];

/// Location of the class-opening clause (through its `{`) and of the brace
/// that closes the class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassOpening {
    pub clause: Range<usize>,
    pub close: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: String,
    pub fields: Vec<FieldRecord>,
}

pub fn strip_source_only(text: &str) -> String {
    let lexed = Lexed::new(text);
    let text = USING_RE.replace_all(text, |caps: &Captures| keep_unless_code(&lexed, caps, ""));
    let lexed = Lexed::new(&text);
    ATTRIBUTE_RE
        .replace_all(&text, |caps: &Captures| {
            // an attribute on its own line takes the line with it
            let indent = match caps.get(2) {
                Some(_) => "",
                None => caps.get(1).map_or("", |m| m.as_str()),
            };
            keep_unless_code(&lexed, caps, indent)
        })
        .into_owned()
}

/// Name of the first class declared in code; the placeholder otherwise.
pub fn detect_class(text: &str) -> ClassDescriptor {
    let lexed = Lexed::new(text);
    CLASS_RE
        .captures_iter(text)
        .find(|caps| lexed.is_code(caps.get(0).unwrap().start()))
        .map(|caps| ClassDescriptor { name: caps[1].to_string() })
        .unwrap_or_else(ClassDescriptor::placeholder)
}

pub fn find_class_opening(text: &str) -> Option<ClassOpening> {
    let lexed = Lexed::new(text);
    let caps = CLASS_OPEN_RE
        .captures_iter(text)
        .find(|caps| lexed.is_code(caps.get(0).unwrap().start()))?;
    let clause = caps.get(0).unwrap().range();
    Some(ClassOpening {
        close: lexed.matching_close(clause.end - 1),
        clause,
    })
}

/// Lift primitive declarations at `field_depth` out of the text.
///
/// Declarations nested deeper are method locals and are rewritten to
/// `let`; shallower ones are outside the class and left alone.
pub fn extract_fields(text: &str, field_depth: usize) -> Extraction {
    let lexed = Lexed::new(text);
    let depths = lexed.brace_depths();
    let mut fields = Vec::new();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for caps in FIELD_HEAD_RE.captures_iter(text) {
        let head = caps.get(0).unwrap();
        if head.start() < cursor || !lexed.is_code(head.start()) {
            continue;
        }
        let floating = matches!(&caps[1], "float" | "double");
        let name = caps.get(2).unwrap();
        let depth = depths[head.start()];

        if depth > field_depth {
            out.push_str(&text[cursor..head.start()]);
            out.push_str("let ");
            out.push_str(name.as_str());
            cursor = name.end();
            if floating && &caps[3] == "=" {
                if let Some(semi) = lexed.find_code_byte(head.end(), b';') {
                    let value = text[head.end()..semi].trim();
                    out.push_str(&format!(" = {}", float_initializer(value)));
                    cursor = semi;
                }
            }
            continue;
        }
        if depth < field_depth {
            continue;
        }

        let (initializer, end) = match &caps[3] {
            ";" => (None, head.end()),
            _ => match lexed.find_code_byte(head.end(), b';') {
                Some(semi) => {
                    let value = text[head.end()..semi].trim();
                    let value = match floating {
                        true => float_initializer(value),
                        false => value.to_string(),
                    };
                    (Some(value), semi + 1)
                }
                None => continue,
            },
        };
        fields.push(FieldRecord { name: name.as_str().to_string(), initializer });

        let (cut_start, cut_end) = whole_line_extent(text, head.start(), end);
        out.push_str(&text[cursor..cut_start]);
        cursor = cut_end;
    }
    out.push_str(&text[cursor..]);

    Extraction { text: rewrite_var_locals(&out, field_depth), fields }
}

/// `[modifiers] ReturnType Name() {` → `fn Name() {`, collecting method names
/// in order of appearance.
pub fn rewrite_method_headers(text: &str) -> (String, IndexSet<String>) {
    let lexed = Lexed::new(text);
    let mut methods = IndexSet::new();
    let out = METHOD_HEAD_RE.replace_all(text, |caps: &Captures| {
        let whole = caps.get(0).unwrap();
        if !lexed.is_code(whole.start()) || NOT_A_RETURN_TYPE.contains(&&caps[1]) {
            return whole.as_str().to_string();
        }
        methods.insert(caps[2].to_string());
        format!("fn {}() {{", &caps[2])
    });
    (out.into_owned(), methods)
}

// Integer literals assigned to floating-point declarations keep their type.
fn float_initializer(value: &str) -> String {
    match INT_LITERAL_RE.is_match(value) {
        true => format!("{value}.0"),
        false => value.to_string(),
    }
}

fn rewrite_var_locals(text: &str, field_depth: usize) -> String {
    let lexed = Lexed::new(text);
    let depths = lexed.brace_depths();
    VAR_LOCAL_RE
        .replace_all(text, |caps: &Captures| {
            let whole = caps.get(0).unwrap();
            if lexed.is_code(whole.start()) && depths[whole.start()] > field_depth {
                format!("let {} =", &caps[1])
            } else {
                whole.as_str().to_string()
            }
        })
        .into_owned()
}

fn keep_unless_code(lexed: &Lexed<'_>, caps: &Captures, replacement: &str) -> String {
    let whole = caps.get(0).unwrap();
    if lexed.is_code(whole.start()) {
        replacement.to_string()
    } else {
        whole.as_str().to_string()
    }
}

// Widen a removed declaration to its whole line when nothing else shares it.
fn whole_line_extent(text: &str, start: usize, end: usize) -> (usize, usize) {
    let bytes = text.as_bytes();
    let mut line_start = start;
    while line_start > 0 && matches!(bytes[line_start - 1], b' ' | b'\t') {
        line_start -= 1;
    }
    let mut line_end = end;
    while line_end < bytes.len() && matches!(bytes[line_end], b' ' | b'\t' | b'\r') {
        line_end += 1;
    }
    let starts_line = line_start == 0 || bytes[line_start - 1] == b'\n';
    let ends_line = line_end == bytes.len() || bytes[line_end] == b'\n';
    if starts_line && ends_line {
        (line_start, (line_end + 1).min(bytes.len()))
    } else {
        (start, end)
    }
}
