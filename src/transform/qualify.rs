//! Instance qualification of field references and method calls.
use std::collections::HashSet;
use std::ops::Range;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use super::lexical::{Lexed, IDENT_RE};
use crate::ir::{FieldRecord, INSTANCE_PREFIX};

static LET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\blet\s+([A-Za-z_]\w*)").unwrap());

/// Whether field names inside string literals and comments are qualified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LiteralPolicy {
    /// Literal and comment text is never rewritten.
    #[default]
    Exempt,
    /// Whole-word matches are qualified wherever they appear, quoted text
    /// included.
    Qualify,
}

/// Rewrite every bare reference to a field into `this.field`.
///
/// A match is skipped when it is a member access (`this.name`, `other.name`)
/// or sits in call position (`name(`, whitespace allowed). Running the pass
/// twice yields the same text.
pub fn qualify_fields(text: &str, fields: &[FieldRecord], policy: LiteralPolicy) -> String {
    let names: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    if names.is_empty() {
        return text.to_string();
    }
    let lexed = Lexed::new(text);
    let locals = LocalScopes::new(text);
    IDENT_RE
        .replace_all(text, |caps: &Captures| {
            let ident = caps.get(0).unwrap();
            let name = ident.as_str();
            let skip = !names.contains(name)
                || text[..ident.start()].ends_with('.')
                || in_call_position(text, ident.end())
                || locals.shadows(name, ident.start())
                || (policy == LiteralPolicy::Exempt && !lexed.is_code(ident.start()));
            if skip {
                name.to_string()
            } else {
                format!("{INSTANCE_PREFIX}{name}")
            }
        })
        .into_owned()
}

/// Regions where a `let` binding hides a field of the same name: from the
/// `let` to the end of its enclosing block.
#[derive(Debug, Default)]
pub struct LocalScopes {
    scopes: Vec<(String, Range<usize>)>,
}

impl LocalScopes {
    pub fn new(text: &str) -> Self {
        let lexed = Lexed::new(text);
        let depths = lexed.brace_depths();
        let scopes = LET_RE
            .captures_iter(text)
            .filter(|caps| lexed.is_code(caps.get(0).unwrap().start()))
            .map(|caps| {
                let start = caps.get(0).unwrap().start();
                let depth = depths[start];
                let end = (start..depths.len())
                    .find(|&i| depths[i] < depth)
                    .unwrap_or(depths.len());
                (caps[1].to_string(), start..end)
            })
            .collect();
        Self { scopes }
    }

    pub fn shadows(&self, name: &str, at: usize) -> bool {
        self.scopes
            .iter()
            .any(|(local, range)| local == name && range.contains(&at))
    }
}

/// Rewrite bare calls to the class's own methods (`Jump();`) into
/// `this.Jump();` so they run against the live instance. Definitions
/// (`fn Jump()`) and member calls (`x.Jump()`) are left alone.
pub fn qualify_method_calls(text: &str, methods: &IndexSet<String>) -> String {
    if methods.is_empty() {
        return text.to_string();
    }
    let lexed = Lexed::new(text);
    IDENT_RE
        .replace_all(text, |caps: &Captures| {
            let ident = caps.get(0).unwrap();
            let name = ident.as_str();
            let before = text[..ident.start()].trim_end();
            let bare_call = methods.contains(name)
                && lexed.is_code(ident.start())
                && in_call_position(text, ident.end())
                && !before.ends_with('.')
                && !ends_with_word(before, "fn");
            if bare_call {
                format!("{INSTANCE_PREFIX}{name}")
            } else {
                name.to_string()
            }
        })
        .into_owned()
}

fn in_call_position(text: &str, end: usize) -> bool {
    text[end..].trim_start().starts_with('(')
}

fn ends_with_word(text: &str, word: &str) -> bool {
    text.strip_suffix(word).is_some_and(|rest| {
        !rest
            .as_bytes()
            .last()
            .is_some_and(|&b| super::lexical::is_ident_byte(b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields(names: &[&str]) -> Vec<FieldRecord> {
        names
            .iter()
            .map(|n| FieldRecord { name: n.to_string(), initializer: None })
            .collect()
    }

    #[test]
    fn qualifies_bare_references_only() {
        let f = fields(&["count"]);
        let text = "fn Update() { count = count + 1; this.count = 2; counter = count(); hud.count = 0; }";
        assert_eq!(
            qualify_fields(text, &f, LiteralPolicy::Exempt),
            "fn Update() { this.count = this.count + 1; this.count = 2; counter = count(); hud.count = 0; }"
        );
    }

    #[test]
    fn qualification_is_idempotent() {
        let f = fields(&["count", "speed"]);
        let text = "fn constructor() { this.speed = count * 2; }\nfn Update() { speed = speed + count; }";
        let once = qualify_fields(text, &f, LiteralPolicy::Exempt);
        let twice = qualify_fields(&once, &f, LiteralPolicy::Exempt);
        assert_eq!(once, "fn constructor() { this.speed = this.count * 2; }\nfn Update() { this.speed = this.speed + this.count; }");
        assert_eq!(once, twice);
    }

    #[test]
    fn literal_policy_controls_quoted_text() {
        let f = fields(&["count"]);
        let text = r#"this.logToConsole("count"); // count"#;
        assert_eq!(qualify_fields(text, &f, LiteralPolicy::Exempt), text);
        assert_eq!(
            qualify_fields(text, &f, LiteralPolicy::Qualify),
            r#"this.logToConsole("this.count"); // this.count"#
        );
    }

    #[test]
    fn locals_shadow_fields_until_their_block_ends() {
        let f = fields(&["count"]);
        let text = "fn Start() {\n    let count = 5;\n    if count > 1 { count = count + 1; }\n}\nfn Update() { count = 2; }";
        assert_eq!(
            qualify_fields(text, &f, LiteralPolicy::Exempt),
            "fn Start() {\n    let count = 5;\n    if count > 1 { count = count + 1; }\n}\nfn Update() { this.count = 2; }"
        );
    }

    #[test]
    fn method_calls_gain_instance_prefix() {
        let methods: IndexSet<String> = ["Jump".to_string()].into_iter().collect();
        let text = "fn Jump() { }\nfn Update() { Jump(); this.Jump(); other.Jump(); Jumper(); \"Jump()\"; }";
        assert_eq!(
            qualify_method_calls(text, &methods),
            "fn Jump() { }\nfn Update() { this.Jump(); this.Jump(); other.Jump(); Jumper(); \"Jump()\"; }"
        );
    }
}
