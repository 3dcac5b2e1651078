//! `Debug.Log(expr);` → `this.logToConsole(expr);`
use std::collections::HashSet;

use regex::Captures;

use super::lexical::{is_ident_byte, map_code, Lexed, IDENT_RE};
use super::qualify::LocalScopes;
use crate::ir::{FieldRecord, INSTANCE_PREFIX, LOG_HELPER};

const LOG_CALL: &str = "Debug.Log(";

/// Rewrite every logging statement found in code. Calls whose argument
/// list is empty, unbalanced or not followed by `;` are left as written.
pub fn translate_logging(text: &str, fields: &[FieldRecord]) -> String {
    let names: HashSet<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    let lexed = Lexed::new(text);
    let locals = LocalScopes::new(text);
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut search = 0;

    while let Some(found) = text[search..].find(LOG_CALL) {
        let start = search + found;
        search = start + LOG_CALL.len();
        if !lexed.is_code(start) || (start > 0 && is_ident_byte(bytes[start - 1])) {
            continue;
        }
        let open = start + LOG_CALL.len() - 1;
        let Some(close) = lexed.matching_close(open) else {
            continue;
        };
        let semi = skip_whitespace(bytes, close + 1);
        if bytes.get(semi) != Some(&b';') {
            continue;
        }
        let args = &text[open + 1..close];
        if args.trim().is_empty() {
            continue;
        }
        let visible: HashSet<&str> = names
            .iter()
            .copied()
            .filter(|name| !locals.shadows(name, start))
            .collect();
        out.push_str(&text[cursor..start]);
        out.push_str(&format!("{INSTANCE_PREFIX}{LOG_HELPER}({});", qualify_arguments(args, &visible)));
        cursor = semi + 1;
        search = cursor;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Qualify known fields inside a logging argument list. Literal spans are
/// copied verbatim and member accesses (`a.count`) are not touched.
pub fn qualify_arguments(args: &str, names: &HashSet<&str>) -> String {
    map_code(args, |code| {
        IDENT_RE
            .replace_all(code, |caps: &Captures| {
                let ident = caps.get(0).unwrap();
                let after_dot = code[..ident.start()].trim_end().ends_with('.');
                if names.contains(ident.as_str()) && !after_dot {
                    format!("{INSTANCE_PREFIX}{}", ident.as_str())
                } else {
                    ident.as_str().to_string()
                }
            })
            .into_owned()
    })
}

fn skip_whitespace(bytes: &[u8], mut at: usize) -> usize {
    while at < bytes.len() && bytes[at].is_ascii_whitespace() {
        at += 1;
    }
    at
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
    fn string_literal_passes_through() {
        let out = translate_logging(r#"Debug.Log("hello");"#, &fields(&["count"]));
        assert_eq!(out, r#"this.logToConsole("hello");"#);
    }

    #[test]
    fn literal_equal_to_field_name_is_not_qualified() {
        let out = translate_logging(r#"Debug.Log("count" + count);"#, &fields(&["count"]));
        assert_eq!(out, r#"this.logToConsole("count" + this.count);"#);
    }

    #[test]
    fn field_argument_is_qualified_once() {
        let f = fields(&["count"]);
        assert_eq!(translate_logging("Debug.Log(count);", &f), "this.logToConsole(this.count);");
        assert_eq!(translate_logging("Debug.Log(this.count);", &f), "this.logToConsole(this.count);");
    }

    #[test]
    fn unknown_identifiers_and_nested_calls_pass_through() {
        let out = translate_logging(r#"Debug.Log(Score() + " pts: " + total);"#, &fields(&["count"]));
        assert_eq!(out, r#"this.logToConsole(Score() + " pts: " + total);"#);
    }

    #[test]
    fn calls_in_comments_and_lookalikes_are_untouched() {
        let text = "// Debug.Log(count);\nMyDebug.Log(count);\nDebug.Log();\nDebug.Log(count)";
        assert_eq!(translate_logging(text, &fields(&["count"])), text);
    }

    #[test]
    fn shadowing_local_is_logged_as_is() {
        let text = "fn Start() { let count = 5; Debug.Log(count); }\nfn Update() { Debug.Log(count); }";
        assert_eq!(
            translate_logging(text, &fields(&["count"])),
            "fn Start() { let count = 5; this.logToConsole(count); }\nfn Update() { this.logToConsole(this.count); }"
        );
    }

    #[test]
    fn parenthesis_inside_literal_does_not_end_call() {
        let out = translate_logging(r#"Debug.Log(":)" + count) ;"#, &fields(&["count"]));
        assert_eq!(out, r#"this.logToConsole(":)" + this.count);"#);
    }
}
