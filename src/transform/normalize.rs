//! Token rewrites for source syntax the target engine rejects.
//!
//! - `x++`, `++x` → `x += 1` (and the `--` forms); statement position only
//! - numeric suffixes: `1.5f` → `1.5`, `2f` → `2.0`
//! - `null` → `()`
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::lexical::map_code;
use crate::ir::NULL_LITERAL;

static POSTFIX_STEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b((?:this\.)?[A-Za-z_]\w*)\s*(\+\+|--)").unwrap()
});
static PREFIX_STEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+\+|--)\s*((?:this\.)?[A-Za-z_]\w*)\b").unwrap()
});
static NUMERIC_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d+)(\.\d+)?[fFdDmM]\b").unwrap()
});
static NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnull\b").unwrap());

pub fn normalize(text: &str) -> String {
    map_code(text, |code| {
        let code = POSTFIX_STEP_RE.replace_all(code, |caps: &Captures| step(&caps[1], &caps[2]));
        let code = PREFIX_STEP_RE.replace_all(&code, |caps: &Captures| step(&caps[2], &caps[1]));
        let code = NUMERIC_SUFFIX_RE.replace_all(&code, |caps: &Captures| {
            let fraction = caps.get(2).map_or(".0", |m| m.as_str());
            format!("{}{}", &caps[1], fraction)
        });
        NULL_RE.replace_all(&code, NULL_LITERAL).into_owned()
    })
}

fn step(target: &str, op: &str) -> String {
    match op {
        "++" => format!("{target} += 1"),
        _ => format!("{target} -= 1"),
    }
}
