//! Class header synthesis.
//!
//! The first class-opening clause is replaced by the logging helper and an
//! initializer that assigns every extracted field; the brace closing that
//! class is dropped so its methods become top-level script functions.
use super::fields::find_class_opening;
use crate::ir::{
    ClassDescriptor, FieldRecord, CONSTRUCTOR_FN, HOST_LOG_FN, INSTANCE_PREFIX, LOG_HELPER,
};

pub fn class_header(class: &ClassDescriptor, fields: &[FieldRecord]) -> String {
    let mut out = format!("// class {}\n", class.name);
    out.push_str(&format!("fn {LOG_HELPER}(log_line) {{\n    {HOST_LOG_FN}(log_line);\n}}\n\n"));
    out.push_str(&format!("fn {CONSTRUCTOR_FN}() {{\n"));
    for field in fields {
        out.push_str(&format!(
            "    {INSTANCE_PREFIX}{} = {};\n",
            field.name,
            field.initializer_or_null()
        ));
    }
    out.push_str("}\n");
    out
}

pub fn synthesize(text: &str, class: &ClassDescriptor, fields: &[FieldRecord]) -> String {
    let header = class_header(class, fields);
    let Some(opening) = find_class_opening(text) else {
        return format!("{header}\n{text}");
    };
    let mut out = String::with_capacity(text.len() + header.len());
    out.push_str(&text[..opening.clause.start]);
    out.push_str(&header);
    match opening.close {
        Some(close) => {
            out.push_str(&text[opening.clause.end..close]);
            out.push_str(&text[close + 1..]);
        }
        None => out.push_str(&text[opening.clause.end..]),
    }
    out
}
