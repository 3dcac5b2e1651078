//! Pattern-driven C#-subset → Rhai rewriter.
//!
//! Each pass takes the previous pass's text and returns new text; the only
//! state carried between passes is the class name, the extracted fields and
//! the method names. Pass order matters:
//! - strip imports/attributes and normalize tokens
//! - lift fields out of the class body, rewrite method headers
//! - splice the class header (logging helper + constructor)
//! - translate logging calls, then qualify fields, then method calls
//! - append the bootstrap
//!
//! Unsupported syntax is carried through unchanged; nothing here fails.
pub mod lexical;
pub mod fields;
pub mod normalize;
pub mod constructor;
pub mod logging;
pub mod qualify;
pub mod bootstrap;

use serde::Serialize;

use crate::ir::EmittedProgram;
use lexical::Lexed;
pub use qualify::LiteralPolicy;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TranspileOptions {
    pub literal_policy: LiteralPolicy,
}

pub fn transpile(source: &str, options: &TranspileOptions) -> EmittedProgram {
    let text = fields::strip_source_only(source);
    let text = normalize::normalize(&text);
    let class = fields::detect_class(&text);

    let field_depth = class_body_depth(&text);
    let extraction = fields::extract_fields(&text, field_depth);
    let (text, methods) = fields::rewrite_method_headers(&extraction.text);

    let text = constructor::synthesize(&text, &class, &extraction.fields);
    let text = logging::translate_logging(&text, &extraction.fields);
    let text = qualify::qualify_fields(&text, &extraction.fields, options.literal_policy);
    let text = qualify::qualify_method_calls(&text, &methods);
    let source = bootstrap::emit_bootstrap(&text, &class);

    tracing::debug!(
        class = %class.name,
        fields = extraction.fields.len(),
        methods = methods.len(),
        "transpiled"
    );
    EmittedProgram {
        class,
        fields: extraction.fields,
        methods: methods.into_iter().collect(),
        source,
    }
}

// Fields live directly inside the first class; without one, at top level.
fn class_body_depth(text: &str) -> usize {
    match fields::find_class_opening(text) {
        Some(opening) => Lexed::new(text).brace_depths()[opening.clause.end],
        None => 0,
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FieldRecord;
    use pretty_assertions::assert_eq;

    const COUNTER: &str = "\
using UnityEngine;

public class Counter : MonoBehaviour
{
    private int count = 0;
    public string label;

    void Start()
    {
        Debug.Log(\"hello\");
    }

    void Update()
    {
        count = count + 1;
        Debug.Log(count);
    }
}
";

    #[test]
    fn counter_script_end_to_end() {
        let program = transpile(COUNTER, &TranspileOptions::default());
        assert_eq!(program.class.name, "Counter");
        assert_eq!(program.fields, vec![
            FieldRecord { name: "count".into(), initializer: Some("0".into()) },
            FieldRecord { name: "label".into(), initializer: None },
        ]);
        assert_eq!(program.methods, vec!["Start", "Update"]);
        assert_eq!(program.source, "\n\
// class Counter
fn logToConsole(log_line) {
    host_log(log_line);
}

fn constructor() {
    this.count = 0;
    this.label = ();
}


    fn Start() {
        this.logToConsole(\"hello\");
    }

    fn Update() {
        this.count = this.count + 1;
        this.logToConsole(this.count);
    }

let instance = #{ \"__class\": \"Counter\" };
instance.constructor();
if is_def_fn(\"Start\", 0) { instance.Start(); }
if is_def_fn(\"Update\", 0) { instance.Update(); }
");
    }

    #[test]
    fn declarations_do_not_survive_extraction() {
        let program = transpile(COUNTER, &TranspileOptions::default());
        assert!(!program.source.contains("int count"));
        assert!(!program.source.contains("string label"));
        assert!(!program.source.contains("using"));
    }

    #[test]
    fn initializers_referencing_other_fields_are_qualified() {
        let src = "class A {\n    int a = 2;\n    int b = a * 3;\n}";
        let program = transpile(src, &TranspileOptions::default());
        assert!(program.source.contains("    this.b = this.a * 3;\n"));
    }

    #[test]
    fn bootstrap_is_appended_once_for_many_classes() {
        let src = "class First { void Start() { } }\nclass Second { void Update() { } }";
        let program = transpile(src, &TranspileOptions::default());
        assert_eq!(program.class.name, "First");
        assert_eq!(program.source.matches("let instance =").count(), 1);
        assert!(program.source.contains("\"__class\": \"First\""));
    }

    #[test]
    fn placeholder_class_when_none_declared() {
        let program = transpile("int hits = 3;\nvoid Update() { hits++; }", &TranspileOptions::default());
        assert!(program.class.is_placeholder());
        assert!(program.source.starts_with("// class UnknownClass\n"));
        assert!(program.source.contains("fn Update() { this.hits += 1; }"));
        assert!(program.source.contains("\"__class\": \"UnknownClass\""));
    }

    #[test]
    fn legacy_policy_qualifies_quoted_field_names() {
        let src = "class A { int count; void Start() { Debug.Log(\"count\"); } }";
        let exempt = transpile(src, &TranspileOptions::default());
        assert!(exempt.source.contains("this.logToConsole(\"count\");"));
        let legacy = transpile(src, &TranspileOptions { literal_policy: LiteralPolicy::Qualify });
        assert!(legacy.source.contains("this.logToConsole(\"this.count\");"));
    }

    #[test]
    fn methods_calling_methods_use_the_instance() {
        let src = "class A { void Jump() { } void Update() { Jump(); } }";
        let program = transpile(src, &TranspileOptions::default());
        assert!(program.source.contains("fn Update() { this.Jump(); }"));
    }
}
