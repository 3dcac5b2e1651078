//! Rhai implementation of the compile-and-run capability.
use std::rc::Rc;

use rhai::{CallFnOptions, Dynamic, Engine, Map, Scope, AST};

use super::{HostConfig, HostError, Instance, Runtime};
use crate::console::SharedConsole;
use crate::ir::{EmittedProgram, CLASS_TAG, HOST_LOG_FN, INSTANCE_SLOT};

// How an unset field reads when logged.
const NULL_TEXT: &str = "null";

#[derive(Debug, Clone)]
pub struct RhaiRuntime {
    pub max_operations: u64,
    pub strict_variables: bool,
}

impl Default for RhaiRuntime {
    fn default() -> Self {
        Self::from_config(&HostConfig::default())
    }
}

impl RhaiRuntime {
    pub fn from_config(config: &HostConfig) -> Self {
        Self {
            max_operations: config.max_operations,
            strict_variables: config.strict_variables,
        }
    }

    // Fresh engine per run; all program output goes to the console.
    fn engine(&self, console: &SharedConsole) -> Engine {
        let mut engine = Engine::new();
        engine.set_strict_variables(self.strict_variables);
        engine.set_max_operations(self.max_operations);

        let sink = Rc::clone(console);
        engine.register_fn(HOST_LOG_FN, move |value: Dynamic| {
            let text = match value.is_unit() {
                true => NULL_TEXT.to_string(),
                false => value.to_string(),
            };
            sink.borrow_mut().log(text);
        });
        let sink = Rc::clone(console);
        engine.on_print(move |text| sink.borrow_mut().log(text));
        let sink = Rc::clone(console);
        engine.on_debug(move |text, _source, _pos| sink.borrow_mut().log(text));
        engine
    }
}

impl Runtime for RhaiRuntime {
    type Instance = RhaiInstance;

    fn launch(&self, program: &EmittedProgram, console: &SharedConsole) -> Result<RhaiInstance, HostError> {
        let engine = self.engine(console);
        let ast = engine
            .compile(&program.source)
            .map_err(|e| HostError::Compile(e.to_string()))?;

        let mut scope = Scope::new();
        engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|e| HostError::Execution(e.to_string()))?;

        let instance = scope
            .get_value::<Map>(INSTANCE_SLOT)
            .ok_or(HostError::MissingInstance { slot: INSTANCE_SLOT })?;
        let class = instance
            .get(CLASS_TAG)
            .map(|tag| tag.to_string())
            .unwrap_or_else(|| program.class.name.clone());

        Ok(RhaiInstance {
            engine,
            ast,
            scope,
            this: Dynamic::from_map(instance),
            class,
        })
    }
}

/// The published object map plus the engine and AST its methods live in.
pub struct RhaiInstance {
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
    this: Dynamic,
    class: String,
}

impl RhaiInstance {
    pub fn field(&self, name: &str) -> Option<Dynamic> {
        self.this.read_lock::<Map>()?.get(name).cloned()
    }
}

impl Instance for RhaiInstance {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn has_hook(&self, hook: &str) -> bool {
        self.ast
            .iter_functions()
            .any(|f| f.name == hook && f.params.is_empty())
    }

    fn call_hook(&mut self, hook: &str) -> Result<(), HostError> {
        let options = CallFnOptions::new()
            .eval_ast(false)
            .rewind_scope(true)
            .bind_this_ptr(&mut self.this);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut self.scope, &self.ast, hook, ())
            .map(|_| ())
            .map_err(|e| HostError::Hook {
                hook: hook.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Console;
    use crate::transform::{transpile, TranspileOptions};

    fn launch(source: &str) -> (Result<RhaiInstance, HostError>, SharedConsole) {
        let console = Console::new().shared();
        let program = transpile(source, &TranspileOptions::default());
        (RhaiRuntime::default().launch(&program, &console), console)
    }

    fn int_field(instance: &RhaiInstance, name: &str) -> Option<i64> {
        instance.field(name).and_then(|v| v.as_int().ok())
    }

    #[test]
    fn bootstrap_runs_start_and_update_once() {
        let (instance, console) = launch(
            "class Counter {\n    int count = 0;\n    void Start() { Debug.Log(\"hello\"); }\n    void Update() { count = count + 1; Debug.Log(count); }\n}",
        );
        let instance = instance.unwrap();
        assert_eq!(instance.class_name(), "Counter");
        assert_eq!(int_field(&instance, "count"), Some(1));
        assert_eq!(console.borrow().lines(), vec!["hello", "1"]);
    }

    #[test]
    fn hooks_mutate_the_published_instance() {
        let (instance, _console) = launch("class C { int n = 10; void Update() { n = n + 5; } }");
        let mut instance = instance.unwrap();
        assert!(instance.has_hook("Update"));
        assert!(!instance.has_hook("Start"));
        instance.call_hook("Update").unwrap();
        assert_eq!(int_field(&instance, "n"), Some(20));
    }

    #[test]
    fn unset_fields_start_as_unit() {
        let (instance, _console) = launch("class C { string label; }");
        let instance = instance.unwrap();
        assert!(instance.field("label").unwrap().is_unit());
    }

    #[test]
    fn unset_fields_log_as_null() {
        let (instance, console) = launch("class C { string label; void Start() { Debug.Log(label); } }");
        assert!(instance.is_ok());
        assert_eq!(console.borrow().lines(), vec!["null"]);
    }

    #[test]
    fn floating_fields_divide_as_floats() {
        let (instance, console) = launch(
            "class A { float half = 1; void Start() { half = half / 2; Debug.Log(half); } }",
        );
        let instance = instance.unwrap();
        assert_eq!(instance.field("half").and_then(|v| v.as_float().ok()), Some(0.5));
        assert_eq!(console.borrow().lines(), vec!["0.5"]);
    }

    #[test]
    fn locals_may_shadow_fields() {
        let (instance, console) = launch(
            "class A { int count = 0; void Start() { int count = 5; Debug.Log(count); } }",
        );
        let instance = instance.unwrap();
        assert_eq!(int_field(&instance, "count"), Some(0));
        assert_eq!(console.borrow().lines(), vec!["5"]);
    }

    #[test]
    fn syntax_errors_surface_as_compile_errors() {
        let (result, console) = launch("class Broken { void Start() { if ( { } }");
        assert!(matches!(result, Err(HostError::Compile(_))));
        assert!(console.borrow().entries().is_empty());
    }

    #[test]
    fn top_level_faults_surface_as_execution_errors() {
        let (result, _console) = launch("class Boom { int n = 1; void Start() { n = n / 0; } }");
        assert!(matches!(result, Err(HostError::Execution(_))));
    }

    #[test]
    fn print_is_routed_to_console() {
        let (instance, console) = launch("class P { void Start() { print(\"via print\"); } }");
        assert!(instance.is_ok());
        assert_eq!(console.borrow().lines(), vec!["via print"]);
    }
}
