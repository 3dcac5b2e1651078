// Records shared between the transform passes and the execution host.
use serde::Serialize;

/// Placeholder used when the source has no class declaration.
pub const PLACEHOLDER_CLASS: &str = "UnknownClass";

/// Prefix that scopes a reference to the owning instance.
pub const INSTANCE_PREFIX: &str = "this.";

/// Global slot the bootstrap publishes the instance to.
pub const INSTANCE_SLOT: &str = "instance";

/// Map key carrying the class name on the published instance.
pub const CLASS_TAG: &str = "__class";

/// Target-language value assigned to fields declared without an initializer.
pub const NULL_LITERAL: &str = "()";

// Names the emitted program and the host agree on.
pub const LOG_HELPER: &str = "logToConsole";
pub const HOST_LOG_FN: &str = "host_log";
pub const CONSTRUCTOR_FN: &str = "constructor";
pub const START_HOOK: &str = "Start";
pub const UPDATE_HOOK: &str = "Update";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDescriptor {
    pub name: String,
}

impl ClassDescriptor {
    pub fn placeholder() -> Self {
        Self { name: PLACEHOLDER_CLASS.to_string() }
    }
    pub fn is_placeholder(&self) -> bool {
        self.name == PLACEHOLDER_CLASS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRecord {
    pub name: String,
    pub initializer: Option<String>, // None → NULL_LITERAL
}

impl FieldRecord {
    pub fn initializer_or_null(&self) -> &str {
        self.initializer.as_deref().unwrap_or(NULL_LITERAL)
    }
}

/// Final text handed to the execution host, together with what produced it.
#[derive(Debug, Clone, Serialize)]
pub struct EmittedProgram {
    pub class: ClassDescriptor,
    pub fields: Vec<FieldRecord>,
    pub methods: Vec<String>,
    pub source: String,
}
