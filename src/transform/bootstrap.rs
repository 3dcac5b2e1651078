use crate::ir::{ClassDescriptor, CLASS_TAG, CONSTRUCTOR_FN, INSTANCE_SLOT, START_HOOK, UPDATE_HOOK};

/// Trailer that builds the instance, publishes it to the well-known slot and
/// runs the lifecycle hooks the program defines.
pub fn bootstrap(class: &ClassDescriptor) -> String {
    let slot = INSTANCE_SLOT;
    let mut out = format!("let {slot} = #{{ \"{CLASS_TAG}\": \"{}\" }};\n", class.name);
    out.push_str(&format!("{slot}.{CONSTRUCTOR_FN}();\n"));
    for hook in [START_HOOK, UPDATE_HOOK] {
        out.push_str(&format!("if is_def_fn(\"{hook}\", 0) {{ {slot}.{hook}(); }}\n"));
    }
    out
}

pub fn emit_bootstrap(text: &str, class: &ClassDescriptor) -> String {
    format!("{}\n\n{}", text.trim_end(), bootstrap(class))
}
