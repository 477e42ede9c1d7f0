// File: src/interpreter/runtime/mod.rs
//
// Builtin runtime modules for the Quill programming language.
//
// Each module exposes a single `register` entry point that takes the
// mutable name→value environment and installs invocable builtins and
// constants. The loader is a fixed capability registry: only known module
// names resolve, and callers treat failures as warnings — imports are
// best-effort enrichment, never required structure.

pub mod math;
pub mod string;
pub mod time;

use super::{OutputSink, Value};
use crate::errors::{ErrorKind, LangError, SourceLocation};
use ahash::AHashMap;

/// An invocable builtin. Arguments arrive fully evaluated, positionally.
pub type NativeFn = fn(&mut OutputSink, &[Value]) -> Result<Value, Box<LangError>>;

/// What a runtime module may install under a name.
pub enum Builtin {
    Function(NativeFn),
    Const(Value),
}

/// The builtin environment mapping: name → invocable or constant.
pub type BuiltinEnv = AHashMap<String, Builtin>;

/// Resolve a module by name and run its registration entry point.
pub fn load_module(name: &str, env: &mut BuiltinEnv) -> Result<(), LangError> {
    if name.is_empty() {
        return Err(module_error("Module name cannot be empty".to_string()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(module_error(format!("Invalid module name: {}", name)));
    }

    match name {
        "math" => math::register(env),
        "string" => string::register(env),
        "time" => time::register(env),
        _ => return Err(module_error(format!("Module '{}' not found", name))),
    }

    Ok(())
}

fn module_error(message: String) -> LangError {
    LangError::new(ErrorKind::ModuleLoad, message, SourceLocation::unknown())
}

/// Arity check shared by the builtin implementations.
pub(crate) fn expect_arity(
    name: &str,
    args: &[Value],
    expected: usize,
) -> Result<(), Box<LangError>> {
    if args.len() != expected {
        return Err(Box::new(LangError::runtime(format!(
            "Function '{}' expects {} arguments, got {}",
            name,
            expected,
            args.len()
        ))));
    }
    Ok(())
}

/// Numeric view of a builtin argument, or a type error naming the builtin.
pub(crate) fn number(name: &str, value: &Value) -> Result<f64, Box<LangError>> {
    value.as_f64().ok_or_else(|| {
        Box::new(LangError::type_error(format!(
            "Function '{}' expects a numeric argument, got {}",
            name,
            value.type_name()
        )))
    })
}
