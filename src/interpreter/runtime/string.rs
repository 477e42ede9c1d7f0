// File: src/interpreter/runtime/string.rs
//
// String and output builtins. `print`/`println` are the language's only
// output channel; everything else is pure string manipulation.

use super::{expect_arity, Builtin, BuiltinEnv};
use crate::errors::LangError;
use crate::interpreter::{OutputSink, Value};

/// Registers the string functions in the environment.
pub fn register(env: &mut BuiltinEnv) {
    env.insert("print".to_string(), Builtin::Function(print));
    env.insert("println".to_string(), Builtin::Function(println));
    env.insert("len".to_string(), Builtin::Function(len));
    env.insert("substr".to_string(), Builtin::Function(substr));
    env.insert("upper".to_string(), Builtin::Function(upper));
    env.insert("lower".to_string(), Builtin::Function(lower));
}

fn joined(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Writes all arguments space-separated, without a trailing newline.
fn print(out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    out.write(&joined(args));
    Ok(Value::Null)
}

/// Writes all arguments space-separated, followed by a newline.
fn println(out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    out.writeln(&joined(args));
    Ok(Value::Null)
}

// Non-string values are measured by their textual form.
fn len(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("len", args, 1)?;
    let count = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::Null => 0,
        other => other.to_string().chars().count(),
    };
    Ok(Value::Int(count as i64))
}

fn index_arg(name: &str, value: &Value) -> Result<i64, Box<LangError>> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(Box::new(LangError::type_error(format!(
            "Function '{}' expects an integer index, got {}",
            name,
            other.type_name()
        )))),
    }
}

/// `substr(s, start)` or `substr(s, start, end)` with Python-style
/// negative indices; out-of-range indices clamp instead of erroring.
fn substr(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    if args.len() != 2 && args.len() != 3 {
        return Err(Box::new(LangError::runtime(format!(
            "Function 'substr' expects 2 or 3 arguments, got {}",
            args.len()
        ))));
    }

    let source = match &args[0] {
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let chars: Vec<char> = source.chars().collect();
    let length = chars.len() as i64;

    let mut start = index_arg("substr", &args[1])?;
    if start < 0 {
        start = (length + start).max(0);
    }
    let start = start.clamp(0, length) as usize;

    let end = match args.get(2) {
        Some(value) => {
            let mut end = index_arg("substr", value)?;
            if end < 0 {
                end = (length + end).max(0);
            }
            (end.clamp(0, length) as usize).max(start)
        }
        None => length as usize,
    };

    Ok(Value::Str(chars[start..end].iter().collect()))
}

fn upper(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("upper", args, 1)?;
    let text = match &args[0] {
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(Value::Str(text.to_uppercase()))
}

fn lower(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("lower", args, 1)?;
    let text = match &args[0] {
        Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(Value::Str(text.to_lowercase()))
}
