// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the Quill programming language.
//
// Execution order is fixed: load imported modules (best-effort), evaluate
// top-level bindings, then call `main`. Builtins shadow user functions at
// call sites; variables resolve frame → globals → builtin constants.

mod environment;
pub mod runtime;
mod value;

pub use environment::{Environment, Frame, ScopeKind};
pub use value::Value;

use crate::ast::{CallExpr, Expr, FunctionDef, Program, ReturnType, Stmt};
use crate::errors::{find_closest_match, ErrorKind, LangError};
use ahash::AHashMap;
use runtime::{load_module, Builtin, BuiltinEnv};
use std::io::Write as _;
use std::sync::{Arc, Mutex};

/// Ceiling on simultaneously active user-function calls.
pub const MAX_CALL_DEPTH: usize = 1000;

/// Stack size for the evaluation thread. Every interpreted frame costs
/// several host frames (`call_user_function` → `exec_body` → `eval_call`),
/// which outgrows a default thread stack well before the call-depth
/// ceiling fires.
const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Where builtin output goes. Production runs write straight to stdout;
/// tests swap in a shared buffer to capture what a program printed.
pub struct OutputSink {
    buffer: Option<Arc<Mutex<Vec<u8>>>>,
}

impl OutputSink {
    pub fn stdout() -> Self {
        OutputSink { buffer: None }
    }

    pub fn captured(buffer: Arc<Mutex<Vec<u8>>>) -> Self {
        OutputSink { buffer: Some(buffer) }
    }

    pub fn write(&mut self, text: &str) {
        match &self.buffer {
            Some(buffer) => {
                let mut guard = buffer.lock().unwrap();
                guard.extend_from_slice(text.as_bytes());
            }
            None => {
                print!("{}", text);
                let _ = std::io::stdout().flush();
            }
        }
    }

    pub fn writeln(&mut self, text: &str) {
        match &self.buffer {
            Some(buffer) => {
                let mut guard = buffer.lock().unwrap();
                guard.extend_from_slice(text.as_bytes());
                guard.push(b'\n');
            }
            None => {
                println!("{}", text);
                let _ = std::io::stdout().flush();
            }
        }
    }
}

pub struct Interpreter {
    env: BuiltinEnv,
    scopes: Environment,
    output: OutputSink,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            env: BuiltinEnv::new(),
            scopes: Environment::new(),
            output: OutputSink::stdout(),
            max_call_depth: MAX_CALL_DEPTH,
        }
    }

    /// Redirect builtin output into a shared buffer.
    pub fn set_output(&mut self, buffer: Arc<Mutex<Vec<u8>>>) {
        self.output = OutputSink::captured(buffer);
    }

    /// Run a program to completion and produce its process exit code:
    /// `main`'s numeric result truncated to i32, 0 for anything else,
    /// 1 on error, 130 on interruption.
    pub fn run(&mut self, program: &Program) -> i32 {
        match self.execute(program) {
            Ok(Value::Int(n)) => n as i32,
            Ok(Value::Float(n)) => n as i32,
            Ok(_) => 0,
            Err(err) if err.kind == ErrorKind::Interrupted => {
                eprintln!("\nProgram interrupted by user");
                130
            }
            Err(err) => {
                eprintln!("{}", err);
                1
            }
        }
    }

    /// Execute a program and return what `main` evaluated to.
    ///
    /// Evaluation runs on its own thread with a stack sized for
    /// `MAX_CALL_DEPTH` frames of interpreter recursion.
    pub fn execute(&mut self, program: &Program) -> Result<Value, Box<LangError>> {
        std::thread::scope(|scope| {
            let handle = std::thread::Builder::new()
                .name("quill-eval".to_string())
                .stack_size(EVAL_STACK_SIZE)
                .spawn_scoped(scope, || self.execute_program(program));
            match handle {
                Ok(handle) => handle.join().unwrap_or_else(|_| {
                    Err(Box::new(LangError::runtime(
                        "Evaluation thread panicked".to_string(),
                    )))
                }),
                Err(err) => Err(Box::new(LangError::runtime(format!(
                    "Failed to start evaluation thread: {}",
                    err
                )))),
            }
        })
    }

    fn execute_program(&mut self, program: &Program) -> Result<Value, Box<LangError>> {
        if program.functions.is_empty() {
            return Err(Box::new(LangError::runtime(
                "No functions defined in program".to_string(),
            )));
        }

        // Imports are best-effort; a missing module is a warning, not a
        // failure.
        for import in &program.imports {
            if let Err(err) = load_module(&import.module, &mut self.env) {
                eprintln!(
                    "Warning: Failed to load module '{}': {}",
                    import.module, err.message
                );
            }
        }

        for binding in &program.globals {
            let value = self.eval_expr(program, &binding.value)?;
            self.scopes.define(binding.name.clone(), value);
        }

        let main_fn = find_function(program, "main").ok_or_else(|| {
            Box::new(
                LangError::runtime("No `main` function found".to_string()).with_help(
                    "Every program needs an `int main()` entry point".to_string(),
                ),
            )
        })?;

        self.call_user_function(program, main_fn, Vec::new())
    }

    fn call_user_function(
        &mut self,
        program: &Program,
        fn_def: &FunctionDef,
        args: Vec<Value>,
    ) -> Result<Value, Box<LangError>> {
        if self.scopes.depth() >= self.max_call_depth {
            return Err(Box::new(LangError::runtime(format!(
                "Maximum call depth exceeded ({})",
                self.max_call_depth
            ))));
        }
        if args.len() != fn_def.params.len() {
            return Err(Box::new(LangError::runtime(format!(
                "Function '{}' expects {} arguments, got {}",
                fn_def.name,
                fn_def.params.len(),
                args.len()
            ))));
        }

        let mut locals = AHashMap::new();
        for (param, arg) in fn_def.params.iter().zip(args) {
            locals.insert(param.name.clone(), arg);
        }
        self.scopes.push_frame(Frame::new(fn_def.name.clone(), locals));

        let result = self.exec_body(program, fn_def);
        self.scopes.pop_frame();

        result.map_err(|err| {
            Box::new(err.with_context(&format!("Error in function '{}'", fn_def.name)))
        })
    }

    fn exec_body(
        &mut self,
        program: &Program,
        fn_def: &FunctionDef,
    ) -> Result<Value, Box<LangError>> {
        for stmt in &fn_def.body {
            let value = self.exec_stmt(program, stmt)?;
            if matches!(stmt, Stmt::Return(_)) {
                return Ok(value);
            }
        }

        // Fall-through: int functions yield 0, void functions nothing
        Ok(match fn_def.return_type {
            ReturnType::Int => Value::Int(0),
            ReturnType::Void => Value::Null,
        })
    }

    fn exec_stmt(&mut self, program: &Program, stmt: &Stmt) -> Result<Value, Box<LangError>> {
        match stmt {
            Stmt::Call(call) => self.eval_call(program, call),
            Stmt::Return(None) => Ok(Value::Null),
            Stmt::Return(Some(expr)) => self.eval_expr(program, expr),
            Stmt::Let(binding) => {
                let value = self.eval_expr(program, &binding.value)?;
                self.scopes.define(binding.name.clone(), value.clone());
                Ok(value)
            }
        }
    }

    fn eval_expr(&mut self, program: &Program, expr: &Expr) -> Result<Value, Box<LangError>> {
        match expr {
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Var(name) => self.lookup_variable(name),
            Expr::Call(call) => self.eval_call(program, call),
            Expr::Binary { left, op, right } => {
                let left = self.eval_expr(program, left)?;
                let right = self.eval_expr(program, right)?;
                apply_binary(op, &left, &right)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(program, operand)?;
                apply_unary(op, &operand)
            }
        }
    }

    fn lookup_variable(&self, name: &str) -> Result<Value, Box<LangError>> {
        if let Some(value) = self.scopes.get(name) {
            return Ok(value);
        }
        // Builtin constants (pi, e) sit behind both variable scopes
        if let Some(Builtin::Const(value)) = self.env.get(name) {
            return Ok(value.clone());
        }

        let mut candidates = self.scopes.visible_names();
        candidates.extend(self.env.iter().filter_map(|(name, builtin)| {
            matches!(builtin, Builtin::Const(_)).then(|| name.clone())
        }));

        let mut err = LangError::undefined_variable(name);
        if let Some(closest) = find_closest_match(name, candidates.iter().map(String::as_str)) {
            err = err.with_suggestion(closest.to_string());
        }
        Err(Box::new(err))
    }

    fn eval_args(
        &mut self,
        program: &Program,
        call: &CallExpr,
    ) -> Result<Vec<Value>, Box<LangError>> {
        let mut args = Vec::with_capacity(call.args.len());
        for (i, arg) in call.args.iter().enumerate() {
            let value = self.eval_expr(program, arg).map_err(|err| {
                Box::new(err.with_context(&format!(
                    "Error evaluating argument {} of function '{}'",
                    i + 1,
                    call.name
                )))
            })?;
            args.push(value);
        }
        Ok(args)
    }

    fn eval_call(&mut self, program: &Program, call: &CallExpr) -> Result<Value, Box<LangError>> {
        // Builtins take precedence over user functions of the same name
        if let Some(Builtin::Function(native)) = self.env.get(call.name.as_str()) {
            let native = *native;
            let args = self.eval_args(program, call)?;
            return native(&mut self.output, &args).map_err(|err| {
                Box::new(err.with_context(&format!("Error calling function '{}'", call.name)))
            });
        }

        if let Some(fn_def) = find_function(program, &call.name) {
            let args = self.eval_args(program, call)?;
            return self.call_user_function(program, fn_def, args);
        }

        let mut candidates: Vec<String> = self
            .env
            .iter()
            .filter_map(|(name, builtin)| {
                matches!(builtin, Builtin::Function(_)).then(|| name.clone())
            })
            .collect();
        candidates.extend(program.functions.iter().map(|f| f.name.clone()));

        let mut err = LangError::undefined_function(&call.name);
        if let Some(closest) = find_closest_match(&call.name, candidates.iter().map(String::as_str))
        {
            err = err.with_suggestion(closest.to_string());
        }
        Err(Box::new(err))
    }
}

fn find_function<'a>(program: &'a Program, name: &str) -> Option<&'a FunctionDef> {
    program.functions.iter().find(|f| f.name == name)
}

fn int_overflow(op: &str) -> Box<LangError> {
    Box::new(LangError::runtime(format!("Integer overflow in '{}'", op)))
}

fn apply_binary(op: &str, left: &Value, right: &Value) -> Result<Value, Box<LangError>> {
    match op {
        "+" => {
            // Either side being a string makes `+` concatenation
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                return Ok(Value::Str(format!("{}{}", left, right)));
            }
            match (left, right) {
                (Value::Int(a), Value::Int(b)) => {
                    a.checked_add(*b).map(Value::Int).ok_or_else(|| int_overflow("+"))
                }
                _ => both_numeric(left, right, op)
                    .map(|(a, b)| Value::Float(a + b))
                    .map_err(|_| type_error_add(left, right)),
            }
        }
        "-" => match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_sub(*b).map(Value::Int).ok_or_else(|| int_overflow("-"))
            }
            _ => both_numeric(left, right, op)
                .map(|(a, b)| Value::Float(a - b))
                .map_err(|_| {
                    Box::new(LangError::type_error(format!(
                        "Cannot subtract {} from {}",
                        right.type_name(),
                        left.type_name()
                    )))
                }),
        },
        "*" => match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_mul(*b).map(Value::Int).ok_or_else(|| int_overflow("*"))
            }
            _ => both_numeric(left, right, op)
                .map(|(a, b)| Value::Float(a * b))
                .map_err(|_| {
                    Box::new(LangError::type_error(format!(
                        "Cannot multiply {} and {}",
                        left.type_name(),
                        right.type_name()
                    )))
                }),
        },
        "/" => {
            let (a, b) = both_numeric(left, right, op).map_err(|_| {
                Box::new(LangError::type_error(format!(
                    "Cannot divide {} by {}",
                    left.type_name(),
                    right.type_name()
                )))
            })?;
            if b == 0.0 {
                return Err(Box::new(LangError::runtime("Division by zero".to_string())));
            }
            Ok(Value::Float(a / b))
        }
        "%" => {
            match (left, right) {
                (Value::Int(_), Value::Int(0)) => {
                    Err(Box::new(LangError::runtime("Modulo by zero".to_string())))
                }
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(floored_rem(*a, *b))),
                _ => {
                    let (a, b) = both_numeric(left, right, op).map_err(|_| {
                        Box::new(LangError::type_error(format!(
                            "Cannot get modulo of {} and {}",
                            left.type_name(),
                            right.type_name()
                        )))
                    })?;
                    if b == 0.0 {
                        return Err(Box::new(LangError::runtime("Modulo by zero".to_string())));
                    }
                    Ok(Value::Float(a - b * (a / b).floor()))
                }
            }
        }
        other => Err(Box::new(LangError::runtime(format!(
            "Unknown binary operator: {}",
            other
        )))),
    }
}

fn apply_unary(op: &str, operand: &Value) -> Result<Value, Box<LangError>> {
    match op {
        "-" => match operand {
            Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| int_overflow("-")),
            Value::Float(n) => Ok(Value::Float(-n)),
            other => Err(Box::new(LangError::type_error(format!(
                "Cannot negate {}",
                other.type_name()
            )))),
        },
        "+" => match operand {
            Value::Int(_) | Value::Float(_) => Ok(operand.clone()),
            other => Err(Box::new(LangError::type_error(format!(
                "Cannot apply unary plus to {}",
                other.type_name()
            )))),
        },
        other => Err(Box::new(LangError::runtime(format!(
            "Unknown unary operator: {}",
            other
        )))),
    }
}

/// Floored remainder: the result takes the divisor's sign. `checked_rem`
/// covers the `i64::MIN % -1` overflow (the true remainder is 0), and the
/// sign adjustment cannot overflow because it only fires when the signs of
/// the remainder and divisor differ.
pub(crate) fn floored_rem(a: i64, b: i64) -> i64 {
    let r = a.checked_rem(b).unwrap_or(0);
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

fn both_numeric(left: &Value, right: &Value, _op: &str) -> Result<(f64, f64), ()> {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(()),
    }
}

fn type_error_add(left: &Value, right: &Value) -> Box<LangError> {
    Box::new(LangError::type_error(format!(
        "Cannot add {} and {}",
        left.type_name(),
        right.type_name()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_concatenates_when_either_side_is_a_string() {
        let result = apply_binary("+", &Value::Str("a".to_string()), &Value::Int(1)).unwrap();
        assert_eq!(result, Value::Str("a1".to_string()));

        let result = apply_binary("+", &Value::Int(2), &Value::Str("x".to_string())).unwrap();
        assert_eq!(result, Value::Str("2x".to_string()));

        let result =
            apply_binary("+", &Value::Float(5.0), &Value::Str("!".to_string())).unwrap();
        assert_eq!(result, Value::Str("5.0!".to_string()));
    }

    #[test]
    fn test_plus_on_nulls_is_a_type_error() {
        let err = apply_binary("+", &Value::Int(1), &Value::Null).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("Cannot add int and null"));
    }

    #[test]
    fn test_division_always_yields_float() {
        assert_eq!(apply_binary("/", &Value::Int(10), &Value::Int(4)).unwrap(), Value::Float(2.5));
        assert_eq!(apply_binary("/", &Value::Int(10), &Value::Int(5)).unwrap(), Value::Float(2.0));
    }

    #[test]
    fn test_division_and_modulo_by_zero() {
        let err = apply_binary("/", &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.message, "Division by zero");

        let err = apply_binary("%", &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err.message, "Modulo by zero");

        let err = apply_binary("%", &Value::Float(1.0), &Value::Float(0.0)).unwrap_err();
        assert_eq!(err.message, "Modulo by zero");
    }

    #[test]
    fn test_modulo_sign_follows_divisor() {
        assert_eq!(apply_binary("%", &Value::Int(-7), &Value::Int(3)).unwrap(), Value::Int(2));
        assert_eq!(apply_binary("%", &Value::Int(7), &Value::Int(-3)).unwrap(), Value::Int(-2));
    }

    #[test]
    fn test_modulo_extremes_do_not_overflow() {
        // Small dividend, huge divisor: the sign adjustment must not wrap
        assert_eq!(
            apply_binary("%", &Value::Int(5), &Value::Int(i64::MAX)).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            apply_binary("%", &Value::Int(-5), &Value::Int(i64::MAX)).unwrap(),
            Value::Int(i64::MAX - 5)
        );
        // i64::MIN % -1 overflows the bare remainder; the true result is 0
        assert_eq!(
            apply_binary("%", &Value::Int(i64::MIN), &Value::Int(-1)).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn test_integer_arithmetic_is_overflow_checked() {
        let err = apply_binary("+", &Value::Int(i64::MAX), &Value::Int(1)).unwrap_err();
        assert!(err.message.contains("overflow"));

        let err = apply_unary("-", &Value::Int(i64::MIN)).unwrap_err();
        assert!(err.message.contains("overflow"));
    }

    #[test]
    fn test_unary_minus_rejects_strings() {
        let err = apply_unary("-", &Value::Str("x".to_string())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.message.contains("Cannot negate string"));
    }

    #[test]
    fn test_unknown_operators_fail_closed() {
        assert!(apply_binary("&", &Value::Int(1), &Value::Int(2)).is_err());
        assert!(apply_unary("!", &Value::Int(1)).is_err());
    }
}
