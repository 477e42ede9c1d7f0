// File: src/interpreter/runtime/math.rs
//
// Math builtins and constants. Integer pairs stay integral where the
// operation allows it; anything else promotes to float.

use super::{expect_arity, number, Builtin, BuiltinEnv};
use crate::errors::LangError;
use crate::interpreter::{OutputSink, Value};

/// Registers the math functions and constants in the environment.
pub fn register(env: &mut BuiltinEnv) {
    // Arithmetic
    env.insert("add".to_string(), Builtin::Function(add));
    env.insert("sub".to_string(), Builtin::Function(sub));
    env.insert("mul".to_string(), Builtin::Function(mul));
    env.insert("div".to_string(), Builtin::Function(div));
    env.insert("mod".to_string(), Builtin::Function(modulo));
    env.insert("pow".to_string(), Builtin::Function(pow));

    // Unary
    env.insert("neg".to_string(), Builtin::Function(neg));
    env.insert("abs".to_string(), Builtin::Function(abs));

    // Comparison
    env.insert("min".to_string(), Builtin::Function(min));
    env.insert("max".to_string(), Builtin::Function(max));

    // Math functions
    env.insert("sqrt".to_string(), Builtin::Function(sqrt));
    env.insert("log".to_string(), Builtin::Function(log));
    env.insert("ln".to_string(), Builtin::Function(ln));
    env.insert("exp".to_string(), Builtin::Function(exp));
    env.insert("floor".to_string(), Builtin::Function(floor));
    env.insert("ceil".to_string(), Builtin::Function(ceil));
    env.insert("round".to_string(), Builtin::Function(round));

    // Trigonometry
    env.insert("sin".to_string(), Builtin::Function(sin));
    env.insert("cos".to_string(), Builtin::Function(cos));
    env.insert("tan".to_string(), Builtin::Function(tan));
    env.insert("asin".to_string(), Builtin::Function(asin));
    env.insert("acos".to_string(), Builtin::Function(acos));
    env.insert("atan".to_string(), Builtin::Function(atan));

    // Constants
    env.insert("pi".to_string(), Builtin::Const(Value::Float(std::f64::consts::PI)));
    env.insert("e".to_string(), Builtin::Const(Value::Float(std::f64::consts::E)));
}

fn int_pair(a: &Value, b: &Value) -> Option<(i64, i64)> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some((*x, *y)),
        _ => None,
    }
}

fn overflow(name: &str) -> Box<LangError> {
    Box::new(LangError::runtime(format!("Integer overflow in '{}'", name)))
}

fn add(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("add", args, 2)?;
    if let Some((a, b)) = int_pair(&args[0], &args[1]) {
        return a.checked_add(b).map(Value::Int).ok_or_else(|| overflow("add"));
    }
    Ok(Value::Float(number("add", &args[0])? + number("add", &args[1])?))
}

fn sub(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("sub", args, 2)?;
    if let Some((a, b)) = int_pair(&args[0], &args[1]) {
        return a.checked_sub(b).map(Value::Int).ok_or_else(|| overflow("sub"));
    }
    Ok(Value::Float(number("sub", &args[0])? - number("sub", &args[1])?))
}

fn mul(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("mul", args, 2)?;
    if let Some((a, b)) = int_pair(&args[0], &args[1]) {
        return a.checked_mul(b).map(Value::Int).ok_or_else(|| overflow("mul"));
    }
    Ok(Value::Float(number("mul", &args[0])? * number("mul", &args[1])?))
}

// A zero divisor yields 0 here, unlike the `/` operator, which is fatal.
fn div(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("div", args, 2)?;
    let a = number("div", &args[0])?;
    let b = number("div", &args[1])?;
    if b == 0.0 {
        return Ok(Value::Int(0));
    }
    Ok(Value::Float(a / b))
}

fn modulo(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("mod", args, 2)?;
    if let Some((a, b)) = int_pair(&args[0], &args[1]) {
        if b == 0 {
            return Err(Box::new(LangError::runtime("Modulo by zero".to_string())));
        }
        return Ok(Value::Int(crate::interpreter::floored_rem(a, b)));
    }
    let a = number("mod", &args[0])?;
    let b = number("mod", &args[1])?;
    if b == 0.0 {
        return Err(Box::new(LangError::runtime("Modulo by zero".to_string())));
    }
    Ok(Value::Float(a - b * (a / b).floor()))
}

fn pow(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("pow", args, 2)?;
    if let Some((a, b)) = int_pair(&args[0], &args[1]) {
        if let Ok(exponent) = u32::try_from(b) {
            return a.checked_pow(exponent).map(Value::Int).ok_or_else(|| overflow("pow"));
        }
    }
    Ok(Value::Float(number("pow", &args[0])?.powf(number("pow", &args[1])?)))
}

fn neg(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("neg", args, 1)?;
    match &args[0] {
        Value::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(|| overflow("neg")),
        other => Ok(Value::Float(-number("neg", other)?)),
    }
}

fn abs(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("abs", args, 1)?;
    match &args[0] {
        Value::Int(n) => n.checked_abs().map(Value::Int).ok_or_else(|| overflow("abs")),
        other => Ok(Value::Float(number("abs", other)?.abs())),
    }
}

fn min(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("min", args, 2)?;
    let a = number("min", &args[0])?;
    let b = number("min", &args[1])?;
    Ok(if a <= b { args[0].clone() } else { args[1].clone() })
}

fn max(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("max", args, 2)?;
    let a = number("max", &args[0])?;
    let b = number("max", &args[1])?;
    Ok(if a >= b { args[0].clone() } else { args[1].clone() })
}

fn unary_float(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, Box<LangError>> {
    expect_arity(name, args, 1)?;
    Ok(Value::Float(f(number(name, &args[0])?)))
}

fn unary_int(name: &str, args: &[Value], f: fn(f64) -> f64) -> Result<Value, Box<LangError>> {
    expect_arity(name, args, 1)?;
    Ok(Value::Int(f(number(name, &args[0])?) as i64))
}

fn sqrt(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("sqrt", args, f64::sqrt)
}

fn log(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("log", args, f64::log10)
}

fn ln(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("ln", args, f64::ln)
}

fn exp(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("exp", args, f64::exp)
}

fn floor(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_int("floor", args, f64::floor)
}

fn ceil(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_int("ceil", args, f64::ceil)
}

fn round(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_int("round", args, f64::round)
}

fn sin(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("sin", args, f64::sin)
}

fn cos(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("cos", args, f64::cos)
}

fn tan(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("tan", args, f64::tan)
}

fn asin(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("asin", args, f64::asin)
}

fn acos(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("acos", args, f64::acos)
}

fn atan(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    unary_float("atan", args, f64::atan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: super::super::NativeFn, args: &[Value]) -> Result<Value, Box<LangError>> {
        let mut out = OutputSink::stdout();
        f(&mut out, args)
    }

    #[test]
    fn test_integer_arithmetic_stays_integral() {
        assert_eq!(call(add, &[Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(5));
        assert_eq!(call(sub, &[Value::Int(10), Value::Int(4)]).unwrap(), Value::Int(6));
        assert_eq!(call(mul, &[Value::Int(6), Value::Int(7)]).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_mixed_arithmetic_promotes_to_float() {
        assert_eq!(call(add, &[Value::Int(1), Value::Float(0.5)]).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_div_builtin_yields_zero_for_zero_divisor() {
        assert_eq!(call(div, &[Value::Int(10), Value::Int(0)]).unwrap(), Value::Int(0));
        assert_eq!(call(div, &[Value::Int(10), Value::Int(4)]).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn test_modulo_sign_follows_divisor() {
        assert_eq!(call(modulo, &[Value::Int(-7), Value::Int(3)]).unwrap(), Value::Int(2));
        assert_eq!(call(modulo, &[Value::Int(7), Value::Int(-3)]).unwrap(), Value::Int(-2));
        assert!(call(modulo, &[Value::Int(1), Value::Int(0)]).is_err());
    }

    #[test]
    fn test_modulo_extreme_operands() {
        assert_eq!(
            call(modulo, &[Value::Int(5), Value::Int(i64::MAX)]).unwrap(),
            Value::Int(5)
        );
        assert_eq!(
            call(modulo, &[Value::Int(i64::MIN), Value::Int(-1)]).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn test_rounding_functions_return_ints() {
        assert_eq!(call(floor, &[Value::Float(2.9)]).unwrap(), Value::Int(2));
        assert_eq!(call(ceil, &[Value::Float(2.1)]).unwrap(), Value::Int(3));
        assert_eq!(call(round, &[Value::Float(2.5)]).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_arity_and_type_errors_name_the_builtin() {
        let err = call(add, &[Value::Int(1)]).unwrap_err();
        assert!(err.message.contains("'add' expects 2 arguments, got 1"));

        let err = call(sqrt, &[Value::Str("x".to_string())]).unwrap_err();
        assert!(err.message.contains("'sqrt'"));
    }

    #[test]
    fn test_integer_overflow_is_reported_not_wrapped() {
        let err = call(add, &[Value::Int(i64::MAX), Value::Int(1)]).unwrap_err();
        assert!(err.message.contains("overflow"));
    }
}
