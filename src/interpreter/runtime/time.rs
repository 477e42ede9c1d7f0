// File: src/interpreter/runtime/time.rs
//
// Time builtins. The module keeps a process-wide start instant, set when
// the module is first loaded; `reset_timer` rewinds it.

use super::{expect_arity, number, Builtin, BuiltinEnv};
use crate::errors::LangError;
use crate::interpreter::{OutputSink, Value};
use chrono::Local;
use once_cell::sync::Lazy;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

static START: Lazy<Mutex<Option<Instant>>> = Lazy::new(|| Mutex::new(None));

const MAX_SLEEP_SECONDS: f64 = 3600.0;

/// Registers the time functions in the environment and re-arms the timer.
pub fn register(env: &mut BuiltinEnv) {
    *START.lock().unwrap() = Some(Instant::now());

    env.insert("time".to_string(), Builtin::Function(time));
    env.insert("timestamp".to_string(), Builtin::Function(timestamp));
    env.insert("datetime".to_string(), Builtin::Function(datetime));
    env.insert("date".to_string(), Builtin::Function(date));
    env.insert("sleep".to_string(), Builtin::Function(sleep));
    env.insert("reset_timer".to_string(), Builtin::Function(reset_timer));
    env.insert("uptime".to_string(), Builtin::Function(uptime));
}

fn elapsed_seconds() -> f64 {
    match *START.lock().unwrap() {
        Some(start) => start.elapsed().as_secs_f64(),
        None => 0.0,
    }
}

/// Elapsed time since the timer started, as `"1.234s"`.
fn time(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("time", args, 0)?;
    Ok(Value::Str(format!("{:.3}s", elapsed_seconds())))
}

fn timestamp(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("timestamp", args, 0)?;
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Ok(Value::Str(seconds.to_string()))
}

fn datetime(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("datetime", args, 0)?;
    Ok(Value::Str(
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    ))
}

fn date(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("date", args, 0)?;
    Ok(Value::Str(Local::now().format("%Y-%m-%d").to_string()))
}

fn sleep(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("sleep", args, 1)?;
    let seconds = number("sleep", &args[0])?;
    if seconds < 0.0 {
        return Err(Box::new(LangError::runtime(
            "Sleep duration cannot be negative".to_string(),
        )));
    }
    if seconds > MAX_SLEEP_SECONDS {
        return Err(Box::new(LangError::runtime(
            "Sleep duration cannot exceed 1 hour".to_string(),
        )));
    }
    std::thread::sleep(Duration::from_secs_f64(seconds));
    Ok(Value::Null)
}

fn reset_timer(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("reset_timer", args, 0)?;
    *START.lock().unwrap() = Some(Instant::now());
    Ok(Value::Null)
}

fn uptime(_out: &mut OutputSink, args: &[Value]) -> Result<Value, Box<LangError>> {
    expect_arity("uptime", args, 0)?;
    Ok(Value::Float(elapsed_seconds()))
}
