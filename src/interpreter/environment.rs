// File: src/interpreter/environment.rs
//
// Two-level scope model for the Quill interpreter: one mutable global
// scope plus a stack of call frames of which only the topmost is visible.
// There is no lexical nesting within a function body and no closures — a
// function can never see another function's locals.

use super::value::Value;
use ahash::AHashMap;

/// Which scope a write lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Local,
}

/// The local-variable scope and identity of one in-progress function
/// invocation.
#[derive(Debug, Clone)]
pub struct Frame {
    pub function: String,
    locals: AHashMap<String, Value>,
}

impl Frame {
    pub fn new(function: String, locals: AHashMap<String, Value>) -> Self {
        Frame { function, locals }
    }
}

/// Variable storage: globals plus the call-frame stack.
///
/// Lookup order on read is fixed: current frame locals, then globals. The
/// builtin-constant environment is the interpreter's third and final
/// fallback, outside this struct. Writes always go to the innermost active
/// scope — a `let` inside a function can never reach outside it.
#[derive(Debug, Default)]
pub struct Environment {
    globals: AHashMap<String, Value>,
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Number of active call frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn active_scope(&self) -> ScopeKind {
        if self.frames.is_empty() {
            ScopeKind::Global
        } else {
            ScopeKind::Local
        }
    }

    /// Read a variable: top frame first, then globals. First match wins.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(frame) = self.frames.last() {
            if let Some(value) = frame.locals.get(name) {
                return Some(value.clone());
            }
        }
        self.globals.get(name).cloned()
    }

    /// Bind a variable in the innermost active scope.
    pub fn define(&mut self, name: String, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.locals.insert(name, value);
            }
            None => {
                self.globals.insert(name, value);
            }
        }
    }

    /// Names visible from the current scope, for diagnostics.
    pub fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.globals.keys().cloned().collect();
        if let Some(frame) = self.frames.last() {
            names.extend(frame.locals.keys().cloned());
        }
        names
    }
}
