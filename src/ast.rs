// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for the Quill programming language.
// Defines the structure of parsed Quill programs.
//
// This is a plain data model: the parser constructs it, the interpreter
// reads it, and nothing rewrites it after a successful parse. The Display
// impls produce the canonical source form, which reparses to a structurally
// equal tree.

use std::fmt;

/// Root of the syntax tree: one compilation unit in fixed section order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub version: Option<VersionDirective>,
    /// Order-preserving; duplicates are tolerated, not deduplicated.
    pub imports: Vec<Import>,
    pub functions: Vec<FunctionDef>,
    /// Top-level bindings, evaluated once before `main` runs.
    pub globals: Vec<LetBinding>,
}

impl Program {
    pub fn empty() -> Self {
        Program { version: None, imports: Vec::new(), functions: Vec::new(), globals: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VersionDirective {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
}

/// Declared return type of a function. `int` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Int,
    Void,
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReturnType::Int => write!(f, "int"),
            ReturnType::Void => write!(f, "void"),
        }
    }
}

/// Function parameter. The type tag is advisory only; it is not enforced
/// at call time.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub type_tag: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: ReturnType,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetBinding {
    pub name: String,
    pub value: Expr,
}

/// Represents a statement in Quill — exactly the variants the interpreter
/// dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Call(CallExpr),
    Return(Option<Expr>),
    Let(LetBinding),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
}

/// Represents an expression in Quill — something that evaluates to a value
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(String),
    Int(i64),
    Var(String),
    Binary { left: Box<Expr>, op: String, right: Box<Expr> },
    Unary { op: String, operand: Box<Expr> },
    Call(CallExpr),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Str(s) => write!(f, "\"{}\"", s),
            Expr::Int(n) => write!(f, "{}", n),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Binary { left, op, right } => {
                // Left association is implicit; only a binary right child
                // needs parentheses to reparse to the same shape.
                write!(f, "{} {} ", left, op)?;
                if matches!(**right, Expr::Binary { .. }) {
                    write!(f, "({})", right)
                } else {
                    write!(f, "{}", right)
                }
            }
            Expr::Unary { op, operand } => {
                if matches!(**operand, Expr::Binary { .. }) {
                    write!(f, "{}({})", op, operand)
                } else {
                    write!(f, "{}{}", op, operand)
                }
            }
            Expr::Call(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for CallExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Call(call) => write!(f, "{};", call),
            Stmt::Return(None) => write!(f, "return;"),
            Stmt::Return(Some(expr)) => write!(f, "return {};", expr),
            Stmt::Let(binding) => write!(f, "let {} = {}", binding.name, binding.value),
        }
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", param.type_tag, param.name)?;
        }
        writeln!(f, ") {{")?;
        for stmt in &self.body {
            writeln!(f, "    {}", stmt)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(version) = &self.version {
            writeln!(f, "@version \"{}\"", version.version)?;
            writeln!(f)?;
        }
        for import in &self.imports {
            writeln!(f, "import {};", import.module)?;
        }
        if !self.imports.is_empty() {
            writeln!(f)?;
        }
        for binding in &self.globals {
            writeln!(f, "let {} = {}", binding.name, binding.value)?;
        }
        if !self.globals.is_empty() {
            writeln!(f)?;
        }
        for (i, function) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", function)?;
        }
        Ok(())
    }
}
