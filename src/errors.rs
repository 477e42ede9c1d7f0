// File: src/errors.rs
//
// Error handling and reporting for the Quill programming language.
// Provides structured error types with source location information
// and pretty-printed error messages.

use colored::Colorize;
use std::fmt;

/// Source location information for tracking where code appears in a file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub file: Option<String>,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column, file: None }
    }

    pub fn with_file(line: usize, column: usize, file: String) -> Self {
        Self { line, column, file: Some(file) }
    }

    pub fn unknown() -> Self {
        Self { line: 0, column: 0, file: None }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Error produced by the lexer. `position` is the absolute byte offset of
/// the offending character in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl LexError {
    pub fn new(message: String, position: usize, line: usize, column: usize) -> Self {
        Self { message, position, line, column }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} (line {}, column {})",
            "Lexical Error".red().bold(),
            self.message,
            self.line,
            self.column
        )
    }
}

impl std::error::Error for LexError {}

/// Grammar violation recorded by the parser. Parse errors are accumulated,
/// not thrown — the parser synchronizes and keeps going.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl ParseError {
    pub fn new(message: String) -> Self {
        Self { message, location: None }
    }

    pub fn at(message: String, location: SourceLocation) -> Self {
        Self { message, location: Some(location) }
    }

    /// Wrap this error's message with additional context, keeping its
    /// location.
    pub fn with_context(mut self, context: &str) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "{}: {} (line {}, column {})",
                "Parse Error".red().bold(),
                self.message,
                loc.line,
                loc.column
            ),
            None => write!(f, "{}: {}", "Parse Error".red().bold(), self.message),
        }
    }
}

impl std::error::Error for ParseError {}

/// Types of runtime errors that can occur in Quill
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    RuntimeError,
    TypeError,
    UndefinedVariable,
    UndefinedFunction,
    ModuleLoad,
    Interrupted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::RuntimeError => write!(f, "Runtime Error"),
            ErrorKind::TypeError => write!(f, "Type Error"),
            ErrorKind::UndefinedVariable => write!(f, "Undefined Variable"),
            ErrorKind::UndefinedFunction => write!(f, "Undefined Function"),
            ErrorKind::ModuleLoad => write!(f, "Module Load Error"),
            ErrorKind::Interrupted => write!(f, "Interrupted"),
        }
    }
}

/// A structured runtime error with location information
#[derive(Debug, Clone)]
pub struct LangError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceLocation,
    pub suggestion: Option<String>,
    pub help: Option<String>,
}

impl LangError {
    pub fn new(kind: ErrorKind, message: String, location: SourceLocation) -> Self {
        Self { kind, message, location, suggestion: None, help: None }
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Create a runtime error
    pub fn runtime(message: String) -> Self {
        Self::new(ErrorKind::RuntimeError, message, SourceLocation::unknown())
    }

    /// Create a type error
    pub fn type_error(message: String) -> Self {
        Self::new(ErrorKind::TypeError, message, SourceLocation::unknown())
    }

    /// Create an undefined variable error
    pub fn undefined_variable(name: &str) -> Self {
        Self::new(
            ErrorKind::UndefinedVariable,
            format!("Undefined variable: {}", name),
            SourceLocation::unknown(),
        )
    }

    /// Create an undefined function error
    pub fn undefined_function(name: &str) -> Self {
        Self::new(
            ErrorKind::UndefinedFunction,
            format!("Unknown function: {}", name),
            SourceLocation::unknown(),
        )
    }

    /// Wrap this error's message with additional context, keeping its kind.
    pub fn with_context(mut self, context: &str) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }
}

impl fmt::Display for LangError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        write!(f, "{}: {}", kind_str.red().bold(), self.message)?;

        if self.location != SourceLocation::unknown() {
            let location_str = format!("\n  --> {}", self.location);
            write!(f, "{}", location_str.bright_blue())?;
        }

        if let Some(ref help) = self.help {
            write!(
                f,
                "\n   {} {}",
                "=".bright_yellow(),
                format!("help: {}", help).bright_yellow()
            )?;
        }

        if let Some(ref suggestion) = self.suggestion {
            write!(
                f,
                "\n   {} {}",
                "=".bright_green(),
                format!("Did you mean '{}'?", suggestion).bright_green()
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for LangError {}

/// Computes the Levenshtein distance between two strings
/// Used for "Did you mean?" suggestions
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let len1 = s1.chars().count();
    let len2 = s2.chars().count();

    if len1 == 0 {
        return len2;
    }
    if len2 == 0 {
        return len1;
    }

    let mut matrix = vec![vec![0; len2 + 1]; len1 + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(len1 + 1) {
        row[0] = i;
    }
    for j in 0..=len2 {
        matrix[0][j] = j;
    }

    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = if s1_chars[i - 1] == s2_chars[j - 1] { 0 } else { 1 };
            matrix[i][j] = std::cmp::min(
                std::cmp::min(
                    matrix[i - 1][j] + 1, // deletion
                    matrix[i][j - 1] + 1, // insertion
                ),
                matrix[i - 1][j - 1] + cost, // substitution
            );
        }
    }

    matrix[len1][len2]
}

/// Find the closest match from a list of candidates using Levenshtein distance
/// Returns None if no good match is found (distance > 3)
pub fn find_closest_match<'a, I>(target: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best_match = None;
    let mut best_distance = usize::MAX;

    for candidate in candidates {
        let distance = levenshtein_distance(target, candidate);
        if distance <= 3 && distance < best_distance {
            best_distance = distance;
            best_match = Some(candidate);
        }
    }

    best_match
}
