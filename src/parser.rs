// File: src/parser.rs
//
// Recursive descent parser for the Quill programming language.
// Transforms a sequence of tokens into an Abstract Syntax Tree (AST).
//
// A program has a fixed section order: optional @version directive,
// imports, top-level let bindings, then function definitions. Structural
// errors never cross the parse() boundary; they are accumulated and the
// parser synchronizes at statement boundaries so one mistake yields one
// error, not a cascade.
//
// The expression grammar deliberately wires only `+`/`-` binary chains and
// prefix `-`. Multiplicative, comparison, and logical operators tokenize
// but do not parse.

use crate::ast::{
    CallExpr, Expr, FunctionDef, Import, LetBinding, Param, Program, ReturnType, Stmt,
    VersionDirective,
};
use crate::errors::{ParseError, SourceLocation};
use crate::lexer::{Token, TokenKind};

/// Parser maintains position in the token stream and accumulates errors
/// instead of raising them.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    /// Creates a new parser from a vector of tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0, errors: Vec::new() }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn location(token: &Token) -> SourceLocation {
        SourceLocation::new(token.line, token.column)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        match self.peek() {
            None => Err(ParseError::new(format!("Expected {}, but reached end of file", what))),
            Some(tok) if tok.kind == kind => Ok(self.advance().expect("token was just peeked")),
            Some(tok) => Err(ParseError::at(
                format!("Expected {}, got '{}'", what, tok.text),
                Self::location(tok),
            )),
        }
    }

    fn report(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Panic-mode recovery: discard tokens until a statement boundary or
    /// the start of a new top-level section. A `;` boundary is consumed so
    /// parsing resumes after the broken statement; `}` and section starts
    /// are left for the caller.
    fn synchronize(&mut self) {
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace
                | TokenKind::IntType
                | TokenKind::VoidType
                | TokenKind::Import
                | TokenKind::Version => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// True when the current token starts a section `parse_sections` can
    /// consume. A mid-file `@version` is deliberately excluded: the section
    /// loop cannot resume on it, so recovery must skip past it.
    fn at_resumable_section(&self) -> bool {
        matches!(
            self.peek_kind(),
            Some(
                TokenKind::Import | TokenKind::Let | TokenKind::IntType | TokenKind::VoidType
            )
        )
    }

    /// Parse the entire token stream. Returns the recovered program together
    /// with every error encountered; the program contains only successfully
    /// parsed constructs.
    pub fn parse(&mut self) -> (Program, Vec<ParseError>) {
        let mut program = Program::empty();

        if self.check(TokenKind::Version) {
            match self.parse_version() {
                Ok(version) => program.version = Some(version),
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                }
            }
        }

        loop {
            self.parse_sections(&mut program);
            if self.is_at_end() {
                break;
            }

            // Whatever is here does not start the next expected section.
            let tok = self.tokens[self.pos].clone();
            self.report(ParseError::at(
                format!("Unexpected token '{}'", tok.text),
                Self::location(&tok),
            ));
            self.synchronize();
            if !self.is_at_end() && !self.at_resumable_section() {
                self.advance();
            }
        }

        (program, std::mem::take(&mut self.errors))
    }

    /// Imports, then top-level lets, then function definitions.
    fn parse_sections(&mut self, program: &mut Program) {
        while self.check(TokenKind::Import) {
            match self.parse_import() {
                Ok(import) => program.imports.push(import),
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                }
            }
        }

        while self.check(TokenKind::Let) {
            match self.parse_let() {
                Ok(binding) => program.globals.push(binding),
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                }
            }
        }

        while self.check(TokenKind::IntType) || self.check(TokenKind::VoidType) {
            match self.parse_function() {
                Ok(function) => program.functions.push(function),
                Err(err) => {
                    self.report(err);
                    self.synchronize();
                }
            }
        }
    }

    fn parse_version(&mut self) -> Result<VersionDirective, ParseError> {
        self.expect(TokenKind::Version, "@version")?;
        let tok = self.expect(TokenKind::Str, "version string")?;
        let version = tok.text.trim_matches('"').to_string();
        if version.is_empty() {
            return Err(ParseError::at(
                "Version string cannot be empty".to_string(),
                Self::location(&tok),
            ));
        }
        Ok(VersionDirective { version })
    }

    fn parse_import(&mut self) -> Result<Import, ParseError> {
        self.expect(TokenKind::Import, "'import'")?;
        let module = self.expect_module_name()?;
        self.expect(TokenKind::Semi, "';' after import")?;
        Ok(Import { module })
    }

    /// Module names collide with type keywords (`string` names a runtime
    /// module), so an import target is an identifier or a type keyword.
    fn expect_module_name(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(tok)
                if matches!(
                    tok.kind,
                    TokenKind::Ident
                        | TokenKind::IntType
                        | TokenKind::FloatType
                        | TokenKind::BoolType
                        | TokenKind::StringType
                        | TokenKind::VoidType
                ) =>
            {
                Ok(self.advance().expect("token was just peeked").text)
            }
            Some(tok) => Err(ParseError::at(
                format!("Expected module name, got '{}'", tok.text),
                Self::location(tok),
            )),
            None => {
                Err(ParseError::new("Expected module name, but reached end of file".to_string()))
            }
        }
    }

    /// `let <name> = <expr>` — no trailing semicolon.
    fn parse_let(&mut self) -> Result<LetBinding, ParseError> {
        self.expect(TokenKind::Let, "'let'")?;
        let name = self.expect(TokenKind::Ident, "variable name")?;
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.parse_expression()?;
        Ok(LetBinding { name: name.text, value })
    }

    fn parse_function(&mut self) -> Result<FunctionDef, ParseError> {
        let return_type = match self.advance() {
            Some(tok) if tok.kind == TokenKind::VoidType => ReturnType::Void,
            _ => ReturnType::Int,
        };
        let name = self.expect(TokenKind::Ident, "function name")?.text;

        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            params.push(self.parse_parameter()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                params.push(self.parse_parameter()?);
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::LBrace, "'{'")?;

        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(err) => {
                    self.report(err.with_context(&format!("In function '{}'", name)));
                    self.synchronize();
                }
            }
        }

        if self.is_at_end() {
            return Err(ParseError::new("Unexpected end of file, expected '}'".to_string()));
        }
        self.expect(TokenKind::RBrace, "'}'")?;

        Ok(FunctionDef { name, params, return_type, body })
    }

    /// `<type> <name>` — the type tag is an identifier or a type keyword.
    fn parse_parameter(&mut self) -> Result<Param, ParseError> {
        let type_tag = match self.peek() {
            Some(tok)
                if matches!(
                    tok.kind,
                    TokenKind::Ident
                        | TokenKind::IntType
                        | TokenKind::FloatType
                        | TokenKind::BoolType
                        | TokenKind::StringType
                        | TokenKind::VoidType
                ) =>
            {
                self.advance().expect("token was just peeked").text
            }
            Some(tok) => {
                return Err(ParseError::at(
                    format!("Expected parameter type, got '{}'", tok.text),
                    Self::location(tok),
                ))
            }
            None => {
                return Err(ParseError::new(
                    "Expected parameter type, but reached end of file".to_string(),
                ))
            }
        };
        let name = self.expect(TokenKind::Ident, "parameter name")?;
        Ok(Param { type_tag, name: name.text })
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Return) => self.parse_return(),
            Some(TokenKind::Let) => self.parse_let().map(Stmt::Let),
            Some(TokenKind::Ident) => self.parse_call_statement(),
            Some(_) => {
                let tok = self.peek().expect("kind was just peeked").clone();
                Err(ParseError::at(
                    format!("Unexpected statement token: '{}'", tok.text),
                    Self::location(&tok),
                ))
            }
            None => Err(ParseError::new("Unexpected end of file in statement".to_string())),
        }
    }

    fn parse_call_statement(&mut self) -> Result<Stmt, ParseError> {
        let call = self.parse_call_expression()?;
        self.expect(TokenKind::Semi, "';' after call")?;
        Ok(Stmt::Call(call))
    }

    fn parse_call_expression(&mut self) -> Result<CallExpr, ParseError> {
        let name = self.expect(TokenKind::Ident, "function name")?.text;
        self.expect(TokenKind::LParen, "'('")?;

        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.check(TokenKind::Comma) {
                self.advance();
                args.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(CallExpr { name, args })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.expect(TokenKind::Return, "'return'")?;
        let value =
            if self.check(TokenKind::Semi) { None } else { Some(self.parse_expression()?) };
        self.expect(TokenKind::Semi, "';' after return")?;
        Ok(Stmt::Return(value))
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_addition()
    }

    /// Left-associative `+`/`-` chain over the unary level.
    fn parse_addition(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_multiplication()?;

        while matches!(self.peek_kind(), Some(TokenKind::Plus | TokenKind::Minus)) {
            let op = self.advance().expect("operator was just peeked").text;
            let right = self.parse_multiplication()?;
            expr = Expr::Binary { left: Box::new(expr), op, right: Box::new(right) };
        }

        Ok(expr)
    }

    // The multiplicative level is a pass-through: `*`, `/` and `%` tokenize
    // but are not part of the working grammar.
    fn parse_multiplication(&mut self) -> Result<Expr, ParseError> {
        self.parse_unary()
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::Minus) {
            let op = self.advance().expect("operator was just peeked").text;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op, operand: Box::new(operand) });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(tok) = self.peek().cloned() else {
            return Err(ParseError::new("Unexpected end of file in expression".to_string()));
        };

        match tok.kind {
            TokenKind::Str => {
                self.advance();
                Ok(Expr::Str(tok.text.trim_matches('"').to_string()))
            }
            TokenKind::Int => {
                self.advance();
                tok.text.parse::<i64>().map(Expr::Int).map_err(|_| {
                    ParseError::at(
                        format!("Invalid integer literal: {}", tok.text),
                        Self::location(&tok),
                    )
                })
            }
            TokenKind::Ident => {
                // One-token lookahead: `name(` is a call, bare `name` a variable.
                let next_is_paren = self
                    .tokens
                    .get(self.pos + 1)
                    .map(|t| t.kind == TokenKind::LParen)
                    .unwrap_or(false);
                if next_is_paren {
                    self.parse_call_expression().map(Expr::Call)
                } else {
                    self.advance();
                    Ok(Expr::Var(tok.text))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(ParseError::at(
                format!("Unexpected token in expression: '{}'", tok.text),
                Self::location(&tok),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> (Program, Vec<ParseError>) {
        let tokens = tokenize(source).expect("test source should tokenize");
        Parser::new(tokens).parse()
    }

    #[test]
    fn test_full_program_sections() {
        let (program, errors) = parse_source(
            r#"@version "v0.1"

import math;
import string;

let greeting = "hi"
let total = 1 + 2

int main() {
    println(greeting);
    return total;
}
"#,
        );
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        assert_eq!(program.version.as_ref().unwrap().version, "v0.1");
        assert_eq!(program.imports.len(), 2);
        assert_eq!(program.globals.len(), 2);
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].return_type, ReturnType::Int);
        assert_eq!(program.functions[0].body.len(), 2);
    }

    #[test]
    fn test_duplicate_imports_are_preserved_in_order() {
        let (program, errors) = parse_source("import math;\nimport math;\nint main() { return 0; }");
        assert!(errors.is_empty());
        let modules: Vec<&str> = program.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["math", "math"]);
    }

    #[test]
    fn test_type_keyword_module_names_parse() {
        // `string` lexes as a type keyword but must still work as a module name
        let (program, errors) =
            parse_source("import string;\nimport time;\nimport math;\nint main() { return 0; }");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        let modules: Vec<&str> = program.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["string", "time", "math"]);
    }

    #[test]
    fn test_statement_errors_carry_function_context() {
        let (_, errors) = parse_source("int main() {\n    let = 1;\n    return 0;\n}");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("In function 'main':"));
    }

    #[test]
    fn test_empty_version_string_is_an_error() {
        let (program, errors) = parse_source("@version \"\"\nint main() { return 0; }");
        assert!(program.version.is_none());
        assert!(errors.iter().any(|e| e.message.contains("Version string cannot be empty")));
        // Recovery still finds the function
        assert_eq!(program.functions.len(), 1);
    }

    #[test]
    fn test_call_vs_variable_lookahead() {
        let (program, errors) = parse_source("let a = f(1)\nlet b = f\nint main() { return 0; }");
        assert!(errors.is_empty());
        assert!(matches!(program.globals[0].value, Expr::Call(_)));
        assert!(matches!(program.globals[1].value, Expr::Var(_)));
    }

    #[test]
    fn test_unary_minus_and_parenthesized_expressions() {
        let (program, errors) = parse_source("let x = -(1 + 2) - -3\nint main() { return x; }");
        assert!(errors.is_empty());
        let Expr::Binary { left, op, right } = &program.globals[0].value else {
            panic!("expected binary expression");
        };
        assert_eq!(op, "-");
        assert!(matches!(**left, Expr::Unary { .. }));
        assert!(matches!(**right, Expr::Unary { .. }));
    }

    #[test]
    fn test_multiplicative_operators_are_not_wired() {
        let (_, errors) = parse_source("let x = 1 * 2\nint main() { return 0; }");
        assert!(!errors.is_empty(), "'*' must not parse as a binary operator");
    }

    #[test]
    fn test_void_function_and_typed_parameters() {
        let (program, errors) =
            parse_source("void shout(string msg, int times) { println(msg); }");
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        let function = &program.functions[0];
        assert_eq!(function.return_type, ReturnType::Void);
        assert_eq!(function.params.len(), 2);
        assert_eq!(function.params[0].type_tag, "string");
        assert_eq!(function.params[1].name, "times");
    }

    #[test]
    fn test_statement_error_recovery_is_bounded_per_boundary() {
        let (program, errors) = parse_source(
            "int main() {\n    let = 1;\n    println(\"still here\");\n    return 0;\n}",
        );
        assert_eq!(errors.len(), 1, "one broken statement should yield one error: {:?}", errors);
        // The statements after the bad one survive
        assert_eq!(program.functions[0].body.len(), 2);
    }

    #[test]
    fn test_out_of_order_sections_are_reported() {
        let (program, errors) = parse_source("int main() { return 0; }\nimport math;");
        assert!(errors.iter().any(|e| e.message.contains("Unexpected token 'import'")));
        // The import is still collected by recovery
        assert_eq!(program.imports.len(), 1);
        assert_eq!(program.functions.len(), 1);
    }

    #[test]
    fn test_stray_version_directive_mid_file_is_skipped() {
        let (program, errors) =
            parse_source("import math;\n@version \"1.0\"\nint main() { return 0; }");
        assert!(errors.iter().any(|e| e.message.contains("Unexpected token '@version'")));
        assert_eq!(program.imports.len(), 1);
        assert_eq!(program.functions.len(), 1);
        assert!(program.version.is_none());
    }

    #[test]
    fn test_bare_expression_statements_are_rejected() {
        let (_, errors) = parse_source("int main() { 1 + 2; return 0; }");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_parse_is_idempotent_on_canonical_output() {
        let source = r#"@version "v0.2"

import math;

let base = 10 + -2

int helper(int n) {
    return n + base;
}

int main() {
    let local = helper(5) - (1 + 2)
    return local;
}
"#;
        let (first, errors) = parse_source(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        let rendered = first.to_string();
        let (second, rerrors) = parse_source(&rendered);
        assert!(rerrors.is_empty(), "canonical output should reparse cleanly: {:?}", rerrors);
        assert_eq!(first, second);
    }
}
