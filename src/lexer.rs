// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for the Quill programming language.
// Converts source code text into a stream of tokens for parsing.
//
// The lexer is driven by an ordered table of (kind, regex) rules tried
// left-to-right at each position; the first rule that matches wins. Rule
// order is the disambiguation mechanism: comments come before `/`,
// two-character operators before their one-character prefixes, keywords
// before the general identifier pattern.

use crate::errors::LexError;
use once_cell::sync::Lazy;
use regex::Regex;

/// The closed set of token kinds Quill recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Skipped by the token stream but still tracked for positions
    Whitespace,
    Comment,

    // Keywords
    Version,
    Import,
    Return,
    Let,
    Const,

    // Type keywords
    IntType,
    FloatType,
    BoolType,
    StringType,
    VoidType,

    // Literals
    BoolLiteral,
    Str,
    Float,
    Int,

    // Operators (two-character forms are ordered before their prefixes)
    Power,
    EqEq,
    Ne,
    Le,
    Ge,
    AndAnd,
    OrOr,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Gt,
    Bang,

    Ident,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Semi,
    Comma,
    Dot,
}

/// Smallest lexical unit: a kind, its literal source text, and where it
/// starts. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

/// Ordered rule table. First match at the current position wins; ties are
/// broken by list order, not match length, so more-specific patterns must
/// come first.
static TOKEN_RULES: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    let rules: &[(TokenKind, &str)] = &[
        (TokenKind::Whitespace, r"\s+"),
        (TokenKind::Comment, r"//[^\n]*"),
        (TokenKind::Version, r"@version\b"),
        (TokenKind::Import, r"import\b"),
        (TokenKind::Return, r"return\b"),
        (TokenKind::Let, r"let\b"),
        (TokenKind::Const, r"const\b"),
        (TokenKind::IntType, r"int\b"),
        (TokenKind::FloatType, r"float\b"),
        (TokenKind::BoolType, r"bool\b"),
        (TokenKind::StringType, r"string\b"),
        (TokenKind::VoidType, r"void\b"),
        (TokenKind::BoolLiteral, r"true\b|false\b"),
        (TokenKind::Str, r#""[^"]*""#),
        // Sign is never folded into numeric literals; unary minus owns it.
        (TokenKind::Float, r"\d+\.\d+"),
        (TokenKind::Int, r"\d+"),
        (TokenKind::Power, r"\*\*"),
        (TokenKind::EqEq, r"=="),
        (TokenKind::Ne, r"!="),
        (TokenKind::Le, r"<="),
        (TokenKind::Ge, r">="),
        (TokenKind::AndAnd, r"&&"),
        (TokenKind::OrOr, r"\|\|"),
        (TokenKind::Arrow, r"->"),
        (TokenKind::Assign, r"="),
        (TokenKind::Plus, r"\+"),
        (TokenKind::Minus, r"-"),
        (TokenKind::Star, r"\*"),
        (TokenKind::Slash, r"/"),
        (TokenKind::Percent, r"%"),
        (TokenKind::Lt, r"<"),
        (TokenKind::Gt, r">"),
        (TokenKind::Bang, r"!"),
        (TokenKind::Ident, r"[A-Za-z_][A-Za-z0-9_]*"),
        (TokenKind::LParen, r"\("),
        (TokenKind::RParen, r"\)"),
        (TokenKind::LBrace, r"\{"),
        (TokenKind::RBrace, r"\}"),
        (TokenKind::LBracket, r"\["),
        (TokenKind::RBracket, r"\]"),
        (TokenKind::Colon, r":"),
        (TokenKind::Semi, r";"),
        (TokenKind::Comma, r","),
        (TokenKind::Dot, r"\."),
    ];

    rules
        .iter()
        .map(|(kind, pattern)| {
            let anchored = format!("^(?:{})", pattern);
            (*kind, Regex::new(&anchored).expect("token rule pattern must compile"))
        })
        .collect()
});

/// Track line/column/byte-offset while walking the source.
#[derive(Debug, Clone, Copy)]
struct Position {
    line: usize,
    column: usize,
    offset: usize,
}

impl Position {
    fn new() -> Self {
        Position { line: 1, column: 1, offset: 0 }
    }

    fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.offset += ch.len_utf8();
    }
}

/// Tokenizes Quill source code into a vector of tokens.
///
/// Whitespace and `//` comments are recognized but not emitted; they still
/// advance line/column tracking. Fails with a `LexError` at the first
/// character no rule matches, with unterminated string literals reported as
/// their own case at the opening quote.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut pos = Position::new();

    while pos.offset < source.len() {
        let rest = &source[pos.offset..];
        let start = pos;

        let matched = TOKEN_RULES.iter().find_map(|(kind, regex)| {
            regex.find(rest).map(|m| (*kind, m.as_str().to_string()))
        });

        match matched {
            Some((kind, text)) => {
                if !matches!(kind, TokenKind::Whitespace | TokenKind::Comment) {
                    tokens.push(Token {
                        kind,
                        text: text.clone(),
                        line: start.line,
                        column: start.column,
                    });
                }
                for ch in text.chars() {
                    pos.advance(ch);
                }
            }
            None => {
                let ch = rest.chars().next().expect("offset is within source");
                if ch == '"' {
                    // The string rule requires a closing quote, so a lone
                    // quote here means the literal never terminates.
                    return Err(LexError::new(
                        "Unterminated string literal".to_string(),
                        pos.offset,
                        pos.line,
                        pos.column,
                    ));
                }
                let message = if ch.is_ascii_graphic() || ch == ' ' {
                    format!("Unexpected character '{}'", ch)
                } else {
                    format!("Unexpected character (U+{:04X})", ch as u32)
                };
                return Err(LexError::new(message, pos.offset, pos.line, pos.column));
            }
        }
    }

    Ok(tokens)
}

/// Tokenize with error recovery: each offending character is replaced with
/// a space and lexing restarts, accumulating every error encountered. A
/// best-effort diagnostic aid, not used on the happy path.
pub fn tokenize_with_recovery(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut errors = Vec::new();
    let mut code = source.to_string();

    loop {
        match tokenize(&code) {
            Ok(tokens) => return (tokens, errors),
            Err(err) => {
                let offset = err.position;
                let Some(ch) = code[offset..].chars().next() else {
                    errors.push(err);
                    return (Vec::new(), errors);
                };
                errors.push(err);
                code.replace_range(offset..offset + ch.len_utf8(), " ");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).expect("source should tokenize").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_simple_function() {
        let toks = tokenize("int main() { return 0; }").unwrap();
        let expected = [
            TokenKind::IntType,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Return,
            TokenKind::Int,
            TokenKind::Semi,
            TokenKind::RBrace,
        ];
        assert_eq!(toks.iter().map(|t| t.kind).collect::<Vec<_>>(), expected);
        assert_eq!(toks[1].text, "main");
    }

    #[test]
    fn test_two_char_operators_win_over_prefixes() {
        assert_eq!(kinds("== = ** * <= < -> -"), vec![
            TokenKind::EqEq,
            TokenKind::Assign,
            TokenKind::Power,
            TokenKind::Star,
            TokenKind::Le,
            TokenKind::Lt,
            TokenKind::Arrow,
            TokenKind::Minus,
        ]);
    }

    #[test]
    fn test_keyword_boundary_does_not_split_identifiers() {
        // "internal" starts with the "int" keyword but must lex as one identifier
        let toks = tokenize("internal").unwrap();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::Ident);
        assert_eq!(toks[0].text, "internal");
    }

    #[test]
    fn test_minus_is_never_folded_into_literals() {
        assert_eq!(kinds("-5"), vec![TokenKind::Minus, TokenKind::Int]);
        assert_eq!(kinds("1 -5"), vec![TokenKind::Int, TokenKind::Minus, TokenKind::Int]);
    }

    #[test]
    fn test_comments_and_whitespace_are_elided_but_advance_positions() {
        let toks = tokenize("let x = 1 // trailing\nlet y = 2").unwrap();
        let y = toks.iter().find(|t| t.text == "y").unwrap();
        assert_eq!(y.line, 2);
        assert_eq!(y.column, 5);
        assert!(toks.iter().all(|t| t.kind != TokenKind::Comment));
    }

    #[test]
    fn test_comment_rule_precedes_division() {
        assert_eq!(kinds("1 / 2 // note"), vec![TokenKind::Int, TokenKind::Slash, TokenKind::Int]);
    }

    #[test]
    fn test_token_positions_track_lines_and_columns() {
        let toks = tokenize("let a = 1\nlet b = 2").unwrap();
        assert_eq!((toks[0].line, toks[0].column), (1, 1));
        let b = toks.iter().find(|t| t.text == "b").unwrap();
        assert_eq!((b.line, b.column), (2, 5));
    }

    #[test]
    fn test_unterminated_string_reports_opening_quote() {
        let err = tokenize("let s = \"oops").unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 9);
        assert_eq!(err.position, 8);
    }

    #[test]
    fn test_unexpected_character_is_named() {
        let err = tokenize("let x = 1 ~ 2").unwrap_err();
        assert_eq!(err.message, "Unexpected character '~'");
        assert_eq!(err.column, 11);
    }

    #[test]
    fn test_unprintable_character_reported_by_code_point() {
        let err = tokenize("let x \u{7}").unwrap_err();
        assert_eq!(err.message, "Unexpected character (U+0007)");
    }

    #[test]
    fn test_recovery_collects_all_errors_and_keeps_lexing() {
        let (tokens, errors) = tokenize_with_recovery("let ~ x = ` 1");
        assert_eq!(errors.len(), 2);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["let", "x", "=", "1"]);
    }

    #[test]
    fn test_spans_reconstruct_source_modulo_elided_trivia() {
        let source = "let x = 1 + 2 // sum\nint main() { return x; }";
        let tokens = tokenize(source).unwrap();
        // Every token's literal text appears verbatim at its source position;
        // stripping tokens out leaves only whitespace and comments.
        let mut remainder = source.to_string();
        for tok in tokens.iter().rev() {
            let at = remainder.rfind(&tok.text).expect("token text must come from the source");
            remainder.replace_range(at..at + tok.text.len(), "");
        }
        assert!(remainder
            .split_whitespace()
            .all(|chunk| chunk.starts_with("//") || "// sum".contains(chunk)));
    }
}
