//! logos-based tokenizer for `${...}` expressions.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `**` beats `*`, `===` beats `==`)
//! 2. For equal length matches, literal tokens win over regexes
//!
//! Keywords (`this`, `true`, `null`, ...) lex as [`Token::Ident`] and are
//! recognized by the parser.

use logos::Logos;

use crate::error::TemplateSyntaxError;

/// Expression token produced by the lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Literals ─────────────────────────────────────────────────────

    /// Unsigned number: `3`, `0.5`, `1e3`, `2.5E-2`.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
    Number,

    /// Double-quoted string with backslash escapes.
    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleString,

    /// Single-quoted string with backslash escapes.
    #[regex(r"'([^'\\]|\\.)*'")]
    SingleString,

    /// Identifier, including `$`-prefixed state names: `$count`, `this`.
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,

    // ── Operators ────────────────────────────────────────────────────

    #[token("**")]
    StarStar,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    NotEqEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,

    // ── Punctuation ──────────────────────────────────────────────────

    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
}

/// A token with its source text and byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned<'a> {
    pub token: Token,
    pub text: &'a str,
    pub start: usize,
}

/// Tokenize an expression.
///
/// Unlike a lenient lexer, any character that does not start a token is an
/// error: an expression is never silently truncated.
pub fn tokenize(input: &str) -> Result<Vec<Spanned<'_>>, TemplateSyntaxError> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(input).spanned() {
        match result {
            Ok(token) => tokens.push(Spanned {
                token,
                text: &input[span.clone()],
                start: span.start,
            }),
            Err(()) => {
                return Err(TemplateSyntaxError::new(
                    "unrecognized token",
                    &input[span.clone()],
                    span.start,
                ))
            }
        }
    }
    Ok(tokens)
}
