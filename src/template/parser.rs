//! Precedence-climbing expression parser.
//!
//! Tiers, loosest first:
//!
//! | tier | operators | associativity |
//! |------|-----------|---------------|
//! | ternary | `? :` | right |
//! | logical or | `\|\|` | left |
//! | logical and | `&&` | left |
//! | comparison | `== != === !== < > <= >=` | left |
//! | additive | `+ -` | left |
//! | multiplicative | `* / %` | left |
//! | exponent | `**` | left |
//! | unary | `- + !` | prefix |
//!
//! Every binary tier, exponentiation included, combines strictly left to
//! right: `2 ** 3 ** 2` is `(2 ** 3) ** 2`. Unary operators bind tighter than
//! `**`, so `-2 ** 2` is `(-2) ** 2`. Use parentheses to group differently.
//!
//! Nesting (groups, ternaries, unary chains, literals, operator chains) is
//! bounded by [`MAX_DEPTH`]; deeper input is a syntax error.

use std::rc::Rc;

use crate::accessor::{PropertyPath, Segment};
use crate::error::TemplateSyntaxError;
use crate::value::Value;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::tokenizer::{tokenize, Spanned, Token};

/// Deepest expression tree the parser builds.
pub const MAX_DEPTH: usize = 256;

/// Parse a single expression (the text between `${` and `}`).
pub fn parse_expression(source: &str) -> Result<Expr, TemplateSyntaxError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(TemplateSyntaxError::new("empty expression", source, 0));
    }
    let mut parser = Parser {
        source,
        tokens,
        cursor: 0,
        depth: 0,
    };
    let expr = parser.parse_ternary()?;
    if let Some(tok) = parser.peek() {
        return Err(parser.unexpected(tok, "expected end of expression"));
    }
    Ok(expr)
}

/// Recursive descent parser state.
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned<'a>>,
    cursor: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Spanned<'a>> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<Token> {
        self.peek().map(|t| t.token)
    }

    fn advance(&mut self) -> Option<Spanned<'a>> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.peek_token() == Some(token) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self, tok: &Spanned<'_>, message: &str) -> TemplateSyntaxError {
        TemplateSyntaxError::new(
            format!("{message}, found `{}`", tok.text),
            tok.text,
            tok.start,
        )
    }

    fn eof(&self, message: &str) -> TemplateSyntaxError {
        TemplateSyntaxError::new(
            format!("unexpected end of expression, {message}"),
            self.source,
            0,
        )
    }

    fn too_deep(&self) -> TemplateSyntaxError {
        match self.peek().or_else(|| self.tokens.last()) {
            Some(tok) => TemplateSyntaxError::new("expression nested too deeply", tok.text, tok.start),
            None => self.eof("expression nested too deeply"),
        }
    }

    /// Run `parse` one nesting level down.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, TemplateSyntaxError>,
    ) -> Result<T, TemplateSyntaxError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<Spanned<'a>, TemplateSyntaxError> {
        match self.advance() {
            Some(tok) if tok.token == token => Ok(tok),
            Some(tok) => Err(self.unexpected(&tok, &format!("expected {what}"))),
            None => Err(self.eof(&format!("expected {what}"))),
        }
    }

    // ── Tiers ────────────────────────────────────────────────────────

    fn parse_ternary(&mut self) -> Result<Expr, TemplateSyntaxError> {
        self.nested(|p| {
            let condition = p.parse_binary(1)?;
            if !p.eat(Token::Question) {
                return Ok(condition);
            }
            let when_true = p.parse_ternary()?;
            p.expect(Token::Colon, "`:`")?;
            let when_false = p.parse_ternary()?;
            Ok(Expr::ternary(condition, when_true, when_false))
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, TemplateSyntaxError> {
        let mut left = self.parse_unary()?;
        // Each operator in a left-associative chain deepens the tree by one.
        let base = self.depth;
        while let Some(op) = self.peek_token().and_then(binary_op) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            if self.depth >= MAX_DEPTH {
                return Err(self.too_deep());
            }
            self.depth += 1;
            self.cursor += 1;
            let right = self.parse_binary(precedence + 1)?;
            left = Expr::binary(op, left, right);
        }
        self.depth = base;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let op = match self.peek_token() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        self.cursor += 1;
        Ok(Expr::unary(op, self.nested(Self::parse_unary)?))
    }

    fn parse_primary(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let Some(tok) = self.advance() else {
            return Err(self.eof("expected a value"));
        };
        match tok.token {
            Token::Number => parse_number(&tok).map(|n| Expr::Literal(Value::Number(n))),
            Token::DoubleString | Token::SingleString => {
                Ok(Expr::Literal(Value::String(unescape(tok.text).into())))
            }
            Token::Ident => Ok(match tok.text {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                "undefined" => Expr::Literal(Value::Undefined),
                "NaN" => Expr::Literal(Value::Number(f64::NAN)),
                "Infinity" => Expr::Literal(Value::Number(f64::INFINITY)),
                "this" => Expr::Path(self.parse_members(PropertyPath::default())?),
                name => {
                    let root = PropertyPath::new(vec![Segment::Key(name.into())]);
                    Expr::Path(self.parse_members(root)?)
                }
            }),
            Token::ParenOpen => {
                let inner = self.parse_ternary()?;
                self.expect(Token::ParenClose, "`)`")?;
                Ok(inner)
            }
            Token::BracketOpen => self.nested(Self::parse_array),
            Token::BraceOpen => self.nested(Self::parse_object),
            _ => Err(self.unexpected(&tok, "expected a value")),
        }
    }

    /// `.name` and `[literal]` suffixes of a property path.
    fn parse_members(&mut self, mut path: PropertyPath) -> Result<PropertyPath, TemplateSyntaxError> {
        loop {
            if self.eat(Token::Dot) {
                let name = self.expect(Token::Ident, "a property name")?;
                path.push(Segment::Key(name.text.into()));
            } else if self.eat(Token::BracketOpen) {
                let Some(tok) = self.advance() else {
                    return Err(self.eof("expected an index"));
                };
                let segment = match tok.token {
                    Token::Number => match tok.text.parse::<usize>() {
                        Ok(index) => Segment::Index(index),
                        Err(_) => {
                            return Err(self.unexpected(&tok, "index must be a non-negative integer"))
                        }
                    },
                    Token::DoubleString | Token::SingleString => {
                        Segment::Key(unescape(tok.text).into())
                    }
                    _ => {
                        return Err(self.unexpected(
                            &tok,
                            "computed member access is not supported, expected a literal index",
                        ))
                    }
                };
                self.expect(Token::BracketClose, "`]`")?;
                path.push(segment);
            } else {
                return Ok(path);
            }
        }
    }

    fn parse_array(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let mut items = Vec::new();
        while !self.eat(Token::BracketClose) {
            items.push(self.parse_ternary()?);
            if !self.eat(Token::Comma) {
                self.expect(Token::BracketClose, "`,` or `]`")?;
                break;
            }
        }
        Ok(Expr::Array(items))
    }

    fn parse_object(&mut self) -> Result<Expr, TemplateSyntaxError> {
        let mut entries = Vec::new();
        while !self.eat(Token::BraceClose) {
            let Some(key) = self.advance() else {
                return Err(self.eof("expected a property name"));
            };
            let key: Rc<str> = match key.token {
                Token::Ident | Token::Number => key.text.into(),
                Token::DoubleString | Token::SingleString => unescape(key.text).into(),
                _ => return Err(self.unexpected(&key, "expected a property name")),
            };
            self.expect(Token::Colon, "`:`")?;
            entries.push((key, self.parse_ternary()?));
            if !self.eat(Token::Comma) {
                self.expect(Token::BraceClose, "`,` or `}`")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }
}

fn binary_op(token: Token) -> Option<BinaryOp> {
    Some(match token {
        Token::OrOr => BinaryOp::Or,
        Token::AndAnd => BinaryOp::And,
        Token::EqEq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::NotEq,
        Token::EqEqEq => BinaryOp::StrictEq,
        Token::NotEqEq => BinaryOp::StrictNotEq,
        Token::Lt => BinaryOp::Lt,
        Token::Gt => BinaryOp::Gt,
        Token::LtEq => BinaryOp::LtEq,
        Token::GtEq => BinaryOp::GtEq,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Rem,
        Token::StarStar => BinaryOp::Pow,
        _ => return None,
    })
}

fn parse_number(tok: &Spanned<'_>) -> Result<f64, TemplateSyntaxError> {
    tok.text
        .parse()
        .map_err(|_| TemplateSyntaxError::new("invalid number", tok.text, tok.start))
}

/// Strip the quotes of a string token and resolve backslash escapes.
fn unescape(quoted: &str) -> String {
    let body = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
