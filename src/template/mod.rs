//! Template literals: strings with embedded `${expression}` regions.
//!
//! - [`scanner`]: finds `${...}` regions (brace- and quote-aware).
//! - [`tokenizer`]: logos lexer for expression source.
//! - [`parser`]: precedence-climbing parser into [`ast::Expr`].
//! - [`cache`]: bounded cache of parsed templates.
//!
//! A [`ParsedTemplate`] is immutable and holds no binding context; the same
//! instance can be bound to many contexts at once.

pub mod ast;
pub mod cache;
pub mod parser;
pub mod scanner;
pub mod tokenizer;

use std::rc::Rc;

use tracing::debug;

use crate::error::TemplateSyntaxError;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use cache::TemplateCache;
pub use parser::parse_expression;

/// One segment of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Literal text, emitted verbatim.
    Text(Rc<str>),
    /// An expression and the raw source it was parsed from.
    Expr { source: Rc<str>, expr: Expr },
}

/// A template split into literal text and parsed expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    source: Rc<str>,
    parts: Vec<Part>,
}

impl ParsedTemplate {
    /// The original template string.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn source_rc(&self) -> &Rc<str> {
        &self.source
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// `true` if the template has no `${}` regions.
    pub fn is_constant(&self) -> bool {
        self.as_constant().is_some()
    }

    /// The literal text of a template without `${}` regions.
    pub fn as_constant(&self) -> Option<&str> {
        match self.parts.as_slice() {
            [Part::Text(text)] => Some(&**text),
            _ => None,
        }
    }

    /// The expression of a template that is exactly one `${}` region with no
    /// surrounding text. Such templates keep the expression's native type
    /// when bound to a property.
    pub fn pure_expression(&self) -> Option<&Expr> {
        match self.parts.as_slice() {
            [Part::Expr { expr, .. }] => Some(expr),
            _ => None,
        }
    }

    /// Iterate the parsed expressions in source order.
    pub fn expressions(&self) -> impl Iterator<Item = &Expr> {
        self.parts.iter().filter_map(|part| match part {
            Part::Expr { expr, .. } => Some(expr),
            Part::Text(_) => None,
        })
    }
}

/// Fast pre-check used to skip parsing plain strings.
pub fn is_template_literal(source: &str) -> bool {
    scanner::has_expression(source)
}

/// Parse a template string.
///
/// A source without `${}` parses to a single text part without invoking the
/// expression parser. Malformed regions fail with [`TemplateSyntaxError`]
/// whose offset is relative to `source`.
#[tracing::instrument(level = "debug", err)]
pub fn parse_template_literal(source: &str) -> Result<ParsedTemplate, TemplateSyntaxError> {
    let source: Rc<str> = source.into();
    if !is_template_literal(&source) {
        return Ok(ParsedTemplate {
            parts: vec![Part::Text(Rc::clone(&source))],
            source,
        });
    }

    let mut parts = Vec::new();
    for chunk in scanner::scan(&source)? {
        match chunk {
            scanner::Chunk::Text(text) => parts.push(Part::Text(text.into())),
            scanner::Chunk::Expr { source: expr_source, offset } => {
                let expr = parse_expression(expr_source).map_err(|e| e.offset_by(offset))?;
                parts.push(Part::Expr {
                    source: expr_source.into(),
                    expr,
                });
            }
        }
    }
    debug!(parts = parts.len(), "template parsed");
    Ok(ParsedTemplate { source, parts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_string_is_single_text_part() {
        let t = parse_template_literal("hello world").unwrap();
        assert_eq!(t.as_constant(), Some("hello world"));
        assert!(t.pure_expression().is_none());
        assert!(!is_template_literal("hello world"));
    }

    #[test]
    fn empty_string_is_constant() {
        let t = parse_template_literal("").unwrap();
        assert_eq!(t.as_constant(), Some(""));
    }

    #[test]
    fn mixed_template() {
        let t = parse_template_literal("Count: ${this.$count}!").unwrap();
        assert_eq!(t.parts().len(), 3);
        assert!(!t.is_constant());
        assert!(t.pure_expression().is_none());
        assert_eq!(t.expressions().count(), 1);
        assert_eq!(t.source(), "Count: ${this.$count}!");
    }

    #[test]
    fn pure_expression_template() {
        let t = parse_template_literal("${ 1 + 1 }").unwrap();
        assert_eq!(
            t.pure_expression().map(ToString::to_string),
            Some("(1 + 1)".to_string())
        );
    }

    #[test]
    fn adjacent_expressions() {
        let t = parse_template_literal("${a}${b}").unwrap();
        assert_eq!(t.parts().len(), 2);
        assert!(t.pure_expression().is_none());
    }

    #[test]
    fn object_literal_in_region() {
        let t = parse_template_literal("${ {a: 1} }").unwrap();
        assert!(matches!(t.pure_expression(), Some(Expr::Object(_))));
    }

    #[test]
    fn expression_part_keeps_source() {
        let t = parse_template_literal("x${ 'y' }").unwrap();
        assert_eq!(
            t.parts()[1],
            Part::Expr {
                source: " 'y' ".into(),
                expr: Expr::Literal(Value::from("y")),
            }
        );
    }

    #[test]
    fn error_offsets_are_relative_to_template() {
        let err = parse_template_literal("abc ${1 + @}").unwrap_err();
        assert_eq!(err.fragment, "@");
        assert_eq!(err.offset, 10);
    }

    #[test]
    fn empty_region_is_an_error() {
        let err = parse_template_literal("a ${ } b").unwrap_err();
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn deeply_nested_region_is_an_error() {
        let source = format!("${{{}1{}}}", "(".repeat(3000), ")".repeat(3000));
        let err = parse_template_literal(&source).unwrap_err();
        assert_eq!(err.message, "expression nested too deeply");
        assert_eq!(err.fragment, "(");
    }

    #[test]
    fn unbalanced_is_an_error() {
        assert!(parse_template_literal("${ this.$a ").is_err());
    }
}
