//! Locates `${...}` regions in a template string.
//!
//! Braces nest (`${ {a: 1}.a }` is one region) and quoted strings inside an
//! expression are skipped, so `${ "}" }` does not close early.

use crate::error::TemplateSyntaxError;

/// A piece of template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chunk<'a> {
    /// Literal text outside any `${}`.
    Text(&'a str),
    /// Raw expression source between `${` and the matching `}`; `offset` is
    /// the byte position of the expression's first character.
    Expr { source: &'a str, offset: usize },
}

/// Fast pre-check: does `source` contain a `${` opener?
pub fn has_expression(source: &str) -> bool {
    source.contains("${")
}

/// Split `source` into text and expression chunks.
pub fn scan(source: &str) -> Result<Vec<Chunk<'_>>, TemplateSyntaxError> {
    let bytes = source.as_bytes();
    let mut chunks = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'{' {
            if text_start < i {
                chunks.push(Chunk::Text(&source[text_start..i]));
            }
            let expr_start = i + 2;
            let expr_end = find_closing_brace(source, expr_start)
                .ok_or_else(|| TemplateSyntaxError::new("unterminated `${`", &source[i..], i))?;
            chunks.push(Chunk::Expr {
                source: &source[expr_start..expr_end],
                offset: expr_start,
            });
            i = expr_end + 1;
            text_start = i;
        } else {
            i += 1;
        }
    }

    if text_start < source.len() {
        chunks.push(Chunk::Text(&source[text_start..]));
    }
    Ok(chunks)
}

/// Byte index of the `}` closing the region whose body starts at `start`.
fn find_closing_brace(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' if depth == 0 => return Some(i),
                b'}' => depth -= 1,
                _ => {}
            },
        }
        i += 1;
    }
    None
}
