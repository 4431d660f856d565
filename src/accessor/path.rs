//! Property paths: `this.$items[0].name`, `$count`, `map["a key"]`.

use std::fmt;
use std::rc::Rc;

use crate::error::TemplateSyntaxError;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named property: `.name` or `["name"]`.
    Key(Rc<str>),
    /// Numeric index: `[0]`.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, ".{key}"),
            Segment::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// An ordered sequence of [`Segment`]s, resolved against a binding context.
///
/// A leading `this` anchors the path at the context and is not stored; an
/// empty path denotes the context itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PropertyPath {
    segments: Vec<Segment>,
}

impl PropertyPath {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Parse dot/bracket syntax.
    pub fn parse(source: &str) -> Result<Self, TemplateSyntaxError> {
        PathScanner::new(source).parse()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("this")?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for PropertyPath {
    type Err = TemplateSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Byte scanner over a path string.
struct PathScanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> PathScanner<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn error(&self, message: &str) -> TemplateSyntaxError {
        let fragment = &self.source[self.pos..];
        TemplateSyntaxError::new(message, fragment, self.pos)
    }

    fn parse(mut self) -> Result<PropertyPath, TemplateSyntaxError> {
        let mut path = PropertyPath::default();
        let source = self.source.trim();
        self.pos = self.source.len() - self.source.trim_start().len();
        if source.is_empty() {
            return Err(TemplateSyntaxError::new("empty property path", self.source, 0));
        }

        let first = self.ident()?;
        if first != "this" {
            path.push(Segment::Key(first.into()));
        }

        let end = self.pos + self.source[self.pos..].trim_end().len();
        while self.pos < end {
            match self.peek() {
                Some('.') => {
                    self.pos += 1;
                    let key = self.ident()?;
                    path.push(Segment::Key(key.into()));
                }
                Some('[') => {
                    self.pos += 1;
                    path.push(self.bracket()?);
                }
                _ => return Err(self.error("expected `.` or `[`")),
            }
        }
        Ok(path)
    }

    fn ident(&mut self) -> Result<&'a str, TemplateSyntaxError> {
        let source: &'a str = self.source;
        let rest = &source[self.pos..];
        match rest.chars().next() {
            Some(c) if is_ident_start(c) => {}
            _ => return Err(self.error("expected identifier")),
        }
        let len = rest
            .char_indices()
            .find(|&(_, c)| !is_ident_continue(c))
            .map_or(rest.len(), |(i, _)| i);
        self.pos += len;
        Ok(&rest[..len])
    }

    /// Parse the inside of `[...]`; the opening bracket is already consumed.
    fn bracket(&mut self) -> Result<Segment, TemplateSyntaxError> {
        let source: &'a str = self.source;
        let rest = &source[self.pos..];
        let segment = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let close = body
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated string in brackets"))?;
                self.pos += close + 2;
                Segment::Key(body[..close].into())
            }
            Some(c) if c.is_ascii_digit() => {
                let len = rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(rest.len());
                let index = rest[..len]
                    .parse()
                    .map_err(|_| self.error("index out of range"))?;
                self.pos += len;
                Segment::Index(index)
            }
            _ => return Err(self.error("expected index or quoted key")),
        };
        if self.peek() != Some(']') {
            return Err(self.error("expected `]`"));
        }
        self.pos += 1;
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(k: &str) -> Segment {
        Segment::Key(k.into())
    }

    #[test]
    fn this_prefix_is_dropped() {
        let path = PropertyPath::parse("this.$count").unwrap();
        assert_eq!(path.segments(), &[key("$count")]);
    }

    #[test]
    fn bare_identifier() {
        let path = PropertyPath::parse("$count").unwrap();
        assert_eq!(path.segments(), &[key("$count")]);
    }

    #[test]
    fn bare_this_is_context() {
        assert!(PropertyPath::parse("this").unwrap().is_empty());
    }

    #[test]
    fn mixed_dot_and_bracket() {
        let path = PropertyPath::parse("this.$items[0].name").unwrap();
        assert_eq!(
            path.segments(),
            &[key("$items"), Segment::Index(0), key("name")]
        );
    }

    #[test]
    fn quoted_keys() {
        let path = PropertyPath::parse(r#"map["a key"]['b']"#).unwrap();
        assert_eq!(path.segments(), &[key("map"), key("a key"), key("b")]);
    }

    #[test]
    fn surrounding_whitespace_ignored() {
        let path = PropertyPath::parse("  this.a  ").unwrap();
        assert_eq!(path.segments(), &[key("a")]);
    }

    #[test]
    fn display_round_trip() {
        let path = PropertyPath::parse("a[2].b").unwrap();
        assert_eq!(path.to_string(), "this.a[2].b");
    }

    #[test]
    fn rejects_method_calls() {
        let err = PropertyPath::parse("this.items.map()").unwrap_err();
        assert_eq!(err.fragment, "()");
    }

    #[test]
    fn rejects_malformed() {
        assert!(PropertyPath::parse("").is_err());
        assert!(PropertyPath::parse("a.").is_err());
        assert!(PropertyPath::parse("a[").is_err());
        assert!(PropertyPath::parse("a[x]").is_err());
        assert!(PropertyPath::parse("a['x'").is_err());
        assert!(PropertyPath::parse("1abc").is_err());
    }
}
