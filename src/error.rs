//! Error types shared across the crate.
//!
//! Parse-time problems surface as [`TemplateSyntaxError`]; misuse of the
//! reactive graph surfaces as [`ReactiveError`]. Missing properties are not
//! errors at all: they resolve to [`Value::Undefined`](crate::value::Value).

/// A malformed `${...}` region or property path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("template syntax error at byte {offset} in `{fragment}`: {message}")]
pub struct TemplateSyntaxError {
    /// What went wrong.
    pub message: String,
    /// The offending substring.
    pub fragment: String,
    /// Byte offset of `fragment` in the source that was being parsed.
    pub offset: usize,
}

impl TemplateSyntaxError {
    pub(crate) fn new(message: impl Into<String>, fragment: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            fragment: fragment.into(),
            offset,
        }
    }

    /// Shift the offset by `base` (used when a sub-slice was parsed on its own).
    pub(crate) fn offset_by(mut self, base: usize) -> Self {
        self.offset += base;
        self
    }
}

/// Errors from the signal graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReactiveError {
    /// A handle refers to a node or scope that has been disposed.
    #[error("access to disposed {node}")]
    DisposedAccess { node: &'static str },
    /// A computed read itself, directly or transitively, while recomputing.
    #[error("cyclic dependency detected while computing a derived value")]
    CyclicDependency,
    /// Effects kept re-triggering each other within one flush.
    #[error("propagation did not settle after {runs} effect runs")]
    PropagationLimit { runs: usize },
}

/// Umbrella error for the public API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] TemplateSyntaxError),
    #[error(transparent)]
    Reactive(#[from] ReactiveError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
