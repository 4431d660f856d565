//! Bounded cache of parsed templates keyed by source string.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use super::{parse_template_literal, ParsedTemplate};
use crate::error::TemplateSyntaxError;

/// Default number of templates kept by [`TemplateCache::default`].
pub const DEFAULT_CAPACITY: usize = 256;

/// FIFO cache of [`ParsedTemplate`]s.
///
/// Parsed templates are immutable, so one cached entry can back any number of
/// bindings. Sources that fail to parse are not cached.
#[derive(Debug)]
pub struct TemplateCache {
    entries: IndexMap<Rc<str>, Rc<ParsedTemplate>>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl TemplateCache {
    /// Create a cache holding at most `capacity` templates (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: IndexMap::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached parse of `source`, parsing and inserting on a miss.
    pub fn get_or_parse(&mut self, source: &str) -> Result<Rc<ParsedTemplate>, TemplateSyntaxError> {
        if let Some(template) = self.entries.get(source) {
            self.hits += 1;
            trace!(source, "template cache hit");
            return Ok(Rc::clone(template));
        }
        self.misses += 1;
        let template = Rc::new(parse_template_literal(source)?);
        if self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries
            .insert(Rc::clone(template.source_rc()), Rc::clone(&template));
        Ok(template)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
