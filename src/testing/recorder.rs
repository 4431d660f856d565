//! A sink that records every value it receives.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bind::Sink;
use crate::value::Value;

/// Records the values pushed by a binding.
///
/// Clones share one log, so a test can hand a clone to
/// [`Binder::attach`](crate::bind::Binder::attach) and inspect the original.
///
/// # Examples
///
/// ```ignore
/// let sink = RecordingSink::new();
/// binder.attach(computed, sink.clone())?;
/// assert_eq!(sink.values(), vec![Value::from("Hi")]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<Value>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every value received so far, oldest first.
    pub fn values(&self) -> Vec<Value> {
        self.log.borrow().clone()
    }

    /// The values rendered as template strings.
    pub fn strings(&self) -> Vec<String> {
        self.log.borrow().iter().map(Value::to_template_string).collect()
    }

    pub fn last(&self) -> Option<Value> {
        self.log.borrow().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl Sink for RecordingSink {
    fn apply(&mut self, value: &Value) {
        self.log.borrow_mut().push(value.clone());
    }
}
