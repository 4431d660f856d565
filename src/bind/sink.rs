//! Destinations for live binding values.

use crate::value::Value;

/// Receives the current value of a binding each time it changes.
///
/// Any `FnMut(&Value)` closure is a sink, which covers the usual case of a
/// text node or attribute setter owned by the rendering layer:
///
/// ```ignore
/// binder.attach(computed, move |value: &Value| node.set_text(value.to_template_string()))?;
/// ```
pub trait Sink {
    fn apply(&mut self, value: &Value);
}

impl<F> Sink for F
where
    F: FnMut(&Value),
{
    fn apply(&mut self, value: &Value) {
        self(value)
    }
}
