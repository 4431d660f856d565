//! One-shot template rendering for assertions.

use crate::error::Result;
use crate::eval::{evaluate_template, render_template};
use crate::reactive::Runtime;
use crate::template::parse_template_literal;
use crate::value::Value;

/// Parse `source` and render it once against `context`.
///
/// Reads are untracked, so this can be called from anywhere without
/// subscribing an enclosing computation.
///
/// # Examples
///
/// ```ignore
/// let rt = Runtime::new();
/// assert_eq!(render(&rt, "${2 ** 3}", &Value::Undefined)?, "8");
/// ```
pub fn render(rt: &Runtime, source: &str, context: &Value) -> Result<String> {
    let template = parse_template_literal(source)?;
    Ok(rt.untrack(|| render_template(rt, &template, context))?)
}

/// Like [`render`], keeping the native value of a pure `${expr}` template.
pub fn evaluate(rt: &Runtime, source: &str, context: &Value) -> Result<Value> {
    let template = parse_template_literal(source)?;
    Ok(rt.untrack(|| evaluate_template(rt, &template, context))?)
}
