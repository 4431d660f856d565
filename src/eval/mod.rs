//! Expression evaluation.
//!
//! [`evaluator`] walks parsed expressions; [`ops`] holds the operator
//! semantics on plain values.

pub mod evaluator;
pub mod ops;

pub use evaluator::{evaluate, evaluate_template, render_template};
