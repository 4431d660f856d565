//! Test helpers: a recording sink and one-shot rendering.
//!
//! Use [`RecordingSink`] to observe what a binding pushes over time and
//! [`render`] to check what a template produces for a given context.

pub mod recorder;
pub mod render;

pub use recorder::RecordingSink;
pub use render::{evaluate, render};
