//! Property accessor: read-only dot/bracket paths over a binding context.
//!
//! Reactive cells are unwrapped transparently, so `this.$count` yields the
//! number stored in the `$count` signal. Missing members resolve to
//! `undefined`; only property reads are supported, never calls.

pub mod path;
pub mod resolve;

pub use path::{PropertyPath, Segment};
pub use resolve::{member, resolve, resolve_str, unwrap_reactive};
