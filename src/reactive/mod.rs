//! Reactive state: signals, computeds, effects, watcher scopes.
//!
//! Fine-grained reactivity over an explicit [`Runtime`] arena.
//!
//! - [`Runtime::create_signal`]: mutable cell.
//! - [`Runtime::create_computed`]: memoized derived cell with dynamic dependencies.
//! - [`Runtime::create_effect`]: auto-tracking side effect owned by a [`Scope`].
//! - [`Runtime::batch`]: coalesce multiple writes into one propagation pass.
//! - [`feed::pipe_channel`]: forward async results into a signal.

mod runtime;
pub mod signal;
pub mod effect;
pub mod feed;

pub use runtime::{NodeId, Runtime, ScopeId};
pub use signal::{Computed, Signal};
pub use effect::{Effect, Scope};
