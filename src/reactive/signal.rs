//! Signal and Computed handles.
//!
//! Both are `Copy` keys into a [`Runtime`]. Reading either inside a running
//! computed or effect registers it as a dependency of that computation.

use std::fmt;

use super::runtime::{NodeId, Runtime};
use crate::error::ReactiveError;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// A mutable reactive cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal {
    pub(crate) id: NodeId,
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("id", &self.id).finish()
    }
}

impl Runtime {
    /// Create a signal holding `initial`.
    pub fn create_signal(&self, initial: impl Into<Value>) -> Signal {
        Signal {
            id: self.insert_signal(initial.into()),
        }
    }
}

impl Signal {
    /// Read the current value, subscribing the running computation (if any).
    pub fn get(&self, rt: &Runtime) -> Result<Value, ReactiveError> {
        rt.read_signal(self.id, true)
    }

    /// Read without subscribing anything.
    pub fn get_untracked(&self, rt: &Runtime) -> Result<Value, ReactiveError> {
        rt.read_signal(self.id, false)
    }

    /// Store a new value and propagate to dependents.
    ///
    /// Under [`WriteEquality::SkipEqual`](crate::config::WriteEquality) a
    /// write of an equal value is a no-op. Returns
    /// [`ReactiveError::PropagationLimit`] if the resulting effect runs do not
    /// settle.
    pub fn set(&self, rt: &Runtime, value: impl Into<Value>) -> Result<(), ReactiveError> {
        rt.write_signal(self.id, value.into())
    }

    /// Derive the next value from the current one (read untracked).
    pub fn update(
        &self,
        rt: &Runtime,
        f: impl FnOnce(&Value) -> Value,
    ) -> Result<(), ReactiveError> {
        let current = self.get_untracked(rt)?;
        self.set(rt, f(&current))
    }

    /// Number of computeds and effects currently depending on this signal.
    pub fn subscriber_count(&self, rt: &Runtime) -> usize {
        rt.subscriber_count(self.id)
    }
}

// ---------------------------------------------------------------------------
// Computed
// ---------------------------------------------------------------------------

/// A derived reactive cell.
///
/// The value is memoized and recomputed lazily on read after a dependency
/// changed. Dependencies are whatever the last run actually read.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Computed {
    pub(crate) id: NodeId,
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed").field("id", &self.id).finish()
    }
}

impl Runtime {
    /// Create an unowned computed. It lives until [`Computed::dispose`].
    pub fn create_computed(
        &self,
        f: impl FnMut(&Runtime) -> Result<Value, ReactiveError> + 'static,
    ) -> Computed {
        Computed {
            id: self.insert_unowned_computed(Box::new(f)),
        }
    }

    /// Create a computed owned by `scope`.
    pub fn create_computed_in(
        &self,
        scope: super::Scope,
        f: impl FnMut(&Runtime) -> Result<Value, ReactiveError> + 'static,
    ) -> Result<Computed, ReactiveError> {
        let id = self.insert_computed(scope.id, Box::new(f))?;
        Ok(Computed { id })
    }
}

impl Computed {
    /// Current value, recomputing first if a dependency changed.
    ///
    /// Fails with [`ReactiveError::DisposedAccess`] once disposed and with
    /// [`ReactiveError::CyclicDependency`] when read from its own computation.
    pub fn get(&self, rt: &Runtime) -> Result<Value, ReactiveError> {
        rt.read_computed(self.id, true)
    }

    /// Like [`get`](Self::get) without subscribing the caller.
    pub fn get_untracked(&self, rt: &Runtime) -> Result<Value, ReactiveError> {
        rt.read_computed(self.id, false)
    }

    /// Detach from all dependencies and free the node.
    pub fn dispose(&self, rt: &Runtime) {
        rt.dispose_node(self.id);
    }

    pub fn is_disposed(&self, rt: &Runtime) -> bool {
        !rt.contains_node(self.id)
    }

    /// Number of cells read during the last computation.
    pub fn source_count(&self, rt: &Runtime) -> usize {
        rt.source_count(self.id)
    }

    pub fn subscriber_count(&self, rt: &Runtime) -> usize {
        rt.subscriber_count(self.id)
    }
}
