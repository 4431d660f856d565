//! Effects and watcher scopes.
//!
//! An effect is a closure that runs once on creation and re-runs whenever any
//! cell it read changes:
//!
//! ```ignore
//! let rt = Runtime::new();
//! let scope = rt.create_scope();
//! let count = rt.create_signal(0);
//! rt.create_effect(scope, move |rt| {
//!     println!("count = {}", count.get(rt).unwrap_or_default());
//! })?;
//! count.set(&rt, 1)?; // prints "count = 1"
//! ```
//!
//! Every effect belongs to a [`Scope`]. Disposing the scope disposes its child
//! scopes and every effect and computed created in it.

use std::fmt;

use super::runtime::{NodeId, Runtime, ScopeId};
use crate::error::ReactiveError;

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// Handle to a running effect. Dropping it does not stop the effect; call
/// [`Effect::dispose`] or dispose the owning scope.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effect {
    pub(crate) id: NodeId,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect").field("id", &self.id).finish()
    }
}

impl Runtime {
    /// Create an effect in `scope`. Runs `f` immediately to collect its
    /// dependencies.
    pub fn create_effect(
        &self,
        scope: Scope,
        f: impl FnMut(&Runtime) + 'static,
    ) -> Result<Effect, ReactiveError> {
        let id = self.insert_effect(scope.id, Box::new(f))?;
        Ok(Effect { id })
    }
}

impl Effect {
    /// Stop re-running and drop the closure. Idempotent.
    pub fn dispose(&self, rt: &Runtime) {
        rt.dispose_node(self.id);
    }

    pub fn is_disposed(&self, rt: &Runtime) -> bool {
        !rt.contains_node(self.id)
    }

    /// Number of cells read during the last run.
    pub fn source_count(&self, rt: &Runtime) -> usize {
        rt.source_count(self.id)
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// A disposal unit for effects and computeds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    pub(crate) id: ScopeId,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("id", &self.id).finish()
    }
}

impl Runtime {
    /// Create a top-level scope.
    pub fn create_scope(&self) -> Scope {
        Scope {
            id: self.insert_root_scope(),
        }
    }
}

impl Scope {
    /// Create a scope that is disposed together with this one.
    pub fn child(&self, rt: &Runtime) -> Result<Scope, ReactiveError> {
        Ok(Scope {
            id: rt.insert_child_scope(self.id)?,
        })
    }

    /// Dispose child scopes and every effect and computed owned by this scope.
    pub fn dispose(&self, rt: &Runtime) {
        rt.dispose_scope(self.id);
    }

    /// External async work checks this before writing into the graph.
    pub fn is_disposed(&self, rt: &Runtime) -> bool {
        !rt.contains_scope(self.id)
    }

    /// Number of effects and computeds owned directly by this scope.
    pub fn node_count(&self, rt: &Runtime) -> usize {
        rt.scope_node_count(self.id)
    }
}
