//! The reactive graph: node arena, dependency tracking, propagation.
//!
//! Signals, computeds and effects are nodes in one `SlotMap`. Edges are kept in
//! both directions (`sources` / `subscribers`) so recomputation can re-link a
//! node in O(edges) and disposal can unlink it completely.
//!
//! Propagation is push-invalidate, pull-recompute:
//!
//! 1. `set` marks direct subscribers [`State::Dirty`] and everything further
//!    downstream [`State::Check`]. Effects reached this way are queued.
//! 2. Once marking is finished (and no batch is open) the queued effects run.
//!    Before running, a node in `Check` asks its sources to bring themselves
//!    up to date; only if one of them actually changed value does the node
//!    itself become `Dirty` and re-run.
//!
//! A computed therefore recomputes at most once per propagation, never sees a
//! half-updated set of sources, and stops invalidation when its value is
//! unchanged.

use std::cell::RefCell;
use std::fmt;
use std::mem;

use indexmap::IndexSet;
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, trace, warn};

use crate::config::{RuntimeConfig, WriteEquality};
use crate::error::ReactiveError;
use crate::value::Value;

new_key_type! {
    /// Key of a node (signal, computed or effect) in the graph.
    pub struct NodeId;
    /// Key of a watcher scope.
    pub struct ScopeId;
}

/// Freshness of a node, ordered from fresh to stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum State {
    Clean,
    /// A transitive source changed; sources must be checked before reuse.
    Check,
    /// A direct source changed; must re-run.
    Dirty,
}

pub(crate) type ComputeFn = Box<dyn FnMut(&Runtime) -> Result<Value, ReactiveError>>;
pub(crate) type EffectFn = Box<dyn FnMut(&Runtime)>;

enum NodeKind {
    Signal {
        value: Value,
    },
    Computed {
        value: Option<Result<Value, ReactiveError>>,
        /// Taken out while running; `None` means "currently computing".
        compute: Option<ComputeFn>,
    },
    Effect {
        run: Option<EffectFn>,
    },
}

struct Node {
    kind: NodeKind,
    state: State,
    sources: IndexSet<NodeId>,
    subscribers: IndexSet<NodeId>,
    scope: Option<ScopeId>,
}

impl Node {
    fn new(kind: NodeKind, state: State, scope: Option<ScopeId>) -> Self {
        Self {
            kind,
            state,
            sources: IndexSet::new(),
            subscribers: IndexSet::new(),
            scope,
        }
    }
}

#[derive(Default)]
struct ScopeData {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    nodes: Vec<NodeId>,
}

/// Sources collected while a computed or effect runs.
struct Frame {
    sources: IndexSet<NodeId>,
}

struct Graph {
    nodes: SlotMap<NodeId, Node>,
    scopes: SlotMap<ScopeId, ScopeData>,
    /// `None` entries are untracked regions.
    tracking: Vec<Option<Frame>>,
    batch_depth: usize,
    pending: IndexSet<NodeId>,
    flushing: bool,
}

impl Graph {
    fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            scopes: SlotMap::with_key(),
            tracking: Vec::new(),
            batch_depth: 0,
            pending: IndexSet::new(),
            flushing: false,
        }
    }

    /// Raise `id` to at least `state`, queueing effects and marking
    /// downstream nodes `Check`.
    fn mark(&mut self, id: NodeId, state: State) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.state >= state {
            return;
        }
        node.state = state;
        if matches!(node.kind, NodeKind::Effect { .. }) {
            self.pending.insert(id);
            return;
        }
        let subscribers: Vec<NodeId> = node.subscribers.iter().copied().collect();
        for sub in subscribers {
            self.mark(sub, State::Check);
        }
    }

    /// Replace the recorded sources of `id`, keeping subscriber lists in sync.
    fn relink(&mut self, id: NodeId, sources: IndexSet<NodeId>) {
        let old = match self.nodes.get_mut(id) {
            Some(node) => mem::take(&mut node.sources),
            None => return,
        };
        for src in old.difference(&sources) {
            if let Some(node) = self.nodes.get_mut(*src) {
                node.subscribers.shift_remove(&id);
            }
        }
        let mut live = IndexSet::with_capacity(sources.len());
        for src in sources {
            if let Some(node) = self.nodes.get_mut(src) {
                node.subscribers.insert(id);
                live.insert(src);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.sources = live;
        }
    }

    /// Remove a node and every edge that touches it.
    fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.nodes.remove(id) else {
            return false;
        };
        for src in &node.sources {
            if let Some(source) = self.nodes.get_mut(*src) {
                source.subscribers.shift_remove(&id);
            }
        }
        for sub in &node.subscribers {
            if let Some(subscriber) = self.nodes.get_mut(*sub) {
                subscriber.sources.shift_remove(&id);
            }
        }
        if let Some(scope) = node.scope.and_then(|s| self.scopes.get_mut(s)) {
            scope.nodes.retain(|n| *n != id);
        }
        self.pending.shift_remove(&id);
        true
    }

    fn remove_scope(&mut self, id: ScopeId) -> bool {
        let Some(scope) = self.scopes.remove(id) else {
            return false;
        };
        if let Some(parent) = scope.parent.and_then(|p| self.scopes.get_mut(p)) {
            parent.children.retain(|c| *c != id);
        }
        for child in scope.children {
            self.remove_scope(child);
        }
        for node in scope.nodes {
            self.remove_node(node);
        }
        true
    }
}

/// A reactive graph.
///
/// All handles ([`Signal`](super::Signal), [`Computed`](super::Computed),
/// [`Effect`](super::Effect), [`Scope`](super::Scope)) are plain keys into one
/// runtime and must be used with the runtime that created them. Computation
/// and effect closures receive the runtime as their argument, so nothing is
/// stored in global state.
pub struct Runtime {
    graph: RefCell<Graph>,
    config: RuntimeConfig,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Runtime");
        if let Ok(graph) = self.graph.try_borrow() {
            s.field("nodes", &graph.nodes.len())
                .field("scopes", &graph.scopes.len())
                .field("pending", &graph.pending.len());
        }
        s.field("config", &self.config).finish()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with the given configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            graph: RefCell::new(Graph::new()),
            config,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Number of live signals, computeds and effects.
    pub fn node_count(&self) -> usize {
        self.graph.borrow().nodes.len()
    }

    /// Run `f` without registering any reads as dependencies.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        self.graph.borrow_mut().tracking.push(None);
        let result = f();
        self.graph.borrow_mut().tracking.pop();
        result
    }

    /// Group writes so that effects run once, after the outermost batch.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R, ReactiveError> {
        self.graph.borrow_mut().batch_depth += 1;
        let result = f();
        self.graph.borrow_mut().batch_depth -= 1;
        self.flush()?;
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Node creation
    // -----------------------------------------------------------------------

    pub(crate) fn insert_signal(&self, value: Value) -> NodeId {
        let id = self
            .graph
            .borrow_mut()
            .nodes
            .insert(Node::new(NodeKind::Signal { value }, State::Clean, None));
        trace!(?id, "signal created");
        id
    }

    pub(crate) fn insert_unowned_computed(&self, compute: ComputeFn) -> NodeId {
        let kind = NodeKind::Computed {
            value: None,
            compute: Some(compute),
        };
        self.graph
            .borrow_mut()
            .nodes
            .insert(Node::new(kind, State::Dirty, None))
    }

    pub(crate) fn insert_computed(&self, scope: ScopeId, compute: ComputeFn) -> Result<NodeId, ReactiveError> {
        let kind = NodeKind::Computed {
            value: None,
            compute: Some(compute),
        };
        self.insert_owned(scope, kind)
    }

    pub(crate) fn insert_effect(&self, scope: ScopeId, run: EffectFn) -> Result<NodeId, ReactiveError> {
        let id = self.insert_owned(scope, NodeKind::Effect { run: Some(run) })?;
        trace!(?id, "effect created");
        self.run_effect(id);
        Ok(id)
    }

    fn insert_owned(&self, scope: ScopeId, kind: NodeKind) -> Result<NodeId, ReactiveError> {
        let mut graph = self.graph.borrow_mut();
        if !graph.scopes.contains_key(scope) {
            return Err(ReactiveError::DisposedAccess { node: "scope" });
        }
        let id = graph.nodes.insert(Node::new(kind, State::Dirty, Some(scope)));
        if let Some(data) = graph.scopes.get_mut(scope) {
            data.nodes.push(id);
        }
        Ok(id)
    }

    pub(crate) fn insert_root_scope(&self) -> ScopeId {
        self.graph.borrow_mut().scopes.insert(ScopeData::default())
    }

    pub(crate) fn insert_child_scope(&self, parent: ScopeId) -> Result<ScopeId, ReactiveError> {
        let mut graph = self.graph.borrow_mut();
        if !graph.scopes.contains_key(parent) {
            return Err(ReactiveError::DisposedAccess { node: "scope" });
        }
        let id = graph.scopes.insert(ScopeData {
            parent: Some(parent),
            ..ScopeData::default()
        });
        if let Some(data) = graph.scopes.get_mut(parent) {
            data.children.push(id);
        }
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Disposal and introspection
    // -----------------------------------------------------------------------

    pub(crate) fn dispose_node(&self, id: NodeId) {
        if self.graph.borrow_mut().remove_node(id) {
            trace!(?id, "node disposed");
        }
    }

    pub(crate) fn dispose_scope(&self, id: ScopeId) {
        if self.graph.borrow_mut().remove_scope(id) {
            debug!(?id, "scope disposed");
        }
    }

    pub(crate) fn contains_node(&self, id: NodeId) -> bool {
        self.graph.borrow().nodes.contains_key(id)
    }

    pub(crate) fn contains_scope(&self, id: ScopeId) -> bool {
        self.graph.borrow().scopes.contains_key(id)
    }

    pub(crate) fn subscriber_count(&self, id: NodeId) -> usize {
        self.graph
            .borrow()
            .nodes
            .get(id)
            .map_or(0, |n| n.subscribers.len())
    }

    pub(crate) fn source_count(&self, id: NodeId) -> usize {
        self.graph
            .borrow()
            .nodes
            .get(id)
            .map_or(0, |n| n.sources.len())
    }

    pub(crate) fn scope_node_count(&self, id: ScopeId) -> usize {
        self.graph
            .borrow()
            .scopes
            .get(id)
            .map_or(0, |s| s.nodes.len())
    }

    // -----------------------------------------------------------------------
    // Reads and writes
    // -----------------------------------------------------------------------

    /// Register `id` as a source of the innermost tracking frame.
    fn track(&self, id: NodeId) {
        let mut graph = self.graph.borrow_mut();
        if let Some(Some(frame)) = graph.tracking.last_mut() {
            frame.sources.insert(id);
        }
    }

    pub(crate) fn read_signal(&self, id: NodeId, tracked: bool) -> Result<Value, ReactiveError> {
        let value = {
            let graph = self.graph.borrow();
            match graph.nodes.get(id).map(|n| &n.kind) {
                Some(NodeKind::Signal { value }) => value.clone(),
                _ => return Err(ReactiveError::DisposedAccess { node: "signal" }),
            }
        };
        if tracked {
            self.track(id);
        }
        Ok(value)
    }

    pub(crate) fn write_signal(&self, id: NodeId, value: Value) -> Result<(), ReactiveError> {
        {
            let mut graph = self.graph.borrow_mut();
            let node = graph
                .nodes
                .get_mut(id)
                .ok_or(ReactiveError::DisposedAccess { node: "signal" })?;
            let NodeKind::Signal { value: slot } = &mut node.kind else {
                return Err(ReactiveError::DisposedAccess { node: "signal" });
            };
            if self.config.write_equality == WriteEquality::SkipEqual && *slot == value {
                trace!(?id, "signal write skipped, value unchanged");
                return Ok(());
            }
            *slot = value;
            trace!(
                ?id,
                kind = slot.type_name(),
                subscribers = node.subscribers.len(),
                "signal written"
            );
            let subscribers: Vec<NodeId> = node.subscribers.iter().copied().collect();
            for sub in subscribers {
                graph.mark(sub, State::Dirty);
            }
        }
        self.flush()
    }

    pub(crate) fn read_computed(&self, id: NodeId, tracked: bool) -> Result<Value, ReactiveError> {
        {
            let graph = self.graph.borrow();
            match graph.nodes.get(id).map(|n| &n.kind) {
                Some(NodeKind::Computed { compute: None, .. }) => {
                    return Err(ReactiveError::CyclicDependency)
                }
                Some(NodeKind::Computed { .. }) => {}
                _ => return Err(ReactiveError::DisposedAccess { node: "computed" }),
            }
        }
        self.update_if_necessary(id);
        if tracked {
            self.track(id);
        }
        let graph = self.graph.borrow();
        match graph.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Computed { value: Some(result), .. }) => result.clone(),
            Some(NodeKind::Computed { value: None, .. }) => Ok(Value::Undefined),
            _ => Err(ReactiveError::DisposedAccess { node: "computed" }),
        }
    }

    // -----------------------------------------------------------------------
    // Propagation
    // -----------------------------------------------------------------------

    fn state_of(&self, id: NodeId) -> Option<State> {
        self.graph.borrow().nodes.get(id).map(|n| n.state)
    }

    /// Bring `id` up to date: resolve `Check` against its sources, re-run if
    /// `Dirty`.
    fn update_if_necessary(&self, id: NodeId) {
        if self.state_of(id) == Some(State::Check) {
            let sources: Vec<NodeId> = {
                let graph = self.graph.borrow();
                graph
                    .nodes
                    .get(id)
                    .map(|n| n.sources.iter().copied().collect())
                    .unwrap_or_default()
            };
            for src in sources {
                if self.is_idle_computed(src) {
                    self.update_if_necessary(src);
                }
                if self.state_of(id) == Some(State::Dirty) {
                    break;
                }
            }
        }

        match self.state_of(id) {
            Some(State::Dirty) => self.run_node(id),
            Some(State::Check) => {
                if let Some(node) = self.graph.borrow_mut().nodes.get_mut(id) {
                    node.state = State::Clean;
                }
            }
            _ => {}
        }
    }

    /// A computed that exists and is not in the middle of its own run.
    fn is_idle_computed(&self, id: NodeId) -> bool {
        matches!(
            self.graph.borrow().nodes.get(id).map(|n| &n.kind),
            Some(NodeKind::Computed { compute: Some(_), .. })
        )
    }

    fn run_node(&self, id: NodeId) {
        let is_effect = matches!(
            self.graph.borrow().nodes.get(id).map(|n| &n.kind),
            Some(NodeKind::Effect { .. })
        );
        if is_effect {
            self.run_effect(id);
        } else {
            self.recompute(id);
        }
    }

    fn begin_tracking(&self) {
        self.graph.borrow_mut().tracking.push(Some(Frame {
            sources: IndexSet::new(),
        }));
    }

    fn end_tracking(&self) -> IndexSet<NodeId> {
        match self.graph.borrow_mut().tracking.pop() {
            Some(Some(frame)) => frame.sources,
            _ => IndexSet::new(),
        }
    }

    fn recompute(&self, id: NodeId) {
        let compute = {
            let mut graph = self.graph.borrow_mut();
            let Some(node) = graph.nodes.get_mut(id) else {
                return;
            };
            let NodeKind::Computed { compute, .. } = &mut node.kind else {
                return;
            };
            let Some(compute) = compute.take() else {
                return;
            };
            node.state = State::Clean;
            compute
        };
        let mut compute = compute;

        trace!(?id, "recomputing");
        self.begin_tracking();
        let result = compute(self);
        let sources = self.end_tracking();

        let mut graph = self.graph.borrow_mut();
        graph.relink(id, sources);
        let Some(node) = graph.nodes.get_mut(id) else {
            // Disposed during its own run.
            return;
        };
        let NodeKind::Computed { value, compute: slot } = &mut node.kind else {
            return;
        };
        *slot = Some(compute);
        let changed = value.as_ref() != Some(&result);
        *value = Some(result);
        if changed {
            let subscribers: Vec<NodeId> = node.subscribers.iter().copied().collect();
            for sub in subscribers {
                if let Some(sub) = graph.nodes.get_mut(sub) {
                    if sub.state == State::Check {
                        sub.state = State::Dirty;
                    }
                }
            }
        }
    }

    fn run_effect(&self, id: NodeId) {
        let run = {
            let mut graph = self.graph.borrow_mut();
            let Some(node) = graph.nodes.get_mut(id) else {
                return;
            };
            let NodeKind::Effect { run } = &mut node.kind else {
                return;
            };
            let Some(run) = run.take() else {
                return;
            };
            node.state = State::Clean;
            run
        };
        let mut run = run;

        trace!(?id, "running effect");
        self.begin_tracking();
        run(self);
        let sources = self.end_tracking();

        let mut graph = self.graph.borrow_mut();
        graph.relink(id, sources);
        if let Some(NodeKind::Effect { run: slot }) = graph.nodes.get_mut(id).map(|n| &mut n.kind) {
            *slot = Some(run);
        }
    }

    /// Run queued effects until the queue is empty.
    fn flush(&self) -> Result<(), ReactiveError> {
        {
            let mut graph = self.graph.borrow_mut();
            if graph.batch_depth > 0 || graph.flushing {
                return Ok(());
            }
            graph.flushing = true;
        }

        let limit = self.config.max_effect_runs;
        let mut runs = 0;
        let mut result = Ok(());
        loop {
            let next = self.graph.borrow_mut().pending.shift_remove_index(0);
            let Some(effect) = next else {
                break;
            };
            runs += 1;
            if runs > limit {
                let mut graph = self.graph.borrow_mut();
                warn!(
                    runs = limit,
                    dropped = graph.pending.len() + 1,
                    "effect propagation did not settle, dropping queued effects"
                );
                if let Some(node) = graph.nodes.get_mut(effect) {
                    node.state = State::Clean;
                }
                for id in mem::take(&mut graph.pending) {
                    if let Some(node) = graph.nodes.get_mut(id) {
                        node.state = State::Clean;
                    }
                }
                result = Err(ReactiveError::PropagationLimit { runs: limit });
                break;
            }
            self.update_if_necessary(effect);
        }

        self.graph.borrow_mut().flushing = false;
        result
    }
}
