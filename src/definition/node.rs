//! Compiled state nodes and transitions.

use crate::core::Action;
use std::collections::BTreeMap;
use std::fmt;

/// Index of a state node in its definition.
///
/// Nodes are numbered in document order (pre-order), so a parent always has
/// a lower index than its descendants and earlier siblings have lower
/// indices than later ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Depth of a history state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryKind {
    /// Remembers the parent's active child only.
    Shallow,
    /// Remembers every active atomic descendant of the parent.
    Deep,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateKind {
    Atomic,
    Compound,
    Parallel,
    Final,
    History(HistoryKind),
}

impl StateKind {
    /// Atomic and final states are the leaves of a configuration.
    pub fn is_leaf(self) -> bool {
        matches!(self, StateKind::Atomic | StateKind::Final)
    }

    pub fn is_history(self) -> bool {
        matches!(self, StateKind::History(_))
    }
}

/// A transition compiled against its definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub(crate) source: NodeId,
    pub(crate) event: String,
    pub(crate) position: usize,
    pub(crate) targets: Vec<NodeId>,
    pub(crate) guard: Option<String>,
    pub(crate) in_state: Option<NodeId>,
    pub(crate) actions: Vec<Action>,
    pub(crate) internal: bool,
}

impl Transition {
    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Declaration position among the source's candidates for this event.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    pub fn guard(&self) -> Option<&str> {
        self.guard.as_deref()
    }

    pub fn in_state(&self) -> Option<NodeId> {
        self.in_state
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// A targetless transition runs its actions without changing state.
    pub fn is_targetless(&self) -> bool {
        self.targets.is_empty()
    }

    /// Whether two references denote the same declared transition.
    pub(crate) fn same_as(&self, other: &Transition) -> bool {
        self.source == other.source && self.event == other.event && self.position == other.position
    }
}

/// One node of the compiled state tree.
#[derive(Clone, Debug)]
pub struct StateNode {
    pub(crate) key: String,
    pub(crate) id: String,
    pub(crate) alias: Option<String>,
    pub(crate) kind: StateKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) initial: Option<NodeId>,
    pub(crate) depth: usize,
    pub(crate) on: BTreeMap<String, Vec<Transition>>,
    pub(crate) entry: Vec<Action>,
    pub(crate) exit: Vec<Action>,
    pub(crate) history_default: Vec<NodeId>,
}

impl StateNode {
    /// Name of this state within its parent.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Full dotted id, starting with the machine id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn initial(&self) -> Option<NodeId> {
        self.initial
    }

    /// Distance from the root (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Candidate transitions for `event`, in declaration order.
    pub fn transitions_for(&self, event: &str) -> &[Transition] {
        self.on.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Events this state declares transitions for.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.on.keys().map(String::as_str)
    }

    pub fn entry(&self) -> &[Action] {
        &self.entry
    }

    pub fn exit(&self) -> &[Action] {
        &self.exit
    }

    /// Default targets of a history state with nothing recorded.
    pub fn history_default(&self) -> &[NodeId] {
        &self.history_default
    }
}
