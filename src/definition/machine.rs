//! The immutable, compiled machine definition.

use super::compile;
use super::config::MachineConfig;
use super::error::CompileError;
use super::node::{NodeId, StateKind, StateNode};
use crate::core::GuardRegistry;
use crate::engine::InterpreterOptions;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a compiled definition.
pub type MachineHandle<C> = Arc<MachineDefinition<C>>;

/// A compiled statechart.
///
/// The state tree is stored as a flat arena: every node records its parent
/// index and its children's indices, so there are no ownership cycles.
/// Nothing in a definition changes after compilation, which makes it safe to
/// share across threads and across any number of interpreter calls.
pub struct MachineDefinition<C> {
    pub(crate) id: String,
    pub(crate) nodes: Vec<StateNode>,
    pub(crate) ids: BTreeMap<String, NodeId>,
    pub(crate) guards: GuardRegistry<C>,
    pub(crate) options: InterpreterOptions,
}

impl<C> MachineDefinition<C> {
    /// Compile a description with default interpreter options.
    pub fn compile(config: &MachineConfig, guards: GuardRegistry<C>) -> Result<Self, CompileError> {
        compile::compile(config, guards, InterpreterOptions::default())
    }

    pub fn compile_with_options(
        config: &MachineConfig,
        guards: GuardRegistry<C>,
        options: InterpreterOptions,
    ) -> Result<Self, CompileError> {
        compile::compile(config, guards, options)
    }

    /// Move the definition behind a shareable handle.
    pub fn into_handle(self) -> MachineHandle<C> {
        Arc::new(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The node `id` refers to.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this definition; use
    /// [`get`](Self::get) for ids of unknown origin.
    pub fn node(&self, id: NodeId) -> &StateNode {
        &self.nodes[id.0]
    }

    /// The node `id` refers to, or `None` if this definition has no such node.
    pub fn get(&self, id: NodeId) -> Option<&StateNode> {
        self.nodes.get(id.0)
    }

    /// All nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &StateNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Find a node by full id (`"editor.edit.empty"`) or alias.
    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    /// Find a node by dotted path relative to the root (`"edit.empty"`).
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        path.split('.')
            .try_fold(self.root(), |node, key| self.child_by_key(node, key))
    }

    pub fn child_by_key(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).key == key)
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    pub fn guards(&self) -> &GuardRegistry<C> {
        &self.guards
    }

    /// Proper ancestors of `id`, innermost first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, C> {
        Ancestors {
            definition: self,
            next: self.node(id).parent,
        }
    }

    /// Whether `node` lies strictly below `ancestor`.
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let depth = self.node(ancestor).depth;
        self.node(node).depth > depth && self.ancestors(node).any(|candidate| candidate == ancestor)
    }

    /// Nearest node that is `a`, `b`, or an ancestor of both.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let (mut a, mut b) = (a, b);
        while self.node(a).depth > self.node(b).depth {
            a = self.node(a).parent.unwrap_or(a);
        }
        while self.node(b).depth > self.node(a).depth {
            b = self.node(b).parent.unwrap_or(b);
        }
        while a != b {
            match (self.node(a).parent, self.node(b).parent) {
                (Some(pa), Some(pb)) => {
                    a = pa;
                    b = pb;
                }
                _ => return self.root(),
            }
        }
        a
    }

    /// Children that can be active (history pseudo-states excluded).
    pub(crate) fn state_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|child| !self.node(*child).kind.is_history())
    }

    pub(crate) fn kind(&self, id: NodeId) -> StateKind {
        self.node(id).kind
    }
}

impl<C> fmt::Debug for MachineDefinition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineDefinition")
            .field("id", &self.id)
            .field("states", &self.nodes.len())
            .field("guards", &self.guards)
            .field("options", &self.options)
            .finish()
    }
}

/// Iterator over proper ancestors, innermost first.
pub struct Ancestors<'a, C> {
    definition: &'a MachineDefinition<C>,
    next: Option<NodeId>,
}

impl<C> Iterator for Ancestors<'_, C> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.definition.node(current).parent;
        Some(current)
    }
}
