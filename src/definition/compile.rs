//! Compilation of a `MachineConfig` into a `MachineDefinition`.
//!
//! Compilation runs in three passes: lay the tree out in document order,
//! check each node's structure, then resolve transitions. Every check yields
//! a `Validation`, and all of them are combined with `Validation::all_vec`, so
//! a description with several problems reports all of them at once.

use super::config::{ActionConfig, HistoryType, MachineConfig, StateConfig, StateType};
use super::error::{CompileError, DefinitionError};
use super::machine::MachineDefinition;
use super::node::{HistoryKind, NodeId, StateKind, StateNode, Transition};
use crate::core::{Event, GuardRegistry};
use crate::engine::InterpreterOptions;
use std::collections::BTreeMap;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

type Check = Validation<(), NonEmptyVec<DefinitionError>>;

fn ensure(condition: bool, error: impl FnOnce() -> DefinitionError) -> Check {
    if condition {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

fn combine(checks: Vec<Check>) -> Check {
    Validation::all_vec(checks).map(|_| ())
}

pub(crate) fn compile<C>(
    config: &MachineConfig,
    guards: GuardRegistry<C>,
    options: InterpreterOptions,
) -> Result<MachineDefinition<C>, CompileError> {
    let mut layout = Layout::default();
    layout
        .checks
        .push(ensure(!config.id.is_empty(), || DefinitionError::MissingMachineId));
    layout.place(&config.id, &config.root, None, 0);

    let Layout {
        nodes,
        raw,
        ids,
        mut checks,
    } = layout;

    let mut definition = MachineDefinition {
        id: config.id.clone(),
        nodes,
        ids,
        guards,
        options,
    };

    for (index, state) in raw.iter().enumerate() {
        checks.push(check_structure(&mut definition, NodeId(index), state));
    }
    for (index, state) in raw.iter().enumerate() {
        checks.push(compile_transitions(&mut definition, NodeId(index), state));
    }

    match Validation::all_vec(checks).into_result() {
        Ok(_) => {
            debug!(
                machine = %definition.id,
                states = definition.nodes.len(),
                "Compiled machine definition"
            );
            Ok(definition)
        }
        Err(errors) => {
            let errors = errors.into_vec();
            debug!(
                machine = %config.id,
                errors = errors.len(),
                "Rejected machine definition"
            );
            Err(CompileError::new(errors))
        }
    }
}

#[derive(Default)]
struct Layout<'a> {
    nodes: Vec<StateNode>,
    raw: Vec<&'a StateConfig>,
    ids: BTreeMap<String, NodeId>,
    checks: Vec<Check>,
}

impl<'a> Layout<'a> {
    fn place(
        &mut self,
        key: &str,
        config: &'a StateConfig,
        parent: Option<NodeId>,
        depth: usize,
    ) -> NodeId {
        let node_id = NodeId(self.nodes.len());
        let id = match parent {
            Some(parent) => {
                let parent_id = self.nodes[parent.0].id.clone();
                self.checks.push(ensure(is_valid_key(key), || {
                    DefinitionError::InvalidKey {
                        parent: parent_id.clone(),
                        key: key.to_string(),
                    }
                }));
                format!("{parent_id}.{key}")
            }
            None => key.to_string(),
        };

        self.register(id.clone(), node_id);
        if let Some(alias) = config.id.as_ref().filter(|alias| **alias != id) {
            self.register(alias.clone(), node_id);
        }

        self.nodes.push(StateNode {
            key: key.to_string(),
            id,
            alias: config.id.clone(),
            kind: kind_of(config),
            parent,
            children: Vec::new(),
            initial: None,
            depth,
            on: BTreeMap::new(),
            entry: config.entry.iter().map(ActionConfig::to_action).collect(),
            exit: config.exit.iter().map(ActionConfig::to_action).collect(),
            history_default: Vec::new(),
        });
        self.raw.push(config);

        for (child_key, child) in config.states.iter() {
            let child_id = self.place(child_key, child, Some(node_id), depth + 1);
            self.nodes[node_id.0].children.push(child_id);
        }

        node_id
    }

    fn register(&mut self, id: String, node: NodeId) {
        let fresh = !self.ids.contains_key(&id);
        self.checks
            .push(ensure(fresh, || DefinitionError::DuplicateId { id: id.clone() }));
        if fresh {
            self.ids.insert(id, node);
        }
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('.') && !key.contains('#')
}

fn kind_of(config: &StateConfig) -> StateKind {
    let history = || match config.history.unwrap_or_default() {
        HistoryType::Shallow => HistoryKind::Shallow,
        HistoryType::Deep => HistoryKind::Deep,
    };

    match config.kind {
        Some(StateType::Atomic) => StateKind::Atomic,
        Some(StateType::Compound) => StateKind::Compound,
        Some(StateType::Parallel) => StateKind::Parallel,
        Some(StateType::Final) => StateKind::Final,
        Some(StateType::History) => StateKind::History(history()),
        None if config.history.is_some() => StateKind::History(history()),
        None if !config.states.is_empty() => StateKind::Compound,
        None => StateKind::Atomic,
    }
}

fn check_structure<C>(
    definition: &mut MachineDefinition<C>,
    id: NodeId,
    config: &StateConfig,
) -> Check {
    let name = definition.node(id).id.clone();
    let kind = definition.node(id).kind;
    let declares_transitions = !config.on.is_empty() || config.on_done.is_some();
    let mut checks = Vec::new();

    if kind != StateKind::Compound && kind != StateKind::Parallel {
        if let Some(initial) = &config.initial {
            checks.push(Validation::fail(DefinitionError::UnknownInitial {
                state: name.clone(),
                initial: initial.clone(),
            }));
        }
    }

    match kind {
        StateKind::Compound => match &config.initial {
            None => checks.push(Validation::fail(DefinitionError::MissingInitial {
                state: name.clone(),
            })),
            Some(initial) => {
                let child = definition
                    .child_by_key(id, initial)
                    .filter(|child| !definition.kind(*child).is_history());
                match child {
                    Some(child) => definition.nodes[id.0].initial = Some(child),
                    None => checks.push(Validation::fail(DefinitionError::UnknownInitial {
                        state: name.clone(),
                        initial: initial.clone(),
                    })),
                }
            }
        },
        StateKind::Parallel => {
            let has_regions = definition.state_children(id).next().is_some();
            checks.push(ensure(has_regions, || DefinitionError::EmptyParallel {
                state: name.clone(),
            }));
        }
        StateKind::Atomic => {
            checks.push(ensure(config.states.is_empty(), || {
                DefinitionError::UnexpectedChildren {
                    state: name.clone(),
                }
            }));
        }
        StateKind::Final => {
            checks.push(ensure(config.states.is_empty(), || {
                DefinitionError::InvalidFinal {
                    state: name.clone(),
                    reason: "declares child states".to_string(),
                }
            }));
            checks.push(ensure(!declares_transitions, || {
                DefinitionError::InvalidFinal {
                    state: name.clone(),
                    reason: "declares transitions".to_string(),
                }
            }));
        }
        StateKind::History(_) => checks.push(check_history(definition, id, config)),
    }

    combine(checks)
}

fn check_history<C>(
    definition: &mut MachineDefinition<C>,
    id: NodeId,
    config: &StateConfig,
) -> Check {
    let name = definition.node(id).id.clone();
    let invalid = |reason: &str| DefinitionError::InvalidHistory {
        state: name.clone(),
        reason: reason.to_string(),
    };

    let Some(parent) = definition.node(id).parent else {
        return Validation::fail(invalid("cannot be the root state"));
    };

    let mut checks = vec![
        ensure(config.states.is_empty(), || invalid("declares child states")),
        ensure(config.on.is_empty() && config.on_done.is_none(), || {
            invalid("declares transitions")
        }),
    ];

    if let Some(target) = &config.target {
        match resolve_target(definition, id, target) {
            Some(node) if definition.is_descendant(node, parent) => {
                definition.nodes[id.0].history_default = vec![node];
            }
            Some(_) => checks.push(Validation::fail(invalid(
                "has a default target outside its parent state",
            ))),
            None => checks.push(Validation::fail(DefinitionError::UnresolvedTarget {
                state: name.clone(),
                event: "history default".to_string(),
                target: target.clone(),
            })),
        }
    }

    combine(checks)
}

fn compile_transitions<C>(
    definition: &mut MachineDefinition<C>,
    id: NodeId,
    config: &StateConfig,
) -> Check {
    let name = definition.node(id).id.clone();
    let done_event = config
        .on_done
        .as_ref()
        .map(|list| (Event::done_state(&name).name().to_string(), list));
    let declared = config
        .on
        .iter()
        .map(|(event, list)| (event.clone(), list))
        .chain(done_event);

    let mut checks = Vec::new();
    let mut on: BTreeMap<String, Vec<Transition>> = BTreeMap::new();

    for (event, list) in declared {
        for transition in list.iter() {
            let spec = transition.to_spec();

            let mut targets = Vec::with_capacity(spec.target.len());
            for target in &spec.target {
                match resolve_target(definition, id, target) {
                    Some(node) => targets.push(node),
                    None => checks.push(Validation::fail(DefinitionError::UnresolvedTarget {
                        state: name.clone(),
                        event: event.clone(),
                        target: target.clone(),
                    })),
                }
            }
            if targets.len() > 1 {
                checks.push(ensure(targets_are_disjoint(definition, &targets), || {
                    DefinitionError::ConflictingTargets {
                        state: name.clone(),
                        event: event.clone(),
                        targets: spec.target.clone(),
                    }
                }));
            }

            if let Some(guard) = &spec.cond {
                checks.push(ensure(definition.guards.contains(guard), || {
                    DefinitionError::UnknownGuard {
                        state: name.clone(),
                        event: event.clone(),
                        guard: guard.clone(),
                    }
                }));
            }

            let in_state = match &spec.in_state {
                Some(reference) => {
                    let resolved = resolve_in_state(definition, reference);
                    if resolved.is_none() {
                        checks.push(Validation::fail(DefinitionError::UnresolvedInState {
                            state: name.clone(),
                            event: event.clone(),
                            reference: reference.clone(),
                        }));
                    }
                    resolved
                }
                None => None,
            };

            let candidates = on.entry(event.clone()).or_default();
            candidates.push(Transition {
                source: id,
                event: event.clone(),
                position: candidates.len(),
                targets,
                guard: spec.cond.clone(),
                in_state,
                actions: spec.actions.iter().map(ActionConfig::to_action).collect(),
                internal: spec.internal,
            });
        }
    }

    definition.nodes[id.0].on = on;
    combine(checks)
}

/// Every pair of targets must sit in different regions of a parallel state.
fn targets_are_disjoint<C>(definition: &MachineDefinition<C>, targets: &[NodeId]) -> bool {
    targets.iter().enumerate().all(|(i, a)| {
        targets[i + 1..].iter().all(|b| {
            let shared = definition.common_ancestor(*a, *b);
            shared != *a && shared != *b && definition.kind(shared) == StateKind::Parallel
        })
    })
}

/// Resolve a transition target written on `source`.
///
/// - `#id` / `#alias.child`: absolute
/// - `.child.grandchild`: relative to the source
/// - `sibling` / `sibling.child`: relative to the source's parent
fn resolve_target<C>(definition: &MachineDefinition<C>, source: NodeId, target: &str) -> Option<NodeId> {
    if let Some(reference) = target.strip_prefix('#') {
        return resolve_reference(definition, reference);
    }
    if let Some(path) = target.strip_prefix('.') {
        return descend(definition, source, path);
    }
    let base = definition.node(source).parent.unwrap_or(source);
    descend(definition, base, target)
}

/// Resolve an `in` condition: `#id` or a dotted path from the root.
fn resolve_in_state<C>(definition: &MachineDefinition<C>, reference: &str) -> Option<NodeId> {
    match reference.strip_prefix('#') {
        Some(reference) => resolve_reference(definition, reference),
        None => definition.find_path(reference),
    }
}

fn resolve_reference<C>(definition: &MachineDefinition<C>, reference: &str) -> Option<NodeId> {
    definition.lookup(reference).or_else(|| {
        let (alias, rest) = reference.split_once('.')?;
        definition
            .lookup(alias)
            .and_then(|node| descend(definition, node, rest))
    })
}

fn descend<C>(definition: &MachineDefinition<C>, from: NodeId, path: &str) -> Option<NodeId> {
    path.split('.')
        .try_fold(from, |node, key| definition.child_by_key(node, key))
}
