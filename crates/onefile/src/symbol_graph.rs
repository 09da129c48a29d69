//! Symbol arena and definition-time ordering
//!
//! Every included definition lives in a [`SymbolArena`] and is addressed by
//! its [`SymbolId`], so two modules defining the same name stay distinct.
//! Two lookups sit next to each other on purpose:
//! - the arena itself, in inclusion order, drives emission
//! - a first-registered name resolver drives edge construction
//!
//! The ordering is Kahn's algorithm with a FIFO ready queue seeded and
//! released in inclusion order, which makes it stable. When a cycle keeps
//! some definitions from ever becoming ready, the whole order falls back to
//! inclusion order.

use std::{collections::VecDeque, ops::Index};

use log::{debug, trace, warn};
use petgraph::{
    Direction,
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};
use rustc_hash::FxHashMap;

use crate::types::FxIndexSet;

/// Unique identifier for an included definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A top-level definition selected for the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDefinition {
    pub name: String,
    /// Dotted name of the module that defines it
    pub module: String,
    /// 1-based line where the definition (including decorators) starts
    pub line: usize,
    /// Exact original source text, trailing whitespace trimmed
    pub source: String,
    /// Names evaluated when the definition executes
    pub definition_deps: FxIndexSet<String>,
    /// `alias = name` lines a library module's renaming import needs right
    /// after the definition
    pub bound_aliases: Vec<String>,
}

#[derive(Debug, Default)]
pub struct SymbolArena {
    definitions: Vec<SymbolDefinition>,
    /// (module, name) to the definition materialized for it
    by_key: FxHashMap<(String, String), SymbolId>,
    /// Name to the first definition registered under it, across modules
    first_by_name: FxHashMap<String, SymbolId>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition at the end of the inclusion order
    pub fn insert(&mut self, definition: SymbolDefinition) -> SymbolId {
        let id = SymbolId::new(self.definitions.len() as u32);
        self.first_by_name
            .entry(definition.name.clone())
            .or_insert(id);
        self.by_key
            .insert((definition.module.clone(), definition.name.clone()), id);
        trace!(
            "Included {}.{} (line {}) as {id:?}",
            definition.module, definition.name, definition.line
        );
        self.definitions.push(definition);
        id
    }

    /// Make `name` in `module` refer to an already included definition, for
    /// statements that bind several names such as `a = b = 0`
    pub fn register_name(&mut self, module: &str, name: &str, id: SymbolId) {
        self.first_by_name.entry(name.to_owned()).or_insert(id);
        self.by_key
            .entry((module.to_owned(), name.to_owned()))
            .or_insert(id);
    }

    /// Bind a renamed local name to `id`: ordering edges through `alias`
    /// resolve to the definition, and `alias = name` is emitted right after it
    pub fn bind_alias(&mut self, id: SymbolId, alias: &str, assignment: String) {
        self.first_by_name.entry(alias.to_owned()).or_insert(id);
        let definition = &mut self.definitions[id.index()];
        if !definition.bound_aliases.contains(&assignment) {
            trace!(
                "Bound {alias} to {}.{}",
                definition.module, definition.name
            );
            definition.bound_aliases.push(assignment);
        }
    }

    pub fn lookup(&self, module: &str, name: &str) -> Option<SymbolId> {
        self.by_key
            .get(&(module.to_owned(), name.to_owned()))
            .copied()
    }

    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.lookup(module, name).is_some()
    }

    /// The definition ordering edges resolve `name` to
    pub fn first_registered(&self, name: &str) -> Option<SymbolId> {
        self.first_by_name.get(name).copied()
    }

    /// Ids in inclusion order
    pub fn ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        (0..self.definitions.len() as u32).map(SymbolId::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &SymbolDefinition)> {
        self.ids().zip(&self.definitions)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Index<SymbolId> for SymbolArena {
    type Output = SymbolDefinition;

    fn index(&self, id: SymbolId) -> &Self::Output {
        &self.definitions[id.index()]
    }
}

/// Result of one topological sort attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOutcome {
    /// Whether every definition was placed
    pub complete: bool,
    /// Definitions placed before the sort stalled, or all of them
    pub order: Vec<SymbolId>,
}

/// Definition-time dependency graph over the included symbols.
///
/// An edge `B -> A` means B must be emitted before A. Node indices match
/// symbol ids because nodes are added in inclusion order.
#[derive(Debug)]
pub struct DefinitionGraph {
    graph: DiGraph<SymbolId, ()>,
}

impl DefinitionGraph {
    pub fn build(arena: &SymbolArena) -> Self {
        let mut graph: DiGraph<SymbolId, ()> = DiGraph::with_capacity(arena.len(), 0);
        for id in arena.ids() {
            graph.add_node(id);
        }

        for (id, definition) in arena.iter() {
            for dep in &definition.definition_deps {
                let Some(target) = arena.first_registered(dep) else {
                    continue;
                };
                if target == id {
                    continue;
                }
                graph.update_edge(
                    NodeIndex::new(target.index()),
                    NodeIndex::new(id.index()),
                    (),
                );
            }
        }

        debug!(
            "Built definition graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Self { graph }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Stable Kahn sort; reports whether every node was placed
    pub fn stable_toposort(&self) -> SortOutcome {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|node| {
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .count()
            })
            .collect();

        let mut ready: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|node| in_degree[node.index()] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(node) = ready.pop_front() {
            order.push(self.graph[node]);

            // petgraph yields neighbors newest-first; release in inclusion order
            let mut dependents: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .collect();
            dependents.sort_unstable();
            for dependent in dependents {
                in_degree[dependent.index()] -= 1;
                if in_degree[dependent.index()] == 0 {
                    ready.push_back(dependent);
                }
            }
        }

        SortOutcome {
            complete: order.len() == self.graph.node_count(),
            order,
        }
    }

    /// Groups of definitions that depend on each other at definition time
    pub fn cycles(&self) -> Vec<Vec<SymbolId>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut ids: Vec<SymbolId> =
                    component.into_iter().map(|node| self.graph[node]).collect();
                ids.sort_unstable();
                ids
            })
            .collect()
    }
}

/// Order the included definitions so dependencies come first, or keep
/// inclusion order when that is impossible.
pub fn resolve_order(arena: &SymbolArena) -> Vec<SymbolId> {
    let graph = DefinitionGraph::build(arena);
    let outcome = graph.stable_toposort();
    if outcome.complete {
        return outcome.order;
    }

    for cycle in graph.cycles() {
        let names: Vec<String> = cycle
            .iter()
            .map(|id| format!("{}.{}", arena[*id].module, arena[*id].name))
            .collect();
        warn!(
            "Definition-time cycle between {}; keeping discovery order",
            names.join(", ")
        );
    }
    arena.ids().collect()
}
