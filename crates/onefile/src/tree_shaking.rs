use std::collections::VecDeque;

use indexmap::IndexSet;
use log::{debug, trace};
use rustc_hash::FxHashMap;
use ruff_text_size::Ranged;

use crate::{
    error::{BundleError, Result},
    imports::ImportedSymbol,
    module_loader::{ModuleLoader, ModuleRecord},
    symbol_graph::{SymbolArena, SymbolDefinition, SymbolId},
    visitors::{DefinitionTimeCollector, NameLoadCollector},
};

/// Everything reachable from the entry file's library imports
#[derive(Debug, Default)]
pub struct SymbolClosure {
    /// Included definitions in discovery order
    pub arena: SymbolArena,
    /// `alias = name` lines for the entry file's renaming imports, first
    /// occurrence wins
    pub aliases: IndexSet<String>,
}

/// Where a request for a symbol came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requester {
    /// An import in the entry file; its alias is needed by the entry body only
    Entry,
    /// A library module's import binding read by an included definition; its
    /// alias must exist before that definition runs
    Library,
}

/// Computes the transitive set of library symbols the entry file needs.
///
/// Starting from the imported symbols, every included definition pulls in
/// the names it loads that are defined in its own module, or that its
/// module binds through an import from another library module.
#[derive(Debug)]
pub struct TreeShaker<'a> {
    loader: &'a mut ModuleLoader,
    closure: SymbolClosure,
    /// (module, body statement index) to the definition emitted for it
    statements: FxHashMap<(String, usize), SymbolId>,
}

impl<'a> TreeShaker<'a> {
    pub fn new(loader: &'a mut ModuleLoader) -> Self {
        Self {
            loader,
            closure: SymbolClosure::default(),
            statements: FxHashMap::default(),
        }
    }

    /// Run the breadth-first closure over `seeds`.
    ///
    /// Terminates because a `(module, name)` pair is materialized at most
    /// once and only unseen pairs enqueue further work.
    pub fn shake(mut self, seeds: impl IntoIterator<Item = ImportedSymbol>) -> Result<SymbolClosure> {
        let mut queue: VecDeque<(ImportedSymbol, Requester)> = seeds
            .into_iter()
            .map(|seed| (seed, Requester::Entry))
            .collect();
        debug!("Starting symbol closure from {} imported symbols", queue.len());

        while let Some((item, requester)) = queue.pop_front() {
            let record = self.loader.load(&item.module)?;
            let Some(stmt_index) = record.symbols.get(&item.name) else {
                return Err(BundleError::SymbolNotFound {
                    module: item.module,
                    symbol: item.name,
                    path: record.path().to_path_buf(),
                });
            };

            let arena = &mut self.closure.arena;
            let id = if let Some(id) = arena.lookup(&item.module, &item.name) {
                id
            } else if let Some(&id) = self.statements.get(&(item.module.clone(), stmt_index)) {
                // Another name bound by the same statement was already included
                arena.register_name(&item.module, &item.name, id);
                id
            } else {
                let stmt = &record.parsed.module().body[stmt_index];
                let range = stmt.range();
                let id = arena.insert(SymbolDefinition {
                    name: item.name.clone(),
                    module: item.module.clone(),
                    line: record.parsed.lines().line_number(range.start()),
                    source: record.parsed.text(range).trim_end().to_owned(),
                    definition_deps: DefinitionTimeCollector::collect(stmt),
                    bound_aliases: Vec::new(),
                });
                self.statements.insert((item.module.clone(), stmt_index), id);

                let mut loads: Vec<String> =
                    NameLoadCollector::collect_from_stmt(stmt).into_iter().collect();
                loads.sort_unstable();
                for name in loads {
                    if let Some(next) = Self::follow(record, arena, name) {
                        trace!(
                            "{}.{} pulls in {}.{}",
                            item.module, item.name, next.module, next.name
                        );
                        queue.push_back((next, Requester::Library));
                    }
                }
                id
            };

            if let Some(assignment) = item.alias_assignment() {
                match (requester, item.alias.as_deref()) {
                    (Requester::Library, Some(alias)) => {
                        self.closure.arena.bind_alias(id, alias, assignment);
                    }
                    _ => {
                        self.closure.aliases.insert(assignment);
                    }
                }
            }
        }

        debug!(
            "Symbol closure includes {} definitions and {} aliases",
            self.closure.arena.len(),
            self.closure.aliases.len()
        );
        Ok(self.closure)
    }

    /// The symbol a name loaded inside `record` refers to, if it still has
    /// to be included or bound
    fn follow(record: &ModuleRecord, arena: &SymbolArena, name: String) -> Option<ImportedSymbol> {
        if record.symbols.contains(&name) {
            return (!arena.contains(&record.name, &name))
                .then(|| ImportedSymbol::new(record.name.as_str(), name, None));
        }

        record.imports.library_bindings.get(&name).cloned()
    }
}
