use indexmap::IndexMap;
use ruff_python_ast::{Expr, ModModule, Stmt};

/// Top-level names of one module mapped to the index of their defining
/// statement in the module body.
///
/// Only the first top-level definition of a name is recorded. A later
/// redefinition (even a `def` after an assignment) is ignored, although at
/// runtime the last binding would be the effective one.
///
/// `a = b = 0` maps both names to the same statement; the bundle emits that
/// statement once however many of its names are needed.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: IndexMap<String, usize>,
}

impl SymbolTable {
    pub fn build(module: &ModModule) -> Self {
        let mut table = Self::default();

        for (index, stmt) in module.body.iter().enumerate() {
            match stmt {
                Stmt::FunctionDef(function_def) => {
                    table.define(function_def.name.as_str(), index);
                }
                Stmt::ClassDef(class_def) => {
                    table.define(class_def.name.as_str(), index);
                }
                Stmt::Assign(assign) => {
                    for target in &assign.targets {
                        if let Expr::Name(name) = target {
                            table.define(name.id.as_str(), index);
                        }
                    }
                }
                Stmt::AnnAssign(ann_assign) => {
                    if let Expr::Name(name) = ann_assign.target.as_ref() {
                        table.define(name.id.as_str(), index);
                    }
                }
                _ => {}
            }
        }

        table
    }

    fn define(&mut self, name: &str, index: usize) {
        self.symbols.entry(name.to_owned()).or_insert(index);
    }

    /// Index into the module body of the statement defining `name`
    pub fn get(&self, name: &str) -> Option<usize> {
        self.symbols.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
