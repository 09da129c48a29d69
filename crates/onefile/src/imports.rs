//! Classification of top-level import statements
//!
//! The entry file and the library modules treat the same import forms
//! differently: the entry file names the symbols to inline, while library
//! modules contribute import lines to the bundle header and bindings that
//! point at other library modules.

use indexmap::IndexMap;
use log::{trace, warn};
use ruff_python_ast::{Stmt, StmtImportFrom};
use ruff_text_size::Ranged;

use crate::{
    error::{BundleError, Result, UnsupportedImportForm},
    line_index::LineSpan,
    module_loader::ParsedSource,
    resolver::{ImportType, ModuleResolver},
};

/// One name pulled from the library namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedSymbol {
    pub module: String,
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedSymbol {
    pub fn new(module: impl Into<String>, name: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            alias,
        }
    }

    /// `alias = name` when the import renames the symbol
    pub fn alias_assignment(&self) -> Option<String> {
        self.alias
            .as_deref()
            .filter(|alias| *alias != self.name)
            .map(|alias| format!("{alias} = {}", self.name))
    }
}

fn is_future_import(import_from: &StmtImportFrom) -> bool {
    import_from.level == 0
        && import_from
            .module
            .as_ref()
            .is_some_and(|module| module.as_str() == "__future__")
}

fn absolute_module<'a>(
    import_from: &'a StmtImportFrom,
    resolver: &ModuleResolver,
) -> Option<&'a str> {
    if import_from.level != 0 {
        return None;
    }
    import_from
        .module
        .as_ref()
        .map(|module| module.as_str())
        .filter(|module| resolver.is_library_module(module))
}

/// What the entry file imports and which of its lines must leave the body
#[derive(Debug, Default)]
pub struct EntryImports {
    /// Symbols requested through `from <ns>... import ...`, in source order
    pub symbols: Vec<ImportedSymbol>,
    /// Source text of every library import statement
    pub library_statements: Vec<String>,
    /// Source text of every `from __future__ import ...` statement
    pub future_statements: Vec<String>,
    /// Lines removed from the entry body
    pub removed_lines: Vec<LineSpan>,
}

impl EntryImports {
    /// Scan the entry file's top-level statements.
    ///
    /// Whole-module and wildcard imports of the library namespace are
    /// rejected: there is no way to tell which symbols they need.
    pub fn analyze(entry: &ParsedSource, resolver: &ModuleResolver) -> Result<Self> {
        let mut imports = Self::default();

        for stmt in &entry.module().body {
            match stmt {
                Stmt::ImportFrom(import_from) => {
                    if let Some(module) = absolute_module(import_from, resolver) {
                        if import_from.names.iter().any(|alias| alias.name.as_str() == "*") {
                            return Err(BundleError::UnsupportedImport {
                                module: module.to_owned(),
                                form: UnsupportedImportForm::Wildcard,
                            });
                        }
                        imports
                            .symbols
                            .extend(import_from.names.iter().map(|alias| {
                                ImportedSymbol::new(
                                    module,
                                    alias.name.as_str(),
                                    alias.asname.as_ref().map(ToString::to_string),
                                )
                            }));
                        imports
                            .library_statements
                            .push(entry.text(stmt.range()).to_owned());
                        imports.removed_lines.push(entry.line_span(stmt.range()));
                    } else if is_future_import(import_from) {
                        imports
                            .future_statements
                            .push(entry.text(stmt.range()).to_owned());
                        imports.removed_lines.push(entry.line_span(stmt.range()));
                    }
                }
                Stmt::Import(import) => {
                    if let Some(alias) = import
                        .names
                        .iter()
                        .find(|alias| resolver.is_library_module(alias.name.as_str()))
                    {
                        return Err(BundleError::UnsupportedImport {
                            module: alias.name.to_string(),
                            form: UnsupportedImportForm::WholeModule,
                        });
                    }
                }
                _ => {}
            }
        }

        trace!(
            "Entry imports {} library symbols from {} statements",
            imports.symbols.len(),
            imports.library_statements.len()
        );
        Ok(imports)
    }
}

/// Import statements found at the top level of one library module
#[derive(Debug, Default)]
pub struct ModuleImports {
    /// `from __future__ import ...` statements
    pub future: Vec<String>,
    /// Statements importing anything outside the library namespace
    pub ordinary: Vec<String>,
    /// Local name to the library symbol it is bound to
    pub library_bindings: IndexMap<String, ImportedSymbol>,
}

impl ModuleImports {
    pub fn collect(
        module_name: &str,
        is_package: bool,
        parsed: &ParsedSource,
        resolver: &ModuleResolver,
        warn_third_party: bool,
    ) -> Self {
        let mut imports = Self::default();

        for stmt in &parsed.module().body {
            match stmt {
                Stmt::ImportFrom(import_from) if is_future_import(import_from) => {
                    imports.future.push(parsed.text(stmt.range()).to_owned());
                }
                Stmt::ImportFrom(import_from) => {
                    let target = if import_from.level == 0 {
                        absolute_module(import_from, resolver).map(ToOwned::to_owned)
                    } else {
                        let target = resolver.resolve_relative(
                            module_name,
                            is_package,
                            import_from.level,
                            import_from.module.as_ref().map(|module| module.as_str()),
                        );
                        if target.is_none() {
                            warn!(
                                "Dropping relative import in '{module_name}' that leaves the \
                                 '{}' namespace: {}",
                                resolver.namespace(),
                                parsed.text(stmt.range())
                            );
                            continue;
                        }
                        target
                    };

                    match target {
                        Some(target) => {
                            imports.bind_library_names(module_name, &target, import_from);
                        }
                        None => {
                            if let Some(module) = &import_from.module {
                                check_third_party(
                                    module_name,
                                    module.as_str(),
                                    resolver,
                                    warn_third_party,
                                );
                            }
                            imports.ordinary.push(parsed.text(stmt.range()).to_owned());
                        }
                    }
                }
                Stmt::Import(import) => {
                    if import
                        .names
                        .iter()
                        .any(|alias| resolver.is_library_module(alias.name.as_str()))
                    {
                        warn!(
                            "Dropping whole-module library import in '{module_name}': {}",
                            parsed.text(stmt.range())
                        );
                        continue;
                    }
                    for alias in &import.names {
                        check_third_party(
                            module_name,
                            alias.name.as_str(),
                            resolver,
                            warn_third_party,
                        );
                    }
                    imports.ordinary.push(parsed.text(stmt.range()).to_owned());
                }
                _ => {}
            }
        }

        imports
    }

    fn bind_library_names(&mut self, module_name: &str, target: &str, import_from: &StmtImportFrom) {
        for alias in &import_from.names {
            if alias.name.as_str() == "*" {
                warn!("Dropping wildcard library import in '{module_name}': from {target} import *");
                continue;
            }
            let local = alias.asname.as_ref().unwrap_or(&alias.name).to_string();
            trace!("'{module_name}' binds '{local}' to {target}.{}", alias.name);
            self.library_bindings.entry(local).or_insert_with(|| {
                ImportedSymbol::new(
                    target,
                    alias.name.as_str(),
                    alias.asname.as_ref().map(ToString::to_string),
                )
            });
        }
    }
}

fn check_third_party(
    module_name: &str,
    imported: &str,
    resolver: &ModuleResolver,
    warn_third_party: bool,
) {
    if warn_third_party && resolver.classify_import(imported) == ImportType::ThirdParty {
        warn!(
            "'{module_name}' imports third-party module '{imported}', which the judge may not \
             provide"
        );
    }
}
