//! Parsing and caching of library modules
//!
//! A [`ParsedSource`] keeps the raw text next to ruff's tree so the exact
//! original text of any node can be sliced back out. The [`ModuleLoader`]
//! turns dotted names into cached [`ModuleRecord`]s and accumulates the
//! import lines every loaded module contributes to the bundle header.

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::{IndexMap, map::Entry};
use log::debug;
use ruff_python_ast::ModModule;
use ruff_python_parser::parse_module;
use ruff_text_size::TextRange;

use crate::{
    error::{BundleError, Result},
    imports::ModuleImports,
    line_index::{LineIndex, LineSpan},
    resolver::ModuleResolver,
    symbol_table::SymbolTable,
};

/// Source text of one file together with its syntax tree
#[derive(Debug)]
pub struct ParsedSource {
    path: PathBuf,
    source: String,
    module: ModModule,
    lines: LineIndex,
}

impl ParsedSource {
    pub fn read(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, source)
    }

    pub fn parse(path: &Path, source: String) -> Result<Self> {
        let lines = LineIndex::from_source(&source);
        let module = match parse_module(&source) {
            Ok(parsed) => parsed.into_syntax(),
            Err(err) => {
                return Err(BundleError::ParseFailure {
                    path: path.to_path_buf(),
                    message: format!(
                        "{} (line {})",
                        err.error,
                        lines.line_number(err.location.start())
                    ),
                });
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            source,
            module,
            lines,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    pub fn module(&self) -> &ModModule {
        &self.module
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    /// Exact original text covered by `range`
    pub fn text(&self, range: TextRange) -> &str {
        &self.source.as_str()[range]
    }

    pub fn line_span(&self, range: TextRange) -> LineSpan {
        self.lines.line_span(range)
    }
}

/// One library module, loaded once per bundling run
#[derive(Debug)]
pub struct ModuleRecord {
    pub name: String,
    pub parsed: ParsedSource,
    pub symbols: SymbolTable,
    pub imports: ModuleImports,
}

impl ModuleRecord {
    pub fn path(&self) -> &Path {
        self.parsed.path()
    }
}

/// Loads library modules by dotted name, caching each one for the run
#[derive(Debug)]
pub struct ModuleLoader {
    resolver: ModuleResolver,
    warn_third_party: bool,
    modules: IndexMap<String, ModuleRecord>,
    future_imports: Vec<String>,
    ordinary_imports: Vec<String>,
}

impl ModuleLoader {
    pub fn new(resolver: ModuleResolver, warn_third_party: bool) -> Self {
        Self {
            resolver,
            warn_third_party,
            modules: IndexMap::new(),
            future_imports: Vec::new(),
            ordinary_imports: Vec::new(),
        }
    }

    /// Load `module_name`, or return the record cached by an earlier call.
    ///
    /// A module's import lines are collected only the first time it loads.
    pub fn load(&mut self, module_name: &str) -> Result<&ModuleRecord> {
        match self.modules.entry(module_name.to_owned()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self.resolver.resolve_module_path(module_name)?;
                let parsed = ParsedSource::read(&path)?;
                let is_package = path.file_name().is_some_and(|name| name == "__init__.py");

                let symbols = SymbolTable::build(parsed.module());
                let imports = ModuleImports::collect(
                    module_name,
                    is_package,
                    &parsed,
                    &self.resolver,
                    self.warn_third_party,
                );
                self.future_imports.extend(imports.future.iter().cloned());
                self.ordinary_imports.extend(imports.ordinary.iter().cloned());

                debug!(
                    "Loaded module '{module_name}' from {} with {} symbols",
                    path.display(),
                    symbols.len()
                );

                Ok(entry.insert(ModuleRecord {
                    name: module_name.to_owned(),
                    parsed,
                    symbols,
                    imports,
                }))
            }
        }
    }

    pub fn get(&self, module_name: &str) -> Option<&ModuleRecord> {
        self.modules.get(module_name)
    }

    /// `__future__` import lines of every loaded module, in load order
    pub fn future_imports(&self) -> &[String] {
        &self.future_imports
    }

    /// Non-library import lines of every loaded module, in load order
    pub fn ordinary_imports(&self) -> &[String] {
        &self.ordinary_imports
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write_library(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (relative, content) in files {
            let path = temp_dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_parse_failure_names_path() {
        let err = ParsedSource::parse(Path::new("broken.py"), "def f(:\n".to_string())
            .unwrap_err();
        match err {
            BundleError::ParseFailure { path, message } => {
                assert_eq!(path, PathBuf::from("broken.py"));
                assert!(message.contains("line 1"), "got: {message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_text_slices_original_source() {
        let parsed =
            ParsedSource::parse(Path::new("m.py"), "x = 1\n\ndef f():\n    return x\n".to_string())
                .unwrap();
        let function = &parsed.module().body[1];
        assert_eq!(
            parsed.text(ruff_text_size::Ranged::range(function)),
            "def f():\n    return x"
        );
    }

    #[test]
    fn test_load_caches_and_collects_imports_once() {
        let temp_dir = write_library(&[
            ("lib/__init__.py", ""),
            (
                "lib/util.py",
                "from __future__ import annotations\nimport sys\n\ndef f():\n    return sys.maxsize\n",
            ),
        ]);
        let resolver = ModuleResolver::new(temp_dir.path(), "lib", 11);
        let mut loader = ModuleLoader::new(resolver, true);

        let first_path = loader.load("lib.util").unwrap().path().to_path_buf();
        let second_path = loader.load("lib.util").unwrap().path().to_path_buf();
        assert_eq!(first_path, second_path);

        assert_eq!(
            loader.future_imports(),
            ["from __future__ import annotations".to_string()]
        );
        assert_eq!(loader.ordinary_imports(), ["import sys".to_string()]);
        assert!(loader.get("lib.util").unwrap().symbols.contains("f"));
    }

    #[test]
    fn test_load_missing_module() {
        let temp_dir = write_library(&[("lib/__init__.py", "")]);
        let resolver = ModuleResolver::new(temp_dir.path(), "lib", 11);
        let mut loader = ModuleLoader::new(resolver, true);
        assert!(matches!(
            loader.load("lib.absent"),
            Err(BundleError::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn test_load_reports_module_parse_failure() {
        let temp_dir = write_library(&[("lib/bad.py", "class :\n")]);
        let resolver = ModuleResolver::new(temp_dir.path(), "lib", 11);
        let mut loader = ModuleLoader::new(resolver, true);
        let err = loader.load("lib.bad").unwrap_err();
        assert!(err.to_string().contains("bad.py"), "got: {err}");
    }
}
