use std::path::PathBuf;

use indexmap::IndexMap;
use log::{debug, trace};
use ruff_python_stdlib::sys;

use crate::error::{BundleError, Result};

/// Check if a module is part of the Python standard library using ruff_python_stdlib
fn is_stdlib_module(module_name: &str, python_version: u8) -> bool {
    // __future__ is not part of ruff's stdlib table
    if module_name == "__future__" {
        return true;
    }

    if sys::is_known_standard_library(python_version, module_name) {
        return true;
    }

    // Check if it's a submodule of a stdlib module
    if let Some(top_level) = module_name.split('.').next() {
        sys::is_known_standard_library(python_version, top_level)
    } else {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportType {
    /// Lives under the library namespace and gets inlined
    Library,
    ThirdParty,
    StandardLibrary,
}

/// Resolves dotted names of the library namespace to files under a root
/// directory.
///
/// `a.b` resolves to `root/a/b.py` first and to the package index
/// `root/a/b/__init__.py` second.
#[derive(Debug)]
pub struct ModuleResolver {
    root: PathBuf,
    namespace: String,
    /// Minor version of CPython 3 used for stdlib classification
    python_version: u8,
    /// Cache of resolved module paths
    module_cache: IndexMap<String, PathBuf>,
}

impl ModuleResolver {
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>, python_version: u8) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
            python_version,
            module_cache: IndexMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether `module_name` is the library namespace or one of its submodules
    pub fn is_library_module(&self, module_name: &str) -> bool {
        module_name
            .strip_prefix(self.namespace.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }

    pub fn classify_import(&self, module_name: &str) -> ImportType {
        if self.is_library_module(module_name) {
            ImportType::Library
        } else if is_stdlib_module(module_name, self.python_version) {
            ImportType::StandardLibrary
        } else {
            ImportType::ThirdParty
        }
    }

    /// Resolve a dotted module name to its source file
    pub fn resolve_module_path(&mut self, module_name: &str) -> Result<PathBuf> {
        if let Some(cached) = self.module_cache.get(module_name) {
            return Ok(cached.clone());
        }

        let target = module_name
            .split('.')
            .fold(self.root.clone(), |path, part| path.join(part));

        let file_candidate = target.with_extension("py");
        let package_candidate = target.join("__init__.py");

        let resolved = if file_candidate.is_file() {
            file_candidate
        } else if package_candidate.is_file() {
            package_candidate
        } else {
            return Err(BundleError::ModuleNotFound {
                module: module_name.to_owned(),
                file_candidate,
                package_candidate,
            });
        };

        debug!("Resolved module '{module_name}' to {}", resolved.display());
        self.module_cache
            .insert(module_name.to_owned(), resolved.clone());
        Ok(resolved)
    }

    /// Turn a relative `from` import inside `current_module` into an absolute
    /// library module name.
    ///
    /// One dot is the current package, every further dot climbs one level.
    /// Returns `None` when the import climbs out of the library namespace.
    pub fn resolve_relative(
        &self,
        current_module: &str,
        is_package: bool,
        level: u32,
        module: Option<&str>,
    ) -> Option<String> {
        let mut package: Vec<&str> = current_module.split('.').collect();
        if !is_package {
            package.pop();
        }

        for _ in 1..level {
            package.pop()?;
        }

        if let Some(module) = module {
            package.extend(module.split('.'));
        }

        let resolved = package.join(".");
        trace!("Relative import level {level} in '{current_module}' resolved to '{resolved}'");
        self.is_library_module(&resolved).then_some(resolved)
    }
}
