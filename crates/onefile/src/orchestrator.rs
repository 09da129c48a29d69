use std::{fs, path::Path};

use log::{debug, info};

use crate::{
    code_generator::{BundleParts, CodeGenerator},
    config::Config,
    error::{BundleError, Result},
    imports::EntryImports,
    module_loader::{ModuleLoader, ParsedSource},
    resolver::ModuleResolver,
    symbol_graph::resolve_order,
    tree_shaking::TreeShaker,
};

const DIRECTIVE_PREFIX: &str = "#!";

/// Drives one bundling run from an entry file to the final text
#[derive(Debug, Clone)]
pub struct BundleOrchestrator {
    config: Config,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Read and bundle the entry file at `entry_path`
    pub fn bundle_file(&self, entry_path: &Path) -> Result<String> {
        info!("Bundling {}", entry_path.display());
        let source = fs::read_to_string(entry_path).map_err(|source| BundleError::Io {
            path: entry_path.to_path_buf(),
            source,
        })?;
        self.bundle_source(entry_path, source)
    }

    /// Bundle entry text that was already read. `entry_path` is only used in
    /// error messages.
    ///
    /// An entry that imports nothing from the library namespace comes back
    /// unchanged, which also makes bundling an already bundled file a no-op.
    pub fn bundle_source(&self, entry_path: &Path, source: String) -> Result<String> {
        let entry = ParsedSource::parse(entry_path, source)?;
        let resolver = ModuleResolver::new(
            &self.config.root,
            self.config.namespace.as_str(),
            self.config.python_version,
        );

        let entry_imports = EntryImports::analyze(&entry, &resolver)?;
        if entry_imports.symbols.is_empty() {
            info!(
                "{} imports nothing from '{}', leaving it unchanged",
                entry_path.display(),
                self.config.namespace
            );
            return Ok(entry.into_source());
        }

        let mut loader = ModuleLoader::new(resolver, self.config.warn_third_party);
        let closure = TreeShaker::new(&mut loader).shake(entry_imports.symbols.iter().cloned())?;
        let order = resolve_order(&closure.arena);

        let directive = entry
            .source()
            .lines()
            .next()
            .filter(|line| line.starts_with(DIRECTIVE_PREFIX));
        let body = entry_body(&entry, &entry_imports, directive.is_some());

        let parts = BundleParts {
            directive,
            entry_library_imports: &entry_imports.library_statements,
            future_imports: entry_imports
                .future_statements
                .iter()
                .chain(loader.future_imports())
                .map(String::as_str)
                .collect(),
            ordinary_imports: loader.ordinary_imports().iter().map(String::as_str).collect(),
            symbols: order.iter().map(|id| &closure.arena[*id]).collect(),
            aliases: closure.aliases.iter().map(String::as_str).collect(),
            entry_body: &body,
        };

        debug!(
            "Emitting {} definitions and {} aliases",
            parts.symbols.len(),
            parts.aliases.len()
        );
        Ok(CodeGenerator::generate(&parts))
    }
}

/// The entry text with its library and `__future__` imports removed, and its
/// own `#!` line dropped when the bundle already starts with it
fn entry_body(entry: &ParsedSource, imports: &EntryImports, directive_emitted: bool) -> String {
    let stripped = entry
        .lines()
        .remove_lines(entry.source(), &imports.removed_lines);
    let mut body = stripped.trim_start_matches('\n');

    if directive_emitted && body.starts_with(DIRECTIVE_PREFIX) {
        body = body
            .split_once('\n')
            .map_or("", |(_, rest)| rest)
            .trim_start_matches('\n');
    }

    body.to_owned()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn orchestrator(temp_dir: &TempDir, files: &[(&str, &str)]) -> BundleOrchestrator {
        for (relative, content) in files {
            let path = temp_dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        BundleOrchestrator::new(Config {
            root: temp_dir.path().to_path_buf(),
            warn_third_party: false,
            ..Config::default()
        })
    }

    #[test]
    fn test_entry_without_library_imports_is_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&temp_dir, &[]);
        let source = "#!/usr/bin/env python3\nfrom __future__ import annotations\nimport sys\n\nprint(sys.argv)\n";
        let output = orchestrator
            .bundle_source(&PathBuf::from("main.py"), source.to_string())
            .unwrap();
        assert_eq!(output, source);
    }

    #[test]
    fn test_directive_is_emitted_once() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&temp_dir, &[("lib/util.py", "ONE = 1\n")]);
        let source = "#!/usr/bin/env python3\nfrom lib.util import ONE\n\nprint(ONE)\n";
        let output = orchestrator
            .bundle_source(&PathBuf::from("main.py"), source.to_string())
            .unwrap();

        assert!(output.starts_with("#!/usr/bin/env python3\n# from lib.util import ONE\n"));
        assert_eq!(output.matches("#!").count(), 1);
        assert!(output.ends_with("# region main logic\nprint(ONE)\n\n# endregion\n"));
    }

    #[test]
    fn test_entry_body_keeps_other_lines() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&temp_dir, &[("lib/util.py", "ONE = 1\n")]);
        let source = "\n\nfrom __future__ import annotations\nfrom lib.util import (\n    ONE,\n)\nimport sys\n\n\nprint(ONE, \"from lib.util import ONE\")\n\n\n";
        let output = orchestrator
            .bundle_source(&PathBuf::from("main.py"), source.to_string())
            .unwrap();

        assert!(output.contains("# region Imports\nfrom __future__ import annotations\n# endregion"));
        assert!(output.ends_with(
            "# region main logic\nimport sys\n\n\nprint(ONE, \"from lib.util import ONE\")\n\n# endregion\n"
        ));
    }

    #[test]
    fn test_missing_entry_file_is_an_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&temp_dir, &[]);
        let err = orchestrator
            .bundle_file(&temp_dir.path().join("missing.py"))
            .unwrap_err();
        assert!(matches!(err, BundleError::Io { .. }));
    }
}
