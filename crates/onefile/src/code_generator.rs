//! Renders the resolved bundle as text
//!
//! Output layout, top to bottom:
//! 1. the entry file's `#!` line, if any
//! 2. the entry file's library imports, commented out
//! 3. an `Imports` region: `__future__` imports, then ordinary imports
//! 4. one region per run of symbols from the same module, each symbol
//!    followed by the renamed bindings library modules read from it
//! 5. an `Aliases` region for the entry file's renaming imports
//! 6. the `main logic` region holding the entry body
//!
//! Empty regions are left out, except `main logic`.

use indexmap::IndexMap;

use crate::symbol_graph::SymbolDefinition;

const REGION_START: &str = "# region";
const REGION_END: &str = "# endregion";

/// Everything the generator needs, already resolved and ordered
#[derive(Debug, Default)]
pub struct BundleParts<'a> {
    pub directive: Option<&'a str>,
    pub entry_library_imports: &'a [String],
    pub future_imports: Vec<&'a str>,
    pub ordinary_imports: Vec<&'a str>,
    pub symbols: Vec<&'a SymbolDefinition>,
    pub aliases: Vec<&'a str>,
    pub entry_body: &'a str,
}

#[derive(Debug, Default)]
pub struct CodeGenerator {
    lines: Vec<String>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(parts: &BundleParts<'_>) -> String {
        let mut generator = Self::new();

        if let Some(directive) = parts.directive {
            generator.push(directive);
        }
        for statement in parts.entry_library_imports {
            generator.push_commented(statement);
        }
        generator.push("");

        let future_imports = dedup_keep_order(&parts.future_imports);
        let ordinary_imports = dedup_keep_order(&parts.ordinary_imports);
        if !future_imports.is_empty() || !ordinary_imports.is_empty() {
            generator.push_region("Imports");
            generator.lines.extend(future_imports);
            generator.lines.extend(ordinary_imports);
            generator.pop_region();
            generator.push("");
        }

        let mut current_module: Option<&str> = None;
        for symbol in &parts.symbols {
            if current_module != Some(symbol.module.as_str()) {
                if current_module.is_some() {
                    generator.pop_region();
                    generator.push("");
                }
                current_module = Some(symbol.module.as_str());
                generator.push_region(&symbol.module);
            }
            generator.push(symbol.source.trim_end());
            for alias in &symbol.bound_aliases {
                generator.push(alias);
            }
            generator.push("");
        }
        if current_module.is_some() {
            generator.pop_region();
            generator.push("");
        }

        if !parts.aliases.is_empty() {
            generator.push_region("Aliases");
            for alias in &parts.aliases {
                generator.push(alias);
            }
            generator.pop_region();
            generator.push("");
        }

        let mut output = generator.lines.join("\n").trim_end().to_owned();
        output.push('\n');

        let mut main_logic = vec!["", "# region main logic"];
        main_logic.extend(parts.entry_body.trim_end_matches('\n').lines());
        main_logic.extend(["", REGION_END, ""]);
        output.push_str(&main_logic.join("\n"));
        output
    }

    fn push(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }

    fn push_region(&mut self, name: &str) {
        self.lines.push(format!("{REGION_START} {name}"));
    }

    fn pop_region(&mut self) {
        self.push(REGION_END);
    }

    /// Inert copy of a statement: `# ` before every line, `#` for blank ones
    fn push_commented(&mut self, block: &str) {
        for line in block.lines() {
            if line.trim().is_empty() {
                self.push("#");
            } else {
                self.lines.push(format!("# {line}"));
            }
        }
    }
}

/// Drop repeated statements by trimmed text, keeping the first occurrence
/// right-trimmed
fn dedup_keep_order(items: &[&str]) -> Vec<String> {
    let mut seen: IndexMap<&str, String> = IndexMap::new();
    for item in items {
        let key = item.trim();
        if key.is_empty() {
            continue;
        }
        seen.entry(key)
            .or_insert_with(|| item.trim_end().to_owned());
    }
    seen.into_values().collect()
}
