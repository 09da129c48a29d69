#![allow(clippy::disallowed_methods)]

use std::{fs, path::PathBuf};

use onefile::{
    config::Config,
    error::{BundleError, UnsupportedImportForm},
    orchestrator::BundleOrchestrator,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A library root in a temporary directory plus an entry file next to it
struct Project {
    temp_dir: TempDir,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let temp_dir = TempDir::new().unwrap();
        for (relative, content) in files {
            let path = temp_dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        Self { temp_dir }
    }

    fn orchestrator(&self) -> BundleOrchestrator {
        BundleOrchestrator::new(Config {
            root: self.temp_dir.path().to_path_buf(),
            warn_third_party: false,
            ..Config::default()
        })
    }

    fn write_entry(&self, source: &str) -> PathBuf {
        let path = self.temp_dir.path().join("main.py");
        fs::write(&path, source).unwrap();
        path
    }

    fn bundle(&self, entry_source: &str) -> Result<String, BundleError> {
        let entry = self.write_entry(entry_source);
        self.orchestrator().bundle_file(&entry)
    }
}

const HELPERS: &str = r#"import sys
from collections import defaultdict

BASE = 10
UNUSED = 42


def register(base):
    def wrap(fn):
        fn.base = base
        return fn
    return wrap


@register(BASE)
def foo():
    return BASE + helper()


def helper():
    return len(sys.argv)
"#;

#[test]
fn test_decorator_dependency_is_emitted_first() {
    let project = Project::new(&[("lib/helpers.py", HELPERS)]);
    let output = project
        .bundle("from lib.helpers import foo\nfrom lib.helpers import foo as bar\n\nprint(foo(), bar())\n")
        .unwrap();

    insta::assert_snapshot!(output, @r#"
# from lib.helpers import foo
# from lib.helpers import foo as bar

# region Imports
import sys
from collections import defaultdict
# endregion

# region lib.helpers
BASE = 10

def helper():
    return len(sys.argv)

def register(base):
    def wrap(fn):
        fn.base = base
        return fn
    return wrap

@register(BASE)
def foo():
    return BASE + helper()

# endregion

# region Aliases
bar = foo
# endregion

# region main logic
print(foo(), bar())

# endregion
"#);
}

#[test]
fn test_unused_definitions_are_left_out() {
    let project = Project::new(&[("lib/helpers.py", HELPERS)]);
    let output = project
        .bundle("from lib.helpers import helper\nprint(helper())\n")
        .unwrap();

    assert!(output.contains("def helper():"));
    assert!(!output.contains("UNUSED"));
    assert!(!output.contains("def foo():"));
    assert!(!output.contains("BASE = 10"));
}

#[test]
fn test_entry_without_library_imports_is_unchanged() {
    let project = Project::new(&[("lib/helpers.py", HELPERS)]);
    let source = "import sys\nfrom collections import deque\n\n# from lib.helpers import foo\nprint('lib.helpers')\n";
    assert_eq!(project.bundle(source).unwrap(), source);
}

#[test]
fn test_bundling_twice_is_a_no_op() {
    let project = Project::new(&[("lib/helpers.py", HELPERS)]);
    let first = project
        .bundle("#!/usr/bin/env python3\nfrom lib.helpers import foo\n\nprint(foo())\n")
        .unwrap();
    let second = project.bundle(&first).unwrap();
    assert_eq!(second, first);
}

#[test]
fn test_each_aliased_symbol_is_defined_once() {
    let project = Project::new(&[(
        "lib/num.py",
        "def gcd(a, b):\n    while b:\n        a, b = b, a % b\n    return a\n",
    )]);
    let output = project
        .bundle("from lib.num import gcd as g1, gcd as g2, gcd\nfrom lib.num import gcd as g1\n\nprint(g1(4, 6), g2(9, 6), gcd(2, 3))\n")
        .unwrap();

    assert_eq!(output.matches("def gcd(a, b):").count(), 1);
    assert!(output.contains("# region Aliases\ng1 = gcd\ng2 = gcd\n# endregion\n"));
}

#[test]
fn test_whole_module_import_is_rejected() {
    let project = Project::new(&[("lib/helpers.py", HELPERS)]);
    let err = project
        .bundle("import lib.helpers\n\nprint(lib.helpers.foo())\n")
        .unwrap_err();

    match err {
        BundleError::UnsupportedImport { module, form } => {
            assert_eq!(module, "lib.helpers");
            assert_eq!(form, UnsupportedImportForm::WholeModule);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_whole_module_import_is_rejected_even_without_symbol_imports() {
    let project = Project::new(&[]);
    let err = project.bundle("import os, lib\n").unwrap_err();
    assert!(matches!(
        err,
        BundleError::UnsupportedImport {
            form: UnsupportedImportForm::WholeModule,
            ..
        }
    ));
}

#[test]
fn test_wildcard_import_is_rejected() {
    let project = Project::new(&[("lib/helpers.py", HELPERS)]);
    let err = project.bundle("from lib.helpers import *\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "unsupported import: 'from lib.helpers import *'"
    );
}

#[test]
fn test_missing_module_names_both_candidates() {
    let project = Project::new(&[("lib/__init__.py", "")]);
    let err = project.bundle("from lib.missing import thing\n").unwrap_err();

    match err {
        BundleError::ModuleNotFound {
            module,
            file_candidate,
            package_candidate,
        } => {
            assert_eq!(module, "lib.missing");
            assert!(file_candidate.ends_with("lib/missing.py"));
            assert!(package_candidate.ends_with("lib/missing/__init__.py"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_symbol_is_reported() {
    let project = Project::new(&[("lib/helpers.py", HELPERS)]);
    let err = project.bundle("from lib.helpers import nope\n").unwrap_err();
    assert!(
        err.to_string().starts_with("symbol not found: lib.helpers.nope (from "),
        "{err}"
    );
}

#[test]
fn test_library_parse_failure_names_the_file() {
    let project = Project::new(&[("lib/broken.py", "def broken(:\n    pass\n")]);
    let err = project.bundle("from lib.broken import broken\n").unwrap_err();
    match err {
        BundleError::ParseFailure { path, .. } => assert!(path.ends_with("lib/broken.py")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_entry_parse_failure_names_the_entry() {
    let project = Project::new(&[("lib/helpers.py", HELPERS)]);
    let err = project
        .bundle("from lib.helpers import foo\nprint(foo(\n")
        .unwrap_err();
    match err {
        BundleError::ParseFailure { path, .. } => assert!(path.ends_with("main.py")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_renamed_library_binding_is_defined_before_use() {
    let project = Project::new(&[
        ("lib/a.py", "from lib.b import BASE as B0\n\nLIMIT = B0 * 2\n"),
        ("lib/b.py", "BASE = 10\n"),
    ]);
    let output = project
        .bundle("from lib.a import LIMIT\nprint(LIMIT)\n")
        .unwrap();

    let base = output.find("# region lib.b\nBASE = 10\nB0 = BASE\n\n# endregion\n");
    let limit = output.find("# region lib.a\nLIMIT = B0 * 2\n");
    assert!(base.is_some(), "{output}");
    assert!(limit.is_some(), "{output}");
    assert!(base < limit);
    assert!(!output.contains("# region Aliases"));
}

#[test]
fn test_statement_binding_two_needed_names_is_emitted_once() {
    let project = Project::new(&[(
        "lib/bounds.py",
        "LOW = HIGH = 0\n\ndef span():\n    return HIGH - LOW\n",
    )]);
    let output = project
        .bundle("from lib.bounds import span, LOW\nprint(span(), LOW)\n")
        .unwrap();

    assert_eq!(output.matches("LOW = HIGH = 0").count(), 1);
    assert!(output.contains("# region lib.bounds\ndef span():\n    return HIGH - LOW\n\nLOW = HIGH = 0\n\n# endregion\n"));
}

#[test]
fn test_future_imports_come_first_and_are_deduplicated() {
    let project = Project::new(&[
        (
            "lib/a.py",
            "from __future__ import annotations\nimport math\n\ndef area(r: float) -> float:\n    return math.pi * r * r\n",
        ),
        (
            "lib/b.py",
            "from __future__ import annotations\nimport math\nfrom typing import Final\n\nTAU: Final = 2 * 3.14159\n",
        ),
    ]);
    let output = project
        .bundle("from __future__ import annotations\nfrom lib.a import area\nfrom lib.b import TAU\n\nprint(area(1.0), TAU)\n")
        .unwrap();

    assert!(output.contains(
        "# region Imports\nfrom __future__ import annotations\nimport math\nfrom typing import Final\n# endregion\n"
    ));
    assert!(output.ends_with("# region main logic\nprint(area(1.0), TAU)\n\n# endregion\n"));
}

#[test]
fn test_definition_cycle_keeps_discovery_order() {
    let project = Project::new(&[(
        "lib/cycle.py",
        "FIRST = 1\nA = [B, FIRST]\nB = [A]\n",
    )]);
    let output = project.bundle("from lib.cycle import A\nprint(A)\n").unwrap();

    let a = output.find("A = [B, FIRST]").unwrap();
    let b = output.find("B = [A]").unwrap();
    let first = output.find("FIRST = 1").unwrap();
    // Discovery order: A, then its loads in sorted order (B, FIRST)
    assert!(a < b);
    assert!(b < first);
}

#[test]
fn test_same_name_in_two_modules_is_kept_apart() {
    let project = Project::new(&[
        ("lib/mod1.py", "MOD = 10**9 + 7\n"),
        ("lib/mod2.py", "MOD = 998244353\n"),
    ]);
    let output = project
        .bundle("from lib.mod1 import MOD\nfrom lib.mod2 import MOD as MOD2\n\nprint(MOD, MOD2)\n")
        .unwrap();

    assert!(output.contains("# region lib.mod1\nMOD = 10**9 + 7\n\n# endregion\n"));
    assert!(output.contains("# region lib.mod2\nMOD = 998244353\n\n# endregion\n"));
    assert!(output.contains("# region Aliases\nMOD2 = MOD\n# endregion\n"));
}

#[test]
fn test_relative_library_imports_are_followed() {
    let project = Project::new(&[
        ("lib/__init__.py", ""),
        ("lib/math/__init__.py", "from .mod import MOD\n"),
        ("lib/math/mod.py", "MOD = 998244353\n"),
        (
            "lib/math/comb.py",
            "from .mod import MOD\n\ndef comb(n, k, fact, inv):\n    return fact[n] * inv[k] % MOD * inv[n - k] % MOD\n",
        ),
    ]);
    let output = project
        .bundle("from lib.math.comb import comb\nprint(comb)\n")
        .unwrap();

    let mod_region = output.find("# region lib.math.mod\nMOD = 998244353").unwrap();
    let comb_region = output.find("# region lib.math.comb\ndef comb").unwrap();
    assert!(comb_region < mod_region);
    assert!(!output.contains("# region Imports"));
}

#[test]
fn test_package_module_resolves_to_init() {
    let project = Project::new(&[(
        "lib/graph/__init__.py",
        "from collections import deque\n\n\ndef bfs(adj, s):\n    seen = {s}\n    queue = deque([s])\n    while queue:\n        v = queue.popleft()\n        for w in adj[v]:\n            if w not in seen:\n                seen.add(w)\n                queue.append(w)\n    return seen\n",
    )]);
    let output = project
        .bundle("from lib.graph import bfs\nprint(bfs({0: []}, 0))\n")
        .unwrap();

    assert!(output.contains("# region Imports\nfrom collections import deque\n# endregion\n"));
    assert!(output.contains("# region lib.graph\ndef bfs(adj, s):\n"));
}

#[test]
fn test_custom_namespace() {
    let project = Project::new(&[("kyopro/seg.py", "IDENTITY = 0\n")]);
    let entry = project.write_entry("from kyopro.seg import IDENTITY\nfrom lib.seg import OTHER\n");
    let orchestrator = BundleOrchestrator::new(Config {
        namespace: "kyopro".to_owned(),
        root: project.temp_dir.path().to_path_buf(),
        warn_third_party: false,
        ..Config::default()
    });

    let output = orchestrator.bundle_file(&entry).unwrap();
    assert!(output.contains("# region kyopro.seg\nIDENTITY = 0\n"));
    // `lib` is an ordinary package under another namespace
    assert!(output.ends_with("# region main logic\nfrom lib.seg import OTHER\n\n# endregion\n"));
}
