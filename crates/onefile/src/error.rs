//! Error taxonomy of the bundling engine
//!
//! Every failure is raised eagerly where it is detected and propagated
//! unchanged to the caller. Bundling is all-or-nothing: there is no partial
//! output and no retry.

use std::{fmt, io, path::PathBuf};

/// Import forms against the library namespace that cannot be inlined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedImportForm {
    /// `import lib.foo`
    WholeModule,
    /// `from lib.foo import *`
    Wildcard,
}

#[derive(Debug)]
pub enum BundleError {
    /// The entry file or a library module is not valid Python
    ParseFailure { path: PathBuf, message: String },
    /// A dotted module name resolves to neither a file nor a package
    ModuleNotFound {
        module: String,
        file_candidate: PathBuf,
        package_candidate: PathBuf,
    },
    /// The requested name is not a top-level symbol of the resolved module
    SymbolNotFound {
        module: String,
        symbol: String,
        path: PathBuf,
    },
    UnsupportedImport {
        module: String,
        form: UnsupportedImportForm,
    },
    Io { path: PathBuf, source: io::Error },
}

pub type Result<T, E = BundleError> = std::result::Result<T, E>;

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseFailure { path, message } => {
                write!(f, "failed to parse {}: {message}", path.display())
            }
            Self::ModuleNotFound {
                module,
                file_candidate,
                package_candidate,
            } => write!(
                f,
                "module not found: '{module}' (searched {} and {})",
                file_candidate.display(),
                package_candidate.display()
            ),
            Self::SymbolNotFound {
                module,
                symbol,
                path,
            } => write!(
                f,
                "symbol not found: {module}.{symbol} (from {})",
                path.display()
            ),
            Self::UnsupportedImport {
                module,
                form: UnsupportedImportForm::WholeModule,
            } => write!(
                f,
                "unsupported import form: use 'from {module} import ...' instead of 'import \
                 {module}'"
            ),
            Self::UnsupportedImport {
                module,
                form: UnsupportedImportForm::Wildcard,
            } => write!(f, "unsupported import: 'from {module} import *'"),
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for BundleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
