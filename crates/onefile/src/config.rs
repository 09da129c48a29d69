//! Layered configuration
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. the user config file, `<config dir>/onefile/onefile.toml`
//! 3. the project config file, `onefile.toml` in the working directory or
//!    the file passed with `--config`
//! 4. `ONEFILE_*` environment variables
//! 5. command-line flags, applied by the binary

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use etcetera::BaseStrategy;
use log::debug;
use ruff_python_stdlib::identifiers::is_identifier;
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "onefile.toml";

pub const ENV_NAMESPACE: &str = "ONEFILE_NAMESPACE";
pub const ENV_ROOT: &str = "ONEFILE_ROOT";
pub const ENV_PYTHON_VERSION: &str = "ONEFILE_PYTHON_VERSION";

/// CPython 3 minor versions the stdlib tables know about
const SUPPORTED_PYTHON_VERSIONS: std::ops::RangeInclusive<u8> = 7..=14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Top-level package whose symbols get inlined
    pub namespace: String,
    /// Directory that contains the namespace package
    pub root: PathBuf,
    /// Minor version of CPython 3, used to tell stdlib imports apart
    pub python_version: u8,
    /// Warn when a library module imports something outside the stdlib
    pub warn_third_party: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "lib".to_owned(),
            root: PathBuf::from("."),
            python_version: 11,
            warn_third_party: true,
        }
    }
}

/// On-disk form; every key is optional so files only override what they set
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
struct ConfigFile {
    namespace: Option<String>,
    root: Option<PathBuf>,
    python_version: Option<u8>,
    warn_third_party: Option<bool>,
}

impl Config {
    /// Build the configuration from every source except the command line.
    ///
    /// `explicit` must exist when given; the implicit project file is only
    /// read when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_path) = user_config_path()
            && user_path.is_file()
        {
            config.merge_file(&user_path)?;
        }

        match explicit {
            Some(path) => config.merge_file(path)?,
            None => {
                let project_path = Path::new(CONFIG_FILE_NAME);
                if project_path.is_file() {
                    config.merge_file(project_path)?;
                }
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Overlay the keys set in the TOML file at `path`.
    ///
    /// A relative `root` is taken relative to the file's directory.
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config file {}", path.display());

        if let Some(namespace) = file.namespace {
            self.namespace = namespace;
        }
        if let Some(root) = file.root {
            self.root = match path.parent() {
                Some(dir) if root.is_relative() => dir.join(root),
                _ => root,
            };
        }
        if let Some(python_version) = file.python_version {
            self.python_version = python_version;
        }
        if let Some(warn_third_party) = file.warn_third_party {
            self.warn_third_party = warn_third_party;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(namespace) = env::var(ENV_NAMESPACE) {
            debug!("{ENV_NAMESPACE} overrides namespace with '{namespace}'");
            self.namespace = namespace;
        }
        if let Some(root) = env::var_os(ENV_ROOT) {
            self.root = PathBuf::from(root);
        }
        if let Ok(version) = env::var(ENV_PYTHON_VERSION) {
            self.python_version = parse_python_version(&version)
                .with_context(|| format!("Invalid {ENV_PYTHON_VERSION}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() || !self.namespace.split('.').all(is_identifier) {
            bail!(
                "namespace must be a dotted Python module name, got '{}'",
                self.namespace
            );
        }
        if !SUPPORTED_PYTHON_VERSIONS.contains(&self.python_version) {
            bail!(
                "python-version must be between {} and {}, got {}",
                SUPPORTED_PYTHON_VERSIONS.start(),
                SUPPORTED_PYTHON_VERSIONS.end(),
                self.python_version
            );
        }
        if !self.root.is_dir() {
            bail!("root {} is not a directory", self.root.display());
        }
        Ok(())
    }
}

/// Accepts `11`, `3.11` and `py311`
pub fn parse_python_version(value: &str) -> Result<u8> {
    let value = value.trim();
    let minor = value
        .strip_prefix("py3")
        .or_else(|| value.strip_prefix("3."))
        .unwrap_or(value);
    minor
        .parse::<u8>()
        .map_err(|_| anyhow!("'{value}' is not a Python 3 version"))
}

fn user_config_path() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("onefile").join(CONFIG_FILE_NAME))
}
