use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};
use onefile::{config::Config, orchestrator::BundleOrchestrator};

/// Inline `from <namespace> import ...` symbols into one self-contained
/// Python file
#[derive(Parser, Debug)]
#[command(name = "onefile", version, about, long_about = None)]
struct Cli {
    /// Entry Python file (your solution)
    entry: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory containing the library namespace package
    #[arg(long)]
    root: Option<PathBuf>,

    /// Top-level package whose imports get inlined
    #[arg(long)]
    namespace: Option<String>,

    /// Configuration file (default: ./onefile.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose))
        .format_timestamp(None)
        .parse_default_env()
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
    }
    config.validate()?;
    debug!("Effective configuration: {config:?}");

    let bundled = BundleOrchestrator::new(config)
        .bundle_file(&cli.entry)
        .with_context(|| format!("Failed to bundle {}", cli.entry.display()))?;

    match cli.output {
        Some(path) => {
            fs::write(&path, bundled)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote bundle to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(bundled.as_bytes())
                .context("Failed to write bundle to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
