use clap::Parser;
use stash_cache::{ArtifactCacheFactory, CacheRegistry};
use stash_config::{CacheMode, CacheOverrides, CacheSettingsLoader};
use stash_core::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod commands;
mod execute;
mod reporter;

use commands::Commands;
use execute::RunContext;
use reporter::ConsoleReporter;

#[derive(Parser)]
#[command(name = "stash")]
#[command(about = "Fetch and store build artifacts in a local cache", long_about = None)]
#[command(version)]
struct Cli {
    /// Disable the artifact cache for this run
    #[arg(long, global = true)]
    no_cache: bool,

    /// Cache mode (off, read, read-write, write)
    #[arg(long, global = true, value_parser = ["off", "read", "read-write", "write"])]
    cache: Option<String>,

    /// Directory backing the artifact cache
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Seconds to wait for caches to close before exiting
    #[arg(long, global = true, value_name = "SECS")]
    close_timeout: Option<u64>,

    /// Read settings from this file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show debug logs and cache lifecycle events
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn overrides(&self) -> CacheOverrides {
        CacheOverrides {
            enabled: self.no_cache.then_some(false),
            mode: self.cache.as_deref().map(CacheMode::from),
            dir: self.cache_dir.clone(),
            close_timeout_secs: self.close_timeout,
        }
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    if let Err(e) = stash_utils::tracing::init(cli.verbose) {
        eprintln!("stash: failed to initialise logging: {e}");
    }

    let mut loader = CacheSettingsLoader::new().overrides(cli.overrides());
    if let Some(path) = &cli.config {
        loader = loader.config_file(path);
    }
    let settings = loader.load()?;

    let events = Arc::new(EventBus::default());
    let registry = Arc::new(CacheRegistry::new());
    let factory = ArtifactCacheFactory::new(Arc::clone(&events), registry);
    let reporter = cli.verbose.then(|| ConsoleReporter::new(&events));

    let ctx = RunContext::new(&factory, &settings);
    let result = cli.command.execute(&ctx);

    // Caches are closed whether or not the command succeeded.
    let report = factory.close_created_caches(settings.close_timeout_secs);
    if !report.is_complete() {
        eprintln!("stash: {report}");
    }

    if let Some(reporter) = reporter {
        reporter.finish(Duration::from_millis(500));
    }

    result
}
