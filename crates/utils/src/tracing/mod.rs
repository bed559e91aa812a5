use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable that overrides the log filter
pub const LOG_FILTER_VAR: &str = "STASH_LOG";

/// Initialize the tracing system
///
/// The filter comes from `STASH_LOG`, then `RUST_LOG`, then the default level
/// (`info`, or `debug` when `verbose` is set). Output goes to stderr so it
/// never mixes with command output on stdout; ANSI colours are only used on a
/// TTY.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = default_filter(verbose);

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_names(verbose)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}
