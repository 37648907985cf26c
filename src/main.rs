//! scriptest CLI entry point

use clap::Parser;

fn main() {
    let cli = scriptest::cli::Cli::parse();

    // Structured logging on stderr; RUST_LOG wins, otherwise -v picks the level.
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .try_init();

    scriptest::cli::run(cli);
}
