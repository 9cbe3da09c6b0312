use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;
use treebak::commands::{self, Cli};

/// Entry point for the tbk CLI application.
/// Bootstraps a config on first run, otherwise performs one backup.
fn main() {
    init_tracing();
    let cli = Cli::parse();

    let code = match commands::execute(&cli) {
        Ok(outcome) => {
            commands::report(&outcome);
            0
        }
        Err(e) => {
            eprintln!("Backup failed: {e:#}");
            commands::exit_code(&e)
        }
    };

    if !cli.no_pause {
        commands::pause();
    }
    process::exit(code);
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default `warn` filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
