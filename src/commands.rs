//! Command-line interface definition for treebak.
//!
//! There are no subcommands: each invocation either bootstraps a default config (when
//! none exists yet) or performs one full backup.

use crate::backup::{self, BackupError, BackupReport};
use crate::config::{self, ConfigError};
use crate::copier::StdFileSystem;
use crate::sysexits;
use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Command-line interface definition for treebak.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path. Defaults to config.toml next to the executable.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Exit immediately instead of waiting for Enter.
    #[arg(long)]
    pub no_pause: bool,
}

/// What a successful invocation did.
#[derive(Debug)]
pub enum Outcome {
    /// No config existed; a default one was written here.
    Bootstrapped(PathBuf),
    /// A backup ran to completion.
    Completed(BackupReport),
}

/// Resolves the config file and either bootstraps it or runs a backup.
pub fn execute(cli: &Cli) -> Result<Outcome> {
    let config_file = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_config_file()
            .context("Couldn't locate the executable directory")?,
    };

    if !config_file.exists() {
        bootstrap(&config_file)?;
        return Ok(Outcome::Bootstrapped(config_file));
    }

    let config = config::load(&config_file)?;
    let run = backup::start(&config, Local::now())?;
    println!(
        "Backup started at {} into {}",
        run.started().format("%Y-%m-%d %H:%M:%S"),
        run.root().display()
    );
    let report = backup::copy_sources(&config, run, &StdFileSystem);
    Ok(Outcome::Completed(report))
}

/// Writes the default config and tells the operator to edit it.
fn bootstrap(config_file: &Path) -> Result<()> {
    config::write_default(config_file)?;
    println!(
        "No config file found. A default one was written to {}",
        config_file.display()
    );
    println!("Edit SourceDirectories and TargetDirectory, then run tbk again.");
    Ok(())
}

/// Prints the end-of-run summary.
pub fn report(outcome: &Outcome) {
    let Outcome::Completed(report) = outcome else {
        return;
    };
    let total = report.total();
    println!("Backup written to {}", report.run.root().display());
    println!(
        "{} files copied, {} files failed, {} directories skipped",
        total.files_copied, total.files_failed, total.dirs_skipped
    );
    if total.has_failures() {
        println!(
            "Some items were skipped. See {} for details.",
            report.run.log_file().display()
        );
    } else {
        println!("Log: {}", report.run.log_file().display());
    }
    if report.log_failures > 0 {
        eprintln!(
            "{} log lines could not be written to {}",
            report.log_failures,
            report.run.log_file().display()
        );
    }
}

/// Maps a fatal error to a process exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let config_code = |e: &ConfigError| match e {
        ConfigError::NotFound(_) | ConfigError::Read { .. } => sysexits::EX_NOINPUT,
        ConfigError::Parse(_) => sysexits::EX_DATAERR,
        ConfigError::Validation(_) => sysexits::EX_CONFIG,
        ConfigError::Write { .. } => sysexits::EX_CANTCREAT,
        ConfigError::Serialize(_) => sysexits::EX_SOFTWARE,
    };
    if let Some(e) = err.downcast_ref::<ConfigError>() {
        return config_code(e);
    }
    match err.downcast_ref::<BackupError>() {
        Some(BackupError::Config(e)) => config_code(e),
        Some(BackupError::CreateRoot { .. }) => sysexits::EX_CANTCREAT,
        None => sysexits::EX_SOFTWARE,
    }
}

/// Waits for the operator to press Enter. Returns at once when stdin is closed.
pub fn pause() {
    print!("Press Enter to exit...");
    // The wait is a courtesy for console windows; a closed or broken stdio just ends it.
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok();
}
