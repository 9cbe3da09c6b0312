//! One full backup run.
//!
//! A run owns a timestamped root under the target directory, a log file inside that
//! root, and one `Source<i>` subtree per configured source directory.

use crate::config::{Config, ConfigError};
use crate::copier::{self, CopySummary, FileSystem, StdFileSystem};
use crate::logger::Logger;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Format of the run id, which names both the root folder and the log file.
pub const RUN_ID_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Errors that stop a run before any source is copied.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create backup directory '{}': {source}", path.display())]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The output location of a single run.
#[derive(Debug, Clone)]
pub struct BackupRun {
    id: String,
    root: PathBuf,
    log_file: PathBuf,
    started: DateTime<Local>,
}

impl BackupRun {
    /// Creates a fresh root directory for a run started at `started`.
    ///
    /// The root is never shared with an earlier run: when a folder with the same
    /// timestamp already exists, `_1`, `_2`, ... is appended to the id.
    pub fn create(target: &Path, started: DateTime<Local>) -> Result<Self, BackupError> {
        fs::create_dir_all(target).map_err(|source| BackupError::CreateRoot {
            path: target.to_path_buf(),
            source,
        })?;

        let stamp = started.format(RUN_ID_FORMAT).to_string();
        let mut suffix = 0u32;
        loop {
            let id = if suffix == 0 {
                stamp.clone()
            } else {
                format!("{stamp}_{suffix}")
            };
            let root = target.join(&id);
            match fs::create_dir(&root) {
                Ok(()) => {
                    let log_file = root.join(format!("backup_{id}.log"));
                    return Ok(Self {
                        id,
                        root,
                        log_file,
                        started,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(source) => return Err(BackupError::CreateRoot { path: root, source }),
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn started(&self) -> DateTime<Local> {
        self.started
    }

    /// Destination folder for the source at `index` in config order.
    pub fn source_dir(&self, index: usize) -> PathBuf {
        self.root.join(format!("Source{index}"))
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub run: BackupRun,
    /// Per-source counters, in config order.
    pub sources: Vec<CopySummary>,
    pub log_failures: usize,
}

impl BackupReport {
    pub fn total(&self) -> CopySummary {
        let mut total = CopySummary::default();
        for summary in &self.sources {
            total.merge(*summary);
        }
        total
    }
}

/// Runs a backup against the real filesystem, timestamped now.
pub fn run_backup(config: &Config) -> Result<BackupReport, BackupError> {
    run_backup_with(config, &StdFileSystem, Local::now())
}

/// Runs a backup through `fs`, using `started` for the run id.
pub fn run_backup_with<F>(
    config: &Config,
    fs: &F,
    started: DateTime<Local>,
) -> Result<BackupReport, BackupError>
where
    F: FileSystem + ?Sized,
{
    let run = start(config, started)?;
    Ok(copy_sources(config, run, fs))
}

/// Validates `config` and creates the run's root directory. Nothing is written when
/// validation fails.
pub fn start(config: &Config, started: DateTime<Local>) -> Result<BackupRun, BackupError> {
    config.validate()?;
    BackupRun::create(&config.target(), started)
}

/// Copies every configured source into `run`. Per-item failures end up in the log and
/// the report, never in an error.
pub fn copy_sources<F>(config: &Config, run: BackupRun, fs: &F) -> BackupReport
where
    F: FileSystem + ?Sized,
{
    let logger = Logger::new(run.log_file(), config.level());
    tracing::debug!(root = %run.root().display(), id = run.id(), "backup run started");
    logger.info(format!("Backup started: {}", run.root().display()));

    let target = config.target();
    let mut report = BackupReport {
        run,
        sources: vec![],
        log_failures: 0,
    };
    for (index, source) in config.sources().iter().enumerate() {
        let dest = report.run.source_dir(index);
        let summary = copier::copy_tree_skipping(fs, source, &dest, &logger, &target);
        tracing::debug!(source = %source.display(), ?summary, "source finished");
        report.sources.push(summary);
    }

    let total = report.total();
    logger.info(format!(
        "Backup completed: {} files copied, {} files failed, {} directories skipped",
        total.files_copied, total.files_failed, total.dirs_skipped
    ));
    tracing::debug!(root = %report.run.root().display(), "backup run completed");

    report.log_failures = logger.failures();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
    }

    #[test]
    fn test_run_naming() {
        let target = tempdir().unwrap();
        let run = BackupRun::create(target.path(), at(14, 5, 9)).unwrap();
        assert_eq!(run.id(), "20240309_140509");
        assert_eq!(run.root(), target.path().join("20240309_140509"));
        assert_eq!(
            run.log_file(),
            target.path().join("20240309_140509").join("backup_20240309_140509.log")
        );
        assert_eq!(run.source_dir(2), run.root().join("Source2"));
        assert_eq!(run.started(), at(14, 5, 9));
        assert!(run.root().is_dir());
    }

    #[test]
    fn test_same_second_gets_new_root() {
        let target = tempdir().unwrap();
        let first = BackupRun::create(target.path(), at(8, 0, 0)).unwrap();
        let second = BackupRun::create(target.path(), at(8, 0, 0)).unwrap();
        let third = BackupRun::create(target.path(), at(8, 0, 0)).unwrap();
        assert_eq!(first.id(), "20240309_080000");
        assert_eq!(second.id(), "20240309_080000_1");
        assert_eq!(third.id(), "20240309_080000_2");
        assert!(second.log_file().ends_with("backup_20240309_080000_1.log"));
    }

    #[test]
    fn test_creates_missing_target() {
        let base = tempdir().unwrap();
        let target = base.path().join("a").join("b");
        let run = BackupRun::create(&target, at(1, 2, 3)).unwrap();
        assert!(run.root().starts_with(&target));
        assert!(run.root().is_dir());
    }

    #[test]
    fn test_root_creation_failure() {
        let base = tempdir().unwrap();
        let blocker = base.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let err = BackupRun::create(&blocker, at(1, 2, 3)).unwrap_err();
        assert!(matches!(err, BackupError::CreateRoot { .. }));
    }

    #[test]
    fn test_invalid_config_writes_nothing() {
        let base = tempdir().unwrap();
        let target = base.path().join("target");
        let config = Config {
            source_directories: vec![],
            target_directory: target.to_string_lossy().into_owned(),
            log_level: "Info".to_string(),
        };
        let err = run_backup(&config).unwrap_err();
        assert!(matches!(err, BackupError::Config(ConfigError::Validation(_))));
        assert!(!target.exists());
    }
}
