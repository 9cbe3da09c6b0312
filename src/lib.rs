//! treebak: mirror a list of directories into a timestamped backup folder.
//!
//! Each run creates `<target>/<yyyyMMdd_HHmmss>/Source<i>/...` for every configured
//! source and writes a leveled log file next to them. A file or directory that cannot be
//! copied is logged and skipped; it never aborts the rest of the run.

pub mod backup;
pub mod commands;
pub mod config;
pub mod copier;
pub mod logger;
pub mod path;
pub mod sysexits;

pub use backup::{BackupError, BackupReport, BackupRun, run_backup};
pub use config::{Config, ConfigError};
pub use copier::{CopySummary, FileSystem, StdFileSystem, copy_tree};
pub use logger::{LogLevel, Logger};
