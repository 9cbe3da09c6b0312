//! Recursive directory mirroring.
//!
//! [`copy_tree`] walks a source directory depth-first and copies every regular file
//! into the matching place under the destination. Failures are isolated at two levels:
//! a file that cannot be copied is logged and skipped, and a directory that cannot be
//! created or listed is logged and abandoned. Neither stops the rest of the walk, and
//! nothing is ever returned to the caller as an error.

use crate::logger::Logger;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Direct children of one directory, each list sorted by file name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirListing {
    /// Regular files, including symlinks that resolve to a file.
    pub files: Vec<PathBuf>,
    /// Real subdirectories. Symlinks to directories are not listed here.
    pub dirs: Vec<PathBuf>,
    /// Everything else: sockets, dangling links, links to directories.
    pub other: Vec<PathBuf>,
}

/// The filesystem operations the tree copier needs.
pub trait FileSystem {
    fn is_dir(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    /// Lists the direct children of `path`.
    fn list_dir(&self, path: &Path) -> io::Result<DirListing>;
    /// Copies `src` to `dest`, replacing `dest` if it exists. Returns the bytes copied.
    fn copy_file(&self, src: &Path, dest: &Path) -> io::Result<u64>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<DirListing> {
        let mut listing = DirListing::default();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_type().is_dir() {
                listing.dirs.push(entry.into_path());
            } else if entry.path().is_file() {
                listing.files.push(entry.into_path());
            } else {
                listing.other.push(entry.into_path());
            }
        }
        Ok(listing)
    }

    fn copy_file(&self, src: &Path, dest: &Path) -> io::Result<u64> {
        fs::copy(src, dest)
    }
}

/// Counters describing what one [`copy_tree`] call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    pub files_copied: usize,
    pub files_failed: usize,
    pub bytes_copied: u64,
    pub dirs_processed: usize,
    /// Directories that were missing or could not be created or listed.
    pub dirs_skipped: usize,
}

impl CopySummary {
    pub fn merge(&mut self, other: CopySummary) {
        self.files_copied += other.files_copied;
        self.files_failed += other.files_failed;
        self.bytes_copied += other.bytes_copied;
        self.dirs_processed += other.dirs_processed;
        self.dirs_skipped += other.dirs_skipped;
    }

    pub fn has_failures(&self) -> bool {
        self.files_failed > 0 || self.dirs_skipped > 0
    }
}

/// Mirrors `source` into `dest`, logging progress and failures to `logger`.
pub fn copy_tree<F>(fs: &F, source: &Path, dest: &Path, logger: &Logger) -> CopySummary
where
    F: FileSystem + ?Sized,
{
    TreeWalk::new(fs, logger, None).run(source, dest)
}

/// Like [`copy_tree`], but never descends into `skip` or anything below it.
///
/// Used to keep a backup from copying its own output when the target directory
/// lives inside a source directory.
pub fn copy_tree_skipping<F>(
    fs: &F,
    source: &Path,
    dest: &Path,
    logger: &Logger,
    skip: &Path,
) -> CopySummary
where
    F: FileSystem + ?Sized,
{
    TreeWalk::new(fs, logger, Some(skip)).run(source, dest)
}

struct TreeWalk<'a, F: ?Sized> {
    fs: &'a F,
    logger: &'a Logger,
    skip: Option<&'a Path>,
    summary: CopySummary,
}

impl<'a, F> TreeWalk<'a, F>
where
    F: FileSystem + ?Sized,
{
    fn new(fs: &'a F, logger: &'a Logger, skip: Option<&'a Path>) -> Self {
        Self {
            fs,
            logger,
            skip,
            summary: CopySummary::default(),
        }
    }

    fn run(mut self, source: &Path, dest: &Path) -> CopySummary {
        self.copy_dir(source, dest);
        self.summary
    }

    fn copy_dir(&mut self, source: &Path, dest: &Path) {
        if !self.fs.is_dir(source) {
            self.logger
                .error(format!("Source directory not found: {}", source.display()));
            self.summary.dirs_skipped += 1;
            return;
        }
        self.logger
            .info(format!("Processing directory: {}", source.display()));

        if let Err(e) = self.mirror_dir(source, dest) {
            self.logger.error(format!(
                "Failed to process directory {}: {e}",
                source.display()
            ));
            self.summary.dirs_skipped += 1;
        }
    }

    /// Copies the files of one directory and recurses into its subdirectories.
    ///
    /// Only errors that affect the whole directory are returned.
    fn mirror_dir(&mut self, source: &Path, dest: &Path) -> io::Result<()> {
        self.fs.create_dir_all(dest)?;
        let listing = self.fs.list_dir(source)?;
        self.summary.dirs_processed += 1;

        for file in &listing.files {
            match copy_file_into(self.fs, file, dest) {
                Ok(bytes) => {
                    self.summary.files_copied += 1;
                    self.summary.bytes_copied += bytes;
                    self.logger.debug(format!("Copied file: {}", file.display()));
                }
                Err(e) => {
                    self.summary.files_failed += 1;
                    self.logger
                        .error(format!("Failed to copy file {}: {e}", file.display()));
                }
            }
        }

        for path in &listing.other {
            self.logger
                .debug(format!("Skipping non-regular entry: {}", path.display()));
        }

        for dir in &listing.dirs {
            if self.skip.is_some_and(|skip| dir.starts_with(skip)) {
                self.logger
                    .debug(format!("Skipping backup target directory: {}", dir.display()));
                continue;
            }
            match dir.file_name() {
                Some(name) => self.copy_dir(dir, &dest.join(name)),
                None => {
                    self.logger
                        .error(format!("Invalid directory name: {}", dir.display()));
                    self.summary.dirs_skipped += 1;
                }
            }
        }
        Ok(())
    }
}

fn copy_file_into<F>(fs: &F, file: &Path, dest_dir: &Path) -> io::Result<u64>
where
    F: FileSystem + ?Sized,
{
    let name = file
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid file name"))?;
    fs.copy_file(file, &dest_dir.join(name))
}
