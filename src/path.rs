use std::env;
use std::path::{Path, PathBuf};

use path_clean::PathClean;

/// Expands a configured path string into an absolute, lexically cleaned path.
///
/// A leading `~` or `$HOME` is replaced with the user's home directory and relative
/// paths are resolved against the current directory. The path does not need to exist.
pub fn expand_path(path: &str) -> PathBuf {
    let path = expand_home(path);
    let path = Path::new(&path);

    let abs_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    abs_path.clean()
}

/// Returns the key used to detect duplicate source directories: the expanded
/// absolute path, lower-cased.
pub fn canonical_key(path: &str) -> String {
    expand_path(path).to_string_lossy().to_lowercase()
}

/// Replaces a leading `~` or `$HOME` with the home directory, but only when it is the
/// whole first component: `~/x` expands, `~alice/x` and `$HOMEDIR/x` do not.
fn expand_home(input: &str) -> String {
    let rest = match input.strip_prefix('~').or_else(|| input.strip_prefix("$HOME")) {
        Some(rest) if rest.is_empty() || rest.starts_with(std::path::is_separator) => rest,
        _ => return input.into(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{rest}", home.to_string_lossy()),
        None => input.into(),
    }
}
