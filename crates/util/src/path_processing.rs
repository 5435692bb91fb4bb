//! Filesystem path helpers.

use std::path::PathBuf;

use dirs_next::home_dir;

/// Resolves a `~` or `~/rest` prefix against the home directory.
///
/// Both `/` and `\\` are accepted after the tilde. `~user` forms are not expanded, and the
/// path is returned unchanged (apart from trimming) when no home directory is known.
pub fn expand_tilde(path: &str) -> PathBuf {
    let path = path.trim();
    let Some(after_tilde) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };
    let relative = match after_tilde.chars().next() {
        None => None,
        Some('/' | '\\') => Some(&after_tilde[1..]),
        Some(_) => return PathBuf::from(path),
    };
    match (home_dir(), relative) {
        (Some(home), Some(relative)) => home.join(relative),
        (Some(home), None) => home,
        (None, _) => PathBuf::from(path),
    }
}
