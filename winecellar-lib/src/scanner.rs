//! Discovery of bottle directories

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Finds bottle prefixes below a root directory
#[derive(Debug, Clone)]
pub struct BottleScanner {
    default_bottle: PathBuf,
}

impl BottleScanner {
    /// Create a scanner; `default_bottle` is usually `~/.wine`
    pub fn new<P: Into<PathBuf>>(default_bottle: P) -> Self {
        Self {
            default_bottle: default_bottle.into(),
        }
    }

    /// List the immediate sub-directories of `root`, sorted case-insensitively
    ///
    /// When `include_default` is set and the default bottle exists, it is
    /// appended after the sorted entries.
    pub fn list_bottle_paths(&self, root: &Path, include_default: bool) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                // Errors below the root are single entries, e.g. dangling symlinks
                Err(e) if e.depth() > 0 => {
                    warn!("Skipping {:?}: {}", e.path(), e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if entry.file_type().is_dir() {
                paths.push(entry.into_path());
            }
        }

        paths.sort_by_cached_key(|p| p.to_string_lossy().to_uppercase());

        if include_default && self.default_bottle.is_dir() {
            paths.push(self.default_bottle.clone());
        }

        debug!("Found {} bottle(s) in {}", paths.len(), root.display());
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn sorted_case_insensitively_with_default_last() {
        let root = tempfile::tempdir().unwrap();
        for name in ["Zeta", "alpha", "Beta"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        fs::write(root.path().join("notes.txt"), "not a bottle").unwrap();

        let default = tempfile::tempdir().unwrap();
        let scanner = BottleScanner::new(default.path());

        let paths = scanner.list_bottle_paths(root.path(), true).unwrap();
        assert_eq!(
            paths,
            vec![
                root.path().join("alpha"),
                root.path().join("Beta"),
                root.path().join("Zeta"),
                default.path().to_path_buf(),
            ]
        );

        let paths = scanner.list_bottle_paths(root.path(), false).unwrap();
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn missing_default_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("one")).unwrap();
        let scanner = BottleScanner::new(root.path().join("does-not-exist"));

        let paths = scanner.list_bottle_paths(root.path(), true).unwrap();
        assert_eq!(paths, vec![root.path().join("one")]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("alpha")).unwrap();
        std::os::unix::fs::symlink(root.path().join("gone"), root.path().join("stale")).unwrap();
        let scanner = BottleScanner::new(root.path().join(".wine"));

        let paths = scanner.list_bottle_paths(root.path(), false).unwrap();
        assert_eq!(paths, vec![root.path().join("alpha")]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let scanner = BottleScanner::new("/nonexistent/.wine");
        assert!(scanner
            .list_bottle_paths(Path::new("/nonexistent/winecellar/prefixes"), false)
            .is_err());
    }
}
