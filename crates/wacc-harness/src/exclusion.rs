//! Fixtures the suite skips.

use crate::error::{HarnessError, Result};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Make a path absolute against the current directory and fold `.` and `..`
/// lexically. Symlinks are left alone.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Set of normalized fixture paths excluded from a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    paths: HashSet<PathBuf>,
}

impl ExclusionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from list text: one path per line, relative to `base`.
    /// Blank lines are ignored.
    pub fn parse(text: &str, base: &Path) -> Self {
        let paths = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|entry| normalize_path(&base.join(entry)))
            .collect();
        Self { paths }
    }

    /// Load the list file. A missing file means nothing is excluded.
    pub fn load(list_file: &Path, base: &Path) -> Result<Self> {
        match std::fs::read_to_string(list_file) {
            Ok(text) => {
                let set = Self::parse(&text, base);
                info!(
                    list = %list_file.display(),
                    excluded = set.len(),
                    "Loaded exclusion list"
                );
                Ok(set)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(list = %list_file.display(), "No exclusion list found; running every fixture");
                Ok(Self::empty())
            }
            Err(e) => Err(HarnessError::io(list_file, e)),
        }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.paths.contains(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
