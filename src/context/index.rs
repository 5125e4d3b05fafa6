//! Reverse index: physical file -> resources it backs.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::core::ResourceKind;
use crate::utils::path::normalize_path;

/// Maps a normalized absolute path to every `(kind, dst)` it backs.
#[derive(Debug, Default, Clone)]
pub struct ReverseIndex {
    by_path: FxHashMap<PathBuf, Vec<(ResourceKind, String)>>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` backs `dst` of `kind`.
    pub fn insert(&mut self, path: &Path, kind: ResourceKind, dst: &str) {
        let entry = self.by_path.entry(normalize_path(path)).or_default();
        if !entry.iter().any(|(k, d)| *k == kind && d == dst) {
            entry.push((kind, dst.to_string()));
        }
    }

    /// Resources backed by `path`; empty when the file backs nothing.
    pub fn lookup(&self, path: &Path) -> &[(ResourceKind, String)] {
        self.by_path
            .get(&normalize_path(path))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Destinations of `kind` backed by `path`.
    pub fn destinations(&self, path: &Path, kind: ResourceKind) -> Vec<String> {
        self.lookup(path)
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, dst)| dst.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_insert_and_lookup() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("logo.png");
        fs::write(&file, b"png").unwrap();

        let mut index = ReverseIndex::new();
        index.insert(&file, ResourceKind::Asset, "assets/logo.png");
        index.insert(&file, ResourceKind::Asset, "assets/logo.png");
        index.insert(&file, ResourceKind::Asset, "assets/img/logo.png");

        let dotted = dir.path().join(".").join("logo.png");
        assert_eq!(index.lookup(&dotted).len(), 2);
        assert_eq!(
            index.destinations(&file, ResourceKind::Asset),
            vec!["assets/logo.png", "assets/img/logo.png"]
        );
        assert!(index.destinations(&file, ResourceKind::Template).is_empty());
    }

    #[test]
    fn test_no_substring_matches() {
        let dir = TempDir::new().unwrap();
        let long = dir.path().join("header.tpl.bak");
        let short = dir.path().join("header.tpl");
        fs::write(&long, "").unwrap();
        fs::write(&short, "").unwrap();

        let mut index = ReverseIndex::new();
        index.insert(&long, ResourceKind::Template, "header.tpl.bak");
        assert!(index.lookup(&short).is_empty());
        assert_eq!(index.len(), 1);
    }
}
