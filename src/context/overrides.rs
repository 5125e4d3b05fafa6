//! Override pattern resolution.
//!
//! Each rule pattern is searched as `<project>/**/<pattern>`. Matches are
//! regular files outside the output root, sorted by full path; the first one
//! wins so repeated runs always pick the same file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::unit::OverrideRule;

/// An override rule together with the file it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOverride {
    pub rule: OverrideRule,
    pub source: PathBuf,
}

/// All regular files under `project_root` matching `pattern`, sorted.
pub fn find_matches(project_root: &Path, output_root: &Path, pattern: &str) -> Vec<PathBuf> {
    let root = glob::Pattern::escape(&project_root.to_string_lossy());
    let full = format!("{}/**/{}", root.trim_end_matches('/'), pattern);

    let paths = match glob::glob(&full) {
        Ok(paths) => paths,
        Err(e) => {
            crate::log!("override"; "invalid pattern `{}`: {}", pattern, e);
            return Vec::new();
        }
    };

    let mut matches: Vec<PathBuf> = paths
        .filter_map(Result::ok)
        .filter(|path| path.is_file() && !path.starts_with(output_root))
        .collect();
    matches.sort();
    matches.dedup();
    matches
}

/// Resolve every rule of an override table.
///
/// Rules without a match are dropped (the destination keeps its original
/// file); rules with several matches take the first after sorting.
pub fn resolve_table(
    project_root: &Path,
    output_root: &Path,
    table: &BTreeMap<String, OverrideRule>,
) -> BTreeMap<String, ResolvedOverride> {
    let mut resolved = BTreeMap::new();
    for (dst, rule) in table {
        let matches = find_matches(project_root, output_root, &rule.pattern);
        let Some(source) = matches.first().cloned() else {
            crate::log!("override"; "no file matches `{}`, keeping {}", rule.pattern, dst);
            continue;
        };
        if matches.len() > 1 {
            let candidates: Vec<_> = matches.iter().map(|p| p.display().to_string()).collect();
            crate::log!(
                "override";
                "`{}` matches {} files, using {}\n  {}",
                rule.pattern,
                matches.len(),
                source.display(),
                candidates.join("\n  ")
            );
        }
        resolved.insert(
            dst.clone(),
            ResolvedOverride {
                rule: rule.clone(),
                source,
            },
        );
    }
    resolved
}
