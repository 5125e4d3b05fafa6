//! URL to output file resolution.

use std::path::{Path, PathBuf};

/// Resolve a request path to a file under `serve_root`.
///
/// Directories resolve to their `index.html`. Anything escaping the root,
/// through `..` or symlinks, resolves to nothing.
pub fn resolve_path(url: &str, serve_root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);

    if clean.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }

    let local = serve_root.join(&clean);

    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Request path without query string, percent-decoded.
pub fn request_path(url: &str) -> String {
    use percent_encoding::percent_decode_str;
    let path = url.split(['?', '#']).next().unwrap_or(url);
    percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default()
}

/// Normalize URL: decode, strip query string, trim slashes
fn normalize_url(url: &str) -> String {
    request_path(url).trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_files_and_index() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("css/shop.css"), "a{}").unwrap();
        fs::write(root.join("index.html"), "<html/>").unwrap();

        let css = resolve_path("/css/shop.css?v=3", root).unwrap();
        assert!(css.ends_with("css/shop.css"));
        assert!(resolve_path("/", root).unwrap().ends_with("index.html"));
        assert!(resolve_path("/css/", root).is_none());
        assert!(resolve_path("/missing.js", root).is_none());
    }

    #[test]
    fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("LocalServer");
        fs::create_dir_all(&root).unwrap();
        fs::write(dir.path().join("secret.txt"), "x").unwrap();

        assert!(resolve_path("/../secret.txt", &root).is_none());
        assert!(resolve_path("/%2e%2e/secret.txt", &root).is_none());
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/who/my%20app?x=1"), "/who/my app");
        assert_eq!(request_path("/define_patch.js#a"), "/define_patch.js");
    }
}
