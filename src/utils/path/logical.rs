//! Logical (source-root relative) path handling.
//!
//! Manifests reference files as `[/Acme/Base/Sass/main.scss]`, `Acme\Base\x.tpl`
//! or `./Acme/Base/x.tpl`. All of them are reduced to one canonical form:
//! forward slashes, no brackets, no leading slash, no `.` segments.

use regex::Regex;
use std::sync::LazyLock;

/// Sass partial file name: `_name.scss`.
static PARTIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^_(.+\.scss)$").expect("valid partial pattern"));

/// Reduce a manifest path to its canonical logical form.
///
/// `..` segments pop the previous segment and never escape the root.
pub fn clean_logical(raw: &str) -> String {
    let trimmed = raw.trim();
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    let mut segments: Vec<&str> = Vec::new();
    for segment in unbracketed.split(['/', '\\']) {
        match segment.trim() {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Strip a unit base path from a logical path.
///
/// Returns the path unchanged when it does not live under `base`.
pub fn strip_base<'a>(path: &'a str, base: &str) -> &'a str {
    if base.is_empty() {
        return path;
    }
    match path.strip_prefix(base) {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => &rest[1..],
        _ => path,
    }
}

/// Map a Sass partial (`dir/_name.scss`) onto its import name (`dir/name.scss`).
///
/// Stylesheet override destinations and requested import paths are both keyed
/// this way so `@import "name"` and a rule written for `_name.scss` meet.
pub fn unpartial(path: &str) -> String {
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path),
    };
    let file = PARTIAL.replace(file, "$1");
    match dir {
        Some(dir) => format!("{dir}/{file}"),
        None => file.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_logical_brackets_and_slashes() {
        assert_eq!(
            clean_logical("[/Acme/Base/Sass/main.scss]"),
            "Acme/Base/Sass/main.scss"
        );
        assert_eq!(clean_logical("  ./Acme\\Base\\x.tpl "), "Acme/Base/x.tpl");
        assert_eq!(clean_logical("Acme//Base/./x.tpl"), "Acme/Base/x.tpl");
    }

    #[test]
    fn test_clean_logical_parent_segments() {
        assert_eq!(clean_logical("Acme/Base/../Other/x.tpl"), "Acme/Other/x.tpl");
        assert_eq!(clean_logical("../../x.tpl"), "x.tpl");
    }

    #[test]
    fn test_strip_base() {
        assert_eq!(strip_base("Acme/Base/img/logo.png", "Acme/Base"), "img/logo.png");
        assert_eq!(strip_base("Acme/Basement/logo.png", "Acme/Base"), "Acme/Basement/logo.png");
        assert_eq!(strip_base("logo.png", ""), "logo.png");
        assert_eq!(strip_base("Acme/Base", "Acme/Base"), "");
    }

    #[test]
    fn test_unpartial() {
        assert_eq!(unpartial("Acme/Sass/_variables.scss"), "Acme/Sass/variables.scss");
        assert_eq!(unpartial("_mixins.scss"), "mixins.scss");
        assert_eq!(unpartial("Acme/Sass/main.scss"), "Acme/Sass/main.scss");
        assert_eq!(unpartial("Acme/_Templates/x.tpl"), "Acme/_Templates/x.tpl");
    }
}
