//! Change routing: which compiler work a set of changed files requires.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::context::CompilationContext;
use crate::core::ResourceKind;

/// Kind of compiler a changed file belongs to, by extension.
pub fn route_change(path: &Path) -> ResourceKind {
    ResourceKind::from_path(path)
}

/// Work derived from one debounced batch of changes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecompilePlan {
    /// Kinds recompiled as a whole
    pub full: BTreeSet<ResourceKind>,
    /// Kinds recompiled per destination
    pub resources: BTreeMap<ResourceKind, BTreeSet<String>>,
}

impl RecompilePlan {
    /// Route changed files.
    ///
    /// Stylesheet and script changes recompile the whole kind. Template and
    /// asset changes recompile the destinations the file backs; a file that
    /// backs nothing produces no work.
    pub fn build(ctx: &CompilationContext, changed: &[PathBuf]) -> Self {
        let mut plan = Self::default();
        for path in changed {
            if path.starts_with(ctx.output_root()) {
                continue;
            }
            let kind = route_change(path);
            if !kind.is_incremental() {
                plan.full.insert(kind);
                continue;
            }
            let dsts = ctx.index().destinations(path, kind);
            if dsts.is_empty() {
                crate::debug!("watch"; "{} backs no {}", path.display(), kind);
                continue;
            }
            plan.resources.entry(kind).or_default().extend(dsts);
        }
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty() && self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::{unit, with_template};
    use crate::unit::{Resource, UnitKind};
    use std::fs;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> CompilationContext {
        let root = dir.path();
        let src = root.join("FileCabinet");
        fs::create_dir_all(src.join("Cart/img")).unwrap();
        fs::write(src.join("Cart/summary.tpl"), "").unwrap();
        fs::write(src.join("Cart/img/logo.png"), "").unwrap();

        let mut ext = with_template(
            unit("Cart", UnitKind::Extension),
            "Cart/summary.tpl",
            "Cart/summary.tpl",
            "checkout",
        );
        ext.assets.insert(
            "assets/img/logo.png".into(),
            Resource::new("Cart/img/logo.png", "assets/img/logo.png"),
        );
        CompilationContext::new(
            root,
            &src,
            root.join("LocalServer"),
            unit("Theme", UnitKind::Theme),
            vec![ext],
        )
    }

    #[test]
    fn test_route_change() {
        assert_eq!(route_change(Path::new("a/b.tpl")), ResourceKind::Template);
        assert_eq!(route_change(Path::new("a/b.js")), ResourceKind::Script);
        assert_eq!(route_change(Path::new("a/_b.scss")), ResourceKind::Stylesheet);
        assert_eq!(route_change(Path::new("a/b.css")), ResourceKind::Stylesheet);
        assert_eq!(route_change(Path::new("a/b.woff2")), ResourceKind::Asset);
    }

    #[test]
    fn test_template_change_never_triggers_stylesheets() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let changed = vec![dir.path().join("FileCabinet/Cart/summary.tpl")];
        let plan = RecompilePlan::build(&ctx, &changed);

        assert!(!plan.full.contains(&ResourceKind::Stylesheet));
        assert!(!plan.resources.contains_key(&ResourceKind::Stylesheet));
        assert!(plan.full.is_empty());
        assert_eq!(
            plan.resources[&ResourceKind::Template],
            BTreeSet::from(["Cart/summary.tpl".to_string()])
        );
    }

    #[test]
    fn test_scss_change_is_full_stylesheet_run() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        // Not referenced by any unit: still a full run
        let changed = vec![dir.path().join("FileCabinet/Other/_unrelated.scss")];
        let plan = RecompilePlan::build(&ctx, &changed);
        assert_eq!(plan.full, BTreeSet::from([ResourceKind::Stylesheet]));
        assert!(plan.resources.is_empty());
    }

    #[test]
    fn test_untracked_files_produce_no_work() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let stray = dir.path().join("FileCabinet/Cart/unused.tpl");
        fs::write(&stray, "").unwrap();
        let changed = vec![stray, dir.path().join("LocalServer/css/shop.css")];
        assert!(RecompilePlan::build(&ctx, &changed).is_empty());
    }

    #[test]
    fn test_asset_change() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let changed = vec![dir.path().join("FileCabinet/Cart/img/logo.png")];
        let plan = RecompilePlan::build(&ctx, &changed);
        assert_eq!(
            plan.resources[&ResourceKind::Asset],
            BTreeSet::from(["assets/img/logo.png".to_string()])
        );
    }
}
