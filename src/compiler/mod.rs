//! Compilation orchestrator.
//!
//! [`Compiler::compile`] recreates the output root and runs the four resource
//! compilers as independent tasks; the first failure rejects the whole run
//! while the other tasks finish in the background. The watcher narrows work
//! with [`Compiler::recompile`] and [`Compiler::recompile_resources`].

mod asset;
mod error;
mod minify;
mod output;
mod sass_fs;
mod script;
mod stylesheet;
mod tasks;
mod template;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

pub use error::CompileError;
pub use script::output_path as script_output_path;
pub use stylesheet::output_path as stylesheet_output_path;
pub use template::{TemplateCache, output_path as template_output_path};

use crate::context::CompilationContext;
use crate::core::ResourceKind;
use tasks::first_failure;

/// Compiler settings taken from `[build]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub minify: bool,
}

/// Number of outputs written per resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileSummary {
    pub stylesheets: usize,
    pub templates: usize,
    pub scripts: usize,
    pub assets: usize,
    pub elapsed: Duration,
}

impl CompileSummary {
    fn record(&mut self, kind: ResourceKind, count: usize) {
        match kind {
            ResourceKind::Stylesheet => self.stylesheets = count,
            ResourceKind::Template => self.templates = count,
            ResourceKind::Script => self.scripts = count,
            ResourceKind::Asset => self.assets = count,
        }
    }
}

/// Runs the resource compilers against one compilation context.
#[derive(Debug, Clone)]
pub struct Compiler {
    ctx: Arc<CompilationContext>,
    options: CompileOptions,
    templates: Arc<TemplateCache>,
}

impl Compiler {
    pub fn new(ctx: CompilationContext, options: CompileOptions) -> Self {
        Self {
            ctx: Arc::new(ctx),
            options,
            templates: Arc::new(TemplateCache::new()),
        }
    }

    pub fn context(&self) -> &CompilationContext {
        &self.ctx
    }

    /// Full compile: fresh output root, all four kinds concurrently.
    pub async fn compile(&self) -> Result<CompileSummary, CompileError> {
        let started = Instant::now();
        output::recreate(self.ctx.output_root()).await?;

        let mut set = JoinSet::new();
        for kind in ResourceKind::ALL {
            let this = self.clone();
            set.spawn(async move { this.run(kind).await.map(|count| (kind, count)) });
        }

        let mut summary = CompileSummary::default();
        for (kind, count) in first_failure(set).await? {
            summary.record(kind, count);
        }
        summary.elapsed = started.elapsed();

        crate::log!(
            "compile";
            "{} stylesheets, {} template bundles, {} script bundles, {} assets in {:.2?}",
            summary.stylesheets,
            summary.templates,
            summary.scripts,
            summary.assets,
            summary.elapsed
        );
        Ok(summary)
    }

    /// Recompile every output of one kind, leaving the rest of the output root.
    pub async fn recompile(&self, kind: ResourceKind) -> Result<usize, CompileError> {
        self.run(kind).await
    }

    /// Recompile only the named destinations of an incremental kind.
    ///
    /// Stylesheets and scripts are pre-aggregated, so for them this is a full
    /// recompile of the kind.
    pub async fn recompile_resources(
        &self,
        kind: ResourceKind,
        dsts: &[String],
    ) -> Result<usize, CompileError> {
        let ctx = Arc::clone(&self.ctx);
        match kind {
            ResourceKind::Template => {
                let cache = Arc::clone(&self.templates);
                template::recompile(ctx, cache, dsts, self.options.minify).await
            }
            ResourceKind::Asset => asset::recompile(ctx, dsts).await,
            ResourceKind::Stylesheet | ResourceKind::Script => self.run(kind).await,
        }
    }

    async fn run(&self, kind: ResourceKind) -> Result<usize, CompileError> {
        let ctx = Arc::clone(&self.ctx);
        let minify = self.options.minify;
        let count = match kind {
            ResourceKind::Stylesheet => stylesheet::compile(ctx, minify).await?,
            ResourceKind::Template => {
                template::compile(ctx, Arc::clone(&self.templates), minify).await?
            }
            ResourceKind::Script => script::compile(ctx, minify).await?,
            ResourceKind::Asset => asset::compile(ctx).await?,
        };
        crate::debug!("compile"; "{}: {} outputs", kind, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Project;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    const THEME: &str = r#"<commercetheme>
        <vendor>Acme</vendor><name>Base</name><version>1.0.0</version>
        <basepath>[/Acme/Base]</basepath>
        <templates><application><shop><files>
            <file>[/Acme/Base/Templates/header.tpl]</file>
        </files></shop></application></templates>
        <sass>
            <entrypoints><shop>[/Acme/Base/Sass/main.scss]</shop></entrypoints>
            <files><file>[/Acme/Base/Sass/main.scss]</file></files>
        </sass>
        <overrides>
            <override>
                <src>[/Acme/Base/Overrides/summary-override.tpl]</src>
                <dst>[/Acme/Cart/checkout/summary.tpl]</dst>
            </override>
            <override>
                <src>[/Acme/Base/Overrides/_cart.scss]</src>
                <dst>[/Acme/Cart/Sass/_cart.scss]</dst>
            </override>
        </overrides>
    </commercetheme>"#;

    const EXTENSION: &str = r#"<commerceextension vendor="Acme" name="Cart" version="2.0.0" basepath="Acme/Cart">
        <templates><application>
            <shop><files><file>[/Acme/Cart/checkout/summary.tpl]</file></files></shop>
            <checkout><files><file>[/Acme/Cart/checkout/summary.tpl]</file></files></checkout>
        </application></templates>
        <sass>
            <entrypoints><shop>[/Acme/Cart/Sass/cart_main.scss]</shop></entrypoints>
        </sass>
        <javascript>
            <entrypoints><shop>[/Acme/Cart/JavaScript/Acme.Cart.js]</shop></entrypoints>
            <application><shop><files>
                <file>[/Acme/Cart/JavaScript/Acme.Cart.View.js]</file>
                <file>[/Acme/Cart/JavaScript/Acme.Cart.js]</file>
            </files></shop></application>
        </javascript>
        <assets><img><files><file>[/Acme/Cart/assets/logo.png]</file></files></img></assets>
    </commerceextension>"#;

    const LOGO: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0xff];

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "deploy.xml", "<deploy/>");
        write(root, "Objects/base_theme.xml", THEME);
        write(root, "Objects/cart_ext.xml", EXTENSION);

        let src = "FileCabinet";
        write(root, &format!("{src}/Acme/Base/Templates/header.tpl"), "<header/>");
        write(
            root,
            &format!("{src}/Acme/Base/Sass/main.scss"),
            "$brand: #336699;\n.header { color: $brand; background: url(getThemeAssetsPath('img/bg.png')); }\n",
        );
        write(
            root,
            &format!("{src}/Acme/Base/Overrides/summary-override.tpl"),
            "<p>theme summary</p>",
        );
        write(
            root,
            &format!("{src}/Acme/Base/Overrides/_cart.scss"),
            ".cart { color: blue; }\n",
        );
        write(
            root,
            &format!("{src}/Acme/Cart/checkout/summary.tpl"),
            "<p>extension summary</p>",
        );
        write(
            root,
            &format!("{src}/Acme/Cart/Sass/cart_main.scss"),
            "@import \"cart\";\n",
        );
        write(
            root,
            &format!("{src}/Acme/Cart/Sass/_cart.scss"),
            ".cart { color: red; }\n",
        );
        write(
            root,
            &format!("{src}/Acme/Cart/JavaScript/Acme.Cart.View.js"),
            "define('Acme.Cart.View', [], function () { return {}; });",
        );
        write(
            root,
            &format!("{src}/Acme/Cart/JavaScript/Acme.Cart.js"),
            "define('Acme.Cart', ['Acme.Cart.View'], function (v) { return v; });\n",
        );
        let logo = root.join(format!("{src}/Acme/Cart/assets/logo.png"));
        fs::create_dir_all(logo.parent().unwrap()).unwrap();
        fs::write(logo, LOGO).unwrap();
        dir
    }

    fn compiler(dir: &TempDir) -> Compiler {
        let project = Project::discover(dir.path()).unwrap();
        let selection = project.select("base_theme", &["cart_ext".into()]).unwrap();
        let ctx = CompilationContext::load(&project, &selection, dir.path().join("LocalServer"))
            .unwrap();
        Compiler::new(ctx, CompileOptions::default())
    }

    fn read(dir: &TempDir, rel: &str) -> String {
        fs::read_to_string(dir.path().join("LocalServer").join(rel)).unwrap()
    }

    fn snapshot(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files = Vec::new();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(dir).unwrap().flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else {
                    let bytes = fs::read(&path).unwrap();
                    files.push((path.strip_prefix(root).unwrap().to_path_buf(), bytes));
                }
            }
        }
        files.sort();
        files
    }

    #[tokio::test]
    async fn test_stylesheet_and_asset_end_to_end() {
        let dir = project();
        let summary = compiler(&dir).compile().await.unwrap();
        assert_eq!(summary.stylesheets, 1);
        assert_eq!(summary.assets, 1);

        let css = read(&dir, "css/shop.css");
        assert!(css.contains(".header"));
        assert!(css.contains("#336699"));
        assert!(css.contains("../assets/img/bg.png"));

        let logo = dir.path().join("LocalServer/assets/logo.png");
        assert_eq!(fs::read(logo).unwrap(), LOGO);
    }

    #[tokio::test]
    async fn test_stylesheet_import_follows_override() {
        let dir = project();
        compiler(&dir).compile().await.unwrap();

        let css = read(&dir, "css/shop.css");
        assert!(css.contains("color: blue"));
        assert!(!css.contains("color: red"));
        // Theme entrypoint precedes the extension's
        assert!(css.find(".header").unwrap() < css.find(".cart").unwrap());
    }

    #[tokio::test]
    async fn test_stylesheet_override_imports_its_sibling() {
        let dir = project();
        let overrides = "FileCabinet/Acme/Base/Overrides";
        write(
            dir.path(),
            &format!("{overrides}/_cart.scss"),
            "@import \"theme-colors\";\n.cart { color: $cart-color; }\n",
        );
        write(
            dir.path(),
            &format!("{overrides}/_theme-colors.scss"),
            "$cart-color: #00ff00;\n",
        );
        compiler(&dir).compile().await.unwrap();

        let css = read(&dir, "css/shop.css");
        assert!(css.contains("#00ff00"), "{css}");
        assert!(!css.contains("color: red"));
    }

    #[tokio::test]
    async fn test_template_override_end_to_end() {
        let dir = project();
        compiler(&dir).compile().await.unwrap();

        for app in ["shop", "checkout"] {
            let bundle = read(&dir, &format!("templates/{app}-templates.js"));
            assert!(bundle.contains("theme summary"), "{app}");
            assert!(!bundle.contains("extension summary"), "{app}");
            assert!(bundle.contains("define(\"summary.tpl\""));
        }
        assert!(read(&dir, "templates/shop-templates.js").contains("<header/>"));
        assert!(!read(&dir, "templates/checkout-templates.js").contains("<header/>"));
    }

    #[tokio::test]
    async fn test_script_bundle() {
        let dir = project();
        compiler(&dir).compile().await.unwrap();

        let js = read(&dir, "extensions/shop_ext.js");
        let view = js.find("// Acme/Cart/JavaScript/Acme.Cart.View.js").unwrap();
        let main = js.find("// Acme/Cart/JavaScript/Acme.Cart.js").unwrap();
        assert!(view < main);
        assert!(js.ends_with("require([\"Acme.Cart\"]);\n"));
    }

    #[tokio::test]
    async fn test_compile_is_idempotent() {
        let dir = project();
        let compiler = compiler(&dir);
        let out = dir.path().join("LocalServer");

        compiler.compile().await.unwrap();
        let first = snapshot(&out);
        fs::write(out.join("stale.txt"), "old").unwrap();
        compiler.compile().await.unwrap();
        let second = snapshot(&out);

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_sass_error_rejects_compile() {
        let dir = project();
        write(
            dir.path(),
            "FileCabinet/Acme/Base/Sass/main.scss",
            ".header { color: ; \n",
        );
        let err = compiler(&dir).compile().await.unwrap_err();
        assert!(matches!(err, CompileError::Sass { ref app, .. } if app == "shop"));
    }

    #[tokio::test]
    async fn test_recompile_single_template() {
        let dir = project();
        let compiler = compiler(&dir);
        compiler.compile().await.unwrap();

        let over = write(
            dir.path(),
            "FileCabinet/Acme/Base/Overrides/summary-override.tpl",
            "<p>edited</p>",
        );
        let hits = compiler.context().index().destinations(&over, ResourceKind::Template);
        assert_eq!(hits, vec!["Acme/Cart/checkout/summary.tpl"]);

        let written = compiler
            .recompile_resources(ResourceKind::Template, &hits)
            .await
            .unwrap();
        assert_eq!(written, 2);
        assert!(read(&dir, "templates/checkout-templates.js").contains("edited"));
        // Untouched templates stay in the rewritten bundle
        assert!(read(&dir, "templates/shop-templates.js").contains("<header/>"));
    }

    #[tokio::test]
    async fn test_recompile_unknown_destinations() {
        let dir = project();
        let compiler = compiler(&dir);
        compiler.compile().await.unwrap();
        let none = vec!["nope.tpl".to_string()];
        assert_eq!(
            compiler
                .recompile_resources(ResourceKind::Template, &none)
                .await
                .unwrap(),
            0
        );
        assert_eq!(
            compiler
                .recompile_resources(ResourceKind::Asset, &none)
                .await
                .unwrap(),
            0
        );
    }
}
