//! Stylesheet compiler.
//!
//! For each application with entrypoints, a small Sass source is synthesized:
//! per unit (theme first) the asset path helpers followed by an import of the
//! unit's entrypoint. grass compiles it through [`OverrideFs`] so imports of
//! overridden stylesheets read the theme's replacement.

use std::path::PathBuf;
use std::sync::Arc;

use grass::{Options, OutputStyle};
use tokio::task::JoinSet;

use super::minify::{maybe_minify, minify_css};
use super::sass_fs::OverrideFs;
use super::tasks::first_failure;
use super::{CompileError, output};
use crate::context::{CompilationContext, StylesheetEntry};
use crate::utils::path::to_slash;

/// Output folder of compiled stylesheets.
pub const CSS_DIR: &str = "css";

/// Asset URL prefix as seen from `css/<app>.css`.
const ASSETS_URL: &str = "../assets/";

/// Output path of an application's stylesheet, relative to the output root.
pub fn output_path(app: &str) -> String {
    format!("{CSS_DIR}/{app}.css")
}

/// Compile every application's stylesheet concurrently.
pub async fn compile(ctx: Arc<CompilationContext>, minify: bool) -> Result<usize, CompileError> {
    let mut set = JoinSet::new();
    for (app, chain) in &ctx.stylesheets().entrypoints {
        if chain.is_empty() {
            continue;
        }
        let ctx = Arc::clone(&ctx);
        let app = app.clone();
        let source = entry_source(&ctx, chain);
        set.spawn(async move { compile_app(ctx, app, source, minify).await });
    }
    let written = first_failure(set).await?;
    Ok(written.len())
}

/// Sass source importing every entrypoint of a chain.
pub fn entry_source(ctx: &CompilationContext, chain: &[StylesheetEntry]) -> String {
    let mut source = String::new();
    for entry in chain {
        let path = to_slash(&ctx.source_root().join(&entry.entry));
        source.push_str(&format!("// {}\n", entry.unit));
        source.push_str(&format!(
            "@function getThemeAssetsPath($asset) {{ @return '{ASSETS_URL}' + $asset; }}\n"
        ));
        source.push_str(&format!(
            "@function getExtensionAssetsPath($asset) {{ @return '{ASSETS_URL}' + $asset; }}\n"
        ));
        source.push_str(&format!("@import \"{}\";\n", path.replace('"', "\\\"")));
    }
    source
}

async fn compile_app(
    ctx: Arc<CompilationContext>,
    app: String,
    source: String,
    minify: bool,
) -> Result<PathBuf, CompileError> {
    let fs = OverrideFs::new(Arc::clone(&ctx));
    let load_path = ctx.source_root().to_path_buf();

    let app_name = app.clone();
    let css = tokio::task::spawn_blocking(move || {
        let options = Options::default()
            .fs(&fs)
            .load_paths(&[load_path])
            .style(OutputStyle::Expanded);
        grass::from_string(source, &options).map_err(|e| CompileError::Sass {
            app: app_name,
            message: e.to_string(),
        })
    })
    .await??;

    let css = maybe_minify(minify, css, minify_css);
    let path = output::write(ctx.output_root(), &output_path(&app), css).await?;
    crate::debug!("sass"; "wrote {}", path.display());
    Ok(path)
}
