//! Script compiler.
//!
//! Concatenates an application's modules verbatim, each behind a banner
//! naming its source, and finishes with a `require` of the entrypoints.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;

use super::minify::{maybe_minify, minify_js};
use super::tasks::first_failure;
use super::{CompileError, output};
use crate::context::{CompilationContext, ScriptBundle};

/// Output folder of script bundles.
pub const EXTENSIONS_DIR: &str = "extensions";

/// Output path of an application's script bundle.
pub fn output_path(app: &str) -> String {
    format!("{EXTENSIONS_DIR}/{app}_ext.js")
}

/// AMD module id of a logical script path: its basename without `.js`.
pub fn module_id(logical: &str) -> &str {
    let base = logical.rsplit('/').next().unwrap_or(logical);
    base.strip_suffix(".js").unwrap_or(base)
}

/// Write every application's script bundle concurrently.
pub async fn compile(ctx: Arc<CompilationContext>, minify: bool) -> Result<usize, CompileError> {
    let mut set = JoinSet::new();
    for (app, bundle) in ctx.scripts() {
        let ctx = Arc::clone(&ctx);
        let app = app.clone();
        let bundle = bundle.clone();
        set.spawn(async move { compile_app(ctx, app, bundle, minify).await });
    }
    let written = first_failure(set).await?;
    Ok(written.len())
}

async fn compile_app(
    ctx: Arc<CompilationContext>,
    app: String,
    bundle: ScriptBundle,
    minify: bool,
) -> Result<PathBuf, CompileError> {
    let mut out = String::new();
    for module in &bundle.modules {
        let source = output::read_source(&ctx.source_root().join(module)).await?;
        out.push_str(&format!("// {module}\n"));
        out.push_str(&source);
        if !source.ends_with('\n') {
            out.push('\n');
        }
    }
    out.push_str(&require_call(&bundle.entrypoints));

    let out = maybe_minify(minify, out, minify_js);
    let path = output::write(ctx.output_root(), &output_path(&app), out).await?;
    crate::debug!("javascript"; "wrote {}", path.display());
    Ok(path)
}

/// `require(["A", "B"]);` for the given entrypoints.
fn require_call(entrypoints: &[String]) -> String {
    let ids: Vec<&str> = entrypoints.iter().map(|e| module_id(e)).collect();
    let ids = serde_json::to_string(&ids).unwrap_or_else(|_| "[]".to_string());
    format!("require({ids});\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_id() {
        assert_eq!(module_id("Acme/Cart/JavaScript/Acme.Cart.js"), "Acme.Cart");
        assert_eq!(module_id("Main.js"), "Main");
        assert_eq!(module_id("Acme/lib.min"), "lib.min");
    }

    #[test]
    fn test_require_call() {
        let entries = vec!["A/One.js".to_string(), "B/Two.js".to_string()];
        assert_eq!(require_call(&entries), "require([\"One\",\"Two\"]);\n");
        assert_eq!(require_call(&[]), "require([]);\n");
    }
}
