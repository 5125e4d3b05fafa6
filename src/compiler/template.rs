//! Template compiler.
//!
//! Every template becomes an AMD module returning its (override-resolved)
//! source text. Modules are bundled per application, ordered by destination.
//! The compiled modules are cached per destination so a change to one
//! template re-reads only that file and rewrites only the bundles that
//! include it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;

use super::minify::{maybe_minify, minify_js};
use super::tasks::first_failure;
use super::{CompileError, output};
use crate::context::CompilationContext;
use crate::unit::Resource;

/// Output folder of template bundles.
pub const TEMPLATES_DIR: &str = "templates";

/// Output path of an application's template bundle.
pub fn output_path(app: &str) -> String {
    format!("{TEMPLATES_DIR}/{app}-templates.js")
}

/// Compiled modules by destination.
#[derive(Debug, Default)]
pub struct TemplateCache {
    modules: Mutex<BTreeMap<String, String>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, dst: String, module: String) {
        self.modules.lock().insert(dst, module);
    }

    fn clear(&self) {
        self.modules.lock().clear();
    }

    /// Bundle text of the given destinations, in destination order.
    fn bundle<'a>(&self, dsts: impl IntoIterator<Item = &'a String>) -> String {
        let modules = self.modules.lock();
        let mut bundle = String::new();
        for dst in dsts {
            if let Some(module) = modules.get(dst) {
                bundle.push_str(module);
                bundle.push('\n');
            }
        }
        bundle
    }

    pub fn len(&self) -> usize {
        self.modules.lock().len()
    }
}

/// Wrap template source as an AMD module named after its file.
pub fn wrap_module(name: &str, source: &str) -> String {
    let name = serde_json::to_string(name).unwrap_or_default();
    let body = serde_json::to_string(source).unwrap_or_default();
    format!("define({name}, [], function () {{ return {body}; }});")
}

/// Compile every template and write every application bundle.
pub async fn compile(
    ctx: Arc<CompilationContext>,
    cache: Arc<TemplateCache>,
    minify: bool,
) -> Result<usize, CompileError> {
    cache.clear();
    let dsts: Vec<String> = ctx.templates().keys().cloned().collect();
    refresh(&ctx, &cache, &dsts).await?;
    crate::debug!("templates"; "{} modules", cache.len());

    let apps: BTreeSet<String> = ctx
        .templates()
        .values()
        .flat_map(|res| res.applications.iter().cloned())
        .collect();
    write_bundles(ctx, cache, apps, minify).await
}

/// Recompile the named templates and rewrite the bundles that include them.
pub async fn recompile(
    ctx: Arc<CompilationContext>,
    cache: Arc<TemplateCache>,
    dsts: &[String],
    minify: bool,
) -> Result<usize, CompileError> {
    let known: Vec<String> = dsts
        .iter()
        .filter(|dst| ctx.templates().contains_key(*dst))
        .cloned()
        .collect();
    if known.is_empty() {
        return Ok(0);
    }
    refresh(&ctx, &cache, &known).await?;
    let apps = ctx.template_applications(&known);
    write_bundles(ctx, cache, apps, minify).await
}

/// Read and wrap the named templates into the cache.
async fn refresh(
    ctx: &Arc<CompilationContext>,
    cache: &Arc<TemplateCache>,
    dsts: &[String],
) -> Result<(), CompileError> {
    let mut set = JoinSet::new();
    for dst in dsts {
        let Some(res) = ctx.templates().get(dst).cloned() else {
            continue;
        };
        let ctx = Arc::clone(ctx);
        let cache = Arc::clone(cache);
        set.spawn(async move {
            let module = compile_one(&ctx, &res).await?;
            cache.insert(res.dst, module);
            Ok(())
        });
    }
    first_failure(set).await.map(|_| ())
}

async fn compile_one(ctx: &CompilationContext, res: &Resource) -> Result<String, CompileError> {
    let path = res.physical_source(ctx.source_root());
    let source = output::read_source(&path).await?;
    if let Some(label) = &res.override_label {
        crate::debug!("templates"; "{} overridden by {}", res.dst, label);
    }
    Ok(wrap_module(res.basename(), &source))
}

async fn write_bundles(
    ctx: Arc<CompilationContext>,
    cache: Arc<TemplateCache>,
    apps: BTreeSet<String>,
    minify: bool,
) -> Result<usize, CompileError> {
    let mut set = JoinSet::new();
    for app in apps {
        let members: Vec<String> = ctx
            .templates()
            .values()
            .filter(|res| res.serves(&app))
            .map(|res| res.dst.clone())
            .collect();
        let bundle = maybe_minify(minify, cache.bundle(&members), minify_js);
        let root = ctx.output_root().to_path_buf();
        set.spawn(async move { output::write(&root, &output_path(&app), bundle).await });
    }
    let written = first_failure(set).await?;
    Ok(written.len())
}
