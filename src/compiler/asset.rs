//! Asset compiler: verbatim copies of every asset's backing file.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinSet;

use super::tasks::first_failure;
use super::{CompileError, output};
use crate::context::CompilationContext;

/// Copy every asset.
pub async fn compile(ctx: Arc<CompilationContext>) -> Result<usize, CompileError> {
    let dsts: Vec<String> = ctx.assets().keys().cloned().collect();
    copy_all(ctx, dsts).await
}

/// Copy only the named assets; unknown destinations are skipped.
pub async fn recompile(ctx: Arc<CompilationContext>, dsts: &[String]) -> Result<usize, CompileError> {
    let known = dsts
        .iter()
        .filter(|dst| ctx.assets().contains_key(*dst))
        .cloned()
        .collect();
    copy_all(ctx, known).await
}

async fn copy_all(ctx: Arc<CompilationContext>, dsts: Vec<String>) -> Result<usize, CompileError> {
    let mut set: JoinSet<Result<PathBuf, CompileError>> = JoinSet::new();
    for dst in dsts {
        let Some(res) = ctx.assets().get(&dst) else {
            continue;
        };
        let from = res.physical_source(ctx.source_root());
        let root = ctx.output_root().to_path_buf();
        set.spawn(async move { output::copy(&from, &root, &dst).await });
    }
    let copied = first_failure(set).await?;
    Ok(copied.len())
}
