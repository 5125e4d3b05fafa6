//! Setup shared by the compiling commands.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::{Cli, SelectionArgs};
use crate::compiler::{CompileOptions, Compiler};
use crate::config::PreviewConfig;
use crate::context::CompilationContext;
use crate::descriptor::Project;

/// Absolute project folder from `--project`, or the current directory.
pub fn project_root(cli: &Cli) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let root = match &cli.project {
        Some(path) => cwd.join(path),
        None => cwd,
    };
    root.canonicalize()
        .with_context(|| format!("project folder `{}` not found", root.display()))
}

/// Discover the project and load its configuration.
pub fn open_project(cli: &Cli) -> Result<(Project, PreviewConfig)> {
    let root = project_root(cli)?;
    let project = Project::discover(&root).context("failed to read project")?;
    let config = PreviewConfig::load(&root).context("failed to load configuration")?;
    Ok((project, config))
}

/// Resolve the selection and build a compiler for it.
///
/// Selection errors surface here, before anything is written.
pub fn prepare_compiler(
    project: &Project,
    config: &PreviewConfig,
    args: &SelectionArgs,
) -> Result<Compiler> {
    let selection = project
        .select(&args.theme, &args.extensions)
        .context("invalid unit selection")?;

    let output_root = config.output_root(&project.root);
    let ctx = CompilationContext::load(project, &selection, output_root)
        .context("failed to load unit manifests")?;

    crate::log!(
        "compile";
        "{} with {} extension(s), applications: {}",
        ctx.theme(),
        ctx.extensions().len(),
        ctx.applications().into_iter().collect::<Vec<_>>().join(", ")
    );

    crate::debug!(
        "override";
        "{} template and {} stylesheet overrides resolved under {}",
        ctx.template_overrides().len(),
        ctx.stylesheet_overrides().len(),
        ctx.project_root().display()
    );

    let options = CompileOptions {
        minify: config.build.minify,
    };
    Ok(Compiler::new(ctx, options))
}

/// Runtime for the compile tasks.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}
