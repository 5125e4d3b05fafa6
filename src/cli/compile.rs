//! `compile` command: one full compile into the output root.

use anyhow::{Context, Result};

use super::{Cli, SelectionArgs, common};

pub fn compile_units(cli: &Cli, args: &SelectionArgs) -> Result<()> {
    let (project, mut config) = common::open_project(cli)?;
    config.apply_minify(args.minify);

    let compiler = common::prepare_compiler(&project, &config, args)?;
    let rt = common::runtime()?;
    rt.block_on(compiler.compile()).context("compilation failed")?;
    Ok(())
}
