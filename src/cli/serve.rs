//! `serve` command: compile, serve, and keep the output in sync.
//!
//! Startup order: watcher (when enabled) -> full compile -> server. The
//! watcher exists before the compile so edits made during it are not lost.

use std::net::IpAddr;

use anyhow::{Context, Result};

use super::{Cli, SelectionArgs, common};
use crate::core::register_shutdown;
use crate::server::LocalServer;
use crate::watch::Watcher;

pub fn serve_units(
    cli: &Cli,
    args: &SelectionArgs,
    interface: Option<IpAddr>,
    port: Option<u16>,
    watch: Option<bool>,
) -> Result<()> {
    let (project, mut config) = common::open_project(cli)?;
    config.apply_minify(args.minify);
    config.apply_serve_options(interface, port, watch);

    let compiler = common::prepare_compiler(&project, &config, args)?;
    let rt = common::runtime()?;

    let server = LocalServer::new(
        compiler.context().output_root(),
        config.serve.interface,
        config.serve.port,
    );

    if !config.serve.watch {
        rt.block_on(compiler.compile()).context("compilation failed")?;
        let handle = server.start()?;
        register_shutdown(handle.token());
        handle.wait();
        return Ok(());
    }

    rt.block_on(async move {
        let token = tokio_util::sync::CancellationToken::new();
        let watcher = Watcher::new(compiler.clone(), token.clone())
            .context("failed to watch sources")?;

        // A failed first compile still serves; the next change retries
        if let Err(e) = compiler.compile().await {
            crate::logger::status_error("compilation failed", &e.report());
        }

        let handle = server.start()?;
        let server_token = handle.token();
        register_shutdown(server_token.clone());

        let watcher_task = tokio::spawn(async move { watcher.run().await });
        server_token.cancelled().await;
        token.cancel();
        let _ = watcher_task.await;

        tokio::task::spawn_blocking(move || handle.stop())
            .await
            .context("server shutdown failed")?;
        Ok(())
    })
}
