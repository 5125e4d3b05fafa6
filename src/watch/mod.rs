//! Source tree watcher.
//!
//! ```text
//! notify -> Debouncer (timing, dedup) -> RecompilePlan (routing) -> Compiler
//! ```
//!
//! The watcher is created before the initial compile so no change made in the
//! meantime is lost, and runs until its cancellation token fires. Besides the
//! source root it watches the folders of override files living elsewhere in
//! the project.

mod debouncer;
mod route;

use std::collections::BTreeSet;
use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use tokio_util::sync::CancellationToken;

pub use debouncer::ChangeKind;
pub use route::RecompilePlan;

use crate::compiler::Compiler;
use crate::context::CompilationContext;
use crate::logger::{status_error, status_success};
use debouncer::Debouncer;

/// Watches the sources of a compiler and keeps the output root in sync.
pub struct Watcher {
    /// Channel receiving notify events (sync side)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    compiler: Compiler,
    token: CancellationToken,
}

impl Watcher {
    /// Start watching. Events buffer until [`Watcher::run`].
    pub fn new(compiler: Compiler, token: CancellationToken) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let ctx = compiler.context();
        watcher.watch(ctx.source_root(), RecursiveMode::Recursive)?;
        crate::log!("watch"; "watching {}", ctx.source_root().display());
        for dir in override_dirs(ctx) {
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
            crate::debug!("watch"; "watching overrides in {}", dir.display());
        }
        Ok(Self {
            notify_rx,
            _watcher: watcher,
            compiler,
            token,
        })
    }

    /// Run the event loop until the token is cancelled.
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let compiler = self.compiler;
        let token = self.token;
        let mut debouncer = Debouncer::new();

        let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);

        // notify delivers on its own thread; bridge into the runtime
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                () = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if let Some(changes) = debouncer.take_if_ready() {
                        let changed: Vec<PathBuf> = changes
                            .into_iter()
                            .filter(|(_, kind)| *kind != ChangeKind::Removed)
                            .map(|(path, _)| path)
                            .collect();
                        apply_changes(&compiler, &changed).await;
                    }
                }
            }
        }
        crate::debug!("watch"; "stopped");
    }
}

/// Folders of override files outside the source root.
fn override_dirs(ctx: &CompilationContext) -> BTreeSet<PathBuf> {
    ctx.template_overrides()
        .values()
        .chain(ctx.stylesheet_overrides().values())
        .filter(|o| !o.source.starts_with(ctx.source_root()))
        .filter_map(|o| o.source.parent().map(PathBuf::from))
        .collect()
}

/// Route a batch of changed files and run the resulting recompiles.
///
/// Stops at the first failing kind; later work waits for the next change.
pub async fn apply_changes(compiler: &Compiler, changed: &[PathBuf]) -> RecompilePlan {
    let plan = RecompilePlan::build(compiler.context(), changed);
    if plan.is_empty() {
        return plan;
    }

    let mut done = Vec::new();
    for kind in &plan.full {
        match compiler.recompile(*kind).await {
            Ok(_) => done.push(kind.to_string()),
            Err(e) => {
                status_error(&format!("{kind} failed"), &e.report());
                return plan;
            }
        }
    }
    for (kind, dsts) in &plan.resources {
        let dsts: Vec<String> = dsts.iter().cloned().collect();
        match compiler.recompile_resources(*kind, &dsts).await {
            Ok(_) => done.push(format!("{} ({})", kind, dsts.join(", "))),
            Err(e) => {
                status_error(&format!("{kind} failed"), &e.report());
                return plan;
            }
        }
    }
    status_success(&format!("recompiled {}", done.join(", ")));
    plan
}
