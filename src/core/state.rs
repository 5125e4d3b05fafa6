//! Process-wide shutdown state.
//!
//! Ctrl+C either exits immediately (nothing to tear down yet) or cancels the
//! token registered by the running server so its owner can stop it.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Token of the running server, cancelled on Ctrl+C
static SHUTDOWN_TOKEN: OnceLock<CancellationToken> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// - Before `register_shutdown()`: exit immediately
/// - After `register_shutdown()`: cancel the registered token
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(token) = SHUTDOWN_TOKEN.get() {
            crate::log!("serve"; "shutting down...");
            token.cancel();
        } else {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the token that Ctrl+C should cancel.
pub fn register_shutdown(token: CancellationToken) {
    let _ = SHUTDOWN_TOKEN.set(token);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
