//! RecoverySweeper — periodic tick that promotes eligible Offline analyzers
//! back to Online after their cooldown (spec §4.5).

use std::sync::Arc;

use tracing::debug;

use crate::config::Tunables;
use crate::health;
use crate::registry::AnalyzerRegistry;

/// Run the sweep loop until the process exits. Intended to be
/// `tokio::spawn`ed once at startup; never returns under normal operation.
pub async fn run(registry: Arc<AnalyzerRegistry>, tunables: Arc<Tunables>) {
    let mut ticker = tokio::time::interval(tunables.sweep_interval);
    loop {
        ticker.tick().await;
        let promoted = health::sweep(&registry, &tunables);
        if promoted > 0 {
            debug!(promoted, "recovery sweep promoted offline analyzers");
        }
    }
}
