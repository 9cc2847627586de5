//! HealthState — the per-analyzer Online/Offline state machine (spec §4.2).
//!
//! Transitions are driven exclusively by three entry points: a successful
//! send, a failed send, and the periodic sweep. All three are idempotent
//! with respect to each other — a sweep racing a concurrent recovering
//! success can only ever leave an analyzer Online, never flap it back.

use tracing::info;

use crate::config::Tunables;
use crate::registry::AnalyzerRegistry;

/// Record a successful delivery to `index`. Resets the failure streak and,
/// if the analyzer was Offline, promotes it back to Online (spec I5).
pub fn record_success(registry: &AnalyzerRegistry, index: usize) {
    let runtime = registry.runtime(index);
    runtime.reset_failures();
    if !runtime.is_online() {
        runtime.set_online(true);
        info!(
            analyzer = %registry.descriptor(index).id,
            "analyzer recovered (successful delivery)"
        );
    }
}

/// Record a failed delivery to `index`. Bumps the failure streak and, once
/// it reaches `tunables.max_consecutive_failures`, transitions Online ->
/// Offline (spec I4).
pub fn record_failure(registry: &AnalyzerRegistry, index: usize, tunables: &Tunables) {
    let runtime = registry.runtime(index);
    runtime.set_last_failure_millis(registry.now_millis());
    let failures = runtime.bump_failures();

    if failures >= tunables.max_consecutive_failures && runtime.is_online() {
        runtime.set_online(false);
        info!(
            analyzer = %registry.descriptor(index).id,
            consecutive_failures = failures,
            "analyzer marked offline"
        );
    }
}

/// Promote every Offline analyzer whose cooldown has elapsed back to
/// Online, zeroing its failure streak (spec §4.5). Returns the number of
/// analyzers promoted, for logging/testing.
pub fn sweep(registry: &AnalyzerRegistry, tunables: &Tunables) -> usize {
    let now = registry.now_millis();
    let timeout_millis = tunables.offline_timeout.as_millis() as u64;
    let mut promoted = 0;

    for index in registry.iter_indices() {
        let runtime = registry.runtime(index);
        if runtime.is_online() {
            continue;
        }
        let last_failure = runtime.last_failure_millis();
        if last_failure != 0 && now.saturating_sub(last_failure) > timeout_millis {
            runtime.set_online(true);
            runtime.reset_failures();
            promoted += 1;
            info!(
                analyzer = %registry.descriptor(index).id,
                "analyzer recovered (sweep cooldown elapsed)"
            );
        }
    }

    promoted
}
