//! Selector — pure weighted-selection function (spec §4.3).
//!
//! Consults only a point-in-time snapshot of analyzer state; never mutates
//! anything. Phase A minimizes post-delivery deviation from each online
//! analyzer's ideal share; Phase B overrides with whichever online analyzer
//! has the largest deficit, if that deficit exceeds `deficit_threshold`.

use crate::registry::AnalyzerView;

/// Select the best analyzer index for a packet carrying `messages` log
/// lines, given `total_messages_processed` at call time. Returns `None` if
/// no analyzer in `snapshot` is online (spec: "no-target").
pub fn select(
    snapshot: &[AnalyzerView],
    total_messages_processed: u64,
    messages: u64,
    deficit_threshold: f64,
) -> Option<usize> {
    debug_assert!(messages >= 1);

    let total = total_messages_processed as f64;
    let future_total = total + messages as f64;

    let mut best_index: Option<usize> = None;
    let mut best_deviation = f64::INFINITY;

    let mut deficit_index: Option<usize> = None;
    let mut best_deficit = 0.0_f64;

    for view in snapshot.iter().filter(|v| v.online) {
        let future_ideal = future_total * view.weight;
        let future_count = view.message_count as f64 + messages as f64;
        let future_deviation = (future_count - future_ideal).abs();

        if future_deviation < best_deviation {
            best_deviation = future_deviation;
            best_index = Some(view.index);
        }

        let current_deficit = (total * view.weight) - view.message_count as f64;
        if current_deficit > best_deficit {
            best_deficit = current_deficit;
            deficit_index = Some(view.index);
        }
    }

    if best_deficit > deficit_threshold {
        deficit_index
    } else {
        best_index
    }
}
