//! Active-window filter: which events are "near" the playhead right now.
//!
//! Recomputed on every state mutation and config change - never cached
//! across calls that could invalidate it.

use crate::core::config::PlaybackConfig;
use crate::entities::TimelineEvent;

/// Events within `time_window_secs` of `current_time` whose severity is on
/// the allow-list. Empty when the engine is disabled.
///
/// Window bounds are found by binary search on the sorted list; severity is
/// filtered inside the window slice.
pub fn active_events(
    events: &[TimelineEvent],
    current_time: f64,
    config: &PlaybackConfig,
) -> Vec<TimelineEvent> {
    if !config.enabled || events.is_empty() {
        return Vec::new();
    }

    let window_ms = config.time_window_secs * 1000.0;
    let lo = current_time - window_ms;
    let hi = current_time + window_ms;

    let from = events.partition_point(|e| (e.timestamp as f64) < lo);
    let to = events.partition_point(|e| e.timestamp as f64 <= hi);

    events[from..to]
        .iter()
        .filter(|e| config.allows(e.severity))
        .cloned()
        .collect()
}
