//! Timeline index: range and aggregate stats over the sorted event list.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entities::{EventKind, Severity, TimelineEvent};

/// Derived `[start, end]` range in epoch milliseconds.
///
/// Recomputed whenever the event list changes. An empty list has no range;
/// callers treat that as "timeline disabled".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRange {
    pub start: i64,
    pub end: i64,
    pub duration: i64,
}

/// Compute min/max/duration. Relies on the sorted-ascending invariant, so
/// min is the first and max the last element.
pub fn compute_range(events: &[TimelineEvent]) -> Option<TimelineRange> {
    let first = events.first()?;
    let last = events.last()?;
    let start = first.timestamp;
    let end = last.timestamp;
    Some(TimelineRange {
        start,
        end,
        duration: end - start,
    })
}

/// Aggregate counts the host surfaces in info panels.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineStats {
    pub total_events: usize,
    pub node_events: usize,
    pub edge_events: usize,
    pub milestones: usize,
    /// Counts per severity level, low..critical.
    pub by_severity: IndexMap<Severity, usize>,
    /// Tactic histogram, first-seen order.
    pub by_tactic: IndexMap<String, usize>,
    pub duration_ms: i64,
    /// Average gap between consecutive events; 0 for fewer than two events.
    pub mean_gap_ms: f64,
    /// Entities excluded during extraction for lack of a valid timestamp.
    pub dropped_entities: usize,
}

pub fn compute_stats(events: &[TimelineEvent], dropped: usize) -> TimelineStats {
    let mut stats = TimelineStats {
        total_events: events.len(),
        dropped_entities: dropped,
        ..Default::default()
    };
    for sev in Severity::ALL {
        stats.by_severity.insert(sev, 0);
    }

    for ev in events {
        match ev.kind {
            EventKind::Node => stats.node_events += 1,
            EventKind::Edge => stats.edge_events += 1,
            EventKind::Milestone => stats.milestones += 1,
        }
        *stats.by_severity.entry(ev.severity).or_insert(0) += 1;
        if let Some(tactic) = &ev.tactic {
            *stats.by_tactic.entry(tactic.clone()).or_insert(0) += 1;
        }
    }

    if let Some(range) = compute_range(events) {
        stats.duration_ms = range.duration;
    }
    if events.len() > 1 {
        stats.mean_gap_ms = stats.duration_ms as f64 / (events.len() - 1) as f64;
    }
    stats
}
