//! Event extraction: graph entities -> timestamped timeline events.
//!
//! **Why**: source graphs carry timestamps under inconsistent field names
//! and severities as free text. Extraction normalizes both so the rest of
//! the engine never touches raw metadata.
//!
//! **Used by**: `core::player` on `initialize()`, CLI stats command.
//!
//! Entities with no parseable timestamp produce no event. They still exist
//! in the graph; dropping them here favors availability over completeness,
//! so the drop count is logged and surfaced through stats instead of being
//! an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use serde_json::Value;

use crate::entities::{EventKind, GraphEdge, GraphNode, Severity, TimelineEvent};

/// Timestamp field candidates, in lookup order. First present field wins,
/// even if it fails to parse.
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "timestamp",
    "time",
    "observed_time",
    "detection_time",
    "created_at",
    "event_time",
];

/// Severity field candidates, in lookup order.
pub const SEVERITY_FIELDS: &[&str] = &["severity", "risk", "priority"];

/// Extraction result: sorted events plus how many entities were dropped
/// for lack of a valid timestamp.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub events: Vec<TimelineEvent>,
    pub dropped: usize,
}

/// Build the sorted event list from a graph snapshot. Pure function.
pub fn build_events(nodes: &[GraphNode], edges: &[GraphEdge]) -> Extraction {
    let mut events = Vec::with_capacity(nodes.len() + edges.len());
    let mut dropped = 0usize;

    for node in nodes {
        match entity_timestamp(&node.meta) {
            Some(ts) => {
                let label = node
                    .label
                    .clone()
                    .or_else(|| meta_string(&node.meta, "name"))
                    .unwrap_or_else(|| node.id.clone());
                let mut ev = TimelineEvent::new(format!("node_{}", node.id), ts, EventKind::Node, label);
                ev.ref_id = Some(node.id.clone());
                ev.description = meta_string(&node.meta, "description").unwrap_or_default();
                ev.severity = entity_severity(&node.meta);
                ev.tactic = meta_string(&node.meta, "tactic");
                ev.technique = meta_string(&node.meta, "technique");
                ev.actor = meta_string(&node.meta, "actor");
                events.push(ev);
            }
            None => dropped += 1,
        }
    }

    for edge in edges {
        match entity_timestamp(&edge.meta) {
            Some(ts) => {
                let label = edge
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("{} -> {}", edge.source, edge.target));
                let mut ev = TimelineEvent::new(format!("edge_{}", edge.id), ts, EventKind::Edge, label);
                ev.ref_id = Some(edge.id.clone());
                ev.description = meta_string(&edge.meta, "description").unwrap_or_default();
                ev.severity = entity_severity(&edge.meta);
                ev.tactic = meta_string(&edge.meta, "tactic");
                ev.technique = meta_string(&edge.meta, "technique");
                ev.actor = meta_string(&edge.meta, "actor");
                events.push(ev);
            }
            None => dropped += 1,
        }
    }

    events.sort_by_key(|e| e.timestamp);

    if dropped > 0 {
        debug!(
            "Event extraction: {} events, {} entities dropped (no valid timestamp)",
            events.len(),
            dropped
        );
    }

    Extraction { events, dropped }
}

/// Find the first timestamp candidate field and parse it. `None` means the
/// entity generates no event.
fn entity_timestamp(meta: &indexmap::IndexMap<String, Value>) -> Option<i64> {
    let value = TIMESTAMP_FIELDS.iter().find_map(|f| meta.get(*f))?;
    parse_timestamp(value)
}

/// Parse a metadata value into epoch milliseconds.
///
/// Numbers are taken as epoch ms directly and must be finite. Strings are
/// tried as a numeric epoch first, then RFC 3339, then a couple of common
/// date formats.
pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            let f = n.as_f64()?;
            f.is_finite().then_some(f as i64)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if let Ok(f) = s.parse::<f64>() {
                return f.is_finite().then_some(f as i64);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.timestamp_millis());
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(naive.and_utc().timestamp_millis());
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
            }
            None
        }
        _ => None,
    }
}

/// Severity from the first recognized candidate field; `Medium` otherwise.
fn entity_severity(meta: &indexmap::IndexMap<String, Value>) -> Severity {
    for field in SEVERITY_FIELDS {
        if let Some(Value::String(s)) = meta.get(*field) {
            if let Some(sev) = Severity::parse(s) {
                return sev;
            }
        }
    }
    Severity::default()
}

fn meta_string(meta: &indexmap::IndexMap<String, Value>, key: &str) -> Option<String> {
    match meta.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(id: &str) -> GraphNode {
        GraphNode::new(id)
    }

    #[test]
    fn test_numeric_and_string_epochs() {
        assert_eq!(parse_timestamp(&json!(1700000000000_i64)), Some(1700000000000));
        assert_eq!(parse_timestamp(&json!("1700000000000")), Some(1700000000000));
        assert_eq!(parse_timestamp(&json!(1.5)), Some(1));
    }

    #[test]
    fn test_date_string_parsing() {
        let rfc = parse_timestamp(&json!("2023-11-14T22:13:20Z")).unwrap();
        assert_eq!(rfc, 1700000000000);
        let space = parse_timestamp(&json!("2023-11-14 22:13:20")).unwrap();
        assert_eq!(space, rfc);
        let date = parse_timestamp(&json!("2023-11-14")).unwrap();
        assert_eq!(date, 1699920000000);
    }

    #[test]
    fn test_invalid_timestamps_rejected() {
        assert_eq!(parse_timestamp(&json!("not a date")), None);
        assert_eq!(parse_timestamp(&json!("")), None);
        assert_eq!(parse_timestamp(&json!(null)), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
        assert_eq!(parse_timestamp(&json!("NaN")), None);
    }

    #[test]
    fn test_field_precedence() {
        // "timestamp" should win over "created_at" regardless of insertion order
        let n = node("a")
            .with_meta("created_at", 2000_i64)
            .with_meta("timestamp", 1000_i64);
        let ex = build_events(&[n], &[]);
        assert_eq!(ex.events[0].timestamp, 1000);
    }

    #[test]
    fn test_entities_without_timestamps_are_dropped() {
        let nodes = vec![
            node("a").with_meta("timestamp", 1000_i64),
            node("b"), // no timestamp at all
            node("c").with_meta("time", "garbage"),
        ];
        let ex = build_events(&nodes, &[]);
        assert_eq!(ex.events.len(), 1);
        assert_eq!(ex.dropped, 2);
    }

    #[test]
    fn test_output_sorted_ascending() {
        let nodes = vec![
            node("late").with_meta("timestamp", 5000_i64),
            node("early").with_meta("timestamp", 1000_i64),
            node("mid").with_meta("timestamp", 3000_i64),
        ];
        let ex = build_events(&nodes, &[]);
        let ts: Vec<i64> = ex.events.iter().map(|e| e.timestamp).collect();
        assert_eq!(ts, vec![1000, 3000, 5000]);
    }

    #[test]
    fn test_severity_fallback_chain() {
        let n = node("a")
            .with_meta("timestamp", 1000_i64)
            .with_meta("risk", "CRITICAL");
        let ex = build_events(&[n], &[]);
        assert_eq!(ex.events[0].severity, Severity::Critical);

        let n = node("b")
            .with_meta("timestamp", 1000_i64)
            .with_meta("severity", "whatever");
        let ex = build_events(&[n], &[]);
        assert_eq!(ex.events[0].severity, Severity::Medium);
    }

    #[test]
    fn test_edge_event_shape() {
        let e = GraphEdge::new("e1", "a", "b")
            .with_meta("observed_time", 4000_i64)
            .with_meta("tactic", "lateral-movement");
        let ex = build_events(&[], &[e]);
        let ev = &ex.events[0];
        assert_eq!(ev.id, "edge_e1");
        assert_eq!(ev.kind, EventKind::Edge);
        assert_eq!(ev.ref_id.as_deref(), Some("e1"));
        assert_eq!(ev.label, "a -> b");
        assert_eq!(ev.tactic.as_deref(), Some("lateral-movement"));
    }
}
