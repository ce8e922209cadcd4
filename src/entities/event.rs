//! Timeline event model.
//!
//! `TimelineEvent` is the unit everything downstream operates on: the
//! extractor produces them, the index sorts and ranges them, the player
//! scrubs across them. Immutable once built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity normalized from free-text source fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl Severity {
    /// All levels, low to critical (default allow-list order).
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Case-insensitive parse. Unrecognized input yields `None`;
    /// the extractor maps that to the `Medium` default.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of graph entity an event was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Node,
    Edge,
    Milestone,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Node => "node",
            EventKind::Edge => "edge",
            EventKind::Milestone => "milestone",
        }
    }
}

/// A single timestamped event on the timeline.
///
/// `timestamp` is epoch milliseconds and is the sole ordering key.
/// `ref_id` points back at the originating node/edge; milestones have none.
/// Classification tags (`tactic`, `technique`, `actor`) pass through
/// verbatim for host-side filtering; the engine does not interpret them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub timestamp: i64,
    pub kind: EventKind,
    pub ref_id: Option<String>,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tactic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl TimelineEvent {
    /// Bare event with defaults for the optional classification fields.
    pub fn new(id: impl Into<String>, timestamp: i64, kind: EventKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            kind,
            ref_id: None,
            label: label.into(),
            description: String::new(),
            severity: Severity::default(),
            tactic: None,
            technique: None,
            actor: None,
        }
    }
}
