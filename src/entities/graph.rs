//! Input graph snapshot: nodes and edges with open metadata bags.
//!
//! The engine never interprets the graph beyond mining timestamp-like and
//! severity-like fields out of `meta` (see `core::extract`). Field order is
//! preserved (IndexMap) so JSON round-trips keep their shape.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A graph node: stable id plus whatever metadata the host attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub meta: IndexMap<String, Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            meta: IndexMap::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builder-style metadata insertion (handy in tests and host code).
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// A directed relationship between two nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(flatten)]
    pub meta: IndexMap<String, Value>,
}

impl GraphEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
            meta: IndexMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// A full graph snapshot as supplied by the host (and by the CLI loader).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

/// An entity annotated with its active/inactive classification.
///
/// Classification only - how active/inactive entities look is the host's
/// decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classified<T> {
    #[serde(flatten)]
    pub entity: T,
    pub active: bool,
}

/// Output of `Player::apply_active_window`: the input graph, copied and
/// classified against the current active-event set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedGraph {
    pub nodes: Vec<Classified<GraphNode>>,
    pub edges: Vec<Classified<GraphEdge>>,
}
