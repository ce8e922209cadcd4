//! Entities module - data model shared by the engine and its hosts.
//!
//! Graph types describe what the host supplies; event types describe what
//! the engine derives. Rendering concerns live entirely outside this crate.

pub mod event;
pub mod graph;

pub use event::{EventKind, Severity, TimelineEvent};
pub use graph::{Classified, ClassifiedGraph, GraphEdge, GraphNode, GraphSnapshot};
