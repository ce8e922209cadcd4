//! TIMEWALK - Timeline playback engine library
//!
//! Turns a timestamped node/edge graph into a chronologically ordered
//! event stream and drives a deterministic playback state machine over it:
//! scrub, play, pause, step, loop, variable speed, and an active-event
//! window query for host renderers.

// Core engine (extraction, index, player, bus, scheduler)
pub mod core;

// Data model (graph input, timeline events)
pub mod entities;

// CLI argument parsing (used by the binary target)
pub mod cli;

// Re-export commonly used types from core
pub use core::config::{ConfigPatch, PlaybackConfig};
pub use core::event_bus::{StateBus, Subscription};
pub use core::index::{TimelineRange, TimelineStats};
pub use core::player::{PlaybackDirection, PlaybackState, Player};
pub use core::scheduler::{IntervalTicker, ManualHandle, ManualTicker, Ticker};

// Re-export entities
pub use entities::{
    Classified, ClassifiedGraph, EventKind, GraphEdge, GraphNode, GraphSnapshot, Severity,
    TimelineEvent,
};
