//! Core engine modules - extraction, index, playback, filtering, bus.
//!
//! These modules form the playback engine, independent of any host UI.

pub mod config;
pub mod event_bus;
pub mod extract;
pub mod index;
pub mod player;
pub mod scheduler;
pub mod window;

// Re-exports for convenience
pub use config::{ConfigPatch, PlaybackConfig, SPEED_PRESETS};
pub use event_bus::{StateBus, Subscription};
pub use extract::{Extraction, build_events};
pub use index::{TimelineRange, TimelineStats, compute_range, compute_stats};
pub use player::{PlaybackDirection, PlaybackState, Player};
pub use scheduler::{IntervalTicker, ManualHandle, ManualTicker, Ticker};
pub use window::active_events;
