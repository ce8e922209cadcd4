//! Playback state machine: virtual clock over the event timeline.
//!
//! **Why**: playback has the only real temporal-state semantics in the
//! system - a bidirectional virtual clock advanced by a timer, boundary
//! and loop handling, and a notification contract that must stay
//! consistent under mid-playback config changes.
//!
//! **Used by**: host render layers (via `on_state_change` +
//! `apply_active_window`), the CLI runner.
//!
//! # Timing Model
//!
//! Virtual time, not wall time. Each ticker tick (100 ms real) advances
//! `current_time` by `range.duration * (tick / BASE_PLAYTHROUGH) * speed`,
//! so a full playthrough takes the same number of real seconds at speed
//! 1.0 regardless of how many days the timeline spans, and scales
//! inversely with speed.
//!
//! # Boundaries
//!
//! Forward at `end`: loop wraps to `start`, otherwise playback pauses in
//! place (the clock stays at `end`; this is `pause`, not `stop`).
//! Backward at `start` is symmetric.
//!
//! # Failure Semantics
//!
//! Every mutating operation on an empty timeline is a silent no-op, not an
//! error - driving the engine before data loads is the most common caller
//! mistake and must be harmless.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::{ConfigPatch, MAX_SPEED, MIN_SPEED, PlaybackConfig, SPEED_PRESETS};
use crate::core::event_bus::{StateBus, Subscription};
use crate::core::extract;
use crate::core::index::{self, TimelineRange, TimelineStats};
use crate::core::scheduler::{IntervalTicker, Ticker};
use crate::core::window;
use crate::entities::{
    Classified, ClassifiedGraph, EventKind, GraphEdge, GraphNode, TimelineEvent,
};

/// Real-world interval between ticker callbacks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Real seconds a full playthrough takes at speed 1.0.
pub const BASE_PLAYTHROUGH_SECS: f64 = 30.0;

/// Direction of the virtual clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackDirection {
    #[default]
    Forward,
    Backward,
}

/// Snapshot of the playback state, emitted by value to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Virtual clock, epoch ms, clamped to `[range.start, range.end]`.
    pub current_time: f64,
    /// Index of the first event with `timestamp > current_time`
    /// (`events.len()` at or past the end).
    pub current_index: usize,
    /// 0..100; 0 when the range has zero duration.
    pub progress: f64,
    pub direction: PlaybackDirection,
    /// Recomputed on every mutation, never cached.
    pub active_events: Vec<TimelineEvent>,
}

/// Engine internals shared between the caller and the ticker thread.
struct Inner {
    events: Vec<TimelineEvent>,
    range: Option<TimelineRange>,
    dropped: usize,
    config: PlaybackConfig,
    is_playing: bool,
    current_time: f64,
    direction: PlaybackDirection,
    bus: StateBus,
}

impl Inner {
    fn new() -> Self {
        Self {
            events: Vec::new(),
            range: None,
            dropped: 0,
            config: PlaybackConfig::default(),
            is_playing: false,
            current_time: 0.0,
            direction: PlaybackDirection::Forward,
            bus: StateBus::new(),
        }
    }

    fn current_index(&self) -> usize {
        self.events
            .partition_point(|e| (e.timestamp as f64) <= self.current_time)
    }

    fn progress(&self) -> f64 {
        match self.range {
            Some(r) if r.duration > 0 => {
                (self.current_time - r.start as f64) / r.duration as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    fn snapshot(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.is_playing,
            current_time: self.current_time,
            current_index: self.current_index(),
            progress: self.progress(),
            direction: self.direction,
            active_events: window::active_events(&self.events, self.current_time, &self.config),
        }
    }

    fn clamp_time(&mut self) {
        match self.range {
            Some(r) => {
                self.current_time = self.current_time.clamp(r.start as f64, r.end as f64);
            }
            None => self.current_time = 0.0,
        }
    }

    /// Replace the timeline wholesale. Config and subscribers survive.
    fn reset(&mut self, events: Vec<TimelineEvent>, dropped: usize) {
        self.events = events;
        self.dropped = dropped;
        self.range = index::compute_range(&self.events);
        self.is_playing = false;
        self.direction = PlaybackDirection::Forward;
        self.current_time = self.range.map(|r| r.start as f64).unwrap_or(0.0);
    }

    /// One timer tick. Returns `(keep_ticking, clock_moved)`.
    fn advance_tick(&mut self) -> (bool, bool) {
        let Some(range) = self.range else {
            self.is_playing = false;
            return (false, false);
        };
        if !self.is_playing {
            return (false, false);
        }

        let step = range.duration as f64 * (TICK_INTERVAL.as_secs_f64() / BASE_PLAYTHROUGH_SECS)
            * self.config.play_speed;
        let (start, end) = (range.start as f64, range.end as f64);

        match self.direction {
            PlaybackDirection::Forward => {
                let next = self.current_time + step;
                if next >= end {
                    if self.config.loop_enabled {
                        trace!("Playback loop: wrapping to range start");
                        self.current_time = start;
                        (true, true)
                    } else {
                        trace!("Reached range end, pausing");
                        self.current_time = end;
                        self.is_playing = false;
                        (false, true)
                    }
                } else {
                    self.current_time = next;
                    (true, true)
                }
            }
            PlaybackDirection::Backward => {
                let next = self.current_time - step;
                if next <= start {
                    if self.config.loop_enabled {
                        trace!("Playback loop: wrapping to range end");
                        self.current_time = end;
                        (true, true)
                    } else {
                        trace!("Reached range start, pausing");
                        self.current_time = start;
                        self.is_playing = false;
                        (false, true)
                    }
                } else {
                    self.current_time = next;
                    (true, true)
                }
            }
        }
    }
}

/// The timeline playback engine.
///
/// Owned, constructed instance - no ambient state, so multiple timelines
/// can coexist. All operations are synchronous; the injected `Ticker`
/// (thread-backed by default, `ManualTicker` for deterministic hosts and
/// tests) is the only source of asynchrony.
///
/// Subscriber callbacks are invoked after the internal lock is released,
/// so a callback may safely call back into the engine.
pub struct Player {
    inner: Arc<Mutex<Inner>>,
    ticker: Box<dyn Ticker>,
}

impl Player {
    /// Engine with the default thread-backed ticker.
    pub fn new() -> Self {
        Self::with_ticker(Box::new(IntervalTicker::new()))
    }

    /// Engine with an injected ticker (fake clocks, host frame loops).
    pub fn with_ticker(ticker: Box<dyn Ticker>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            ticker,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Broadcast the current state to all subscribers. The lock is dropped
    /// before fan-out.
    fn notify(&self) {
        let (snapshot, bus) = {
            let inner = self.lock();
            (inner.snapshot(), inner.bus.clone())
        };
        bus.notify(&snapshot);
    }

    fn start_ticker(&mut self) {
        let inner = Arc::clone(&self.inner);
        self.ticker.start(
            TICK_INTERVAL,
            Box::new(move || {
                let (keep, moved, snapshot, bus) = {
                    let mut g = inner.lock().unwrap_or_else(|e| e.into_inner());
                    let (keep, moved) = g.advance_tick();
                    (keep, moved, g.snapshot(), g.bus.clone())
                };
                if moved {
                    bus.notify(&snapshot);
                }
                keep
            }),
        );
    }

    // === Lifecycle ===

    /// Supply a new graph snapshot. Full reset: events and range are
    /// rebuilt, the clock seeds at `start`, playback stops. Config and
    /// subscribers persist.
    pub fn initialize(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) {
        self.ticker.cancel();
        let extraction = extract::build_events(nodes, edges);
        {
            let mut g = self.lock();
            g.reset(extraction.events, extraction.dropped);
            info!(
                "Timeline initialized: {} events, range {:?}",
                g.events.len(),
                g.range
            );
        }
        self.notify();
    }

    /// Drop all events. Config and subscribers persist.
    pub fn clear(&mut self) {
        self.ticker.cancel();
        {
            let mut g = self.lock();
            g.reset(Vec::new(), 0);
        }
        self.notify();
    }

    // === Transport ===

    /// Start forward playback. No-op when already playing or no timeline.
    pub fn play(&mut self) {
        self.play_direction(PlaybackDirection::Forward)
    }

    /// Start backward playback. Same no-op rules as `play`.
    pub fn play_backward(&mut self) {
        self.play_direction(PlaybackDirection::Backward)
    }

    fn play_direction(&mut self, direction: PlaybackDirection) {
        {
            let mut g = self.lock();
            if g.range.is_none() || g.is_playing {
                return;
            }
            g.is_playing = true;
            g.direction = direction;
            debug!("Playback started ({:?})", direction);
        }
        self.start_ticker();
        self.notify();
    }

    /// Halt the clock in place. No-op when not playing.
    pub fn pause(&mut self) {
        {
            let mut g = self.lock();
            if !g.is_playing {
                return;
            }
            g.is_playing = false;
            debug!("Playback paused at {}", g.current_time);
        }
        self.ticker.cancel();
        self.notify();
    }

    /// Stop and rewind to `range.start`, whatever the prior direction.
    pub fn stop(&mut self) {
        {
            let mut g = self.lock();
            let Some(range) = g.range else { return };
            g.is_playing = false;
            g.current_time = range.start as f64;
        }
        self.ticker.cancel();
        self.notify();
    }

    /// Jump to the next event's timestamp. Boundary no-op; does not touch
    /// the playing flag.
    pub fn step_forward(&mut self) {
        {
            let mut g = self.lock();
            if g.range.is_none() {
                return;
            }
            let idx = g.current_index();
            if idx >= g.events.len() {
                return;
            }
            g.current_time = g.events[idx].timestamp as f64;
        }
        self.notify();
    }

    /// Jump to the latest event strictly before the clock. Boundary no-op.
    pub fn step_backward(&mut self) {
        {
            let mut g = self.lock();
            if g.range.is_none() {
                return;
            }
            let before = g
                .events
                .partition_point(|e| (e.timestamp as f64) < g.current_time);
            if before == 0 {
                return;
            }
            g.current_time = g.events[before - 1].timestamp as f64;
        }
        self.notify();
    }

    // === Scrub ===

    /// Move the clock to `t` (clamped into the range). Always notifies,
    /// even when the clamped value equals the previous one - scrub-drag
    /// UIs rely on one notification per invocation.
    pub fn set_current_time(&mut self, t: f64) {
        {
            let mut g = self.lock();
            let Some(range) = g.range else { return };
            g.current_time = t.clamp(range.start as f64, range.end as f64);
        }
        self.notify();
    }

    /// Scrub by percentage: `p` in 0..100 maps onto the range.
    pub fn set_progress(&mut self, p: f64) {
        let target = {
            let g = self.lock();
            let Some(range) = g.range else { return };
            range.start as f64 + range.duration as f64 * (p.clamp(0.0, 100.0) / 100.0)
        };
        self.set_current_time(target);
    }

    /// Jump to a known event by id; unknown ids are a silent no-op.
    pub fn jump_to_event(&mut self, id: &str) {
        let target = {
            let g = self.lock();
            g.events.iter().find(|e| e.id == id).map(|e| e.timestamp as f64)
        };
        if let Some(t) = target {
            self.set_current_time(t);
        }
    }

    // === Speed ===

    /// Set the speed multiplier, clamped to `[0.1, 5.0]`. A running ticker
    /// is restarted so the change takes effect immediately.
    ///
    /// This is the only clamped speed path; `set_config` patches speed
    /// unclamped (kept asymmetry, see `core::config`).
    pub fn set_play_speed(&mut self, speed: f64) {
        let playing = {
            let mut g = self.lock();
            g.config.play_speed = speed.clamp(MIN_SPEED, MAX_SPEED);
            g.is_playing
        };
        if playing {
            self.start_ticker();
        }
        self.notify();
    }

    /// Step to the next speed preset above the current one.
    pub fn increase_speed(&mut self) {
        let current = self.lock().config.play_speed;
        if let Some(&next) = SPEED_PRESETS.iter().find(|&&p| p > current) {
            self.set_play_speed(next);
        }
    }

    /// Step to the previous speed preset below the current one.
    pub fn decrease_speed(&mut self) {
        let current = self.lock().config.play_speed;
        if let Some(&prev) = SPEED_PRESETS.iter().rev().find(|&&p| p < current) {
            self.set_play_speed(prev);
        }
    }

    // === Configuration ===

    /// Merge a config patch. Active events are recomputed and subscribers
    /// notified on every patch, including while paused.
    pub fn set_config(&mut self, patch: ConfigPatch) {
        {
            let mut g = self.lock();
            g.config.apply(patch);
        }
        self.notify();
    }

    pub fn get_config(&self) -> PlaybackConfig {
        self.lock().config.clone()
    }

    // === Timeline editing ===

    /// Insert a milestone marker. The event list is re-sorted (never
    /// assumed append-ordered) and the range recomputed. Returns the
    /// generated event id.
    pub fn add_milestone(
        &mut self,
        timestamp: i64,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> String {
        let id = format!("milestone_{}", Uuid::new_v4());
        {
            let mut g = self.lock();
            let mut ev = TimelineEvent::new(id.clone(), timestamp, EventKind::Milestone, label);
            ev.description = description.into();
            g.events.push(ev);
            g.events.sort_by_key(|e| e.timestamp);
            g.range = index::compute_range(&g.events);
            g.clamp_time();
        }
        self.notify();
        id
    }

    /// Remove an event by id. Unknown ids are a silent no-op. Removing the
    /// last event disables the timeline and stops any running playback.
    pub fn remove_event(&mut self, id: &str) {
        let emptied = {
            let mut g = self.lock();
            let before = g.events.len();
            g.events.retain(|e| e.id != id);
            if g.events.len() == before {
                return;
            }
            g.range = index::compute_range(&g.events);
            if g.range.is_none() {
                g.is_playing = false;
            }
            g.clamp_time();
            g.range.is_none()
        };
        if emptied {
            self.ticker.cancel();
        }
        self.notify();
    }

    // === Queries ===

    pub fn get_playback_state(&self) -> PlaybackState {
        self.lock().snapshot()
    }

    pub fn get_timeline_range(&self) -> Option<TimelineRange> {
        self.lock().range
    }

    pub fn get_events(&self) -> Vec<TimelineEvent> {
        self.lock().events.clone()
    }

    pub fn get_timeline_stats(&self) -> TimelineStats {
        let g = self.lock();
        index::compute_stats(&g.events, g.dropped)
    }

    /// Subscribe to state-change notifications. Subscribers survive
    /// `initialize`/`clear`; drop delivery with `Subscription::unsubscribe`.
    pub fn on_state_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&PlaybackState) + Send + Sync + 'static,
    {
        self.lock().bus.subscribe(callback)
    }

    /// Classify the host's graph against the current active-event set.
    /// Inputs are copied, never mutated; the classification is
    /// active/inactive only - styling stays with the host.
    pub fn apply_active_window(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
    ) -> ClassifiedGraph {
        let (active_nodes, active_edges) = {
            let g = self.lock();
            let active = window::active_events(&g.events, g.current_time, &g.config);
            let mut node_ids: HashSet<String> = HashSet::new();
            let mut edge_ids: HashSet<String> = HashSet::new();
            for ev in &active {
                if let Some(ref_id) = &ev.ref_id {
                    match ev.kind {
                        EventKind::Node => {
                            node_ids.insert(ref_id.clone());
                        }
                        EventKind::Edge => {
                            edge_ids.insert(ref_id.clone());
                        }
                        EventKind::Milestone => {}
                    }
                }
            }
            (node_ids, edge_ids)
        };

        ClassifiedGraph {
            nodes: nodes
                .iter()
                .map(|n| Classified {
                    active: active_nodes.contains(&n.id),
                    entity: n.clone(),
                })
                .collect(),
            edges: edges
                .iter()
                .map(|e| Classified {
                    active: active_edges.contains(&e.id),
                    entity: e.clone(),
                })
                .collect(),
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.ticker.cancel();
    }
}
