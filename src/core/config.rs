//! Playback configuration: a flat bag of knobs, mutable at any time.
//!
//! Speed is only clamped by `Player::set_play_speed`; patching
//! `play_speed` through `ConfigPatch` is intentionally unclamped - callers
//! that go through the config path own the value they set. Known
//! asymmetry, kept on purpose.

use serde::{Deserialize, Serialize};

use crate::entities::Severity;

/// Speed multiplier bounds enforced by `set_play_speed`.
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 5.0;

/// Speed presets for stepwise speed control.
pub const SPEED_PRESETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 1.5, 2.0, 3.0, 5.0];

/// Playback/display knobs consulted by the engine on every recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Master switch: when false, the active set is forced empty,
    /// telling the host "playback filtering not in effect".
    pub enabled: bool,
    pub play_speed: f64,
    pub loop_enabled: bool,
    /// Active-window half-width around the playhead, in seconds.
    pub time_window_secs: f64,
    /// Severity allow-list consulted by the active-window filter.
    pub severity_filter: Vec<Severity>,
    /// Visual toggles passed through to the host untouched.
    pub highlight_active: bool,
    pub fade_inactive: bool,
    pub animation_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            play_speed: 1.0,
            loop_enabled: false,
            time_window_secs: 5.0,
            severity_filter: Severity::ALL.to_vec(),
            highlight_active: true,
            fade_inactive: true,
            animation_ms: 500,
        }
    }
}

impl PlaybackConfig {
    pub fn allows(&self, severity: Severity) -> bool {
        self.severity_filter.contains(&severity)
    }

    /// Merge a partial patch into this config. Only present fields change.
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(v) = patch.enabled {
            self.enabled = v;
        }
        if let Some(v) = patch.play_speed {
            self.play_speed = v;
        }
        if let Some(v) = patch.loop_enabled {
            self.loop_enabled = v;
        }
        if let Some(v) = patch.time_window_secs {
            self.time_window_secs = v;
        }
        if let Some(v) = patch.severity_filter {
            self.severity_filter = v;
        }
        if let Some(v) = patch.highlight_active {
            self.highlight_active = v;
        }
        if let Some(v) = patch.fade_inactive {
            self.fade_inactive = v;
        }
        if let Some(v) = patch.animation_ms {
            self.animation_ms = v;
        }
    }
}

/// Partial update for `PlaybackConfig`; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    pub enabled: Option<bool>,
    pub play_speed: Option<f64>,
    pub loop_enabled: Option<bool>,
    pub time_window_secs: Option<f64>,
    pub severity_filter: Option<Vec<Severity>>,
    pub highlight_active: Option<bool>,
    pub fade_inactive: Option<bool>,
    pub animation_ms: Option<u64>,
}

impl ConfigPatch {
    pub fn loop_enabled(v: bool) -> Self {
        Self {
            loop_enabled: Some(v),
            ..Default::default()
        }
    }

    pub fn time_window_secs(v: f64) -> Self {
        Self {
            time_window_secs: Some(v),
            ..Default::default()
        }
    }

    pub fn severity_filter(v: Vec<Severity>) -> Self {
        Self {
            severity_filter: Some(v),
            ..Default::default()
        }
    }

    pub fn enabled(v: bool) -> Self {
        Self {
            enabled: Some(v),
            ..Default::default()
        }
    }
}
