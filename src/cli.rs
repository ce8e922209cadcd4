use clap::Parser;
use std::path::PathBuf;

use crate::entities::Severity;

/// Timeline playback engine - headless runner and graph inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Graph snapshot to load (JSON: { "nodes": [...], "edges": [...] })
    #[arg(value_name = "GRAPH")]
    pub graph: PathBuf,

    /// Print timeline stats and exit (no playback)
    #[arg(short = 's', long = "stats")]
    pub stats_only: bool,

    /// Playback speed multiplier (clamped to 0.1..5.0)
    #[arg(long = "speed", value_name = "X", default_value = "1.0")]
    pub speed: f64,

    /// Active-window width in seconds
    #[arg(short = 'w', long = "window", value_name = "SECS", default_value = "5.0")]
    pub window_secs: f64,

    /// Enable looping (runs until Ctrl-C)
    #[arg(short = 'o', long = "loop")]
    pub loop_playback: bool,

    /// Only include these severities in the active set
    #[arg(long = "severity", value_name = "LEVEL")]
    pub severities: Vec<String>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

impl Args {
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// Parse `--severity` values; unknown levels are reported, not fatal.
    pub fn severity_filter(&self) -> Option<Vec<Severity>> {
        if self.severities.is_empty() {
            return None;
        }
        let mut filter = Vec::new();
        for s in &self.severities {
            match Severity::parse(s) {
                Some(sev) => filter.push(sev),
                None => log::warn!("Unknown severity '{}' ignored", s),
            }
        }
        Some(filter)
    }
}
