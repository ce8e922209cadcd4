//! Headless timeline runner: load a graph JSON, print stats, play through.

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use log::info;

use timewalk::cli::Args;
use timewalk::core::config::ConfigPatch;
use timewalk::core::player::Player;
use timewalk::entities::GraphSnapshot;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level())
        .init();

    let raw = std::fs::read_to_string(&args.graph)
        .with_context(|| format!("reading {}", args.graph.display()))?;
    let snapshot: GraphSnapshot =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", args.graph.display()))?;
    info!(
        "Loaded graph: {} nodes, {} edges",
        snapshot.nodes.len(),
        snapshot.edges.len()
    );

    let mut player = Player::new();
    player.initialize(&snapshot.nodes, &snapshot.edges);

    print_stats(&player);
    if args.stats_only {
        return Ok(());
    }

    let Some(range) = player.get_timeline_range() else {
        println!("Timeline is empty (no entity carried a valid timestamp); nothing to play.");
        return Ok(());
    };

    player.set_config(ConfigPatch {
        loop_enabled: Some(args.loop_playback),
        time_window_secs: Some(args.window_secs),
        severity_filter: args.severity_filter(),
        ..Default::default()
    });
    player.set_play_speed(args.speed);

    // Stream state snapshots out of the engine; the subscriber runs on the
    // ticker thread, so hand them to the main thread over a channel.
    let (tx, rx) = unbounded();
    let _sub = player.on_state_change(move |state| {
        let _ = tx.send(state.clone());
    });

    println!(
        "Playing {} .. {} ({:.1}s span) at {}x",
        range.start,
        range.end,
        range.duration as f64 / 1000.0,
        player.get_config().play_speed
    );
    player.play();

    for state in rx.iter() {
        println!(
            "t={:<14.1} progress={:6.2}% index={:<4} active={}",
            state.current_time,
            state.progress,
            state.current_index,
            state.active_events.len()
        );
        if !state.is_playing {
            break;
        }
    }

    println!("Done.");
    Ok(())
}

fn print_stats(player: &Player) {
    let stats = player.get_timeline_stats();
    println!("Timeline: {} events ({} nodes, {} edges, {} milestones)",
        stats.total_events, stats.node_events, stats.edge_events, stats.milestones);
    if stats.dropped_entities > 0 {
        println!("  {} entities dropped (no valid timestamp)", stats.dropped_entities);
    }
    println!("  span: {:.1}s, mean gap: {:.0}ms",
        stats.duration_ms as f64 / 1000.0, stats.mean_gap_ms);
    for (sev, count) in &stats.by_severity {
        if *count > 0 {
            println!("  severity {}: {}", sev, count);
        }
    }
    for (tactic, count) in &stats.by_tactic {
        println!("  tactic {}: {}", tactic, count);
    }
}
