//! Replay command implementation.

use std::path::Path;

use serde::Serialize;
use stampede::replay::{load_signals, replay};
use stampede::{RobotType, Team, World};

use super::{CliError, OutputFormat, demo};

/// Final state summary of a replayed match.
#[derive(Debug, Serialize)]
struct ReplaySummary {
    rounds: u32,
    signals: usize,
    robots: [usize; 2],
    hq_alive: [bool; 2],
    milk: [u64; 2],
    resigned: Option<Team>,
}

impl ReplaySummary {
    fn from_world(world: &World, signals: usize) -> Self {
        let count = |team: Team| world.robots().filter(|r| r.team == team).count();
        let hq = |team: Team| {
            world
                .robots()
                .any(|r| r.team == team && r.robot_type == RobotType::Hq)
        };
        Self {
            rounds: world.round(),
            signals,
            robots: [count(Team::A), count(Team::B)],
            hq_alive: [hq(Team::A), hq(Team::B)],
            milk: [world.milk(Team::A), world.milk(Team::B)],
            resigned: world.resigned(),
        }
    }
}

/// Execute the replay command: fold a saved signal log over the demo
/// world and report the final state.
///
/// # Errors
///
/// Returns an error if the log fails to load or parse.
pub(crate) fn execute(recording: &Path, format: OutputFormat) -> Result<(), CliError> {
    let signals = load_signals(recording)?;
    let initial = demo::demo_world()?;
    let world = replay(&initial, &signals);
    let summary = ReplaySummary::from_world(&world, signals.len());

    match format {
        OutputFormat::Text => {
            println!("Replayed {} signals over {} rounds", summary.signals, summary.rounds);
            println!(
                "Robots:  A={} (HQ {}) B={} (HQ {})",
                summary.robots[0],
                if summary.hq_alive[0] { "alive" } else { "down" },
                summary.robots[1],
                if summary.hq_alive[1] { "alive" } else { "down" },
            );
            println!("Milk:    A={} B={}", summary.milk[0], summary.milk[1]);
            if let Some(team) = summary.resigned {
                println!("Resigned: {team:?}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}
