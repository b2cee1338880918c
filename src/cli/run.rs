//! Run command implementation.

use std::path::PathBuf;

use stampede::replay::save_signals;
use stampede::{MatchConfig, MatchResult, Scheduler, Team};

use super::{CliError, OutputFormat, Strategy, demo};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the match aborts or output fails.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    team_a: Strategy,
    team_b: Strategy,
    rounds: u32,
    budget: u32,
    format: OutputFormat,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let world = demo::demo_world()?;
    let config = MatchConfig {
        max_rounds: rounds,
        round_budget: budget,
    };

    if !quiet {
        println!("Running {team_a:?} (A) vs {team_b:?} (B) for up to {rounds} rounds...");
        println!();
    }

    let mut scheduler = Scheduler::new(world, config, demo::factory(team_a), demo::factory(team_b));
    let result = scheduler.run_match()?;

    if let Some(save_path) = save {
        save_signals(&save_path, scheduler.world().log())?;
        if !quiet {
            println!("Signal log saved to: {}", save_path.display());
            println!();
        }
    }

    match format {
        OutputFormat::Text => print!("{}", format_text(&result)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn format_text(result: &MatchResult) -> String {
    let winner = match result.winner {
        Some(Team::A) => "Team A",
        Some(Team::B) => "Team B",
        _ => "Draw",
    };
    format!(
        "Winner:  {winner}\n\
         Rounds:  {}\n\
         Milk:    A={} B={}\n\
         Power:   A={} B={}\n\
         Signals: {}\n",
        result.rounds,
        result.milk[0],
        result.milk[1],
        result.power_refunded[0],
        result.power_refunded[1],
        result.signals,
    )
}
