//! Stampede CLI - run scripted demo matches and replay recorded ones.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Stampede - a deterministic robot battle engine
#[derive(Parser, Debug)]
#[command(name = "stampede")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a match between two scripted demo teams
    Run {
        /// Strategy for team A: rush, farm, or idle
        #[arg(long, default_value = "rush")]
        team_a: cli::Strategy,

        /// Strategy for team B: rush, farm, or idle
        #[arg(long, default_value = "farm")]
        team_b: cli::Strategy,

        /// Maximum rounds before the milk tiebreak (default: 2000)
        #[arg(short, long, default_value = "2000")]
        rounds: u32,

        /// Bytecode budget per robot per round (default: 10000)
        #[arg(short, long, default_value = "10000")]
        budget: u32,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save the signal log to a file
        #[arg(long)]
        save: Option<std::path::PathBuf>,

        /// Suppress everything but the result
        #[arg(short, long)]
        quiet: bool,
    },

    /// Rebuild a match from a saved signal log
    Replay {
        /// Signal log file (.jsonl)
        #[arg(required = true)]
        recording: std::path::PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            team_a,
            team_b,
            rounds,
            budget,
            format,
            save,
            quiet,
        } => cli::run::execute(team_a, team_b, rounds, budget, format, save, quiet),

        Commands::Replay { recording, format } => cli::replay::execute(&recording, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
