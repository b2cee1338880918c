//! CLI command implementations for Stampede.

pub(crate) mod replay;
pub(crate) mod run;

mod demo;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;

/// Output format for the `run` and `replay` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Scripted strategy a demo team plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Strategy {
    /// March soldiers at the enemy HQ and shoot it down.
    Rush,
    /// Build pastures on cow tiles and milk the round limit.
    Farm,
    /// Yield every slot.
    Idle,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<stampede::EngineError> for CliError {
    fn from(e: stampede::EngineError) -> Self {
        Self::new(format!("engine failure: {e}"))
    }
}

impl From<stampede::replay::ReplayError> for CliError {
    fn from(e: stampede::replay::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}
