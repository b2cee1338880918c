//! Match replay: rebuild any point of a match by folding its signal
//! log over the starting world, and persist logs as JSON lines.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::game::{Signal, World};

/// Failure while persisting or loading a signal log.
#[derive(Debug)]
pub enum ReplayError {
    /// The underlying file operation failed.
    Io(std::io::Error),
    /// A signal would not serialize.
    Encode(serde_json::Error),
    /// A line of the log file did not parse as a signal.
    Malformed {
        /// One-based line number in the log file.
        line: usize,
        /// Parser message.
        reason: String,
    },
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "replay file i/o failed: {e}"),
            Self::Encode(e) => write!(f, "signal did not serialize: {e}"),
            Self::Malformed { line, reason } => {
                write!(f, "malformed signal on line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Encode(e) => Some(e),
            Self::Malformed { .. } => None,
        }
    }
}

impl From<std::io::Error> for ReplayError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Fold a signal log over a starting world. Applied to the world a
/// match started from, this reproduces the final state bit for bit,
/// including the log itself.
#[must_use]
pub fn replay(initial: &World, signals: &[Signal]) -> World {
    let mut world = initial.clone();
    for signal in signals {
        world.commit(signal.clone());
    }
    world
}

/// Write a signal log as one JSON object per line.
///
/// # Errors
///
/// [`ReplayError::Io`] or [`ReplayError::Encode`] on failure.
pub fn save_signals(path: &Path, signals: &[Signal]) -> Result<(), ReplayError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for signal in signals {
        serde_json::to_writer(&mut writer, signal).map_err(ReplayError::Encode)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a signal log written by [`save_signals`]. Blank lines are
/// skipped.
///
/// # Errors
///
/// [`ReplayError::Io`] on file failure, [`ReplayError::Malformed`]
/// with the offending line number on parse failure.
pub fn load_signals(path: &Path) -> Result<Vec<Signal>, ReplayError> {
    let reader = BufReader::new(File::open(path)?);
    let mut signals = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let signal = serde_json::from_str(&line).map_err(|e| ReplayError::Malformed {
            line: index + 1,
            reason: e.to_string(),
        })?;
        signals.push(signal);
    }
    Ok(signals)
}
