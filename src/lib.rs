// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Stampede: a deterministic engine for turn-based robot battles.
//!
//! Robot programs fight over cow pastures on a grid map. The engine is
//! built for:
//! - Bit-exact deterministic execution and replay
//! - Bytecode metering for fair per-round resource limits
//! - A signal log as the single source of truth for every mutation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Match Scheduler              │
//! ├─────────────────────────────────────┤
//! │   Action Rules + Controller         │
//! ├─────────────────────────────────────┤
//! │   World State  ←  Signal Log        │
//! └─────────────────────────────────────┘
//! ```

pub mod error;
pub mod game;
pub mod replay;
pub mod schedule;

pub use error::{ActionError, ActionResult, EngineError};

// Re-export key game types at crate root for convenience
pub use game::{
    Construction, Controller, Direction, GameMap, MapLocation, MovementStyle, Placement, RobotId,
    RobotInfo, RobotRecord, RobotType, Signal, Team, TerrainTile, World,
};
pub use schedule::{MatchConfig, MatchResult, ProgramFactory, RobotProgram, Scheduler};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_sane() {
        let config = MatchConfig::default();
        assert!(config.max_rounds > 0);
        assert!(config.round_budget > 0);
    }
}
