//! Error types for the battle engine.
//!
//! Two tiers. [`ActionError`] is ordinary control flow: a robot program
//! asked for something the rules forbid, the call is rejected, and its
//! turn continues. [`EngineError`] is fatal: the match state or its
//! collaborator-provided inputs are inconsistent and the match aborts.

use std::fmt;

/// A typed, recoverable action failure.
///
/// Returned by the action resolver and the controller facade. A failed
/// call emits no signal and leaves the world untouched; programs are
/// expected to probe with the `can_*` pre-checks and treat these as
/// normal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    /// The robot's action cooldown has not reached zero.
    NotActive,
    /// Destination is occupied, impassable, or not adjacent.
    CannotMoveThere,
    /// The requested location is outside the map.
    OffMap,
    /// The target is beyond this robot's sensor radius.
    OutOfSensorRange,
    /// The target is beyond this robot's attack radius.
    OutOfAttackRange,
    /// No robot occupies the queried location.
    NoRobotThere,
    /// Broadcast channel index exceeds the channel count.
    ChannelOutOfRange,
    /// The acting robot's type may not perform this action.
    RoleNotPermitted,
    /// The robot already has a construction in progress.
    AlreadyConstructing,
    /// Construction target is not a structure type.
    NotAStructure,
    /// The per-round execution budget is spent; the slot is over.
    BudgetExhausted,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::NotActive => write!(f, "robot is not active"),
            ActionError::CannotMoveThere => write!(f, "cannot move there"),
            ActionError::OffMap => write!(f, "location is off the map"),
            ActionError::OutOfSensorRange => write!(f, "target is out of sensor range"),
            ActionError::OutOfAttackRange => write!(f, "target is out of attack range"),
            ActionError::NoRobotThere => write!(f, "no robot at that location"),
            ActionError::ChannelOutOfRange => write!(f, "broadcast channel out of range"),
            ActionError::RoleNotPermitted => write!(f, "robot type may not do that"),
            ActionError::AlreadyConstructing => write!(f, "construction already in progress"),
            ActionError::NotAStructure => write!(f, "target type is not a structure"),
            ActionError::BudgetExhausted => write!(f, "execution budget exhausted"),
        }
    }
}

impl std::error::Error for ActionError {}

/// Result type for resolver and controller calls.
pub type ActionResult<T> = Result<T, ActionError>;

/// A fatal engine-level failure that aborts the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Map data from the loading collaborator is inconsistent.
    InvalidMap {
        /// What was wrong with the map.
        reason: String,
    },
    /// Team-memory index outside the fixed-length array.
    TeamMemoryIndex {
        /// The offending index.
        index: usize,
        /// The fixed array length.
        len: usize,
    },
    /// World state violated a resolver invariant. Unreachable unless
    /// there is a bug in the engine itself.
    CorruptState {
        /// Description of the inconsistency.
        detail: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidMap { reason } => write!(f, "invalid map: {reason}"),
            EngineError::TeamMemoryIndex { index, len } => {
                write!(f, "team memory index {index} out of range (length {len})")
            }
            EngineError::CorruptState { detail } => {
                write!(f, "corrupt world state: {detail}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_display() {
        assert_eq!(
            ActionError::CannotMoveThere.to_string(),
            "cannot move there"
        );
        assert_eq!(
            ActionError::ChannelOutOfRange.to_string(),
            "broadcast channel out of range"
        );
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::TeamMemoryIndex { index: 9, len: 8 };
        let msg = err.to_string();
        assert!(msg.contains('9'));
        assert!(msg.contains('8'));
    }
}
