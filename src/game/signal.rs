//! Signals: the append-only record of accepted state transitions.
//!
//! Every observable change to the world is one signal. The resolver
//! appends a signal only after validation succeeds, and applying the
//! log in order to the initial world reproduces the match bit for bit.
//! A signal is never mutated or retracted once appended.

use serde::{Deserialize, Serialize};

use crate::game::{MapLocation, RobotId, RobotType, Team};

/// How a robot covered a movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementStyle {
    /// Normal movement.
    Run,
    /// Slower, quieter movement.
    Sneak,
}

/// One accepted state transition.
///
/// Each variant carries the acting robot plus the minimal payload
/// needed to reproduce the transition without consulting any other
/// state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// A robot moved one step.
    Movement {
        /// The robot that moved.
        robot: RobotId,
        /// Its new location.
        new_loc: MapLocation,
        /// Whether it moved toward its previous facing rather than
        /// doubling back.
        forward: bool,
        /// Run or sneak.
        style: MovementStyle,
        /// Cooldown charged for the step.
        delay: u32,
    },
    /// A robot attacked a location.
    Attack {
        /// The attacker.
        robot: RobotId,
        /// The targeted location.
        target: MapLocation,
        /// Damage applied to any occupant. Zero for noise pulses.
        damage: u32,
    },
    /// A robot buffered a broadcast write.
    Broadcast {
        /// The broadcasting robot.
        robot: RobotId,
        /// Its team's channel set.
        team: Team,
        /// Channel index.
        channel: usize,
        /// Value committed at the round boundary.
        data: i32,
    },
    /// A robot began converting into a structure.
    ConstructBegin {
        /// The constructing robot.
        robot: RobotId,
        /// Structure type being built.
        target: RobotType,
        /// Total active rounds the construction takes.
        rounds: u32,
    },
    /// A construction countdown reached zero and the robot converted.
    ConstructDone {
        /// The converted robot.
        robot: RobotId,
        /// The type it became.
        target: RobotType,
    },
    /// An HQ queued a spawn for the next round boundary.
    SpawnQueued {
        /// The spawning HQ.
        parent: RobotId,
        /// Id reserved for the new robot.
        id: RobotId,
        /// Type of the new robot.
        robot_type: RobotType,
        /// Owning team.
        team: Team,
        /// Tile the robot will occupy.
        loc: MapLocation,
    },
    /// A queued spawn materialized at the round boundary.
    RobotSpawned {
        /// The id reserved by the matching [`Signal::SpawnQueued`].
        id: RobotId,
    },
    /// A robot died and its record was removed.
    Death {
        /// The dead robot.
        robot: RobotId,
    },
    /// A robot destroyed itself, damaging its surroundings.
    SelfDestruct {
        /// The destructing robot.
        robot: RobotId,
        /// Where it stood.
        loc: MapLocation,
        /// Area damage applied to each robot in blast range.
        damage: u32,
    },
    /// A team conceded the match.
    Resign {
        /// The conceding team.
        team: Team,
    },
    /// A robot set a diagnostic indicator string.
    Indicator {
        /// The robot.
        robot: RobotId,
        /// Indicator slot.
        index: usize,
        /// New contents.
        value: String,
    },
    /// A robot injected an observation into the match record.
    MatchObservation {
        /// The observing robot.
        robot: RobotId,
        /// Free-form observation text.
        observation: String,
    },
    /// The round boundary: deferred effects commit and the round
    /// counter advances.
    RoundEnd {
        /// The round that just finished.
        round: u32,
    },
}

impl Signal {
    /// The robot this signal is about, if it concerns a single robot.
    #[must_use]
    pub const fn robot(&self) -> Option<RobotId> {
        match self {
            Signal::Movement { robot, .. }
            | Signal::Attack { robot, .. }
            | Signal::Broadcast { robot, .. }
            | Signal::ConstructBegin { robot, .. }
            | Signal::ConstructDone { robot, .. }
            | Signal::Death { robot }
            | Signal::SelfDestruct { robot, .. }
            | Signal::Indicator { robot, .. }
            | Signal::MatchObservation { robot, .. } => Some(*robot),
            Signal::SpawnQueued { parent, .. } => Some(*parent),
            Signal::RobotSpawned { id } => Some(*id),
            Signal::Resign { .. } | Signal::RoundEnd { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_robot_attribution() {
        let s = Signal::Movement {
            robot: 7,
            new_loc: MapLocation::new(3, 2),
            forward: true,
            style: MovementStyle::Run,
            delay: 2,
        };
        assert_eq!(s.robot(), Some(7));
        assert_eq!(Signal::RoundEnd { round: 4 }.robot(), None);
        assert_eq!(Signal::Resign { team: Team::A }.robot(), None);
    }

    #[test]
    fn test_signal_json_round_trip() {
        let signals = vec![
            Signal::Attack {
                robot: 3,
                target: MapLocation::new(5, 5),
                damage: 10,
            },
            Signal::Broadcast {
                robot: 3,
                team: Team::B,
                channel: 4,
                data: 17,
            },
            Signal::SpawnQueued {
                parent: 1,
                id: 9,
                robot_type: RobotType::Soldier,
                team: Team::A,
                loc: MapLocation::new(1, 2),
            },
        ];
        for signal in signals {
            let json = serde_json::to_string(&signal).unwrap();
            let back: Signal = serde_json::from_str(&json).unwrap();
            assert_eq!(back, signal);
        }
    }
}
