//! Structural consistency checks run at round boundaries.
//!
//! A violation here means the engine itself is broken, not that a
//! robot program misbehaved, so the scheduler promotes any finding to
//! a fatal [`CorruptState`](crate::error::EngineError::CorruptState).

use std::collections::HashMap;
use std::fmt;

use crate::game::{Construction, MapLocation, RobotId, Team, World};

/// One broken structural invariant, with enough context to debug it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A robot's record and the occupancy index disagree.
    OccupancyMismatch {
        /// Robot whose location is inconsistent.
        robot: RobotId,
        /// Location in the robot's own record.
        recorded: MapLocation,
    },
    /// Two live robots claim the same tile.
    SharedTile {
        /// Lower of the two ids.
        first: RobotId,
        /// Higher of the two ids.
        second: RobotId,
        /// The contested tile.
        loc: MapLocation,
    },
    /// A robot with zero health survived signal application.
    DeadRobotPresent {
        /// The lingering robot.
        robot: RobotId,
    },
    /// A robot stands on impassable terrain or off the map.
    BadFooting {
        /// The misplaced robot.
        robot: RobotId,
        /// Where it stands.
        loc: MapLocation,
    },
    /// A robot spent more bytecodes than one round allows.
    BudgetOverrun {
        /// The overspending robot.
        robot: RobotId,
        /// Bytecodes recorded for the round.
        used: u32,
        /// The configured per-round budget.
        budget: u32,
    },
    /// A construction countdown exceeds the target's build time.
    ConstructionOverrun {
        /// The constructing robot.
        robot: RobotId,
        /// Rounds still recorded.
        rounds_left: u32,
    },
    /// A resigned team still fields robots.
    ResignedTeamAlive {
        /// The team that conceded.
        team: Team,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OccupancyMismatch { robot, recorded } => {
                write!(f, "robot {robot} not indexed at its recorded tile {recorded:?}")
            }
            Self::SharedTile { first, second, loc } => {
                write!(f, "robots {first} and {second} both occupy {loc:?}")
            }
            Self::DeadRobotPresent { robot } => {
                write!(f, "robot {robot} has zero health but was not removed")
            }
            Self::BadFooting { robot, loc } => {
                write!(f, "robot {robot} stands on impassable terrain at {loc:?}")
            }
            Self::BudgetOverrun { robot, used, budget } => {
                write!(f, "robot {robot} used {used} bytecodes against a budget of {budget}")
            }
            Self::ConstructionOverrun { robot, rounds_left } => {
                write!(f, "robot {robot} has {rounds_left} construction rounds left")
            }
            Self::ResignedTeamAlive { team } => {
                write!(f, "resigned team {team:?} still has robots on the map")
            }
        }
    }
}

/// Check every structural invariant and collect all violations.
#[must_use]
pub fn check_invariants(world: &World, round_budget: u32) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut seen: HashMap<MapLocation, RobotId> = HashMap::new();

    for robot in world.robots() {
        if robot.health == 0 {
            violations.push(InvariantViolation::DeadRobotPresent { robot: robot.id });
        }
        if !world.map().on_map(robot.location) || !world.terrain_at(robot.location).is_passable()
        {
            violations.push(InvariantViolation::BadFooting {
                robot: robot.id,
                loc: robot.location,
            });
        }
        if world.robot_at(robot.location).is_none_or(|r| r.id != robot.id) {
            violations.push(InvariantViolation::OccupancyMismatch {
                robot: robot.id,
                recorded: robot.location,
            });
        }
        if let Some(&other) = seen.get(&robot.location) {
            violations.push(InvariantViolation::SharedTile {
                first: other,
                second: robot.id,
                loc: robot.location,
            });
        } else {
            seen.insert(robot.location, robot.id);
        }
        if robot.bytecodes_used > round_budget {
            violations.push(InvariantViolation::BudgetOverrun {
                robot: robot.id,
                used: robot.bytecodes_used,
                budget: round_budget,
            });
        }
        if let Construction::InProgress { target, rounds_left } = robot.construction
            && target.construction_rounds().is_none_or(|max| rounds_left > max)
        {
            violations.push(InvariantViolation::ConstructionOverrun {
                robot: robot.id,
                rounds_left,
            });
        }
    }

    if let Some(team) = world.resigned()
        && world.robots().any(|r| r.team == team)
    {
        violations.push(InvariantViolation::ResignedTeamAlive { team });
    }

    violations
}

/// Debug-build assertion over [`check_invariants`]. Release builds
/// skip the scan entirely.
pub fn assert_invariants(world: &World, round_budget: u32) {
    if cfg!(debug_assertions) {
        let violations = check_invariants(world, round_budget);
        debug_assert!(violations.is_empty(), "invariant violations: {violations:?}");
    }
}
