//! The deterministic battle engine: world state, the signal log that
//! drives every mutation, and the rule set robots play under.
//!
//! State changes flow through exactly one funnel: validated actions
//! commit [`Signal`]s, and [`World::commit`] applies them. Replaying
//! the log over the same starting world reproduces the match bit for
//! bit.

pub mod constants;
pub mod resolver;

mod controller;
mod geometry;
mod invariants;
mod map;
mod robot;
mod signal;
mod world;

pub use controller::{BudgetMeter, Controller, RobotInfo};
pub use geometry::{Direction, MapLocation};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use map::{GameMap, TerrainTile};
pub use robot::{Construction, RobotId, RobotRecord, RobotType, Team};
pub use signal::{MovementStyle, Signal};
pub use world::{Placement, World};
