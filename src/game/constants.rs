//! Global game constants.
//!
//! Per-robot-type tables (health, damage, radii, delays) live on
//! [`RobotType`](crate::game::RobotType); everything battlefield-wide is
//! here. These are sanity-checked by the invariant suite, not tuned for
//! balance.

/// Number of broadcast channels per team.
pub const CHANNEL_COUNT: usize = 256;

/// Fixed length of the cross-match team memory array.
pub const TEAM_MEMORY_LENGTH: usize = 8;

/// Number of indicator strings each robot may set.
pub const INDICATOR_STRING_COUNT: usize = 3;

/// Default per-robot execution budget per round, in bytecodes.
pub const ROUND_BUDGET: u32 = 10_000;

/// Bytecode cost charged for a read-only controller query.
pub const QUERY_COST: u32 = 10;

/// Bytecode cost charged for an action-issuing controller call.
pub const ACTION_COST: u32 = 50;

/// Divisor applied to unspent budget for the yield power refund.
pub const YIELD_REFUND_DIVISOR: u32 = 100;

/// Squared radius of self-destruct area damage.
pub const SELF_DESTRUCT_RADIUS_SQUARED: u32 = 2;

/// Flat component of self-destruct damage.
pub const SELF_DESTRUCT_BASE_DAMAGE: u32 = 30;

/// Divisor applied to remaining health for the variable component of
/// self-destruct damage.
pub const SELF_DESTRUCT_HEALTH_DIVISOR: u32 = 2;

/// Shield points lost at each round boundary.
pub const SHIELD_DECAY: u32 = 1;

/// Extra movement delay for a diagonal step.
pub const DIAGONAL_DELAY_PENALTY: u32 = 1;

/// Movement delay reduction on road terrain.
pub const ROAD_DELAY_BONUS: u32 = 1;

/// Cap on cows accumulated on a single tile.
pub const MAX_COWS_PER_TILE: u32 = 1_000;

/// Squared radius within which a pastr herds cows into milk.
pub const PASTR_HERD_RADIUS_SQUARED: u32 = 5;

/// Cooldown charged to an HQ after queueing a spawn.
pub const HQ_SPAWN_DELAY: u32 = 10;

/// Maximum number of rounds in a match before the tiebreak applies.
pub const DEFAULT_MAX_ROUNDS: u32 = 2_000;
