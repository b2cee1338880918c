//! Robots: teams, types, and per-robot mutable state.

use serde::{Deserialize, Serialize};

use crate::game::constants::INDICATOR_STRING_COUNT;
use crate::game::{Direction, MapLocation};

/// Unique identifier for a robot, stable for its lifetime.
pub type RobotId = u32;

/// A side in the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// First team.
    A,
    /// Second team.
    B,
    /// Unowned; used for terrain and filters, never for robots.
    Neutral,
}

impl Team {
    /// The opposing team. Neutral has no opponent.
    #[must_use]
    pub const fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
            Team::Neutral => Team::Neutral,
        }
    }

    /// Dense index for per-team arrays (`None` for neutral).
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Team::A => Some(0),
            Team::B => Some(1),
            Team::Neutral => None,
        }
    }
}

/// The kind of a robot, which determines its capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotType {
    /// Per-team root structure; sole issuer of spawn actions.
    Hq,
    /// The mobile combat unit.
    Soldier,
    /// Pasture structure; herds nearby cows into milk.
    Pastr,
    /// Noise tower structure; fires zero-damage pulses that scare cows.
    NoiseTower,
}

impl RobotType {
    /// Maximum (and starting) health for this type.
    #[must_use]
    pub const fn max_health(self) -> u32 {
        match self {
            RobotType::Hq => 500,
            RobotType::Soldier => 100,
            RobotType::Pastr => 200,
            RobotType::NoiseTower => 100,
        }
    }

    /// Damage dealt by one attack. Zero for types whose attacks are
    /// noise only.
    #[must_use]
    pub const fn attack_damage(self) -> u32 {
        match self {
            RobotType::Hq => 30,
            RobotType::Soldier => 10,
            RobotType::Pastr => 0,
            RobotType::NoiseTower => 0,
        }
    }

    /// Squared attack radius, or `None` for types that cannot attack.
    #[must_use]
    pub const fn attack_radius_squared(self) -> Option<u32> {
        match self {
            RobotType::Hq => Some(15),
            RobotType::Soldier => Some(10),
            RobotType::Pastr => None,
            RobotType::NoiseTower => Some(300),
        }
    }

    /// Squared sensor radius.
    #[must_use]
    pub const fn sensor_radius_squared(self) -> u32 {
        match self {
            RobotType::Hq => 35,
            RobotType::Soldier => 35,
            RobotType::Pastr => 35,
            RobotType::NoiseTower => 35,
        }
    }

    /// Cooldown set after an attack, in rounds.
    #[must_use]
    pub const fn attack_delay(self) -> u32 {
        match self {
            RobotType::Hq => 2,
            RobotType::Soldier => 2,
            RobotType::Pastr => 0,
            RobotType::NoiseTower => 1,
        }
    }

    /// Cooldown set after an orthogonal run step, in rounds.
    #[must_use]
    pub const fn move_delay(self) -> u32 {
        match self {
            RobotType::Soldier => 2,
            RobotType::Hq | RobotType::Pastr | RobotType::NoiseTower => 0,
        }
    }

    /// Cooldown set after an orthogonal sneak step, in rounds.
    ///
    /// Sneaking trades speed for staying off enemy radar; the engine
    /// records the style in the movement signal for clients.
    #[must_use]
    pub const fn sneak_delay(self) -> u32 {
        match self {
            RobotType::Soldier => 3,
            RobotType::Hq | RobotType::Pastr | RobotType::NoiseTower => 0,
        }
    }

    /// Rounds of construction needed to convert a soldier into this
    /// type, or `None` if it cannot be constructed.
    #[must_use]
    pub const fn construction_rounds(self) -> Option<u32> {
        match self {
            RobotType::Pastr => Some(10),
            RobotType::NoiseTower => Some(20),
            RobotType::Hq | RobotType::Soldier => None,
        }
    }

    /// Whether this type can move at all.
    #[must_use]
    pub const fn can_move(self) -> bool {
        matches!(self, RobotType::Soldier)
    }

    /// Whether this type can issue attacks.
    #[must_use]
    pub const fn can_attack(self) -> bool {
        self.attack_radius_squared().is_some()
    }

    /// Whether this type may spawn new robots.
    #[must_use]
    pub const fn can_spawn(self) -> bool {
        matches!(self, RobotType::Hq)
    }

    /// Whether this type may begin constructions.
    #[must_use]
    pub const fn can_construct(self) -> bool {
        matches!(self, RobotType::Soldier)
    }

    /// Whether this type is a stationary structure.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        matches!(self, RobotType::Hq | RobotType::Pastr | RobotType::NoiseTower)
    }
}

/// Construction progress for a robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Construction {
    /// No construction in progress.
    Idle,
    /// Converting into `target` with `rounds_left` active rounds to go.
    InProgress {
        /// Structure type being built.
        target: RobotType,
        /// Active rounds remaining until conversion.
        rounds_left: u32,
    },
}

/// Mutable per-robot state.
///
/// Records are created by spawn materialization or world setup and
/// removed by exactly one death signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotRecord {
    /// Unique id, immutable for the robot's lifetime.
    pub id: RobotId,
    /// The robot's kind. Changes only on construction completion.
    pub robot_type: RobotType,
    /// Owning team.
    pub team: Team,
    /// Current battlefield location.
    pub location: MapLocation,
    /// Direction of the last movement; seeds the forward/backward flag.
    pub facing: Direction,
    /// Remaining health. Zero triggers removal.
    pub health: u32,
    /// Shield points absorbed before health.
    pub shields: u32,
    /// Rounds until the next action is permitted.
    pub cooldown: u32,
    /// Construction state machine.
    pub construction: Construction,
    /// Bytecodes consumed in the current round.
    pub bytecodes_used: u32,
    /// Diagnostic strings shown by clients; no gameplay effect.
    pub indicator_strings: [String; INDICATOR_STRING_COUNT],
    /// User-settable debug bits the program can react to.
    pub control_bits: u64,
}

impl RobotRecord {
    /// Create a fresh record at full health.
    #[must_use]
    pub fn new(id: RobotId, robot_type: RobotType, team: Team, location: MapLocation) -> Self {
        Self {
            id,
            robot_type,
            team,
            location,
            facing: Direction::North,
            health: robot_type.max_health(),
            shields: 0,
            cooldown: 0,
            construction: Construction::Idle,
            bytecodes_used: 0,
            indicator_strings: std::array::from_fn(|_| String::new()),
            control_bits: 0,
        }
    }

    /// Whether the robot may act this round.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.cooldown == 0
    }

    /// Apply damage, shields first. Health saturates at zero.
    pub fn take_damage(&mut self, damage: u32) {
        let absorbed = self.shields.min(damage);
        self.shields -= absorbed;
        self.health = self.health.saturating_sub(damage - absorbed);
    }
}
