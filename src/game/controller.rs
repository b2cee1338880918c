//! The per-slot command surface handed to robot programs.
//!
//! A [`Controller`] wraps the world for exactly one robot for exactly
//! one round slot. Every query and action is metered against the round
//! budget; once the budget runs dry or the program yields, every
//! further call fails with `BudgetExhausted` and the slot is over.

use crate::error::{ActionError, ActionResult, EngineError};
use crate::game::constants::{
    ACTION_COST, CHANNEL_COUNT, INDICATOR_STRING_COUNT, QUERY_COST, TEAM_MEMORY_LENGTH,
};
use crate::game::{
    Construction, Direction, MapLocation, MovementStyle, RobotId, RobotRecord, RobotType, Signal,
    Team, TerrainTile, World, resolver,
};

/// Snapshot of a sensed robot. Sensing hands out copies, never live
/// references into the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobotInfo {
    /// Engine-assigned id.
    pub id: RobotId,
    /// Current kind, reflecting any completed construction.
    pub robot_type: RobotType,
    /// Owning team.
    pub team: Team,
    /// Tile the robot stands on.
    pub location: MapLocation,
    /// Remaining health.
    pub health: u32,
    /// Remaining shields.
    pub shields: u32,
    /// Whether a structure conversion is counting down.
    pub constructing: bool,
}

impl RobotInfo {
    fn from_record(record: &RobotRecord) -> Self {
        Self {
            id: record.id,
            robot_type: record.robot_type,
            team: record.team,
            location: record.location,
            health: record.health,
            shields: record.shields,
            constructing: record.construction != Construction::Idle,
        }
    }
}

/// Tracks bytecode spend against the per-round budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetMeter {
    limit: u32,
    used: u32,
}

impl BudgetMeter {
    /// Fresh meter with the full budget available.
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self { limit, used: 0 }
    }

    /// Bytecodes consumed so far. Never exceeds the limit.
    #[must_use]
    pub const fn used(&self) -> u32 {
        self.used
    }

    /// Budget left for this slot.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.limit - self.used
    }

    /// Charge one call. The final charge may clamp to the limit; every
    /// call after that fails.
    fn charge(&mut self, cost: u32) -> ActionResult<()> {
        if self.used >= self.limit {
            return Err(ActionError::BudgetExhausted);
        }
        self.used = self.used.saturating_add(cost).min(self.limit);
        Ok(())
    }
}

/// One robot's window onto the world for one round slot.
#[derive(Debug)]
pub struct Controller<'a> {
    world: &'a mut World,
    robot: RobotId,
    meter: BudgetMeter,
    yielded: bool,
    breakpoint: bool,
    fatal: Option<EngineError>,
}

impl<'a> Controller<'a> {
    /// Open a slot for `robot` with `budget` bytecodes to spend.
    pub fn new(world: &'a mut World, robot: RobotId, budget: u32) -> Self {
        Self {
            world,
            robot,
            meter: BudgetMeter::new(budget),
            yielded: false,
            breakpoint: false,
            fatal: None,
        }
    }

    fn spend(&mut self, cost: u32) -> ActionResult<()> {
        if self.yielded {
            return Err(ActionError::BudgetExhausted);
        }
        self.meter.charge(cost)?;
        self.world.charge_bytecodes(self.robot, cost);
        Ok(())
    }

    fn record(&self) -> ActionResult<&RobotRecord> {
        self.world.robot(self.robot).ok_or(ActionError::NoRobotThere)
    }

    // --- identity and self-queries ---

    /// Id of the robot this slot belongs to.
    #[must_use]
    pub const fn id(&self) -> RobotId {
        self.robot
    }

    /// The robot's current location.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn location(&mut self) -> ActionResult<MapLocation> {
        self.spend(QUERY_COST)?;
        Ok(self.record()?.location)
    }

    /// Remaining health.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn health(&mut self) -> ActionResult<u32> {
        self.spend(QUERY_COST)?;
        Ok(self.record()?.health)
    }

    /// Remaining shields.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn shields(&mut self) -> ActionResult<u32> {
        self.spend(QUERY_COST)?;
        Ok(self.record()?.shields)
    }

    /// The robot's kind, reflecting any completed conversion.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn robot_type(&mut self) -> ActionResult<RobotType> {
        self.spend(QUERY_COST)?;
        Ok(self.record()?.robot_type)
    }

    /// Owning team.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn team(&mut self) -> ActionResult<Team> {
        self.spend(QUERY_COST)?;
        Ok(self.record()?.team)
    }

    /// Rounds until the action cooldown clears.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn rounds_until_active(&mut self) -> ActionResult<u32> {
        self.spend(QUERY_COST)?;
        Ok(self.record()?.cooldown)
    }

    /// Whether the robot may act this slot.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn is_active(&mut self) -> ActionResult<bool> {
        self.spend(QUERY_COST)?;
        Ok(self.record()?.is_active())
    }

    /// Construction countdown state.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn construction_status(&mut self) -> ActionResult<Construction> {
        self.spend(QUERY_COST)?;
        Ok(self.record()?.construction)
    }

    /// Observer-set control bits for this robot.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn control_bits(&mut self) -> ActionResult<u64> {
        self.spend(QUERY_COST)?;
        Ok(self.record()?.control_bits)
    }

    /// Current round number.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn round(&mut self) -> ActionResult<u32> {
        self.spend(QUERY_COST)?;
        Ok(self.world.round())
    }

    /// Map dimensions as `(width, height)`. Terrain is global
    /// knowledge and needs no sensor range.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn map_size(&mut self) -> ActionResult<(i32, i32)> {
        self.spend(QUERY_COST)?;
        Ok((self.world.map().width(), self.world.map().height()))
    }

    // --- sensing ---

    /// Whether a location is inside this robot's sensor radius.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn can_sense_location(&mut self, loc: MapLocation) -> ActionResult<bool> {
        self.spend(QUERY_COST)?;
        let record = self.record()?;
        let range = record.robot_type.sensor_radius_squared();
        Ok(record.location.distance_squared_to(loc) <= range)
    }

    /// Terrain at any location; off-map reads as void.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn sense_terrain(&mut self, loc: MapLocation) -> ActionResult<TerrainTile> {
        self.spend(QUERY_COST)?;
        Ok(self.world.terrain_at(loc))
    }

    /// Cow growth rate at any location. Growth rates are printed on
    /// the map and known globally.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn sense_cow_growth(&mut self, loc: MapLocation) -> ActionResult<u32> {
        self.spend(QUERY_COST)?;
        Ok(self.world.map().cow_growth_at(loc))
    }

    /// Cows currently on a tile within sensor range.
    ///
    /// # Errors
    ///
    /// `OutOfSensorRange` beyond the robot's sensor radius.
    pub fn sense_cows_at(&mut self, loc: MapLocation) -> ActionResult<u32> {
        self.spend(QUERY_COST)?;
        let record = self.record()?;
        if record.location.distance_squared_to(loc) > record.robot_type.sensor_radius_squared() {
            return Err(ActionError::OutOfSensorRange);
        }
        Ok(self.world.cows_at(loc))
    }

    /// Snapshot of the robot on a tile within sensor range.
    ///
    /// # Errors
    ///
    /// `OutOfSensorRange` beyond the sensor radius, `NoRobotThere`
    /// when the tile is empty.
    pub fn sense_robot_at(&mut self, loc: MapLocation) -> ActionResult<RobotInfo> {
        self.spend(QUERY_COST)?;
        let record = self.record()?;
        if record.location.distance_squared_to(loc) > record.robot_type.sensor_radius_squared() {
            return Err(ActionError::OutOfSensorRange);
        }
        self.world
            .robot_at(loc)
            .map(RobotInfo::from_record)
            .ok_or(ActionError::NoRobotThere)
    }

    /// Robots within a squared radius of this robot, ascending by id,
    /// optionally filtered by team and kind. The search radius is
    /// clamped to the sensor radius; the sensing robot itself is
    /// excluded.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn sense_nearby_robots(
        &mut self,
        radius_squared: u32,
        team: Option<Team>,
        robot_type: Option<RobotType>,
    ) -> ActionResult<Vec<RobotInfo>> {
        self.spend(QUERY_COST)?;
        let record = self.record()?;
        let center = record.location;
        let radius = radius_squared.min(record.robot_type.sensor_radius_squared());
        let me = self.robot;
        Ok(self
            .world
            .robots_in_radius(center, radius, team, robot_type)
            .into_iter()
            .filter(|r| r.id != me)
            .map(RobotInfo::from_record)
            .collect())
    }

    /// Location of this team's HQ. HQ positions are global knowledge.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn hq_location(&mut self) -> ActionResult<MapLocation> {
        self.spend(QUERY_COST)?;
        let team = self.record()?.team;
        self.world.hq_location(team).ok_or(ActionError::NoRobotThere)
    }

    /// Location of the opposing HQ.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn enemy_hq_location(&mut self) -> ActionResult<MapLocation> {
        self.spend(QUERY_COST)?;
        let team = self.record()?.team.opponent();
        self.world.hq_location(team).ok_or(ActionError::NoRobotThere)
    }

    /// Locations of a team's pastures, ascending by id. Pastures are
    /// visible to both teams regardless of range.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn sense_pastr_locations(&mut self, team: Team) -> ActionResult<Vec<MapLocation>> {
        self.spend(QUERY_COST)?;
        Ok(self.world.pastr_locations(team))
    }

    /// Ids of robots that broadcast during the previous round,
    /// optionally filtered by team.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn sense_broadcasting_robots(
        &mut self,
        team: Option<Team>,
    ) -> ActionResult<Vec<RobotId>> {
        self.spend(QUERY_COST)?;
        Ok(self.world.broadcasting_robots(team))
    }

    /// Committed value of one of this team's broadcast channels.
    /// Writes from the current round are not visible yet.
    ///
    /// # Errors
    ///
    /// `ChannelOutOfRange` when the index exceeds the channel bound.
    pub fn read_broadcast(&mut self, channel: usize) -> ActionResult<i32> {
        self.spend(QUERY_COST)?;
        if channel >= CHANNEL_COUNT {
            return Err(ActionError::ChannelOutOfRange);
        }
        let team = self.record()?.team;
        Ok(self.world.channel_value(team, channel))
    }

    /// This team's accumulated milk score.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn milk(&mut self) -> ActionResult<u64> {
        self.spend(QUERY_COST)?;
        let team = self.record()?.team;
        Ok(self.world.milk(team))
    }

    /// This team's persistent memory as carried between matches.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn team_memory(&mut self) -> ActionResult<[i64; TEAM_MEMORY_LENGTH]> {
        self.spend(QUERY_COST)?;
        let team = self.record()?.team;
        Ok(self.world.team_memory(team))
    }

    // --- pre-checks ---

    /// Whether a one-step move is legal with respect to terrain and
    /// occupancy. Ignores cooldown.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn can_move(&mut self, dir: Direction) -> ActionResult<bool> {
        self.spend(QUERY_COST)?;
        let record = self.record()?;
        if !record.robot_type.can_move() {
            return Ok(false);
        }
        let dest = record.location.add(dir);
        Ok(self.world.map().on_map(dest)
            && self.world.terrain_at(dest).is_passable()
            && !self.world.is_occupied(dest))
    }

    /// Whether a location is inside this robot's attack radius.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` once the round budget is spent.
    pub fn can_attack_square(&mut self, loc: MapLocation) -> ActionResult<bool> {
        self.spend(QUERY_COST)?;
        let record = self.record()?;
        Ok(record
            .robot_type
            .attack_radius_squared()
            .is_some_and(|r| record.location.distance_squared_to(loc) <= r))
    }

    // --- actions ---

    /// Move one step at full speed.
    ///
    /// # Errors
    ///
    /// See [`resolver::attempt_move`], plus `BudgetExhausted` when the
    /// round budget is spent.
    pub fn move_in(&mut self, dir: Direction) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_move(self.world, self.robot, dir, MovementStyle::Run)
    }

    /// Move one step slowly without scaring cows.
    ///
    /// # Errors
    ///
    /// See [`resolver::attempt_move`], plus `BudgetExhausted` when the
    /// round budget is spent.
    pub fn sneak(&mut self, dir: Direction) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_move(self.world, self.robot, dir, MovementStyle::Sneak)
    }

    /// Attack a location for this type's damage.
    ///
    /// # Errors
    ///
    /// See [`resolver::attempt_attack`], plus `BudgetExhausted` when
    /// the round budget is spent.
    pub fn attack_square(&mut self, loc: MapLocation) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_attack(self.world, self.robot, loc, false)
    }

    /// Fire a zero-damage noise pulse that scares cows off a tile.
    /// Noise towers only.
    ///
    /// # Errors
    ///
    /// See [`resolver::attempt_attack`], plus `BudgetExhausted` when
    /// the round budget is spent.
    pub fn attack_square_light(&mut self, loc: MapLocation) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_attack(self.world, self.robot, loc, true)
    }

    /// Write a value to one of this team's broadcast channels. The
    /// write commits at the round boundary.
    ///
    /// # Errors
    ///
    /// See [`resolver::attempt_broadcast`], plus `BudgetExhausted`
    /// when the round budget is spent.
    pub fn broadcast(&mut self, channel: usize, data: i32) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_broadcast(self.world, self.robot, channel, data)
    }

    /// Queue a spawn on an adjacent tile. HQ only.
    ///
    /// # Errors
    ///
    /// See [`resolver::attempt_spawn`], plus `BudgetExhausted` when
    /// the round budget is spent.
    pub fn spawn(&mut self, dir: Direction, robot_type: RobotType) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_spawn(self.world, self.robot, dir, robot_type)
    }

    /// Begin converting this soldier into a structure in place.
    ///
    /// # Errors
    ///
    /// See [`resolver::attempt_construct`], plus `BudgetExhausted`
    /// when the round budget is spent.
    pub fn construct(&mut self, target: RobotType) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_construct(self.world, self.robot, target)
    }

    /// Detonate this robot, damaging everything in blast range. Ends
    /// the slot.
    ///
    /// # Errors
    ///
    /// See [`resolver::attempt_self_destruct`], plus `BudgetExhausted`
    /// when the round budget is spent.
    pub fn self_destruct(&mut self) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_self_destruct(self.world, self.robot)?;
        self.yielded = true;
        Ok(())
    }

    /// Remove this robot from play. Ends the slot.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` when the round budget is spent.
    pub fn suicide(&mut self) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_suicide(self.world, self.robot);
        self.yielded = true;
        Ok(())
    }

    /// Concede the match for this robot's team.
    ///
    /// # Errors
    ///
    /// `BudgetExhausted` when the round budget is spent.
    pub fn resign(&mut self) -> ActionResult<()> {
        self.spend(ACTION_COST)?;
        resolver::attempt_resign(self.world, self.robot);
        self.yielded = true;
        Ok(())
    }

    /// End the slot voluntarily. Unspent budget earns the team a power
    /// refund, accounted by the scheduler.
    pub fn yield_turn(&mut self) {
        self.yielded = true;
    }

    // --- diagnostics ---

    /// Set one of the robot's indicator strings for observers. Free of
    /// charge; an out-of-range slot index is ignored.
    pub fn set_indicator_string(&mut self, index: usize, value: &str) {
        if index < INDICATOR_STRING_COUNT && self.world.robot(self.robot).is_some() {
            self.world.commit(Signal::Indicator {
                robot: self.robot,
                index,
                value: value.to_owned(),
            });
        }
    }

    /// Attach a free-form observation to the match log. Free of
    /// charge.
    pub fn add_match_observation(&mut self, text: &str) {
        self.world.commit(Signal::MatchObservation {
            robot: self.robot,
            observation: text.to_owned(),
        });
    }

    /// Request a debugger pause at the end of this slot.
    pub fn breakpoint(&mut self) {
        self.breakpoint = true;
    }

    /// Overwrite one slot of this team's persistent memory.
    ///
    /// # Errors
    ///
    /// A fatal [`EngineError`] on an out-of-range index; the scheduler
    /// aborts the match.
    pub fn set_team_memory(&mut self, index: usize, value: i64) -> Result<(), EngineError> {
        self.set_team_memory_masked(index, value, -1)
    }

    /// Update only the masked bits of one persistent-memory slot.
    ///
    /// # Errors
    ///
    /// A fatal [`EngineError`] on an out-of-range index; the scheduler
    /// aborts the match.
    pub fn set_team_memory_masked(
        &mut self,
        index: usize,
        value: i64,
        mask: i64,
    ) -> Result<(), EngineError> {
        let Some(record) = self.world.robot(self.robot) else {
            return Ok(());
        };
        let team = record.team;
        if let Err(e) = self.world.write_team_memory(team, index, value, mask) {
            self.fatal = Some(e.clone());
            return Err(e);
        }
        Ok(())
    }

    // --- slot bookkeeping, read by the scheduler ---

    /// Whether the program ended its slot voluntarily.
    #[must_use]
    pub const fn yielded(&self) -> bool {
        self.yielded
    }

    /// Whether a debugger pause was requested.
    #[must_use]
    pub const fn breakpoint_requested(&self) -> bool {
        self.breakpoint
    }

    /// Fatal error raised during the slot, if any.
    #[must_use]
    pub const fn fatal(&self) -> Option<&EngineError> {
        self.fatal.as_ref()
    }

    /// Budget left unspent, the basis of the yield power refund.
    #[must_use]
    pub const fn budget_remaining(&self) -> u32 {
        self.meter.remaining()
    }

    /// Bytecodes consumed this slot.
    #[must_use]
    pub const fn budget_used(&self) -> u32 {
        self.meter.used()
    }
}
