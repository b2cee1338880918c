//! The world: sole owner of mutable battlefield state.
//!
//! All mutation flows through [`World::commit`]: append a signal to the
//! log, then apply it. Read queries never mutate and are deterministic
//! functions of the current state. Robots are kept in a `BTreeMap` so
//! every ordered traversal is ascending-id by construction, which is
//! what makes the round interleaving reproducible.

use std::collections::{BTreeMap, HashMap};

use crate::error::EngineError;
use crate::game::constants::{CHANNEL_COUNT, PASTR_HERD_RADIUS_SQUARED, SHIELD_DECAY, TEAM_MEMORY_LENGTH};
use crate::game::{
    Construction, GameMap, MapLocation, RobotId, RobotRecord, RobotType, Signal, Team, TerrainTile,
};

/// A robot creation queued for the next round boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingSpawn {
    id: RobotId,
    robot_type: RobotType,
    team: Team,
    loc: MapLocation,
}

/// Per-team shared state: broadcast channels, memory, milk.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TeamState {
    /// Channel values readable this round.
    committed: Vec<i32>,
    /// Writes buffered during the current round, committed at the
    /// boundary. Keyed by channel so the last write per channel wins.
    pending: BTreeMap<usize, i32>,
    /// Cross-match team memory, handed off at match end.
    memory: [i64; TEAM_MEMORY_LENGTH],
    /// Milk herded by this team's pastrs; the round-limit tiebreak.
    milk: u64,
}

impl TeamState {
    fn new(memory: [i64; TEAM_MEMORY_LENGTH]) -> Self {
        Self {
            committed: vec![0; CHANNEL_COUNT],
            pending: BTreeMap::new(),
            memory,
            milk: 0,
        }
    }
}

/// An initial robot placement from the map-loading collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Kind of robot to place.
    pub robot_type: RobotType,
    /// Owning team.
    pub team: Team,
    /// Starting tile.
    pub loc: MapLocation,
}

/// The mutable battlefield.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    map: GameMap,
    robots: BTreeMap<RobotId, RobotRecord>,
    occupancy: HashMap<MapLocation, RobotId>,
    teams: [TeamState; 2],
    hq_locations: [MapLocation; 2],
    pending_spawns: Vec<PendingSpawn>,
    /// Robots that broadcast during the current round.
    broadcasters: Vec<RobotId>,
    /// Robots that broadcast during the previous round; what sensing
    /// reports.
    broadcasters_last_round: Vec<RobotId>,
    round: u32,
    next_id: RobotId,
    log: Vec<Signal>,
    resigned: Option<Team>,
}

impl World {
    /// Build a world from collaborator-provided map and placements.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidMap`] unless every placement is on
    /// a distinct passable tile and each playing team has exactly one
    /// HQ.
    pub fn new(
        map: GameMap,
        placements: &[Placement],
        team_memory: [[i64; TEAM_MEMORY_LENGTH]; 2],
    ) -> Result<Self, EngineError> {
        let mut hq: [Option<MapLocation>; 2] = [None, None];
        for p in placements {
            if !map.on_map(p.loc) || !map.terrain_at(p.loc).is_passable() {
                return Err(EngineError::InvalidMap {
                    reason: format!("placement at ({}, {}) is not passable", p.loc.x, p.loc.y),
                });
            }
            let Some(team_idx) = p.team.index() else {
                return Err(EngineError::InvalidMap {
                    reason: "neutral robot placement".to_string(),
                });
            };
            if p.robot_type == RobotType::Hq {
                if hq[team_idx].is_some() {
                    return Err(EngineError::InvalidMap {
                        reason: "duplicate HQ placement".to_string(),
                    });
                }
                hq[team_idx] = Some(p.loc);
            }
        }
        let (Some(hq_a), Some(hq_b)) = (hq[0], hq[1]) else {
            return Err(EngineError::InvalidMap {
                reason: "each team needs exactly one HQ".to_string(),
            });
        };

        let mut world = Self {
            map,
            robots: BTreeMap::new(),
            occupancy: HashMap::new(),
            teams: [TeamState::new(team_memory[0]), TeamState::new(team_memory[1])],
            hq_locations: [hq_a, hq_b],
            pending_spawns: Vec::new(),
            broadcasters: Vec::new(),
            broadcasters_last_round: Vec::new(),
            round: 0,
            next_id: 1,
            log: Vec::new(),
            resigned: None,
        };
        for p in placements {
            if world.occupancy.contains_key(&p.loc) {
                return Err(EngineError::InvalidMap {
                    reason: format!("two placements share tile ({}, {})", p.loc.x, p.loc.y),
                });
            }
            let id = world.allocate_id();
            let record = RobotRecord::new(id, p.robot_type, p.team, p.loc);
            world.occupancy.insert(p.loc, id);
            world.robots.insert(id, record);
        }
        Ok(world)
    }

    // ---------------------------------------------------------------
    // Read queries. Deterministic; out-of-bounds yields empty results.
    // ---------------------------------------------------------------

    /// The terrain grid.
    #[must_use]
    pub const fn map(&self) -> &GameMap {
        &self.map
    }

    /// The current round number, starting at 0.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// The robot with the given id, if alive.
    #[must_use]
    pub fn robot(&self, id: RobotId) -> Option<&RobotRecord> {
        self.robots.get(&id)
    }

    /// The robot occupying a location, if any.
    #[must_use]
    pub fn robot_at(&self, loc: MapLocation) -> Option<&RobotRecord> {
        self.occupancy.get(&loc).and_then(|id| self.robots.get(id))
    }

    /// Whether any robot occupies a location.
    #[must_use]
    pub fn is_occupied(&self, loc: MapLocation) -> bool {
        self.occupancy.contains_key(&loc)
    }

    /// All live robots in ascending-id order.
    #[must_use]
    pub fn robots(&self) -> impl Iterator<Item = &RobotRecord> {
        self.robots.values()
    }

    /// Ids of all live robots, ascending.
    #[must_use]
    pub fn robot_ids(&self) -> Vec<RobotId> {
        self.robots.keys().copied().collect()
    }

    /// Robots within squared distance of a center, ascending by id,
    /// optionally filtered by team and kind. The center itself counts.
    #[must_use]
    pub fn robots_in_radius(
        &self,
        center: MapLocation,
        radius_squared: u32,
        team: Option<Team>,
        robot_type: Option<RobotType>,
    ) -> Vec<&RobotRecord> {
        self.robots
            .values()
            .filter(|r| r.location.distance_squared_to(center) <= radius_squared)
            .filter(|r| team.is_none_or(|t| r.team == t))
            .filter(|r| robot_type.is_none_or(|t| r.robot_type == t))
            .collect()
    }

    /// Terrain at a location; off-map reads as void.
    #[must_use]
    pub fn terrain_at(&self, loc: MapLocation) -> TerrainTile {
        self.map.terrain_at(loc)
    }

    /// Cows currently at a location; zero off the map.
    #[must_use]
    pub fn cows_at(&self, loc: MapLocation) -> u32 {
        self.map.cows_at(loc)
    }

    /// Committed value of a broadcast channel; zero if never written,
    /// out of range, or queried for the neutral team.
    #[must_use]
    pub fn channel_value(&self, team: Team, channel: usize) -> i32 {
        team.index()
            .and_then(|t| self.teams[t].committed.get(channel).copied())
            .unwrap_or(0)
    }

    /// Location of a team's HQ as placed at match start.
    #[must_use]
    pub fn hq_location(&self, team: Team) -> Option<MapLocation> {
        team.index().map(|t| self.hq_locations[t])
    }

    /// Locations of a team's pastrs, ascending by robot id.
    #[must_use]
    pub fn pastr_locations(&self, team: Team) -> Vec<MapLocation> {
        self.robots
            .values()
            .filter(|r| r.team == team && r.robot_type == RobotType::Pastr)
            .map(|r| r.location)
            .collect()
    }

    /// Robots that broadcast during the previous round, ascending,
    /// optionally filtered by team.
    #[must_use]
    pub fn broadcasting_robots(&self, team: Option<Team>) -> Vec<RobotId> {
        self.broadcasters_last_round
            .iter()
            .copied()
            .filter(|id| {
                team.is_none_or(|t| self.robots.get(id).is_some_and(|r| r.team == t))
            })
            .collect()
    }

    /// A team's cross-match memory array.
    #[must_use]
    pub fn team_memory(&self, team: Team) -> [i64; TEAM_MEMORY_LENGTH] {
        team.index().map_or([0; TEAM_MEMORY_LENGTH], |t| self.teams[t].memory)
    }

    /// Milk herded by a team so far.
    #[must_use]
    pub fn milk(&self, team: Team) -> u64 {
        team.index().map_or(0, |t| self.teams[t].milk)
    }

    /// The team that has resigned, if any.
    #[must_use]
    pub const fn resigned(&self) -> Option<Team> {
        self.resigned
    }

    /// The full signal log so far.
    #[must_use]
    pub fn log(&self) -> &[Signal] {
        &self.log
    }

    /// Whether a tile can receive a materializing spawn.
    #[must_use]
    pub fn spawn_site_free(&self, loc: MapLocation) -> bool {
        self.map.on_map(loc) && self.terrain_at(loc).is_passable() && !self.is_occupied(loc)
    }

    // ---------------------------------------------------------------
    // Mutation. `commit` is the only entry point; it is invoked by the
    // action resolver, by `finish_round`, and by the replay driver.
    // ---------------------------------------------------------------

    /// Reserve the next robot id.
    pub fn allocate_id(&mut self) -> RobotId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Write a team-memory slot, applying `mask` to select bits.
    ///
    /// Direct state, not a signal: team memory is invisible to the
    /// battlefield and only handed to the persistence collaborator at
    /// match end.
    ///
    /// # Errors
    ///
    /// Returns the fatal [`EngineError::TeamMemoryIndex`] on an
    /// out-of-range index.
    pub fn write_team_memory(
        &mut self,
        team: Team,
        index: usize,
        value: i64,
        mask: i64,
    ) -> Result<(), EngineError> {
        if index >= TEAM_MEMORY_LENGTH {
            return Err(EngineError::TeamMemoryIndex {
                index,
                len: TEAM_MEMORY_LENGTH,
            });
        }
        if let Some(t) = team.index() {
            let slot = &mut self.teams[t].memory[index];
            *slot = (*slot & !mask) | (value & mask);
        }
        Ok(())
    }

    /// Set a robot's debug control bits. Client boundary; not part of
    /// the signal log.
    pub fn set_control_bits(&mut self, id: RobotId, bits: u64) {
        if let Some(r) = self.robots.get_mut(&id) {
            r.control_bits = bits;
        }
    }

    /// Charge bytecodes against a robot's per-round counter.
    pub fn charge_bytecodes(&mut self, id: RobotId, amount: u32) {
        if let Some(r) = self.robots.get_mut(&id) {
            r.bytecodes_used = r.bytecodes_used.saturating_add(amount);
        }
    }

    /// Append a signal to the log and apply its state transition.
    pub fn commit(&mut self, signal: Signal) {
        self.log.push(signal.clone());
        self.apply(&signal);
    }

    /// Finish the current round: materialize queued spawns, commit the
    /// round boundary, then convert finished constructions. Each
    /// deferred effect is its own signal so the log alone replays the
    /// boundary.
    pub fn finish_round(&mut self) {
        let queued: Vec<RobotId> = self.pending_spawns.iter().map(|p| p.id).collect();
        for id in queued {
            let free = self
                .pending_spawns
                .iter()
                .find(|p| p.id == id)
                .is_some_and(|p| self.spawn_site_free(p.loc));
            // A spawn whose tile was taken since queueing is dropped.
            if free {
                self.commit(Signal::RobotSpawned { id });
            }
        }

        let round = self.round;
        self.commit(Signal::RoundEnd { round });

        let done: Vec<(RobotId, RobotType)> = self
            .robots
            .values()
            .filter_map(|r| match r.construction {
                Construction::InProgress { target, rounds_left: 0 } => Some((r.id, target)),
                _ => None,
            })
            .collect();
        for (robot, target) in done {
            self.commit(Signal::ConstructDone { robot, target });
        }
    }

    /// Apply one signal's state transition.
    ///
    /// Payloads are self-describing; a signal referencing a robot that
    /// no longer exists is a no-op here and surfaces as a corrupt-state
    /// invariant violation instead.
    #[allow(clippy::too_many_lines)]
    fn apply(&mut self, signal: &Signal) {
        match signal {
            Signal::Movement {
                robot,
                new_loc,
                forward: _,
                style: _,
                delay,
            } => {
                if let Some(r) = self.robots.get_mut(robot) {
                    let old = r.location;
                    if let Some(dir) = old.direction_to(*new_loc) {
                        r.facing = dir;
                    }
                    r.location = *new_loc;
                    r.cooldown = *delay;
                    self.occupancy.remove(&old);
                    self.occupancy.insert(*new_loc, *robot);
                }
            }
            Signal::Attack {
                robot,
                target,
                damage,
            } => {
                self.map.scatter_cows(*target);
                if let Some(r) = self.robots.get_mut(robot) {
                    r.cooldown = r.robot_type.attack_delay();
                }
                if *damage > 0
                    && let Some(&victim) = self.occupancy.get(target)
                    && let Some(v) = self.robots.get_mut(&victim)
                {
                    v.take_damage(*damage);
                }
            }
            Signal::Broadcast {
                robot,
                team,
                channel,
                data,
            } => {
                if let Some(t) = team.index() {
                    self.teams[t].pending.insert(*channel, *data);
                }
                if !self.broadcasters.contains(robot) {
                    self.broadcasters.push(*robot);
                }
            }
            Signal::ConstructBegin {
                robot,
                target,
                rounds,
            } => {
                if let Some(r) = self.robots.get_mut(robot) {
                    r.construction = Construction::InProgress {
                        target: *target,
                        rounds_left: *rounds,
                    };
                    r.cooldown = *rounds;
                }
            }
            Signal::ConstructDone { robot, target } => {
                if let Some(r) = self.robots.get_mut(robot) {
                    r.robot_type = *target;
                    r.health = target.max_health();
                    r.construction = Construction::Idle;
                    r.cooldown = 0;
                }
            }
            Signal::SpawnQueued {
                parent,
                id,
                robot_type,
                team,
                loc,
            } => {
                if let Some(p) = self.robots.get_mut(parent) {
                    p.cooldown = crate::game::constants::HQ_SPAWN_DELAY;
                }
                // Keep the id counter ahead of replayed reservations so
                // play can continue from a rebuilt world.
                self.next_id = self.next_id.max(*id + 1);
                self.pending_spawns.push(PendingSpawn {
                    id: *id,
                    robot_type: *robot_type,
                    team: *team,
                    loc: *loc,
                });
            }
            Signal::RobotSpawned { id } => {
                if let Some(pos) = self.pending_spawns.iter().position(|p| p.id == *id) {
                    let p = self.pending_spawns.remove(pos);
                    if self.spawn_site_free(p.loc) {
                        let record = RobotRecord::new(p.id, p.robot_type, p.team, p.loc);
                        self.occupancy.insert(p.loc, p.id);
                        self.robots.insert(p.id, record);
                    }
                }
            }
            Signal::Death { robot } => {
                if let Some(r) = self.robots.remove(robot) {
                    self.occupancy.remove(&r.location);
                }
            }
            Signal::SelfDestruct { robot, loc, damage } => {
                if let Some(r) = self.robots.remove(robot) {
                    self.occupancy.remove(&r.location);
                }
                self.map.scatter_cows(*loc);
                let victims: Vec<RobotId> = self
                    .robots
                    .values()
                    .filter(|r| {
                        r.location.distance_squared_to(*loc)
                            <= crate::game::constants::SELF_DESTRUCT_RADIUS_SQUARED
                    })
                    .map(|r| r.id)
                    .collect();
                for victim in victims {
                    if let Some(v) = self.robots.get_mut(&victim) {
                        v.take_damage(*damage);
                    }
                }
            }
            Signal::Resign { team } => {
                self.resigned = Some(*team);
                let ids: Vec<RobotId> = self
                    .robots
                    .values()
                    .filter(|r| r.team == *team)
                    .map(|r| r.id)
                    .collect();
                for id in ids {
                    if let Some(r) = self.robots.remove(&id) {
                        self.occupancy.remove(&r.location);
                    }
                }
            }
            Signal::Indicator {
                robot,
                index,
                value,
            } => {
                if let Some(r) = self.robots.get_mut(robot)
                    && let Some(slot) = r.indicator_strings.get_mut(*index)
                {
                    *slot = value.clone();
                }
            }
            Signal::MatchObservation { .. } => {
                // Log-only: recorded for the match file, no state change.
            }
            Signal::RoundEnd { .. } => self.apply_round_end(),
        }
    }

    /// The deferred commit phase, in fixed order.
    fn apply_round_end(&mut self) {
        // 1. Broadcast writes become readable.
        for team in &mut self.teams {
            let pending = std::mem::take(&mut team.pending);
            for (channel, data) in pending {
                if let Some(slot) = team.committed.get_mut(channel) {
                    *slot = data;
                }
            }
        }
        // 2. Rotate the broadcasting-robots snapshot.
        self.broadcasters_last_round = std::mem::take(&mut self.broadcasters);
        // 3. Stale queued spawns (site taken) are dropped.
        self.pending_spawns.clear();
        // 4. Cows grow, then pastrs herd them into milk.
        self.map.grow_cows();
        let herds: Vec<(usize, MapLocation)> = self
            .robots
            .values()
            .filter(|r| r.robot_type == RobotType::Pastr)
            .filter_map(|r| r.team.index().map(|t| (t, r.location)))
            .collect();
        for (team_idx, pastr_loc) in herds {
            let herded: u64 = self
                .map
                .locations()
                .filter(|loc| loc.distance_squared_to(pastr_loc) <= PASTR_HERD_RADIUS_SQUARED)
                .map(|loc| u64::from(self.map.cows_at(loc)))
                .sum();
            self.teams[team_idx].milk += herded;
        }
        // 5. Per-robot round tick.
        for r in self.robots.values_mut() {
            r.shields = r.shields.saturating_sub(SHIELD_DECAY);
            r.cooldown = r.cooldown.saturating_sub(1);
            r.bytecodes_used = 0;
            if let Construction::InProgress { target, rounds_left } = r.construction
                && rounds_left > 0
            {
                r.construction = Construction::InProgress {
                    target,
                    rounds_left: rounds_left - 1,
                };
            }
        }
        // 6. Advance the round counter.
        self.round += 1;
    }
}
