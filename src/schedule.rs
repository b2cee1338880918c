//! Match scheduling: the fixed-order round loop, program lifecycle,
//! yield refunds, and victory resolution.
//!
//! Each round every live robot gets one slot, ascending by id. A slot
//! hands the robot's program a metered [`Controller`]; when the program
//! returns or yields, the next robot runs. Robots queued for spawning
//! materialize at the round boundary and are scheduled from the next
//! round on.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::EngineError;
use crate::game::constants::{
    DEFAULT_MAX_ROUNDS, ROUND_BUDGET, TEAM_MEMORY_LENGTH, YIELD_REFUND_DIVISOR,
};
use crate::game::{Controller, RobotId, RobotType, Team, World, check_invariants};

/// A robot's brain. One instance exists per live robot and persists
/// across rounds, so programs can carry state between slots.
pub trait RobotProgram {
    /// Run one slot. The controller is dead after this returns.
    fn run(&mut self, rc: &mut Controller<'_>);
}

impl<F> RobotProgram for F
where
    F: FnMut(&mut Controller<'_>),
{
    fn run(&mut self, rc: &mut Controller<'_>) {
        self(rc);
    }
}

/// Builds a program for each robot a team fields, keyed by the
/// robot's kind at its first slot.
pub type ProgramFactory = Box<dyn FnMut(RobotType, RobotId) -> Box<dyn RobotProgram>>;

/// Tunable match parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchConfig {
    /// Hard round limit before the milk tiebreak decides.
    pub max_rounds: u32,
    /// Bytecode budget per robot per round.
    pub round_budget: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_budget: ROUND_BUDGET,
        }
    }
}

/// Final standing of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// Winning team, or `None` for a draw.
    pub winner: Option<Team>,
    /// Rounds played.
    pub rounds: u32,
    /// Milk scored per team, indexed A then B.
    pub milk: [u64; 2],
    /// Power refunded for unspent budget per team, indexed A then B.
    pub power_refunded: [u64; 2],
    /// Persistent team memory to carry into the next match.
    pub team_memory: [[i64; TEAM_MEMORY_LENGTH]; 2],
    /// Signals committed over the whole match.
    pub signals: usize,
}

/// Drives a match over a [`World`], owning the robot programs.
pub struct Scheduler {
    world: World,
    config: MatchConfig,
    programs: BTreeMap<RobotId, Box<dyn RobotProgram>>,
    factories: [ProgramFactory; 2],
    power_refunded: [u64; 2],
    breakpoint_requested: bool,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("round", &self.world.round())
            .field("config", &self.config)
            .field("programs", &self.programs.len())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Set up a match. Programs for the initial robots are created on
    /// their first slot, like any spawned robot's.
    #[must_use]
    pub fn new(
        world: World,
        config: MatchConfig,
        factory_a: ProgramFactory,
        factory_b: ProgramFactory,
    ) -> Self {
        Self {
            world,
            config,
            programs: BTreeMap::new(),
            factories: [factory_a, factory_b],
            power_refunded: [0; 2],
            breakpoint_requested: false,
        }
    }

    /// The world as it stands.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The configured parameters.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Power refunded so far, indexed A then B.
    #[must_use]
    pub const fn power_refunded(&self) -> [u64; 2] {
        self.power_refunded
    }

    /// Consume a pending debugger-pause request.
    pub fn take_breakpoint(&mut self) -> bool {
        std::mem::take(&mut self.breakpoint_requested)
    }

    /// Run one full round: every live robot's slot in ascending id
    /// order, then the boundary commit.
    ///
    /// # Errors
    ///
    /// Propagates fatal slot errors and promotes any structural
    /// invariant violation to [`EngineError::CorruptState`].
    pub fn run_round(&mut self) -> Result<(), EngineError> {
        for id in self.world.robot_ids() {
            let Some(record) = self.world.robot(id) else {
                // Killed earlier this round.
                continue;
            };
            let Some(team) = record.team.index() else {
                continue;
            };
            let robot_type = record.robot_type;
            let program = self
                .programs
                .entry(id)
                .or_insert_with(|| (self.factories[team])(robot_type, id));

            let mut rc = Controller::new(&mut self.world, id, self.config.round_budget);
            program.run(&mut rc);

            let fatal = rc.fatal().cloned();
            let yielded = rc.yielded();
            let remaining = rc.budget_remaining();
            if rc.breakpoint_requested() {
                self.breakpoint_requested = true;
            }
            if let Some(err) = fatal {
                return Err(err);
            }
            if yielded {
                self.power_refunded[team] += u64::from(remaining / YIELD_REFUND_DIVISOR);
            }
        }

        self.world.finish_round();
        self.programs.retain(|id, _| self.world.robot(*id).is_some());

        if let Some(violation) = check_invariants(&self.world, self.config.round_budget).first() {
            return Err(EngineError::CorruptState {
                detail: violation.to_string(),
            });
        }
        Ok(())
    }

    fn hq_alive(&self, team: Team) -> bool {
        self.world
            .robots()
            .any(|r| r.team == team && r.robot_type == RobotType::Hq)
    }

    fn milk_leader(&self) -> Option<Team> {
        match self.world.milk(Team::A).cmp(&self.world.milk(Team::B)) {
            Ordering::Greater => Some(Team::A),
            Ordering::Less => Some(Team::B),
            Ordering::Equal => None,
        }
    }

    /// Whether the match is already decided, and for whom. `None`
    /// means play on; `Some(None)` is a draw.
    #[must_use]
    pub fn decided(&self) -> Option<Option<Team>> {
        if let Some(resigned) = self.world.resigned() {
            return Some(Some(resigned.opponent()));
        }
        match (self.hq_alive(Team::A), self.hq_alive(Team::B)) {
            (true, true) => None,
            (true, false) => Some(Some(Team::A)),
            (false, true) => Some(Some(Team::B)),
            (false, false) => Some(self.milk_leader()),
        }
    }

    fn result(&self, winner: Option<Team>) -> MatchResult {
        MatchResult {
            winner,
            rounds: self.world.round(),
            milk: [self.world.milk(Team::A), self.world.milk(Team::B)],
            power_refunded: self.power_refunded,
            team_memory: [
                self.world.team_memory(Team::A),
                self.world.team_memory(Team::B),
            ],
            signals: self.world.log().len(),
        }
    }

    /// Play until somebody wins, both HQs fall, or the round limit
    /// triggers the milk tiebreak.
    ///
    /// # Errors
    ///
    /// Propagates the first fatal [`EngineError`] from any round.
    pub fn run_match(&mut self) -> Result<MatchResult, EngineError> {
        loop {
            if let Some(winner) = self.decided() {
                return Ok(self.result(winner));
            }
            if self.world.round() >= self.config.max_rounds {
                return Ok(self.result(self.milk_leader()));
            }
            self.run_round()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::QUERY_COST;
    use crate::game::{GameMap, MapLocation, Placement};

    fn placements(hq_a: MapLocation, hq_b: MapLocation) -> Vec<Placement> {
        vec![
            Placement {
                robot_type: RobotType::Hq,
                team: Team::A,
                loc: hq_a,
            },
            Placement {
                robot_type: RobotType::Hq,
                team: Team::B,
                loc: hq_b,
            },
        ]
    }

    fn idle_factory() -> ProgramFactory {
        Box::new(|_, _| Box::new(|rc: &mut Controller<'_>| rc.yield_turn()))
    }

    /// HQ spawns soldiers toward the enemy; soldiers march at the
    /// enemy HQ and shoot it once in range.
    fn rush_factory() -> ProgramFactory {
        Box::new(|robot_type, _| match robot_type {
            RobotType::Hq => Box::new(|rc: &mut Controller<'_>| {
                if let Ok(here) = rc.location()
                    && let Ok(target) = rc.enemy_hq_location()
                    && let Some(dir) = here.direction_to(target)
                {
                    let _ = rc.spawn(dir, RobotType::Soldier);
                }
                rc.yield_turn();
            }),
            _ => Box::new(|rc: &mut Controller<'_>| {
                if let Ok(here) = rc.location()
                    && let Ok(target) = rc.enemy_hq_location()
                {
                    if rc.can_attack_square(target).unwrap_or(false) {
                        let _ = rc.attack_square(target);
                    } else if let Some(dir) = here.direction_to(target) {
                        let _ = rc.move_in(dir);
                    }
                }
                rc.yield_turn();
            }),
        })
    }

    fn small_world() -> World {
        let map = GameMap::new(10, 10).unwrap();
        World::new(
            map,
            &placements(MapLocation::new(1, 1), MapLocation::new(8, 8)),
            [[0; TEAM_MEMORY_LENGTH]; 2],
        )
        .unwrap()
    }

    #[test]
    fn test_rush_beats_idle() {
        let mut scheduler = Scheduler::new(
            small_world(),
            MatchConfig::default(),
            rush_factory(),
            idle_factory(),
        );
        let result = scheduler.run_match().unwrap();
        assert_eq!(result.winner, Some(Team::A));
        assert!(result.rounds < DEFAULT_MAX_ROUNDS);
        assert_eq!(result.signals, scheduler.world().log().len());
    }

    #[test]
    fn test_idle_match_draws_at_round_limit() {
        let config = MatchConfig {
            max_rounds: 15,
            ..MatchConfig::default()
        };
        let mut scheduler =
            Scheduler::new(small_world(), config, idle_factory(), idle_factory());
        let result = scheduler.run_match().unwrap();
        assert_eq!(result.winner, None);
        assert_eq!(result.rounds, 15);
        assert_eq!(result.milk, [0, 0]);
    }

    #[test]
    fn test_milk_tiebreak_at_round_limit() {
        let mut map = GameMap::new(10, 10).unwrap();
        map.set_cow_growth(MapLocation::new(3, 3), 5);
        let mut p = placements(MapLocation::new(1, 1), MapLocation::new(8, 8));
        p.push(Placement {
            robot_type: RobotType::Soldier,
            team: Team::A,
            loc: MapLocation::new(3, 3),
        });
        let world = World::new(map, &p, [[0; TEAM_MEMORY_LENGTH]; 2]).unwrap();

        let pastr_factory: ProgramFactory = Box::new(|robot_type, _| match robot_type {
            RobotType::Soldier => Box::new(|rc: &mut Controller<'_>| {
                let _ = rc.construct(RobotType::Pastr);
                rc.yield_turn();
            }),
            _ => Box::new(|rc: &mut Controller<'_>| rc.yield_turn()),
        });

        let config = MatchConfig {
            max_rounds: 40,
            ..MatchConfig::default()
        };
        let mut scheduler = Scheduler::new(world, config, pastr_factory, idle_factory());
        let result = scheduler.run_match().unwrap();
        assert_eq!(result.winner, Some(Team::A));
        assert!(result.milk[0] > 0);
        assert_eq!(result.milk[1], 0);
    }

    #[test]
    fn test_resignation_ends_match_immediately() {
        let resign_factory: ProgramFactory =
            Box::new(|_, _| Box::new(|rc: &mut Controller<'_>| {
                let _ = rc.resign();
            }));
        let mut scheduler = Scheduler::new(
            small_world(),
            MatchConfig::default(),
            idle_factory(),
            resign_factory,
        );
        let result = scheduler.run_match().unwrap();
        assert_eq!(result.winner, Some(Team::A));
        assert_eq!(result.rounds, 1);
    }

    #[test]
    fn test_fatal_team_memory_write_aborts() {
        let bad_factory: ProgramFactory = Box::new(|_, _| {
            Box::new(|rc: &mut Controller<'_>| {
                let _ = rc.set_team_memory(TEAM_MEMORY_LENGTH, 1);
                rc.yield_turn();
            })
        });
        let mut scheduler = Scheduler::new(
            small_world(),
            MatchConfig::default(),
            bad_factory,
            idle_factory(),
        );
        let err = scheduler.run_match();
        assert!(matches!(err, Err(EngineError::TeamMemoryIndex { .. })));
    }

    #[test]
    fn test_yield_refunds_power() {
        let counting_factory: ProgramFactory = Box::new(|_, _| {
            Box::new(|rc: &mut Controller<'_>| {
                let _ = rc.location();
                rc.yield_turn();
            })
        });
        let config = MatchConfig {
            max_rounds: 4,
            ..MatchConfig::default()
        };
        let mut scheduler = Scheduler::new(
            small_world(),
            config,
            counting_factory,
            idle_factory(),
        );
        let result = scheduler.run_match().unwrap();
        let per_slot = u64::from((ROUND_BUDGET - QUERY_COST) / YIELD_REFUND_DIVISOR);
        assert_eq!(result.power_refunded[0], 4 * per_slot);
        let full_slot = u64::from(ROUND_BUDGET / YIELD_REFUND_DIVISOR);
        assert_eq!(result.power_refunded[1], 4 * full_slot);
    }

    #[test]
    fn test_team_memory_survives_into_result() {
        let memory_factory: ProgramFactory = Box::new(|_, _| {
            Box::new(|rc: &mut Controller<'_>| {
                let _ = rc.set_team_memory(0, 1234);
                rc.yield_turn();
            })
        });
        let config = MatchConfig {
            max_rounds: 3,
            ..MatchConfig::default()
        };
        let mut scheduler = Scheduler::new(
            small_world(),
            config,
            memory_factory,
            idle_factory(),
        );
        let result = scheduler.run_match().unwrap();
        assert_eq!(result.team_memory[0][0], 1234);
        assert_eq!(result.team_memory[1][0], 0);
    }

    #[test]
    fn test_identical_runs_produce_identical_logs() {
        let run = || {
            let mut scheduler = Scheduler::new(
                small_world(),
                MatchConfig {
                    max_rounds: 30,
                    ..MatchConfig::default()
                },
                rush_factory(),
                rush_factory(),
            );
            scheduler.run_match().unwrap();
            scheduler.world().log().to_vec()
        };
        assert_eq!(run(), run());
    }
}
