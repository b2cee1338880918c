//! The built-in demo map and scripted demo teams.
//!
//! The demo world is fixed, so a saved signal log replays against it
//! without shipping the map alongside the recording.

use stampede::game::constants::TEAM_MEMORY_LENGTH;
use stampede::{
    Controller, Direction, GameMap, MapLocation, Placement, ProgramFactory, RobotType, Team,
    TerrainTile, World,
};

use super::{CliError, Strategy};

/// The fixed demo arena: a road belt across the middle, a broken void
/// wall, and one cow cluster in each team's half.
pub(crate) fn demo_world() -> Result<World, CliError> {
    let mut map = GameMap::new(20, 14)
        .ok_or_else(|| CliError::new("demo map dimensions invalid"))?;

    for x in 0..20 {
        map.set_terrain(MapLocation::new(x, 6), TerrainTile::Road);
    }
    for y in 3..=10 {
        if y != 6 && y != 7 {
            map.set_terrain(MapLocation::new(10, y), TerrainTile::Void);
        }
    }

    map.set_cow_growth(MapLocation::new(4, 10), 8);
    map.set_cow_growth(MapLocation::new(5, 10), 6);
    map.set_cow_growth(MapLocation::new(4, 11), 6);
    map.set_cow_growth(MapLocation::new(15, 3), 8);
    map.set_cow_growth(MapLocation::new(14, 3), 6);
    map.set_cow_growth(MapLocation::new(15, 4), 6);

    let placements = [
        Placement {
            robot_type: RobotType::Hq,
            team: Team::A,
            loc: MapLocation::new(2, 2),
        },
        Placement {
            robot_type: RobotType::Hq,
            team: Team::B,
            loc: MapLocation::new(17, 11),
        },
    ];
    World::new(map, &placements, [[0; TEAM_MEMORY_LENGTH]; 2]).map_err(Into::into)
}

/// Build the program factory for one demo strategy.
pub(crate) fn factory(strategy: Strategy) -> ProgramFactory {
    match strategy {
        Strategy::Idle => Box::new(|_, _| Box::new(idle())),
        Strategy::Rush => Box::new(|robot_type, _| match robot_type {
            RobotType::Hq => Box::new(spawning_hq(u32::MAX)),
            _ => Box::new(rusher()),
        }),
        Strategy::Farm => {
            let mut soldiers = 0_u32;
            Box::new(move |robot_type, _| match robot_type {
                RobotType::Hq => Box::new(spawning_hq(2)),
                _ => {
                    soldiers += 1;
                    if soldiers == 1 {
                        Box::new(farmer())
                    } else {
                        Box::new(idle())
                    }
                }
            })
        }
    }
}

fn idle() -> impl FnMut(&mut Controller<'_>) {
    |rc| rc.yield_turn()
}

/// HQ brain: keep spawning soldiers until the cap, trying each
/// direction in the fixed compass order.
fn spawning_hq(limit: u32) -> impl FnMut(&mut Controller<'_>) {
    let mut spawned = 0_u32;
    move |rc| {
        if spawned < limit {
            for dir in Direction::ALL {
                if rc.spawn(dir, RobotType::Soldier).is_ok() {
                    spawned += 1;
                    break;
                }
            }
        }
        rc.yield_turn();
    }
}

/// Soldier brain: march at the enemy HQ, shoot it once in range, and
/// sidestep deterministically when the direct step is blocked.
fn rusher() -> impl FnMut(&mut Controller<'_>) {
    move |rc| {
        if let Ok(here) = rc.location()
            && let Ok(target) = rc.enemy_hq_location()
        {
            if rc.can_attack_square(target).unwrap_or(false) {
                let _ = rc.attack_square(target);
            } else if let Some(dir) = here.direction_to(target)
                && rc.move_in(dir).is_err()
            {
                for d in Direction::ALL {
                    if rc.move_in(d).is_ok() {
                        break;
                    }
                }
            }
        }
        rc.yield_turn();
    }
}

/// Soldier brain: walk to the richest cow tile and convert into a
/// pasture on it.
fn farmer() -> impl FnMut(&mut Controller<'_>) {
    let mut target: Option<MapLocation> = None;
    move |rc| {
        let Ok(here) = rc.location() else {
            return;
        };
        if target.is_none() {
            target = best_growth_tile(rc);
        }
        let Some(goal) = target else {
            rc.yield_turn();
            return;
        };
        if here == goal {
            let _ = rc.construct(RobotType::Pastr);
        } else if let Some(dir) = here.direction_to(goal)
            && rc.move_in(dir).is_err()
        {
            for d in Direction::ALL {
                if rc.move_in(d).is_ok() {
                    break;
                }
            }
        }
        rc.yield_turn();
    }
}

/// Scan the whole map for the passable tile with the highest cow
/// growth. Growth rates are global knowledge, so this costs queries
/// but never fails on range.
fn best_growth_tile(rc: &mut Controller<'_>) -> Option<MapLocation> {
    let (width, height) = rc.map_size().ok()?;
    let mut best: Option<(u32, MapLocation)> = None;
    for y in 0..height {
        for x in 0..width {
            let loc = MapLocation::new(x, y);
            let growth = rc.sense_cow_growth(loc).ok()?;
            if growth > 0
                && rc.sense_terrain(loc).ok()?.is_passable()
                && best.is_none_or(|(g, _)| growth > g)
            {
                best = Some((growth, loc));
            }
        }
    }
    best.map(|(_, loc)| loc)
}
