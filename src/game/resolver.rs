//! Action resolution: the legality and effect rules for each action.
//!
//! Every entry point is validate-then-commit. Validation failures
//! return a typed [`ActionError`] and leave the world untouched; a
//! successful action commits one or more signals and nothing else.

use crate::error::{ActionError, ActionResult};
use crate::game::constants::{
    CHANNEL_COUNT, DIAGONAL_DELAY_PENALTY, ROAD_DELAY_BONUS,
    SELF_DESTRUCT_BASE_DAMAGE, SELF_DESTRUCT_HEALTH_DIVISOR, SELF_DESTRUCT_RADIUS_SQUARED,
};
use crate::game::{
    Construction, Direction, MapLocation, MovementStyle, RobotId, RobotType, Signal, TerrainTile,
    World,
};

/// Movement delay for one step, from the per-type table adjusted for
/// diagonals and roads. Never less than one round.
#[must_use]
pub fn movement_delay(
    robot_type: RobotType,
    style: MovementStyle,
    dir: Direction,
    destination: TerrainTile,
) -> u32 {
    let base = match style {
        MovementStyle::Run => robot_type.move_delay(),
        MovementStyle::Sneak => robot_type.sneak_delay(),
    };
    let mut delay = base;
    if dir.is_diagonal() {
        delay += DIAGONAL_DELAY_PENALTY;
    }
    if destination == TerrainTile::Road {
        delay = delay.saturating_sub(ROAD_DELAY_BONUS);
    }
    delay.max(1)
}

/// Move or sneak one step in a direction.
///
/// # Errors
///
/// `RoleNotPermitted` for immobile types, `NotActive` under cooldown,
/// `CannotMoveThere` when the destination is off-map, impassable, or
/// occupied.
pub fn attempt_move(
    world: &mut World,
    id: RobotId,
    dir: Direction,
    style: MovementStyle,
) -> ActionResult<()> {
    let robot = world.robot(id).ok_or(ActionError::NoRobotThere)?;
    if !robot.robot_type.can_move() {
        return Err(ActionError::RoleNotPermitted);
    }
    if !robot.is_active() {
        return Err(ActionError::NotActive);
    }
    let destination = robot.location.add(dir);
    let terrain = world.terrain_at(destination);
    if !world.map().on_map(destination) || !terrain.is_passable() || world.is_occupied(destination)
    {
        return Err(ActionError::CannotMoveThere);
    }
    let delay = movement_delay(robot.robot_type, style, dir, terrain);
    let forward = dir != robot.facing.opposite();
    world.commit(Signal::Movement {
        robot: id,
        new_loc: destination,
        forward,
        style,
        delay,
    });
    Ok(())
}

/// Attack a location. `light` selects the zero-damage pulse that only
/// noise towers may fire; normal attacks deal the type's damage to any
/// occupant and both kinds scare cows off the target tile.
///
/// A victim reduced to zero health gets exactly one death signal and
/// is removed.
///
/// # Errors
///
/// `RoleNotPermitted` for non-attacking types or a light pulse from
/// anything but a noise tower, `NotActive` under cooldown, `OffMap`
/// for targets outside the map, `OutOfAttackRange` beyond the type's
/// attack radius.
pub fn attempt_attack(
    world: &mut World,
    id: RobotId,
    target: MapLocation,
    light: bool,
) -> ActionResult<()> {
    let robot = world.robot(id).ok_or(ActionError::NoRobotThere)?;
    let Some(radius_squared) = robot.robot_type.attack_radius_squared() else {
        return Err(ActionError::RoleNotPermitted);
    };
    if light && robot.robot_type != RobotType::NoiseTower {
        return Err(ActionError::RoleNotPermitted);
    }
    if !robot.is_active() {
        return Err(ActionError::NotActive);
    }
    if !world.map().on_map(target) {
        return Err(ActionError::OffMap);
    }
    if robot.location.distance_squared_to(target) > radius_squared {
        return Err(ActionError::OutOfAttackRange);
    }
    let damage = if light { 0 } else { robot.robot_type.attack_damage() };
    world.commit(Signal::Attack {
        robot: id,
        target,
        damage,
    });
    let dead = world
        .robot_at(target)
        .filter(|r| r.health == 0)
        .map(|r| r.id);
    if let Some(victim) = dead {
        world.commit(Signal::Death { robot: victim });
    }
    Ok(())
}

/// Buffer a broadcast write on the robot's team channel set.
///
/// # Errors
///
/// `ChannelOutOfRange` when the channel index exceeds the bound.
pub fn attempt_broadcast(
    world: &mut World,
    id: RobotId,
    channel: usize,
    data: i32,
) -> ActionResult<()> {
    let robot = world.robot(id).ok_or(ActionError::NoRobotThere)?;
    if channel >= CHANNEL_COUNT {
        return Err(ActionError::ChannelOutOfRange);
    }
    let team = robot.team;
    world.commit(Signal::Broadcast {
        robot: id,
        team,
        channel,
        data,
    });
    Ok(())
}

/// Queue the spawn of a new robot adjacent to an HQ. The robot
/// materializes at the round boundary and is scheduled from the next
/// round on.
///
/// # Errors
///
/// `RoleNotPermitted` unless the actor is an HQ, `NotActive` under
/// cooldown, `CannotMoveThere` when the adjacent tile is off-map,
/// impassable, or occupied.
pub fn attempt_spawn(
    world: &mut World,
    id: RobotId,
    dir: Direction,
    robot_type: RobotType,
) -> ActionResult<()> {
    let robot = world.robot(id).ok_or(ActionError::NoRobotThere)?;
    if !robot.robot_type.can_spawn() {
        return Err(ActionError::RoleNotPermitted);
    }
    if !robot.is_active() {
        return Err(ActionError::NotActive);
    }
    let loc = robot.location.add(dir);
    if !world.spawn_site_free(loc) {
        return Err(ActionError::CannotMoveThere);
    }
    let team = robot.team;
    let spawned = world.allocate_id();
    world.commit(Signal::SpawnQueued {
        parent: id,
        id: spawned,
        robot_type,
        team,
        loc,
    });
    Ok(())
}

/// Begin converting a soldier into a structure on its current tile.
///
/// # Errors
///
/// `RoleNotPermitted` for non-constructing types, `NotActive` under
/// cooldown, `AlreadyConstructing` when a countdown is running,
/// `NotAStructure` when the target type cannot be built.
pub fn attempt_construct(world: &mut World, id: RobotId, target: RobotType) -> ActionResult<()> {
    let robot = world.robot(id).ok_or(ActionError::NoRobotThere)?;
    if !robot.robot_type.can_construct() {
        return Err(ActionError::RoleNotPermitted);
    }
    if !robot.is_active() {
        return Err(ActionError::NotActive);
    }
    if robot.construction != Construction::Idle {
        return Err(ActionError::AlreadyConstructing);
    }
    let Some(rounds) = target.construction_rounds() else {
        return Err(ActionError::NotAStructure);
    };
    world.commit(Signal::ConstructBegin {
        robot: id,
        target,
        rounds,
    });
    Ok(())
}

/// Remove the acting robot and damage everything in blast range.
/// Damage is a flat base plus half the actor's remaining health.
///
/// # Errors
///
/// `RoleNotPermitted` for the HQ, which may not destroy itself.
pub fn attempt_self_destruct(world: &mut World, id: RobotId) -> ActionResult<()> {
    let robot = world.robot(id).ok_or(ActionError::NoRobotThere)?;
    if robot.robot_type == RobotType::Hq {
        return Err(ActionError::RoleNotPermitted);
    }
    let loc = robot.location;
    let damage = SELF_DESTRUCT_BASE_DAMAGE + robot.health / SELF_DESTRUCT_HEALTH_DIVISOR;
    world.commit(Signal::SelfDestruct {
        robot: id,
        loc,
        damage,
    });
    let dead: Vec<RobotId> = world
        .robots_in_radius(loc, SELF_DESTRUCT_RADIUS_SQUARED, None, None)
        .iter()
        .filter(|r| r.health == 0)
        .map(|r| r.id)
        .collect();
    for victim in dead {
        world.commit(Signal::Death { robot: victim });
    }
    Ok(())
}

/// Kill the acting robot. Never fails; a dead actor is a no-op.
pub fn attempt_suicide(world: &mut World, id: RobotId) {
    if world.robot(id).is_some() {
        world.commit(Signal::Death { robot: id });
    }
}

/// Concede the match for the acting robot's team. Never fails.
pub fn attempt_resign(world: &mut World, id: RobotId) {
    if let Some(team) = world.robot(id).map(|r| r.team) {
        world.commit(Signal::Resign { team });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::TEAM_MEMORY_LENGTH;
    use crate::game::{Construction, GameMap, Placement, Team};

    fn world_with_soldier() -> World {
        let map = GameMap::new(10, 10).unwrap();
        let placements = [
            Placement {
                robot_type: RobotType::Hq,
                team: Team::A,
                loc: MapLocation::new(0, 0),
            },
            Placement {
                robot_type: RobotType::Hq,
                team: Team::B,
                loc: MapLocation::new(9, 9),
            },
            Placement {
                robot_type: RobotType::Soldier,
                team: Team::A,
                loc: MapLocation::new(2, 2),
            },
        ];
        World::new(map, &placements, [[0; TEAM_MEMORY_LENGTH]; 2]).unwrap()
    }

    const SOLDIER: RobotId = 3;

    #[test]
    fn test_move_east_onto_empty_tile() {
        let mut world = world_with_soldier();
        attempt_move(&mut world, SOLDIER, Direction::East, MovementStyle::Run).unwrap();
        let r = world.robot(SOLDIER).unwrap();
        assert_eq!(r.location, MapLocation::new(3, 2));
        assert_eq!(r.cooldown, RobotType::Soldier.move_delay());
        assert!(matches!(
            world.log().last(),
            Some(Signal::Movement { forward: true, .. })
        ));
    }

    #[test]
    fn test_move_onto_occupied_tile_fails_without_signal() {
        let mut world = world_with_soldier();
        let id = world.allocate_id();
        world.commit(Signal::SpawnQueued {
            parent: 1,
            id,
            robot_type: RobotType::Soldier,
            team: Team::B,
            loc: MapLocation::new(3, 2),
        });
        world.finish_round();
        let log_len = world.log().len();

        let err = attempt_move(&mut world, SOLDIER, Direction::East, MovementStyle::Run);
        assert_eq!(err, Err(ActionError::CannotMoveThere));
        assert_eq!(world.robot(SOLDIER).unwrap().location, MapLocation::new(2, 2));
        assert_eq!(world.robot(SOLDIER).unwrap().cooldown, 0);
        assert_eq!(world.log().len(), log_len);
    }

    #[test]
    fn test_move_into_void_fails() {
        let mut world = world_with_soldier();
        let mut map = world.map().clone();
        map.set_terrain(MapLocation::new(3, 2), TerrainTile::Void);
        // Rebuild with the void tile in place.
        let placements = [
            Placement {
                robot_type: RobotType::Hq,
                team: Team::A,
                loc: MapLocation::new(0, 0),
            },
            Placement {
                robot_type: RobotType::Hq,
                team: Team::B,
                loc: MapLocation::new(9, 9),
            },
            Placement {
                robot_type: RobotType::Soldier,
                team: Team::A,
                loc: MapLocation::new(2, 2),
            },
        ];
        world = World::new(map, &placements, [[0; TEAM_MEMORY_LENGTH]; 2]).unwrap();
        assert_eq!(
            attempt_move(&mut world, SOLDIER, Direction::East, MovementStyle::Run),
            Err(ActionError::CannotMoveThere)
        );
    }

    #[test]
    fn test_move_requires_active() {
        let mut world = world_with_soldier();
        attempt_move(&mut world, SOLDIER, Direction::East, MovementStyle::Run).unwrap();
        assert_eq!(
            attempt_move(&mut world, SOLDIER, Direction::East, MovementStyle::Run),
            Err(ActionError::NotActive)
        );
    }

    #[test]
    fn test_hq_cannot_move() {
        let mut world = world_with_soldier();
        assert_eq!(
            attempt_move(&mut world, 1, Direction::East, MovementStyle::Run),
            Err(ActionError::RoleNotPermitted)
        );
    }

    #[test]
    fn test_sneak_charges_sneak_delay() {
        let mut world = world_with_soldier();
        attempt_move(&mut world, SOLDIER, Direction::East, MovementStyle::Sneak).unwrap();
        assert_eq!(
            world.robot(SOLDIER).unwrap().cooldown,
            RobotType::Soldier.sneak_delay()
        );
    }

    #[test]
    fn test_diagonal_move_slower() {
        let mut world = world_with_soldier();
        attempt_move(&mut world, SOLDIER, Direction::SouthEast, MovementStyle::Run).unwrap();
        assert_eq!(
            world.robot(SOLDIER).unwrap().cooldown,
            RobotType::Soldier.move_delay() + DIAGONAL_DELAY_PENALTY
        );
    }

    #[test]
    fn test_road_speeds_movement() {
        let delay = movement_delay(
            RobotType::Soldier,
            MovementStyle::Run,
            Direction::East,
            TerrainTile::Road,
        );
        assert_eq!(delay, RobotType::Soldier.move_delay() - ROAD_DELAY_BONUS);
        // Delay never drops below one round.
        let min = movement_delay(
            RobotType::Soldier,
            MovementStyle::Run,
            Direction::East,
            TerrainTile::Road,
        );
        assert!(min >= 1);
    }

    #[test]
    fn test_backward_move_clears_forward_flag() {
        let mut world = world_with_soldier();
        attempt_move(&mut world, SOLDIER, Direction::East, MovementStyle::Run).unwrap();
        world.finish_round();
        world.finish_round();
        attempt_move(&mut world, SOLDIER, Direction::West, MovementStyle::Run).unwrap();
        assert!(matches!(
            world.log().last(),
            Some(Signal::Movement { forward: false, .. })
        ));
    }

    #[test]
    fn test_attack_kills_and_emits_single_death() {
        let mut world = world_with_soldier();
        // Wound a fresh enemy soldier next to ours.
        let id = world.allocate_id();
        world.commit(Signal::SpawnQueued {
            parent: 2,
            id,
            robot_type: RobotType::Soldier,
            team: Team::B,
            loc: MapLocation::new(3, 2),
        });
        world.finish_round();
        // 100 health; nine soldier hits of 10 leave 10, the tenth kills.
        for _ in 0..9 {
            attempt_attack(&mut world, SOLDIER, MapLocation::new(3, 2), false).unwrap();
            // Clear attacker cooldown between swings.
            while !world.robot(SOLDIER).unwrap().is_active() {
                world.finish_round();
            }
        }
        assert_eq!(world.robot(id).unwrap().health, 10);
        attempt_attack(&mut world, SOLDIER, MapLocation::new(3, 2), false).unwrap();
        assert!(world.robot(id).is_none());
        let deaths = world
            .log()
            .iter()
            .filter(|s| matches!(s, Signal::Death { robot } if *robot == id))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_attack_out_of_range() {
        let mut world = world_with_soldier();
        assert_eq!(
            attempt_attack(&mut world, SOLDIER, MapLocation::new(9, 9), false),
            Err(ActionError::OutOfAttackRange)
        );
    }

    #[test]
    fn test_attack_empty_tile_scares_cows() {
        let mut world = world_with_soldier();
        let map = {
            let mut m = world.map().clone();
            m.set_cow_growth(MapLocation::new(3, 2), 5);
            m
        };
        let placements = [
            Placement {
                robot_type: RobotType::Hq,
                team: Team::A,
                loc: MapLocation::new(0, 0),
            },
            Placement {
                robot_type: RobotType::Hq,
                team: Team::B,
                loc: MapLocation::new(9, 9),
            },
            Placement {
                robot_type: RobotType::Soldier,
                team: Team::A,
                loc: MapLocation::new(2, 2),
            },
        ];
        world = World::new(map, &placements, [[0; TEAM_MEMORY_LENGTH]; 2]).unwrap();
        world.finish_round();
        assert_eq!(world.cows_at(MapLocation::new(3, 2)), 5);
        attempt_attack(&mut world, SOLDIER, MapLocation::new(3, 2), false).unwrap();
        assert_eq!(world.cows_at(MapLocation::new(3, 2)), 0);
    }

    #[test]
    fn test_light_attack_soldier_forbidden() {
        let mut world = world_with_soldier();
        assert_eq!(
            attempt_attack(&mut world, SOLDIER, MapLocation::new(3, 2), true),
            Err(ActionError::RoleNotPermitted)
        );
    }

    #[test]
    fn test_pastr_cannot_attack() {
        let mut world = world_with_soldier();
        attempt_construct(&mut world, SOLDIER, RobotType::Pastr).unwrap();
        for _ in 0..RobotType::Pastr.construction_rounds().unwrap() {
            world.finish_round();
        }
        assert_eq!(world.robot(SOLDIER).unwrap().robot_type, RobotType::Pastr);
        assert_eq!(
            attempt_attack(&mut world, SOLDIER, MapLocation::new(2, 3), false),
            Err(ActionError::RoleNotPermitted)
        );
    }

    #[test]
    fn test_broadcast_channel_bound() {
        let mut world = world_with_soldier();
        assert_eq!(
            attempt_broadcast(&mut world, SOLDIER, CHANNEL_COUNT, 1),
            Err(ActionError::ChannelOutOfRange)
        );
        attempt_broadcast(&mut world, SOLDIER, CHANNEL_COUNT - 1, 1).unwrap();
    }

    #[test]
    fn test_spawn_role_and_site_rules() {
        let mut world = world_with_soldier();
        assert_eq!(
            attempt_spawn(&mut world, SOLDIER, Direction::East, RobotType::Soldier),
            Err(ActionError::RoleNotPermitted)
        );
        // Off-map site from the corner HQ.
        assert_eq!(
            attempt_spawn(&mut world, 1, Direction::NorthWest, RobotType::Soldier),
            Err(ActionError::CannotMoveThere)
        );
        attempt_spawn(&mut world, 1, Direction::SouthEast, RobotType::Soldier).unwrap();
        // Spawning charges the HQ a cooldown.
        assert!(!world.robot(1).unwrap().is_active());
        assert_eq!(
            attempt_spawn(&mut world, 1, Direction::South, RobotType::Soldier),
            Err(ActionError::NotActive)
        );
    }

    #[test]
    fn test_construct_rules() {
        let mut world = world_with_soldier();
        assert_eq!(
            attempt_construct(&mut world, 1, RobotType::Pastr),
            Err(ActionError::RoleNotPermitted)
        );
        assert_eq!(
            attempt_construct(&mut world, SOLDIER, RobotType::Soldier),
            Err(ActionError::NotAStructure)
        );
        attempt_construct(&mut world, SOLDIER, RobotType::NoiseTower).unwrap();
        assert!(matches!(
            world.robot(SOLDIER).unwrap().construction,
            Construction::InProgress { .. }
        ));
        // Cooldown covers the whole countdown, so a second construct
        // reports NotActive first.
        assert_eq!(
            attempt_construct(&mut world, SOLDIER, RobotType::Pastr),
            Err(ActionError::NotActive)
        );
    }

    #[test]
    fn test_self_destruct_damage_formula() {
        let mut world = world_with_soldier();
        let id = world.allocate_id();
        world.commit(Signal::SpawnQueued {
            parent: 2,
            id,
            robot_type: RobotType::Soldier,
            team: Team::B,
            loc: MapLocation::new(2, 3),
        });
        world.finish_round();

        let health = world.robot(SOLDIER).unwrap().health;
        let expected = SELF_DESTRUCT_BASE_DAMAGE + health / SELF_DESTRUCT_HEALTH_DIVISOR;
        attempt_self_destruct(&mut world, SOLDIER).unwrap();
        assert!(world.robot(SOLDIER).is_none());
        assert_eq!(
            world.robot(id).unwrap().health,
            RobotType::Soldier.max_health() - expected
        );
    }

    #[test]
    fn test_hq_may_not_self_destruct() {
        let mut world = world_with_soldier();
        assert_eq!(
            attempt_self_destruct(&mut world, 1),
            Err(ActionError::RoleNotPermitted)
        );
    }

    #[test]
    fn test_suicide_and_resign_never_fail() {
        let mut world = world_with_soldier();
        attempt_suicide(&mut world, SOLDIER);
        assert!(world.robot(SOLDIER).is_none());
        // Second suicide of a dead robot is a no-op.
        attempt_suicide(&mut world, SOLDIER);

        attempt_resign(&mut world, 2);
        assert_eq!(world.resigned(), Some(Team::B));
        assert!(world.robot(2).is_none());
    }
}
