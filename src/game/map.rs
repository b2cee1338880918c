//! Terrain grid: static tiles plus the semi-static cow layer.

use serde::{Deserialize, Serialize};

use crate::game::constants::MAX_COWS_PER_TILE;
use crate::game::MapLocation;

/// Static terrain at one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TerrainTile {
    /// Plain passable ground.
    Normal = 0,
    /// Passable ground that speeds movement up.
    Road = 1,
    /// Impassable chasm.
    Void = 2,
}

impl TerrainTile {
    /// Whether robots may stand on this tile.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !matches!(self, TerrainTile::Void)
    }
}

/// The battlefield grid.
///
/// Terrain and cow growth are fixed at load time by the map-loading
/// collaborator; the current cow count per tile is the only layer the
/// engine mutates (growth at round boundaries, scattering on noise).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMap {
    /// Width in tiles.
    width: i32,
    /// Height in tiles.
    height: i32,
    /// Terrain in row-major order.
    terrain: Vec<TerrainTile>,
    /// Natural cow growth per tile per round, row-major.
    cow_growth: Vec<u32>,
    /// Current cow count per tile, row-major.
    cows: Vec<u32>,
}

impl GameMap {
    /// Create a map of normal terrain with no cow growth.
    ///
    /// Returns `None` if either dimension is zero or negative.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn new(width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        let size = (width as usize) * (height as usize);
        Some(Self {
            width,
            height,
            terrain: vec![TerrainTile::Normal; size],
            cow_growth: vec![0; size],
            cows: vec![0; size],
        })
    }

    /// Map width in tiles.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Map height in tiles.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Whether a location lies on the map.
    #[must_use]
    pub const fn on_map(&self, loc: MapLocation) -> bool {
        loc.x >= 0 && loc.y >= 0 && loc.x < self.width && loc.y < self.height
    }

    #[allow(clippy::cast_sign_loss)]
    fn index(&self, loc: MapLocation) -> Option<usize> {
        if self.on_map(loc) {
            Some((loc.y as usize) * (self.width as usize) + (loc.x as usize))
        } else {
            None
        }
    }

    /// Terrain at a location. Off-map locations read as [`TerrainTile::Void`].
    #[must_use]
    pub fn terrain_at(&self, loc: MapLocation) -> TerrainTile {
        self.index(loc)
            .map_or(TerrainTile::Void, |i| self.terrain[i])
    }

    /// Set terrain during world setup.
    ///
    /// Returns `false` if the location is off the map.
    pub fn set_terrain(&mut self, loc: MapLocation, tile: TerrainTile) -> bool {
        match self.index(loc) {
            Some(i) => {
                self.terrain[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Natural cow growth at a location; zero off the map.
    #[must_use]
    pub fn cow_growth_at(&self, loc: MapLocation) -> u32 {
        self.index(loc).map_or(0, |i| self.cow_growth[i])
    }

    /// Set cow growth during world setup.
    ///
    /// Returns `false` if the location is off the map.
    pub fn set_cow_growth(&mut self, loc: MapLocation, growth: u32) -> bool {
        match self.index(loc) {
            Some(i) => {
                self.cow_growth[i] = growth;
                true
            }
            None => false,
        }
    }

    /// Current cow count at a location; zero off the map.
    #[must_use]
    pub fn cows_at(&self, loc: MapLocation) -> u32 {
        self.index(loc).map_or(0, |i| self.cows[i])
    }

    /// Scare all cows off a tile. Off-map locations are ignored.
    pub fn scatter_cows(&mut self, loc: MapLocation) {
        if let Some(i) = self.index(loc) {
            self.cows[i] = 0;
        }
    }

    /// Grow cows on every tile by its natural growth, capped per tile.
    pub fn grow_cows(&mut self) {
        for (cows, growth) in self.cows.iter_mut().zip(&self.cow_growth) {
            *cows = (*cows + growth).min(MAX_COWS_PER_TILE);
        }
    }

    /// Iterate all locations in row-major order.
    #[must_use]
    pub fn locations(&self) -> impl Iterator<Item = MapLocation> + use<> {
        let width = self.width;
        let height = self.height;
        (0..height).flat_map(move |y| (0..width).map(move |x| MapLocation::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_creation() {
        let map = GameMap::new(10, 8).unwrap();
        assert_eq!(map.width(), 10);
        assert_eq!(map.height(), 8);
        assert!(GameMap::new(0, 5).is_none());
        assert!(GameMap::new(5, -1).is_none());
    }

    #[test]
    fn test_off_map_reads() {
        let map = GameMap::new(4, 4).unwrap();
        assert_eq!(map.terrain_at(MapLocation::new(-1, 0)), TerrainTile::Void);
        assert_eq!(map.terrain_at(MapLocation::new(4, 0)), TerrainTile::Void);
        assert_eq!(map.cows_at(MapLocation::new(99, 99)), 0);
        assert_eq!(map.cow_growth_at(MapLocation::new(-3, -3)), 0);
    }

    #[test]
    fn test_terrain_set_get() {
        let mut map = GameMap::new(4, 4).unwrap();
        let loc = MapLocation::new(2, 1);
        assert!(map.set_terrain(loc, TerrainTile::Void));
        assert_eq!(map.terrain_at(loc), TerrainTile::Void);
        assert!(!map.set_terrain(MapLocation::new(9, 9), TerrainTile::Road));
    }

    #[test]
    fn test_passability() {
        assert!(TerrainTile::Normal.is_passable());
        assert!(TerrainTile::Road.is_passable());
        assert!(!TerrainTile::Void.is_passable());
    }

    #[test]
    fn test_cow_growth_and_cap() {
        let mut map = GameMap::new(3, 3).unwrap();
        let loc = MapLocation::new(1, 1);
        map.set_cow_growth(loc, 400);

        map.grow_cows();
        assert_eq!(map.cows_at(loc), 400);
        map.grow_cows();
        assert_eq!(map.cows_at(loc), 800);
        map.grow_cows();
        assert_eq!(map.cows_at(loc), MAX_COWS_PER_TILE);
    }

    #[test]
    fn test_scatter_cows() {
        let mut map = GameMap::new(3, 3).unwrap();
        let loc = MapLocation::new(0, 2);
        map.set_cow_growth(loc, 7);
        map.grow_cows();
        assert_eq!(map.cows_at(loc), 7);

        map.scatter_cows(loc);
        assert_eq!(map.cows_at(loc), 0);

        // Off-map scatter is a no-op, not a panic.
        map.scatter_cows(MapLocation::new(-5, 0));
    }

    #[test]
    fn test_locations_row_major() {
        let map = GameMap::new(2, 2).unwrap();
        let locs: Vec<_> = map.locations().collect();
        assert_eq!(
            locs,
            vec![
                MapLocation::new(0, 0),
                MapLocation::new(1, 0),
                MapLocation::new(0, 1),
                MapLocation::new(1, 1),
            ]
        );
    }
}
