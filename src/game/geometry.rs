//! Locations and directions.

use serde::{Deserialize, Serialize};

/// A location on the battlefield grid.
///
/// Coordinates are signed so that stepping off the map edge is
/// representable; the map itself decides what is in bounds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MapLocation {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row).
    pub y: i32,
}

impl MapLocation {
    /// Create a new location.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another location.
    ///
    /// All range checks in the engine compare squared distances so that
    /// no floating-point arithmetic is involved.
    #[must_use]
    pub const fn distance_squared_to(self, other: MapLocation) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx * dx + dy * dy
    }

    /// The location one step in the given direction.
    #[must_use]
    pub const fn add(self, dir: Direction) -> MapLocation {
        let (dx, dy) = dir.delta();
        MapLocation::new(self.x + dx, self.y + dy)
    }

    /// Whether another location is within one king-move step.
    #[must_use]
    pub const fn is_adjacent_to(self, other: MapLocation) -> bool {
        let d = self.distance_squared_to(other);
        d > 0 && d <= 2
    }

    /// The direction pointing most closely toward another location,
    /// or `None` when the locations coincide.
    #[must_use]
    pub fn direction_to(self, other: MapLocation) -> Option<Direction> {
        if self == other {
            return None;
        }
        let dx = (other.x - self.x).signum();
        let dy = (other.y - self.y).signum();
        Direction::ALL.iter().copied().find(|d| d.delta() == (dx, dy))
    }
}

/// One of the eight compass directions a robot can move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Decreasing y.
    North,
    /// Increasing x, decreasing y.
    NorthEast,
    /// Increasing x.
    East,
    /// Increasing x and y.
    SouthEast,
    /// Increasing y.
    South,
    /// Decreasing x, increasing y.
    SouthWest,
    /// Decreasing x.
    West,
    /// Decreasing x and y.
    NorthWest,
}

impl Direction {
    /// All eight directions in clockwise order starting north.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// The (dx, dy) step for this direction.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    /// The direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::South => Direction::North,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }

    /// Whether this direction steps diagonally.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }
}
