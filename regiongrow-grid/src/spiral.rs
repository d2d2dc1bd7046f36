//! Outward square spiral over the region grid.
//!
//! The walk starts at the origin and moves South (+z), West (-x),
//! North (-z), East (+x), walking two sides of each length before the side
//! length grows by one:
//!
//! ```text
//! (0,0) (0,1) (-1,1) (-1,0) (-1,-1) (0,-1) (1,-1) (1,0) (1,1) (1,2) ...
//! ```
//!
//! Every coordinate is visited exactly once and rings (Chebyshev distance
//! from the origin) are visited in non-decreasing order.

use crate::GridCoordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    South,
    West,
    North,
    East,
}

impl Direction {
    fn step(self) -> (i32, i32) {
        match self {
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::North => (0, -1),
            Direction::East => (1, 0),
        }
    }

    fn turn(self) -> Direction {
        match self {
            Direction::South => Direction::West,
            Direction::West => Direction::North,
            Direction::North => Direction::East,
            Direction::East => Direction::South,
        }
    }
}

/// Infinite iterator over the spiral, origin first.
#[derive(Debug, Clone)]
pub struct SpiralWalk {
    current: GridCoordinate,
    direction: Direction,
    side_length: u32,
    steps_on_side: u32,
    sides_done: u32,
    started: bool,
}

impl SpiralWalk {
    pub fn new() -> Self {
        Self {
            current: GridCoordinate::ORIGIN,
            direction: Direction::South,
            side_length: 1,
            steps_on_side: 0,
            sides_done: 0,
            started: false,
        }
    }
}

impl Default for SpiralWalk {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for SpiralWalk {
    type Item = GridCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some(self.current);
        }

        let (dx, dz) = self.direction.step();
        self.current = self.current.offset(dx, dz);
        self.steps_on_side += 1;

        if self.steps_on_side == self.side_length {
            self.steps_on_side = 0;
            self.direction = self.direction.turn();
            self.sides_done += 1;
            // Two sides per length.
            if self.sides_done % 2 == 0 {
                self.side_length += 1;
            }
        }

        Some(self.current)
    }
}

/// Result of one allocator walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiralPosition {
    /// First unnamed coordinate on the spiral.
    pub frontier: GridCoordinate,
    /// Coordinate visited immediately before the frontier, `None` when the
    /// frontier is the origin.
    pub previous: Option<GridCoordinate>,
    /// Number of named coordinates walked over.
    pub named_seen: usize,
}

/// Picks the next region to open by replaying the spiral from the origin.
///
/// The origin itself is the first allocation: with nothing named, the
/// frontier is `(0, 0)`.
pub struct SpiralAllocator;

impl SpiralAllocator {
    pub fn next_unallocated<F>(is_named: F) -> GridCoordinate
    where
        F: Fn(&GridCoordinate) -> bool,
    {
        Self::locate(is_named).frontier
    }

    pub fn locate<F>(is_named: F) -> SpiralPosition
    where
        F: Fn(&GridCoordinate) -> bool,
    {
        let mut previous = None;
        let mut named_seen = 0;
        for coord in SpiralWalk::new() {
            if !is_named(&coord) {
                return SpiralPosition {
                    frontier: coord,
                    previous,
                    named_seen,
                };
            }
            named_seen += 1;
            previous = Some(coord);
        }
        unreachable!("spiral walk is infinite")
    }
}
