use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CHUNK_SIZE;

/// Returned when a string is not exactly two whitespace-separated integers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed region coordinates {input:?}: expected \"<x> <z>\"")]
pub struct FormatError {
    pub input: String,
}

/// Coordinates of one square region cell on the grid.
///
/// Serialized in its canonical string form (`"x z"`), which is also the key
/// used by the durable region records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GridCoordinate {
    pub x: i32,
    pub z: i32,
}

impl GridCoordinate {
    pub const ORIGIN: GridCoordinate = GridCoordinate { x: 0, z: 0 };

    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Region containing the given world block position.
    /// Floor division, so block -1 belongs to region -1 rather than region 0.
    pub fn containing(block_x: i32, block_z: i32, region_size: i32) -> Self {
        Self {
            x: block_x.div_euclid(region_size),
            z: block_z.div_euclid(region_size),
        }
    }

    /// Chebyshev distance from the origin; the spiral visits rings in order.
    pub fn ring(&self) -> u32 {
        self.x.unsigned_abs().max(self.z.unsigned_abs())
    }

    /// Coordinate one step away.
    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// Block-space footprint of this region.
    pub fn block_bounds(&self, region_size: i32) -> BlockBox {
        let min_x = self.x * region_size;
        let min_z = self.z * region_size;
        BlockBox {
            min_x,
            min_z,
            max_x: min_x + region_size - 1,
            max_z: min_z + region_size - 1,
        }
    }

    /// Horizontal centre block of this region.
    pub fn center(&self, region_size: i32) -> (i32, i32) {
        (
            self.x * region_size + region_size / 2,
            self.z * region_size + region_size / 2,
        )
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.z)
    }
}

impl FromStr for GridCoordinate {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || FormatError { input: s.to_string() };
        let mut parts = s.split_whitespace();
        let x = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        let z = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        if parts.next().is_some() {
            return Err(err());
        }
        Ok(Self { x, z })
    }
}

impl TryFrom<String> for GridCoordinate {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GridCoordinate> for String {
    fn from(value: GridCoordinate) -> Self {
        value.to_string()
    }
}

/// Inclusive rectangle in world block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBox {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl BlockBox {
    pub fn width(&self) -> usize {
        (self.max_x - self.min_x + 1).max(0) as usize
    }

    pub fn depth(&self) -> usize {
        (self.max_z - self.min_z + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_z < self.min_z
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    /// Shrinks the box by `margin` blocks on every side.
    pub fn inset(&self, margin: i32) -> BlockBox {
        BlockBox {
            min_x: self.min_x + margin,
            min_z: self.min_z + margin,
            max_x: self.max_x - margin,
            max_z: self.max_z - margin,
        }
    }

    /// Range of chunk coordinates `(min_cx, min_cz, max_cx, max_cz)` touching this box, inclusive.
    pub fn chunk_range(&self) -> (i32, i32, i32, i32) {
        (
            self.min_x.div_euclid(CHUNK_SIZE),
            self.min_z.div_euclid(CHUNK_SIZE),
            self.max_x.div_euclid(CHUNK_SIZE),
            self.max_z.div_euclid(CHUNK_SIZE),
        )
    }
}
