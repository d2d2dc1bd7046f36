//! World data access for region scans.
//!
//! This module handles:
//! - The block material catalogue
//! - Immutable chunk snapshots and the snapshot grid covering one region
//! - Chunk sources (anything that can load or generate a chunk)
//! - The tiled snapshot provider with bounded capture retries

use anyhow::Result;
use serde::Deserialize;

pub mod builder;
pub mod generated;
pub mod material;
pub mod provider;
pub mod snapshot;

pub use builder::SnapshotBuilder;
pub use generated::GeneratedWorld;
pub use material::Material;
pub use provider::{CaptureError, RetryPolicy, TiledSnapshotProvider, WorldSnapshotProvider};
pub use snapshot::{CaptureStats, ChunkSnapshot, SnapshotGrid, SnapshotSection, Tile};

/// Blocks per side of a snapshot section cube.
pub const SECTION_SIZE: i32 = 16;

/// Vertical limits of the world, `max_y` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    pub min_y: i32,
    pub max_y: i32,
}

impl WorldBounds {
    pub fn height(&self) -> usize {
        (self.max_y - self.min_y).max(0) as usize
    }

    pub fn contains_y(&self, y: i32) -> bool {
        y >= self.min_y && y < self.max_y
    }

    pub fn clamp_y(&self, y: i32) -> i32 {
        y.clamp(self.min_y, self.max_y - 1)
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self { min_y: -64, max_y: 320 }
    }
}

/// Something that can load a chunk, generating it first if needed.
///
/// Implementations may hand back a chunk whose content is not materialized
/// yet (all air); the provider detects that and retries.
pub trait ChunkSource: Send + Sync {
    fn load_chunk(&self, chunk_x: i32, chunk_z: i32) -> Result<ChunkSnapshot>;
}
