//! Immutable block snapshots.
//!
//! A [`ChunkSnapshot`] is a point-in-time copy of one 16-wide column of the
//! world, stored as vertical 16x16x16 sections. Sections holding a single
//! material (air above the surface, solid stone deep down) stay uniform and
//! cost one byte. A [`SnapshotGrid`] tiles snapshots over a region.

use regiongrow_grid::CHUNK_SIZE;

use crate::{CaptureError, Material, SECTION_SIZE, WorldBounds};

const SECTION_VOLUME: usize = (SECTION_SIZE * SECTION_SIZE * SECTION_SIZE) as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSection {
    Uniform(Material),
    /// Index order Y -> Z -> X: `(y * 16 + z) * 16 + x`
    Mixed(Box<[Material]>),
}

impl SnapshotSection {
    pub fn get(&self, x: usize, y: usize, z: usize) -> Material {
        match self {
            SnapshotSection::Uniform(m) => *m,
            SnapshotSection::Mixed(blocks) => blocks[section_index(x, y, z)],
        }
    }
}

#[inline]
pub(crate) fn section_index(x: usize, y: usize, z: usize) -> usize {
    (y * SECTION_SIZE as usize + z) * SECTION_SIZE as usize + x
}

pub(crate) fn mixed_section(blocks: Vec<Material>) -> SnapshotSection {
    debug_assert_eq!(blocks.len(), SECTION_VOLUME);
    match blocks.first() {
        Some(first) if blocks.iter().all(|m| m == first) => SnapshotSection::Uniform(*first),
        _ => SnapshotSection::Mixed(blocks.into_boxed_slice()),
    }
}

pub(crate) fn empty_section_blocks(fill: Material) -> Vec<Material> {
    vec![fill; SECTION_VOLUME]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSnapshot {
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// World Y of the bottom of the first section.
    pub min_y: i32,
    pub sections: Vec<SnapshotSection>,
}

impl ChunkSnapshot {
    /// A chunk whose content has not materialized: every block reads as air.
    pub fn unpopulated(chunk_x: i32, chunk_z: i32, bounds: WorldBounds) -> Self {
        let count = bounds.height().div_ceil(SECTION_SIZE as usize);
        Self {
            chunk_x,
            chunk_z,
            min_y: bounds.min_y,
            sections: vec![SnapshotSection::Uniform(Material::Air); count],
        }
    }

    pub fn max_y(&self) -> i32 {
        self.min_y + self.sections.len() as i32 * SECTION_SIZE
    }

    /// Block at chunk-local `x`/`z` (0..15) and world `y`. Air outside the
    /// snapshot's vertical range.
    pub fn block(&self, x: usize, y: i32, z: usize) -> Material {
        if y < self.min_y || y >= self.max_y() || x >= CHUNK_SIZE as usize || z >= CHUNK_SIZE as usize {
            return Material::Air;
        }
        let rel = (y - self.min_y) as usize;
        let section = &self.sections[rel / SECTION_SIZE as usize];
        section.get(x, rel % SECTION_SIZE as usize, z)
    }

    /// True when the column at local `x`/`z` has nothing but air.
    pub fn column_is_empty(&self, x: usize, z: usize) -> bool {
        self.sections.iter().all(|section| match section {
            SnapshotSection::Uniform(m) => m.is_air(),
            SnapshotSection::Mixed(_) => (0..SECTION_SIZE as usize).all(|y| section.get(x, y, z).is_air()),
        })
    }

    /// A freshly loaded chunk whose origin column is all air was most likely
    /// reported loaded before its content was generated.
    pub fn is_suspect(&self) -> bool {
        self.column_is_empty(0, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tile {
    Captured(ChunkSnapshot),
    Unavailable,
}

/// How a grid was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub tiles: usize,
    /// Load attempts past the first, summed over tiles.
    pub retries: usize,
    pub unavailable: usize,
}

/// Rectangular grid of chunk snapshots.
///
/// Tiles are stored row-major by X: index `dx * depth + dz`.
#[derive(Debug, Clone)]
pub struct SnapshotGrid {
    pub origin_chunk_x: i32,
    pub origin_chunk_z: i32,
    pub width: usize,
    pub depth: usize,
    pub bounds: WorldBounds,
    tiles: Vec<Tile>,
    pub stats: CaptureStats,
    failures: Vec<CaptureError>,
}

impl SnapshotGrid {
    /// Missing tiles are filled as [`Tile::Unavailable`]; surplus tiles are dropped.
    pub fn new(
        origin_chunk_x: i32,
        origin_chunk_z: i32,
        width: usize,
        depth: usize,
        bounds: WorldBounds,
        mut tiles: Vec<Tile>,
    ) -> Self {
        let expected = width * depth;
        if tiles.len() != expected {
            log::warn!(
                "Grid at chunk {},{} got {} tiles for {}x{}, resizing",
                origin_chunk_x,
                origin_chunk_z,
                tiles.len(),
                width,
                depth
            );
            tiles.resize_with(expected, || Tile::Unavailable);
        }
        let unavailable = tiles.iter().filter(|t| matches!(t, Tile::Unavailable)).count();
        Self {
            origin_chunk_x,
            origin_chunk_z,
            width,
            depth,
            bounds,
            tiles,
            stats: CaptureStats {
                tiles: expected,
                retries: 0,
                unavailable,
            },
            failures: Vec::new(),
        }
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.stats.retries = retries;
        self
    }

    pub fn with_failures(mut self, failures: Vec<CaptureError>) -> Self {
        self.failures = failures;
        self
    }

    /// Why each unavailable tile could not be captured.
    pub fn failures(&self) -> &[CaptureError] {
        &self.failures
    }

    pub fn tile(&self, chunk_x: i32, chunk_z: i32) -> Option<&Tile> {
        let dx = chunk_x - self.origin_chunk_x;
        let dz = chunk_z - self.origin_chunk_z;
        if dx < 0 || dz < 0 || dx as usize >= self.width || dz as usize >= self.depth {
            return None;
        }
        self.tiles.get(dx as usize * self.depth + dz as usize)
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn unavailable_tiles(&self) -> usize {
        self.stats.unavailable
    }

    /// Material at a world block position.
    ///
    /// `None` when the position is outside the grid or the world's height;
    /// [`Material::Unknown`] when it falls in a tile that could not be captured.
    pub fn material_at(&self, x: i32, y: i32, z: i32) -> Option<Material> {
        if !self.bounds.contains_y(y) {
            return None;
        }
        let tile = self.tile(x.div_euclid(CHUNK_SIZE), z.div_euclid(CHUNK_SIZE))?;
        match tile {
            Tile::Captured(snapshot) => Some(snapshot.block(
                x.rem_euclid(CHUNK_SIZE) as usize,
                y,
                z.rem_euclid(CHUNK_SIZE) as usize,
            )),
            Tile::Unavailable => Some(Material::Unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SnapshotBuilder;

    fn bounds() -> WorldBounds {
        WorldBounds { min_y: -64, max_y: 320 }
    }

    #[test]
    fn test_unpopulated_is_suspect() {
        let snapshot = ChunkSnapshot::unpopulated(3, -2, bounds());
        assert_eq!(snapshot.sections.len(), 24);
        assert!(snapshot.is_suspect());
        assert_eq!(snapshot.block(5, 100, 5), Material::Air);
    }

    #[test]
    fn test_origin_column_decides_suspicion() {
        let mut builder = SnapshotBuilder::new(bounds());
        builder.set_block(0, -64, 0, Material::Bedrock);
        assert!(!builder.build(0, 0).is_suspect());

        // Content elsewhere does not count.
        let mut builder = SnapshotBuilder::new(bounds());
        builder.set_block(3, 10, 3, Material::Stone);
        assert!(builder.build(0, 0).is_suspect());
    }

    #[test]
    fn test_grid_lookup_handles_negative_chunks() {
        let mut builder = SnapshotBuilder::new(bounds());
        builder.set_block(15, 70, 15, Material::DiamondOre);
        let tiles = vec![
            Tile::Captured(builder.build(-1, -1)),
            Tile::Unavailable,
            Tile::Captured(SnapshotBuilder::new(bounds()).build(0, -1)),
            Tile::Captured(SnapshotBuilder::new(bounds()).build(0, 0)),
        ];
        let grid = SnapshotGrid::new(-1, -1, 2, 2, bounds(), tiles);

        assert_eq!(grid.material_at(-1, 70, -1), Some(Material::DiamondOre));
        assert_eq!(grid.material_at(-5, 70, 3), Some(Material::Unknown));
        assert_eq!(grid.material_at(10, 70, 10), Some(Material::Air));
        assert_eq!(grid.material_at(16, 70, 0), None);
        assert_eq!(grid.material_at(0, 320, 0), None);
        assert_eq!(grid.unavailable_tiles(), 1);
    }

    #[test]
    fn test_short_tile_list_fills_with_unavailable() {
        let tiles = vec![Tile::Captured(SnapshotBuilder::new(bounds()).build(0, 0))];
        let grid = SnapshotGrid::new(0, 0, 2, 2, bounds(), tiles);

        assert_eq!(grid.tiles().count(), 4);
        assert_eq!(grid.unavailable_tiles(), 3);
        assert_eq!(grid.material_at(0, 70, 0), Some(Material::Air));
        assert_eq!(grid.material_at(20, 70, 20), Some(Material::Unknown));
    }

    #[test]
    fn test_surplus_tiles_are_dropped() {
        let tiles = vec![Tile::Unavailable, Tile::Unavailable, Tile::Unavailable];
        let grid = SnapshotGrid::new(0, 0, 1, 2, bounds(), tiles);

        assert_eq!(grid.tiles().count(), 2);
        assert_eq!(grid.stats.tiles, 2);
        assert_eq!(grid.unavailable_tiles(), 2);
    }
}
