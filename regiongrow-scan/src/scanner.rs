use std::collections::VecDeque;

use bit_vec::BitVec;
use regiongrow_grid::GridCoordinate;
use regiongrow_world::{SnapshotGrid, WorldBounds};
use serde::Deserialize;

use crate::{BlockClass, Envelope, Resource, classify};

const NEIGHBORS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 0, 1),
    (0, 0, -1),
    (0, 1, 0),
    (0, -1, 0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Blocks trimmed from each side of the region so neighbours never leak in.
    pub inset: i32,
    /// How far below the start cell resources still count.
    pub depth_below: i32,
    pub height_above: i32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            inset: 8,
            depth_below: 20,
            height_above: 48,
        }
    }
}

/// Tallies from one scan. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub wood: u32,
    pub coal: u32,
    pub iron: u32,
    pub gold: u32,
    pub redstone: u32,
    pub diamond: u32,
    pub player_blocks: u32,
    /// Cells popped from the fill queue.
    pub examined: u64,
    pub start: Option<(i32, i32, i32)>,
    pub score: u32,
}

impl ScanResult {
    fn count(&mut self, resource: Resource) {
        match resource {
            Resource::Wood => self.wood += 1,
            Resource::Coal => self.coal += 1,
            Resource::Iron => self.iron += 1,
            Resource::Gold => self.gold += 1,
            Resource::Redstone => self.redstone += 1,
            Resource::Diamond => self.diamond += 1,
        }
    }

    /// Weighted ore score; wood is gated separately and not part of it.
    pub fn weighted_score(&self) -> u32 {
        2 * self.coal + 3 * self.iron + 3 * self.gold + 3 * self.redstone + 4 * self.diamond
    }

    /// Zero score and zero wood, typical of terrain that was not loaded yet.
    pub fn looks_empty(&self) -> bool {
        self.score == 0 && self.wood == 0
    }
}

pub struct ResourceScanner {
    region_size: i32,
    bounds: WorldBounds,
    settings: ScanSettings,
}

impl ResourceScanner {
    pub fn new(region_size: i32, bounds: WorldBounds, settings: ScanSettings) -> Self {
        Self {
            region_size,
            bounds,
            settings,
        }
    }

    /// First walkable cell above the highest solid block at the region centre.
    ///
    /// `None` when the centre column holds no captured ground, as happens
    /// when its chunk is unavailable or not yet populated.
    pub fn start_cell(&self, grid: &SnapshotGrid, region: GridCoordinate) -> Option<(i32, i32, i32)> {
        let (x, z) = region.center(self.region_size);
        let top = self.bounds.max_y - 1;

        let highest_solid = (self.bounds.min_y..=top).rev().find(|&y| {
            grid.material_at(x, y, z)
                .is_some_and(|m| !m.is_air() && m != regiongrow_world::Material::Unknown)
        });

        match highest_solid {
            Some(y) if y >= top => None,
            Some(y) => {
                let above = (y + 1..=top)
                    .find(|&up| grid.material_at(x, up, z).is_some_and(|m| classify(m) == BlockClass::PassThrough))?;
                Some((x, above, z))
            }
            None => None,
        }
    }

    pub fn envelope(&self, region: GridCoordinate, start_y: i32) -> Envelope {
        let area = region.block_bounds(self.region_size).inset(self.settings.inset);
        Envelope {
            area,
            min_y: self.bounds.clamp_y(start_y - self.settings.depth_below),
            max_y: self.bounds.clamp_y(start_y + self.settings.height_above),
        }
    }

    pub fn scan(&self, grid: &SnapshotGrid, region: GridCoordinate) -> ScanResult {
        let mut result = ScanResult::default();

        let Some(start) = self.start_cell(grid, region) else {
            log::warn!("No walkable ground at region {} centre, nothing to scan", region);
            return result;
        };
        result.start = Some(start);

        let envelope = self.envelope(region, start.1);
        if envelope.is_empty() {
            return result;
        }

        // Visited marks cover the region footprint and the full world height.
        let origin = region.block_bounds(self.region_size);
        let size = self.region_size as usize;
        let height = self.bounds.height();
        let mut visited = BitVec::from_elem(size * size * height, false);
        let slot = |x: i32, y: i32, z: i32| {
            ((x - origin.min_x) as usize * size + (z - origin.min_z) as usize) * height
                + (y - self.bounds.min_y) as usize
        };

        let mut queue = VecDeque::new();
        visited.set(slot(start.0, start.1, start.2), true);
        queue.push_back(start);

        while let Some((x, y, z)) = queue.pop_front() {
            result.examined += 1;

            // Outside the captured data: a dead end.
            let Some(material) = grid.material_at(x, y, z) else {
                continue;
            };

            match classify(material) {
                BlockClass::PassThrough => {
                    for (dx, dy, dz) in NEIGHBORS {
                        let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                        if !envelope.contains(nx, ny, nz) {
                            continue;
                        }
                        let idx = slot(nx, ny, nz);
                        if !visited[idx] {
                            visited.set(idx, true);
                            queue.push_back((nx, ny, nz));
                        }
                    }
                }
                BlockClass::Resource(resource) => result.count(resource),
                BlockClass::PlayerModified => result.player_blocks += 1,
                BlockClass::Natural => {}
            }
        }

        result.score = result.weighted_score();
        result
    }
}
