//! Deterministic procedural world.
//!
//! Stands in for a live server world: rolling grass terrain over stone with
//! scattered ore, open quarry pits that expose ore to the surface, and
//! trees. Everything is a pure function of the seed and block position, so
//! two loads of the same chunk always match.

use anyhow::Result;

use crate::{ChunkSnapshot, ChunkSource, Material, SnapshotBuilder, WorldBounds};

const BASE_HEIGHT: i32 = 64;
const HEIGHT_LATTICE: i32 = 32;
const RICHNESS_LATTICE: i32 = 256;
const PIT_DEPTH: i32 = 12;

pub struct GeneratedWorld {
    seed: u64,
    bounds: WorldBounds,
    sea_level: i32,
}

impl GeneratedWorld {
    pub fn new(seed: u64, bounds: WorldBounds) -> Self {
        Self {
            seed,
            bounds,
            sea_level: 62,
        }
    }

    fn hash(&self, a: i32, b: i32, c: i32, salt: u32) -> u64 {
        // FNV-1a 64-bit
        let mut hash: u64 = 0xcbf29ce484222325;
        let bytes = self
            .seed
            .to_le_bytes()
            .into_iter()
            .chain(a.to_le_bytes())
            .chain(b.to_le_bytes())
            .chain(c.to_le_bytes())
            .chain(salt.to_le_bytes());
        for byte in bytes {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash
    }

    /// Bilinear value noise on a square lattice, returns `lo..=hi`.
    fn lattice_noise(&self, x: i32, z: i32, spacing: i32, lo: i32, hi: i32, salt: u32) -> i32 {
        let span = (hi - lo + 1) as u64;
        let corner = |ix: i32, iz: i32| (lo as u64 + self.hash(ix, 0, iz, salt) % span) as f64;

        let ix = x.div_euclid(spacing);
        let iz = z.div_euclid(spacing);
        let fx = x.rem_euclid(spacing) as f64 / spacing as f64;
        let fz = z.rem_euclid(spacing) as f64 / spacing as f64;

        let top = corner(ix, iz) * (1.0 - fx) + corner(ix + 1, iz) * fx;
        let bottom = corner(ix, iz + 1) * (1.0 - fx) + corner(ix + 1, iz + 1) * fx;
        (top * (1.0 - fz) + bottom * fz).round() as i32
    }

    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let h = BASE_HEIGHT + self.lattice_noise(x, z, HEIGHT_LATTICE, -8, 24, 1);
        h.clamp(self.bounds.min_y + PIT_DEPTH + 4, self.bounds.max_y - 16)
    }

    fn ore_at(&self, x: i32, y: i32, z: i32) -> Option<Material> {
        let roll = self.hash(x, y, z, 2) % 1000;
        match roll {
            0..12 => Some(Material::CoalOre),
            12..18 if y < 72 => Some(Material::IronOre),
            18..20 if y < 32 => Some(Material::GoldOre),
            20..22 if y < 16 => Some(Material::RedstoneOre),
            22..23 if y < 16 => Some(Material::DiamondOre),
            _ => None,
        }
    }

    fn has_pit(&self, chunk_x: i32, chunk_z: i32) -> bool {
        let richness = self.lattice_noise(chunk_x * 16, chunk_z * 16, RICHNESS_LATTICE, 0, 45, 3);
        (self.hash(chunk_x, 0, chunk_z, 4) % 100) < richness as u64
    }

    fn has_tree(&self, x: i32, z: i32) -> bool {
        self.hash(x, 0, z, 5) % 90 == 0
    }
}

impl ChunkSource for GeneratedWorld {
    fn load_chunk(&self, chunk_x: i32, chunk_z: i32) -> Result<ChunkSnapshot> {
        let mut builder = SnapshotBuilder::new(self.bounds);
        let base_x = chunk_x * 16;
        let base_z = chunk_z * 16;
        let pit = self.has_pit(chunk_x, chunk_z);

        for lx in 0..16u8 {
            for lz in 0..16u8 {
                let x = base_x + lx as i32;
                let z = base_z + lz as i32;
                let surface = self.surface_height(x, z);
                let in_pit = pit && (4..12).contains(&lx) && (4..12).contains(&lz);

                builder.set_block(lx, self.bounds.min_y, lz, Material::Bedrock);
                for y in self.bounds.min_y + 1..surface - 3 {
                    let material = self.ore_at(x, y, z).unwrap_or(Material::Stone);
                    builder.set_block(lx, y, lz, material);
                }

                if in_pit {
                    // Quarry floor sits below the dirt, the rest stays air.
                    continue;
                }
                builder.fill_column(lx, lz, surface - 3, surface, Material::Dirt);

                if surface < self.sea_level {
                    builder.set_block(lx, surface, lz, Material::Sand);
                    builder.fill_column(lx, lz, surface + 1, self.sea_level + 1, Material::Water);
                    continue;
                }
                builder.set_block(lx, surface, lz, Material::GrassBlock);

                let tree_fits = (2..14).contains(&lx) && (2..14).contains(&lz) && !pit;
                if tree_fits && self.has_tree(x, z) {
                    for dx in -2i32..=2 {
                        for dz in -2i32..=2 {
                            let leaf_x = (lx as i32 + dx) as u8;
                            let leaf_z = (lz as i32 + dz) as u8;
                            builder.fill_column(leaf_x, leaf_z, surface + 4, surface + 6, Material::Leaves);
                        }
                    }
                    builder.set_block(lx, surface + 6, lz, Material::Leaves);
                    builder.fill_column(lx, lz, surface + 1, surface + 6, Material::Log);
                }
            }
        }

        if pit {
            // Cut the quarry down through the stone.
            for lx in 4..12u8 {
                for lz in 4..12u8 {
                    let surface = self.surface_height(base_x + lx as i32, base_z + lz as i32);
                    builder.fill_column(lx, lz, surface - PIT_DEPTH, surface + 1, Material::Air);
                }
            }
        }

        Ok(builder.build(chunk_x, chunk_z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let world = GeneratedWorld::new(42, WorldBounds::default());
        let a = world.load_chunk(3, -7).unwrap();
        let b = world.load_chunk(3, -7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_chunks_are_never_suspect() {
        let world = GeneratedWorld::new(7, WorldBounds::default());
        for cx in -3..3 {
            for cz in -3..3 {
                assert!(!world.load_chunk(cx, cz).unwrap().is_suspect());
            }
        }
    }

    #[test]
    fn test_surface_is_grass_or_sand() {
        let world = GeneratedWorld::new(1, WorldBounds::default());
        let chunk = world.load_chunk(10, 10).unwrap();
        let surface = world.surface_height(160, 160);
        assert!(matches!(
            chunk.block(0, surface, 0),
            Material::GrassBlock | Material::Sand
        ));
        assert_eq!(chunk.block(0, -64, 0), Material::Bedrock);
    }

    #[test]
    fn test_seeds_differ() {
        let a = GeneratedWorld::new(1, WorldBounds::default());
        let b = GeneratedWorld::new(2, WorldBounds::default());
        let differs = (0..64).any(|i| a.surface_height(i * 37, i * 11) != b.surface_height(i * 37, i * 11));
        assert!(differs);
    }
}
