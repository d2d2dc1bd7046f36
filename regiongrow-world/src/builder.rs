use crate::snapshot::{empty_section_blocks, mixed_section, section_index};
use crate::{ChunkSnapshot, Material, SECTION_SIZE, SnapshotSection, WorldBounds};

/// Assembles a [`ChunkSnapshot`] block by block.
///
/// Sections are allocated lazily on first write, so untouched sections stay
/// uniform air.
pub struct SnapshotBuilder {
    bounds: WorldBounds,
    sections: Vec<Option<Vec<Material>>>,
}

impl SnapshotBuilder {
    pub fn new(bounds: WorldBounds) -> Self {
        let count = bounds.height().div_ceil(SECTION_SIZE as usize);
        Self {
            bounds,
            sections: vec![None; count],
        }
    }

    /// Set a single block at chunk-local coordinates (x: 0..15, z: 0..15)
    pub fn set_block(&mut self, x: u8, y: i32, z: u8, material: Material) {
        if x >= 16 || z >= 16 || !self.bounds.contains_y(y) {
            return;
        }
        let rel = (y - self.bounds.min_y) as usize;
        let blocks = self.sections[rel / SECTION_SIZE as usize]
            .get_or_insert_with(|| empty_section_blocks(Material::Air));
        blocks[section_index(x as usize, rel % SECTION_SIZE as usize, z as usize)] = material;
    }

    /// Fill an entire Y-layer with a block
    pub fn fill_layer(&mut self, y: i32, material: Material) {
        for x in 0..16 {
            for z in 0..16 {
                self.set_block(x, y, z, material);
            }
        }
    }

    /// Fill `from_y..to_y` of one column.
    pub fn fill_column(&mut self, x: u8, z: u8, from_y: i32, to_y: i32, material: Material) {
        for y in from_y.max(self.bounds.min_y)..to_y.min(self.bounds.max_y) {
            self.set_block(x, y, z, material);
        }
    }

    pub fn build(self, chunk_x: i32, chunk_z: i32) -> ChunkSnapshot {
        let sections = self
            .sections
            .into_iter()
            .map(|section| match section {
                Some(blocks) => mixed_section(blocks),
                None => SnapshotSection::Uniform(Material::Air),
            })
            .collect();

        ChunkSnapshot {
            chunk_x,
            chunk_z,
            min_y: self.bounds.min_y,
            sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_sections_stay_uniform() {
        let mut builder = SnapshotBuilder::new(WorldBounds::default());
        builder.fill_layer(-64, Material::Bedrock);
        builder.set_block(8, 70, 8, Material::Log);
        let chunk = builder.build(0, 0);

        let mixed = chunk
            .sections
            .iter()
            .filter(|s| matches!(s, SnapshotSection::Mixed(_)))
            .count();
        assert_eq!(mixed, 2);
        assert_eq!(chunk.block(8, 70, 8), Material::Log);
        assert_eq!(chunk.block(3, -64, 12), Material::Bedrock);
        assert_eq!(chunk.block(3, -63, 12), Material::Air);
    }

    #[test]
    fn test_full_section_collapses_to_uniform() {
        let mut builder = SnapshotBuilder::new(WorldBounds::default());
        for y in 0..16 {
            builder.fill_layer(y, Material::Stone);
        }
        let chunk = builder.build(0, 0);
        assert_eq!(chunk.sections[4], SnapshotSection::Uniform(Material::Stone));
    }

    #[test]
    fn test_out_of_range_writes_are_ignored() {
        let mut builder = SnapshotBuilder::new(WorldBounds::default());
        builder.set_block(16, 0, 0, Material::Stone);
        builder.set_block(0, 320, 0, Material::Stone);
        builder.fill_column(1, 1, -100, -62, Material::Stone);
        let chunk = builder.build(0, 0);
        assert_eq!(chunk.block(1, -64, 1), Material::Stone);
        assert_eq!(chunk.block(1, -63, 1), Material::Stone);
        assert_eq!(chunk.block(1, -62, 1), Material::Air);
    }
}
