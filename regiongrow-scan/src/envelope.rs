use regiongrow_grid::BlockBox;

/// Volume the flood fill may enter. Inclusive on every face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    pub area: BlockBox,
    pub min_y: i32,
    pub max_y: i32,
}

impl Envelope {
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        y >= self.min_y && y <= self.max_y && self.area.contains(x, z)
    }

    pub fn is_empty(&self) -> bool {
        self.area.is_empty() || self.max_y < self.min_y
    }
}
