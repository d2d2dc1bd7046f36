//! Region grid primitives.
//!
//! This crate handles:
//! - Region coordinates and their canonical `"x z"` string form
//! - Block-space bounding boxes of a region cell
//! - The outward square spiral used to allocate new regions

mod coords;
pub mod spiral;

pub use coords::{BlockBox, FormatError, GridCoordinate};
pub use spiral::{SpiralAllocator, SpiralPosition, SpiralWalk};

/// Width of a world chunk (tile) in blocks.
pub const CHUNK_SIZE: i32 = 16;
