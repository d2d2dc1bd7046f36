//! Reachable-resource scanning for one region.
//!
//! A breadth-first flood fill starts above the ground at the region centre
//! and walks through blocks an explorer can pass without digging. Resources
//! touching that walkable space inside a bounded envelope are counted;
//! anything deeper, higher or outside the region is "not easily reachable"
//! and never visited.

mod classify;
mod envelope;
mod scanner;

pub use classify::{BlockClass, Resource, classify};
pub use envelope::Envelope;
pub use scanner::{ResourceScanner, ScanResult, ScanSettings};
