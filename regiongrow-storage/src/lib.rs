use anyhow::Result;
use async_trait::async_trait;
use regiongrow_grid::GridCoordinate;
use serde::{Deserialize, Serialize};

pub mod directory;
pub mod file;
pub mod memory;
pub mod naming;
pub mod postgres;

pub use directory::{DirectoryView, RegionDirectory};
pub use naming::{Conflict, DirectoryError, NamingRules};

/// One named region as stored durably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub coordinates: GridCoordinate,
    pub name: String,
}

/// Durable region records, cross-referenced by coordinates and by name.
///
/// Only read at startup; the directory's in-memory maps serve every lookup
/// afterwards.
#[async_trait]
pub trait RegionStore: Send + Sync {
    async fn load_regions(&self) -> Result<Vec<RegionRecord>>;
    async fn save_region(&self, record: &RegionRecord) -> Result<()>;
    async fn delete_region(&self, record: &RegionRecord) -> Result<()>;
}
