use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use regiongrow_grid::GridCoordinate;

use crate::{RegionRecord, RegionStore};

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryRegionStore {
    records: Mutex<HashMap<GridCoordinate, String>>,
}

impl MemoryRegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = RegionRecord>) -> Self {
        let records = records.into_iter().map(|r| (r.coordinates, r.name)).collect();
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RegionStore for MemoryRegionStore {
    async fn load_regions(&self) -> Result<Vec<RegionRecord>> {
        let records = self.records.lock().map_err(|_| anyhow!("region store lock poisoned"))?;
        Ok(records
            .iter()
            .map(|(coordinates, name)| RegionRecord {
                coordinates: *coordinates,
                name: name.clone(),
            })
            .collect())
    }

    async fn save_region(&self, record: &RegionRecord) -> Result<()> {
        let mut records = self.records.lock().map_err(|_| anyhow!("region store lock poisoned"))?;
        records.insert(record.coordinates, record.name.clone());
        Ok(())
    }

    async fn delete_region(&self, record: &RegionRecord) -> Result<()> {
        let mut records = self.records.lock().map_err(|_| anyhow!("region store lock poisoned"))?;
        records.remove(&record.coordinates);
        Ok(())
    }
}
