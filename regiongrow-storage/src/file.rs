//! One-record-per-file region storage.
//!
//! Layout under the data directory:
//! - `by-coordinates/r.<x>.<z>.json`
//! - `by-name/<name>.json`
//!
//! Both files hold the same JSON record, so a region can be found from
//! either key without listing the other directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use regiongrow_grid::GridCoordinate;

use crate::{RegionRecord, RegionStore};

const BY_COORDINATES: &str = "by-coordinates";
const BY_NAME: &str = "by-name";

pub struct FileRegionStore {
    root: PathBuf,
}

impl FileRegionStore {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [BY_COORDINATES, BY_NAME] {
            tokio::fs::create_dir_all(root.join(dir))
                .await
                .with_context(|| format!("Failed to create {}", root.join(dir).display()))?;
        }
        Ok(Self { root })
    }

    fn coordinates_path(&self, coordinates: GridCoordinate) -> PathBuf {
        self.root
            .join(BY_COORDINATES)
            .join(format!("r.{}.{}.json", coordinates.x, coordinates.z))
    }

    fn name_path(&self, name: &str) -> PathBuf {
        self.root.join(BY_NAME).join(format!("{}.json", name))
    }

    async fn write_record(path: &Path, record: &RegionRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to move record into {}", path.display()))?;
        Ok(())
    }

    async fn remove_if_present(path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

#[async_trait]
impl RegionStore for FileRegionStore {
    async fn load_regions(&self) -> Result<Vec<RegionRecord>> {
        let dir = self.root.join(BY_COORDINATES);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to list {}", dir.display()))?;

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match serde_json::from_slice::<RegionRecord>(&bytes) {
                Ok(record) => {
                    if !tokio::fs::try_exists(self.name_path(&record.name)).await.unwrap_or(false) {
                        log::warn!(
                            "Region {} has no by-name entry for {:?}; the coordinate record wins",
                            record.coordinates,
                            record.name
                        );
                    }
                    records.push(record);
                }
                Err(e) => log::warn!("Skipping unreadable region record {}: {}", path.display(), e),
            }
        }
        Ok(records)
    }

    async fn save_region(&self, record: &RegionRecord) -> Result<()> {
        Self::write_record(&self.coordinates_path(record.coordinates), record).await?;
        Self::write_record(&self.name_path(&record.name), record).await?;
        Ok(())
    }

    async fn delete_region(&self, record: &RegionRecord) -> Result<()> {
        Self::remove_if_present(&self.coordinates_path(record.coordinates)).await?;
        Self::remove_if_present(&self.name_path(&record.name)).await?;
        Ok(())
    }
}
