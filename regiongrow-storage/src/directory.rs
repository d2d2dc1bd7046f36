use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::seq::IteratorRandom;
use regiongrow_grid::{GridCoordinate, SpiralAllocator};
use regiongrow_metrics::GrowthMetrics;

use crate::naming::{Conflict, DirectoryError, NamingRules};
use crate::{RegionRecord, RegionStore};

/// Named regions, the open region and the spiral frontier.
///
/// Every mutation goes through `&mut self`; the growth coordinator owns the
/// only instance and hands out [`DirectoryView`] copies for reads. Durable
/// writes are best effort: a failed store write is logged and counted, and
/// the in-memory state still advances.
pub struct RegionDirectory {
    store: Arc<dyn RegionStore>,
    rules: NamingRules,
    metrics: Arc<GrowthMetrics>,
    by_name: HashMap<String, GridCoordinate>,
    by_coordinates: HashMap<GridCoordinate, String>,
    open: Option<GridCoordinate>,
    frontier: GridCoordinate,
}

impl RegionDirectory {
    /// Rebuilds the maps from `store` and re-derives the spiral state.
    ///
    /// The open region after a restart is the coordinate the spiral visits
    /// just before the frontier.
    pub async fn load(
        store: Arc<dyn RegionStore>,
        rules: NamingRules,
        metrics: Arc<GrowthMetrics>,
    ) -> Result<Self> {
        let records = store.load_regions().await.context("Failed to load regions")?;

        let mut directory = Self {
            store,
            rules,
            metrics,
            by_name: HashMap::new(),
            by_coordinates: HashMap::new(),
            open: None,
            frontier: GridCoordinate::ORIGIN,
        };

        for record in records {
            let name = match directory.rules.normalize(&record.name) {
                Ok(name) => name,
                Err(e) => {
                    // Names that fail today's rules are still bindings.
                    log::warn!("Region {}: {}", record.coordinates, e);
                    record.name.trim().to_lowercase()
                }
            };
            if let Some(owner) = directory.by_name.get(&name) {
                log::warn!(
                    "Region {} reuses name {:?} of region {}; ignoring it",
                    record.coordinates,
                    name,
                    owner
                );
                continue;
            }
            if directory.by_coordinates.contains_key(&record.coordinates) {
                log::warn!("Duplicate record for region {}; ignoring it", record.coordinates);
                continue;
            }
            directory.by_name.insert(name.clone(), record.coordinates);
            directory.by_coordinates.insert(record.coordinates, name);
        }

        let position = SpiralAllocator::locate(|c| directory.by_coordinates.contains_key(c));
        directory.frontier = position.frontier;
        directory.open = position.previous;

        match directory.open {
            Some(open) => log::info!(
                "Loaded {} regions, open region {:?} at {}",
                directory.by_coordinates.len(),
                directory.by_coordinates.get(&open).map(String::as_str).unwrap_or(""),
                open
            ),
            None => log::info!("No regions yet, first allocation goes to {}", directory.frontier),
        }

        Ok(directory)
    }

    pub fn name_of(&self, coordinates: GridCoordinate) -> Option<&str> {
        self.by_coordinates.get(&coordinates).map(String::as_str)
    }

    pub fn coordinates_of(&self, name: &str) -> Option<GridCoordinate> {
        self.by_name.get(&name.trim().to_lowercase()).copied()
    }

    pub fn is_named(&self, coordinates: GridCoordinate) -> bool {
        self.by_coordinates.contains_key(&coordinates)
    }

    pub fn open_region(&self) -> Option<GridCoordinate> {
        self.open
    }

    /// The coordinate the next allocation will take.
    pub fn frontier(&self) -> GridCoordinate {
        self.frontier
    }

    pub fn len(&self) -> usize {
        self.by_coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_coordinates.is_empty()
    }

    pub fn rules(&self) -> &NamingRules {
        &self.rules
    }

    /// Binds `name` to an unnamed region.
    ///
    /// Rebinding the same pair is a no-op. Any other collision is a
    /// [`DirectoryError::NameConflict`]; use [`Self::rename_region`] to
    /// replace a name.
    pub async fn name_region(
        &mut self,
        coordinates: GridCoordinate,
        name: &str,
    ) -> Result<(), DirectoryError> {
        let name = self.rules.normalize(name)?;
        self.check_name_free(coordinates, &name)?;

        match self.by_coordinates.get(&coordinates) {
            Some(existing) if *existing == name => return Ok(()),
            Some(existing) => {
                return Err(DirectoryError::NameConflict {
                    coordinates,
                    name,
                    conflict: Conflict::RegionAlreadyNamed {
                        existing: existing.clone(),
                    },
                });
            }
            None => {}
        }

        self.bind(coordinates, name).await;
        Ok(())
    }

    /// Binds `name` to a region, dropping whatever name it had before.
    pub async fn rename_region(
        &mut self,
        coordinates: GridCoordinate,
        name: &str,
    ) -> Result<(), DirectoryError> {
        let name = self.rules.normalize(name)?;
        self.check_name_free(coordinates, &name)?;
        if self.name_of(coordinates) == Some(name.as_str()) {
            return Ok(());
        }
        self.bind(coordinates, name).await;
        Ok(())
    }

    /// Names the spiral frontier with a generated name and opens it.
    pub async fn allocate_next(&mut self) -> Result<GridCoordinate, DirectoryError> {
        let target = self.frontier;
        let name = self
            .rules
            .generate(self.by_coordinates.len(), |n| self.by_name.contains_key(n))?;

        self.bind(target, name.clone()).await;
        self.open = Some(target);
        self.metrics.record_allocation();

        log::info!("Opened region {:?} at {}, next frontier {}", name, target, self.frontier);
        Ok(target)
    }

    /// Cheap read-only copy for concurrent readers.
    pub fn view(&self) -> DirectoryView {
        DirectoryView {
            by_name: self.by_name.clone(),
            by_coordinates: self.by_coordinates.clone(),
            open: self.open,
            frontier: self.frontier,
        }
    }

    fn check_name_free(&self, coordinates: GridCoordinate, name: &str) -> Result<(), DirectoryError> {
        match self.by_name.get(name) {
            Some(owner) if *owner != coordinates => Err(DirectoryError::NameConflict {
                coordinates,
                name: name.to_string(),
                conflict: Conflict::NameTaken { owner: *owner },
            }),
            _ => Ok(()),
        }
    }

    async fn bind(&mut self, coordinates: GridCoordinate, name: String) {
        if let Some(old) = self.by_coordinates.remove(&coordinates) {
            self.by_name.remove(&old);
            let record = RegionRecord {
                coordinates,
                name: old,
            };
            if let Err(e) = self.store.delete_region(&record).await {
                self.persistence_failed("delete", &record, e);
            }
        }

        self.by_name.insert(name.clone(), coordinates);
        self.by_coordinates.insert(coordinates, name.clone());

        let record = RegionRecord { coordinates, name };
        if let Err(e) = self.store.save_region(&record).await {
            self.persistence_failed("save", &record, e);
        }

        let position = SpiralAllocator::locate(|c| self.by_coordinates.contains_key(c));
        self.frontier = position.frontier;
        // Same rule a cold load applies, so a restart sees the same open region.
        if self.open.is_none() {
            self.open = position.previous;
        }
    }

    fn persistence_failed(&self, action: &str, record: &RegionRecord, e: anyhow::Error) {
        log::warn!(
            "Failed to {} region {} {:?}: {:#}",
            action,
            record.coordinates,
            record.name,
            e
        );
        self.metrics.record_persistence_failure();
    }
}

/// Snapshot of the directory taken after the last mutation.
#[derive(Debug, Clone, Default)]
pub struct DirectoryView {
    by_name: HashMap<String, GridCoordinate>,
    by_coordinates: HashMap<GridCoordinate, String>,
    open: Option<GridCoordinate>,
    frontier: GridCoordinate,
}

impl DirectoryView {
    pub fn name_of(&self, coordinates: GridCoordinate) -> Option<&str> {
        self.by_coordinates.get(&coordinates).map(String::as_str)
    }

    pub fn coordinates_of(&self, name: &str) -> Option<GridCoordinate> {
        self.by_name.get(&name.trim().to_lowercase()).copied()
    }

    /// The region containing block column `(block_x, block_z)`, if named.
    pub fn region_at(&self, block_x: i32, block_z: i32, region_size: i32) -> Option<(GridCoordinate, &str)> {
        let coordinates = GridCoordinate::containing(block_x, block_z, region_size);
        self.name_of(coordinates).map(|name| (coordinates, name))
    }

    pub fn open_region(&self) -> Option<GridCoordinate> {
        self.open
    }

    pub fn frontier(&self) -> GridCoordinate {
        self.frontier
    }

    pub fn len(&self) -> usize {
        self.by_coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_coordinates.is_empty()
    }

    /// All region names, sorted.
    pub fn region_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// A random named region other than `avoid`. Needs at least two regions.
    pub fn random_region(&self, avoid: Option<GridCoordinate>) -> Option<GridCoordinate> {
        if self.by_coordinates.len() < 2 {
            return None;
        }
        self.by_coordinates
            .keys()
            .filter(|c| Some(**c) != avoid)
            .copied()
            .choose(&mut rand::thread_rng())
    }
}
