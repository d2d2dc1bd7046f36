use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use regiongrow_grid::{BlockBox, GridCoordinate};
use regiongrow_growth::{
    CaptureConfig, GrowthConfig, GrowthError, GrowthHandle, RegionGrowthCoordinator, Thresholds, Trigger,
    Verdict, spawn_periodic,
};
use regiongrow_metrics::GrowthMetrics;
use regiongrow_scan::ScanSettings;
use regiongrow_storage::file::FileRegionStore;
use regiongrow_storage::memory::MemoryRegionStore;
use regiongrow_storage::{DirectoryError, NamingRules, RegionDirectory, RegionStore};
use regiongrow_world::{
    CaptureError, ChunkSnapshot, Material, SnapshotBuilder, SnapshotGrid, Tile, WorldBounds,
    WorldSnapshotProvider,
};
use tokio::sync::Semaphore;

const REGION: i32 = 32;
const FLOOR: i32 = 20;
const BOUNDS: WorldBounds = WorldBounds { min_y: 0, max_y: 64 };

fn c(x: i32, z: i32) -> GridCoordinate {
    GridCoordinate::new(x, z)
}

fn config() -> GrowthConfig {
    GrowthConfig {
        region_size: REGION,
        world: BOUNDS,
        scan: ScanSettings {
            inset: 2,
            depth_below: 10,
            height_above: 8,
        },
        thresholds: Thresholds {
            min_score: 2,
            min_wood: 1,
            density_ratio: 1.0,
        },
        capture: CaptureConfig {
            max_attempts: 1,
            retry_delay_ms: 1,
            recapture_delay_ms: 1,
        },
        naming: NamingRules::default(),
        scan_interval_secs: 1,
    }
}

/// Stone up to `FLOOR` everywhere. Rich regions also get one coal ore and one
/// log next to the open air; poor regions get nothing.
#[derive(Default)]
struct FakeWorld {
    poor: HashSet<GridCoordinate>,
    captures: Mutex<Vec<GridCoordinate>>,
    /// Captures left that come back half-loaded.
    blank_captures: AtomicUsize,
    gate: Option<Semaphore>,
}

impl FakeWorld {
    fn rich() -> Self {
        Self::default()
    }

    fn poor_at(poor: &[GridCoordinate]) -> Self {
        Self {
            poor: poor.iter().copied().collect(),
            ..Self::default()
        }
    }

    fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(16);
        }
    }

    fn captured(&self) -> Vec<GridCoordinate> {
        self.captures.lock().unwrap().clone()
    }

    fn chunk(&self, region: GridCoordinate, first: bool, chunk_x: i32, chunk_z: i32) -> ChunkSnapshot {
        let mut builder = SnapshotBuilder::new(BOUNDS);
        for y in 0..=FLOOR {
            builder.fill_layer(y, Material::Stone);
        }
        if first && !self.poor.contains(&region) {
            builder.set_block(8, FLOOR, 8, Material::CoalOre);
            builder.set_block(9, FLOOR + 1, 8, Material::Log);
        }
        builder.build(chunk_x, chunk_z)
    }
}

#[async_trait]
impl WorldSnapshotProvider for FakeWorld {
    async fn capture(&self, area: BlockBox) -> SnapshotGrid {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }

        let region = GridCoordinate::containing(area.min_x, area.min_z, REGION);
        self.captures.lock().unwrap().push(region);

        let blank = self
            .blank_captures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        let (min_cx, min_cz, max_cx, max_cz) = area.chunk_range();
        let mut failures = Vec::new();
        if blank {
            failures.push(CaptureError::TileUnavailable {
                chunk_x: min_cx,
                chunk_z: min_cz,
                attempts: 1,
            });
        }
        let mut tiles = Vec::new();
        for cx in min_cx..=max_cx {
            for cz in min_cz..=max_cz {
                let first = cx == min_cx && cz == min_cz;
                let tile = match (blank, first) {
                    (true, true) => Tile::Unavailable,
                    (true, false) => Tile::Captured(ChunkSnapshot::unpopulated(cx, cz, BOUNDS)),
                    (false, _) => Tile::Captured(self.chunk(region, first, cx, cz)),
                };
                tiles.push(tile);
            }
        }
        let width = (max_cx - min_cx + 1) as usize;
        let depth = (max_cz - min_cz + 1) as usize;
        SnapshotGrid::new(min_cx, min_cz, width, depth, BOUNDS, tiles).with_failures(failures)
    }
}

struct Harness {
    handle: GrowthHandle,
    task: tokio::task::JoinHandle<()>,
    world: Arc<FakeWorld>,
    metrics: Arc<GrowthMetrics>,
}

async fn start_with(world: FakeWorld, store: Arc<dyn RegionStore>, config: GrowthConfig) -> Harness {
    let metrics = Arc::new(GrowthMetrics::new(config.summary()));
    let directory = RegionDirectory::load(store, config.naming.clone(), Arc::clone(&metrics))
        .await
        .unwrap();
    let world = Arc::new(world);
    let (handle, task) = RegionGrowthCoordinator::spawn(directory, world.clone(), &config, Arc::clone(&metrics));
    Harness {
        handle,
        task,
        world,
        metrics,
    }
}

async fn start(world: FakeWorld) -> Harness {
    start_with(world, Arc::new(MemoryRegionStore::new()), config()).await
}

#[tokio::test]
async fn rich_world_opens_exactly_one_region() {
    let h = start(FakeWorld::rich()).await;

    let summary = h.handle.periodic().await.unwrap();

    assert_eq!(summary.allocated, vec![c(0, 0)]);
    assert_eq!(summary.evaluations.len(), 1);
    assert_eq!(summary.evaluations[0].verdict, Verdict::Sufficient);
    assert_eq!(summary.evaluations[0].result.score, 2);
    assert_eq!(summary.evaluations[0].result.wood, 1);
    assert_eq!(summary.open_region, Some(c(0, 0)));
    assert_eq!(h.metrics.allocations(), 1);
    assert_eq!(h.world.captured(), vec![c(0, 0)]);
}

#[tokio::test]
async fn two_poor_regions_then_rich_opens_three() {
    let h = start(FakeWorld::poor_at(&[c(0, 0), c(0, 1)])).await;

    let summary = h.handle.periodic().await.unwrap();

    assert_eq!(summary.allocated, vec![c(0, 0), c(0, 1), c(-1, 1)]);
    let verdicts: Vec<_> = summary.evaluations.iter().map(|e| e.verdict).collect();
    assert_eq!(
        verdicts,
        vec![Verdict::InsufficientResources, Verdict::InsufficientResources, Verdict::Sufficient]
    );
    assert_eq!(summary.open_region, Some(c(-1, 1)));
    assert_eq!(h.world.captured(), vec![c(0, 0), c(0, 1), c(-1, 1)]);

    let view = h.handle.view();
    assert_eq!(view.open_region(), Some(c(-1, 1)));
    assert_eq!(view.frontier(), c(-1, 0));
    assert_eq!(view.len(), 3);
}

#[tokio::test]
async fn periodic_on_good_open_region_allocates_nothing() {
    let h = start(FakeWorld::rich()).await;
    h.handle.periodic().await.unwrap();

    let again = h.handle.periodic().await.unwrap();
    assert!(again.allocated.is_empty());
    assert_eq!(again.evaluations[0].region, c(0, 0));
    assert_eq!(h.metrics.allocations(), 1);
}

#[tokio::test]
async fn add_region_forces_one_allocation() {
    let h = start(FakeWorld::rich()).await;
    h.handle.periodic().await.unwrap();

    let summary = h.handle.add_region().await.unwrap();
    assert_eq!(summary.allocated, vec![c(0, 1)]);
    assert_eq!(summary.evaluations.len(), 1);
    assert_eq!(summary.evaluations[0].region, c(0, 1));
    assert_eq!(h.handle.view().open_region(), Some(c(0, 1)));
}

#[tokio::test]
async fn rescan_reports_without_allocating() {
    let h = start(FakeWorld::poor_at(&[c(4, -2)])).await;

    let summary = h.handle.rescan(c(4, -2)).await.unwrap();

    assert_eq!(summary.trigger, Trigger::Rescan(c(4, -2)));
    assert!(summary.allocated.is_empty());
    assert_eq!(summary.evaluations[0].verdict, Verdict::InsufficientResources);
    assert!(
        summary.evaluations[0]
            .report
            .last()
            .unwrap()
            .starts_with("Summary: Insufficient")
    );
    assert!(h.handle.view().is_empty());
    assert_eq!(h.metrics.allocations(), 0);
}

#[tokio::test]
async fn duplicate_trigger_for_busy_region_is_rejected() {
    let h = start(FakeWorld::gated()).await;

    let first = h.handle.submit(Trigger::Rescan(c(3, 3))).await.unwrap();
    let second = h.handle.rescan(c(3, 3)).await;
    assert_eq!(second.unwrap_err(), GrowthError::InFlight(c(3, 3)));

    h.world.release();
    let summary = first.await.unwrap().unwrap();
    assert_eq!(summary.evaluations.len(), 1);
    assert_eq!(h.world.captured(), vec![c(3, 3)]);
    assert!(h.metrics.generate_report().contains("Coalesced: 1"));

    // Free again once the first scan is done.
    assert!(h.handle.rescan(c(3, 3)).await.is_ok());
}

#[tokio::test]
async fn different_regions_are_evaluated_concurrently() {
    let h = start(FakeWorld::gated()).await;

    let first = h.handle.submit(Trigger::Rescan(c(1, 1))).await.unwrap();
    let second = h.handle.submit(Trigger::Rescan(c(2, 2))).await.unwrap();

    // Both workers are parked on the gate at the same time.
    assert_eq!(h.handle.rescan(c(1, 1)).await.unwrap_err(), GrowthError::InFlight(c(1, 1)));
    assert_eq!(h.handle.rescan(c(2, 2)).await.unwrap_err(), GrowthError::InFlight(c(2, 2)));
    assert!(h.world.captured().is_empty());

    h.world.release();
    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first.evaluations[0].region, c(1, 1));
    assert_eq!(second.evaluations[0].region, c(2, 2));

    let mut captured = h.world.captured();
    captured.sort_by_key(|r| (r.x, r.z));
    assert_eq!(captured, vec![c(1, 1), c(2, 2)]);
    assert!(h.metrics.generate_report().contains("Coalesced: 2"));
}

#[tokio::test]
async fn half_loaded_region_is_recaptured_once() {
    let world = FakeWorld::rich();
    world.blank_captures.store(1, Ordering::SeqCst);
    let h = start(world).await;

    let summary = h.handle.periodic().await.unwrap();
    let evaluation = &summary.evaluations[0];

    assert!(evaluation.recaptured);
    assert_eq!(evaluation.verdict, Verdict::Sufficient);
    assert_eq!(evaluation.unavailable_tiles, 0);
    assert!(evaluation.capture_failures.is_empty());
    assert_eq!(h.world.captured(), vec![c(0, 0), c(0, 0)]);
    assert_eq!(summary.allocated, vec![c(0, 0)]);
}

#[tokio::test]
async fn recapture_happens_at_most_once() {
    let world = FakeWorld::rich();
    world.blank_captures.store(10, Ordering::SeqCst);
    let h = start(world).await;

    // Stays half-loaded: one recapture, then the empty result stands.
    let summary = h.handle.rescan(c(0, 0)).await.unwrap();
    let evaluation = &summary.evaluations[0];
    assert!(evaluation.recaptured);
    assert_eq!(evaluation.unavailable_tiles, 1);
    assert_eq!(
        evaluation.capture_failures,
        vec![CaptureError::TileUnavailable {
            chunk_x: 0,
            chunk_z: 0,
            attempts: 1
        }]
    );
    assert_eq!(evaluation.verdict, Verdict::InsufficientResources);
    assert_eq!(h.world.captured().len(), 2);
}

#[tokio::test]
async fn exhausted_names_do_not_stop_the_service() {
    let mut config = config();
    config.naming.names.clear();
    let h = start_with(FakeWorld::rich(), Arc::new(MemoryRegionStore::new()), config).await;

    let err = h.handle.periodic().await.unwrap_err();
    assert_eq!(err, GrowthError::Directory(DirectoryError::NamesExhausted));

    let summary = h.handle.rescan(c(0, 0)).await.unwrap();
    assert_eq!(summary.evaluations[0].verdict, Verdict::Sufficient);
}

#[tokio::test]
async fn growth_halts_cleanly_when_names_run_out() {
    let mut config = config();
    config.naming = NamingRules {
        max_length: 4,
        names: vec!["oak".to_string()],
    };
    // "oak", then "oak1" ... all poor, so growth keeps allocating until the
    // suffix makes names too long.
    let poor: Vec<_> = regiongrow_grid::SpiralWalk::new().take(20).collect();
    let h = start_with(FakeWorld::poor_at(&poor), Arc::new(MemoryRegionStore::new()), config).await;

    let summary = h.handle.periodic().await.unwrap();
    assert_eq!(summary.halted, Some(DirectoryError::NamesExhausted));
    assert_eq!(summary.allocated.len(), 10);
    assert_eq!(h.handle.view().coordinates_of("oak9"), Some(summary.allocated[9]));
}

#[tokio::test]
async fn naming_through_the_handle() {
    let h = start(FakeWorld::rich()).await;

    h.handle.name_region(c(7, 7), "Outpost").await.unwrap();
    assert_eq!(h.handle.view().coordinates_of("outpost"), Some(c(7, 7)));

    let err = h.handle.name_region(c(7, 7), "elsewhere").await.unwrap_err();
    assert!(matches!(
        err,
        GrowthError::Directory(DirectoryError::NameConflict { .. })
    ));
    let err = h.handle.name_region(c(1, 1), "no way!").await.unwrap_err();
    assert!(matches!(err, GrowthError::Directory(DirectoryError::InvalidName { .. })));

    h.handle.rename_region(c(7, 7), "far post").await.unwrap();
    let view = h.handle.view();
    assert_eq!(view.name_of(c(7, 7)), Some("far post"));
    assert_eq!(view.coordinates_of("outpost"), None);
}

#[tokio::test]
async fn grown_regions_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Arc::new(FileRegionStore::open(dir.path()).await.unwrap());
        let h = start_with(FakeWorld::poor_at(&[c(0, 0), c(0, 1)]), store, config()).await;
        h.handle.periodic().await.unwrap();
        h.handle.shutdown().await;
        h.task.await.unwrap();
    }

    let store = Arc::new(FileRegionStore::open(dir.path()).await.unwrap());
    let metrics = Arc::new(GrowthMetrics::new(String::new()));
    let directory = RegionDirectory::load(store, NamingRules::default(), metrics).await.unwrap();
    assert_eq!(directory.len(), 3);
    assert_eq!(directory.open_region(), Some(c(-1, 1)));
    assert_eq!(directory.frontier(), c(-1, 0));
    assert_eq!(directory.name_of(c(0, 0)), Some("amber"));
}

#[tokio::test]
async fn periodic_trigger_runs_immediately() {
    let h = start(FakeWorld::rich()).await;
    let mut views = h.handle.subscribe();

    let periodic = spawn_periodic(h.handle.clone(), Duration::from_secs(3600));
    views.wait_for(|v| v.open_region().is_some()).await.unwrap();
    periodic.abort();

    assert_eq!(h.handle.view().open_region(), Some(c(0, 0)));
}

#[tokio::test]
async fn stopped_service_reports_stopped() {
    let h = start(FakeWorld::rich()).await;
    h.handle.shutdown().await;
    h.task.await.unwrap();

    assert_eq!(h.handle.periodic().await.unwrap_err(), GrowthError::Stopped);
}
