//! The growth loop.
//!
//! One writer task owns the [`RegionDirectory`] and is the only place that
//! names regions. Capture and scanning for a region run on a worker task;
//! the worker reports back with [`Command::ScanFinished`] and the writer
//! decides what happens next. A cycle that finds its region lacking
//! allocates the next region and evaluates that one, until a region passes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use regiongrow_grid::GridCoordinate;
use regiongrow_metrics::GrowthMetrics;
use regiongrow_scan::{ResourceScanner, ScanResult};
use regiongrow_storage::{DirectoryError, DirectoryView, RegionDirectory};
use regiongrow_world::{CaptureError, SnapshotGrid, WorldSnapshotProvider};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::{CaptureConfig, GrowthConfig};
use crate::decision::{Thresholds, Verdict};
use crate::report::scan_report;

const COMMAND_BUFFER: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrowthError {
    #[error("growth service has stopped")]
    Stopped,
    #[error("region {0} is already being evaluated")]
    InFlight(GridCoordinate),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Re-evaluate the open region, growing if it falls short.
    Periodic,
    /// Open a new region now, then keep growing from it.
    AddRegion,
    /// Evaluate one region and report. Never allocates.
    Rescan(GridCoordinate),
}

impl Trigger {
    fn grows(self) -> bool {
        !matches!(self, Trigger::Rescan(_))
    }
}

/// One region's capture, scan and verdict.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub region: GridCoordinate,
    pub result: ScanResult,
    pub verdict: Verdict,
    pub report: Vec<String>,
    pub unavailable_tiles: usize,
    /// Chunks the final capture gave up on.
    pub capture_failures: Vec<CaptureError>,
    pub recaptured: bool,
}

/// Outcome of one triggered cycle.
#[derive(Debug, Clone)]
pub struct CycleSummary {
    pub trigger: Trigger,
    pub evaluations: Vec<Evaluation>,
    /// Regions opened during the cycle, in order.
    pub allocated: Vec<GridCoordinate>,
    pub open_region: Option<GridCoordinate>,
    /// Set when growth had to stop before a region passed.
    pub halted: Option<DirectoryError>,
}

type Reply<T> = oneshot::Sender<Result<T, GrowthError>>;

enum Command {
    Trigger {
        trigger: Trigger,
        reply: Reply<CycleSummary>,
    },
    NameRegion {
        coordinates: GridCoordinate,
        name: String,
        rename: bool,
        reply: Reply<()>,
    },
    ScanFinished {
        cycle: u64,
        evaluation: Evaluation,
    },
    Shutdown,
}

/// Cheap handle for triggering cycles and reading the directory.
#[derive(Clone)]
pub struct GrowthHandle {
    commands: mpsc::Sender<Command>,
    views: watch::Receiver<DirectoryView>,
}

impl GrowthHandle {
    /// Queues a cycle without waiting for it to finish.
    pub async fn submit(
        &self,
        trigger: Trigger,
    ) -> Result<oneshot::Receiver<Result<CycleSummary, GrowthError>>, GrowthError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Trigger { trigger, reply })
            .await
            .map_err(|_| GrowthError::Stopped)?;
        Ok(rx)
    }

    pub async fn trigger(&self, trigger: Trigger) -> Result<CycleSummary, GrowthError> {
        self.submit(trigger).await?.await.map_err(|_| GrowthError::Stopped)?
    }

    pub async fn periodic(&self) -> Result<CycleSummary, GrowthError> {
        self.trigger(Trigger::Periodic).await
    }

    pub async fn add_region(&self) -> Result<CycleSummary, GrowthError> {
        self.trigger(Trigger::AddRegion).await
    }

    pub async fn rescan(&self, region: GridCoordinate) -> Result<CycleSummary, GrowthError> {
        self.trigger(Trigger::Rescan(region)).await
    }

    /// Names an unnamed region; fails if either side is already bound.
    pub async fn name_region(&self, coordinates: GridCoordinate, name: &str) -> Result<(), GrowthError> {
        self.naming(coordinates, name, false).await
    }

    pub async fn rename_region(&self, coordinates: GridCoordinate, name: &str) -> Result<(), GrowthError> {
        self.naming(coordinates, name, true).await
    }

    async fn naming(&self, coordinates: GridCoordinate, name: &str, rename: bool) -> Result<(), GrowthError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::NameRegion {
                coordinates,
                name: name.to_string(),
                rename,
                reply,
            })
            .await
            .map_err(|_| GrowthError::Stopped)?;
        rx.await.map_err(|_| GrowthError::Stopped)?
    }

    /// Directory state as of the last mutation.
    pub fn view(&self) -> DirectoryView {
        self.views.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DirectoryView> {
        self.views.clone()
    }

    /// Stops the writer. Cycles still in flight are dropped.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }
}

/// Capture and scan for one region. Shared by all worker tasks.
struct Evaluator {
    provider: Arc<dyn WorldSnapshotProvider>,
    scanner: ResourceScanner,
    region_size: i32,
    thresholds: Thresholds,
    capture: CaptureConfig,
    metrics: Arc<GrowthMetrics>,
}

impl Evaluator {
    async fn evaluate(self: Arc<Self>, region: GridCoordinate) -> Evaluation {
        log::info!("Examining available resources in region \"{}\"...", region);

        let (mut grid, mut result) = self.capture_and_scan(region).await;
        let mut recaptured = false;

        // A half-loaded region reads as empty. Give it one more chance.
        if grid.unavailable_tiles() > 0 && result.looks_empty() {
            log::warn!(
                "Region {} came back empty with {} unavailable chunk(s); recapturing once",
                region,
                grid.unavailable_tiles()
            );
            for failure in grid.failures() {
                log::debug!("Region {}: {}", region, failure);
            }
            tokio::time::sleep(self.capture.recapture_delay()).await;
            self.metrics.record_recapture();
            (grid, result) = self.capture_and_scan(region).await;
            recaptured = true;
        }

        let verdict = self.thresholds.judge(&result);
        if verdict.passed() {
            self.metrics.record_scan_passed();
        }

        Evaluation {
            region,
            report: scan_report(region, &result, &self.thresholds, verdict),
            result,
            verdict,
            unavailable_tiles: grid.unavailable_tiles(),
            capture_failures: grid.failures().to_vec(),
            recaptured,
        }
    }

    async fn capture_and_scan(self: &Arc<Self>, region: GridCoordinate) -> (Arc<SnapshotGrid>, ScanResult) {
        let started = Instant::now();
        let grid = Arc::new(self.provider.capture(region.block_bounds(self.region_size)).await);
        self.metrics.record_capture(
            started.elapsed(),
            grid.stats.tiles,
            grid.stats.retries,
            grid.stats.unavailable,
        );

        let started = Instant::now();
        let evaluator = Arc::clone(self);
        let scanned = Arc::clone(&grid);
        let result = tokio::task::spawn_blocking(move || evaluator.scanner.scan(&scanned, region))
            .await
            .unwrap_or_else(|e| {
                log::error!("Scan of region {} failed: {}", region, e);
                ScanResult::default()
            });
        self.metrics.record_scan(started.elapsed(), result.examined);

        (grid, result)
    }
}

struct Cycle {
    trigger: Trigger,
    evaluations: Vec<Evaluation>,
    allocated: Vec<GridCoordinate>,
    reply: Reply<CycleSummary>,
}

/// Owns the directory and drives every cycle.
pub struct RegionGrowthCoordinator {
    directory: RegionDirectory,
    evaluator: Arc<Evaluator>,
    metrics: Arc<GrowthMetrics>,
    views: watch::Sender<DirectoryView>,
    // Weak so the writer stops once every handle and worker is gone.
    commands: mpsc::WeakSender<Command>,
    cycles: HashMap<u64, Cycle>,
    in_flight: HashSet<GridCoordinate>,
    next_cycle: u64,
}

impl RegionGrowthCoordinator {
    /// Starts the writer task and returns a handle to it.
    pub fn spawn(
        directory: RegionDirectory,
        provider: Arc<dyn WorldSnapshotProvider>,
        config: &GrowthConfig,
        metrics: Arc<GrowthMetrics>,
    ) -> (GrowthHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (views, view_rx) = watch::channel(directory.view());

        let evaluator = Arc::new(Evaluator {
            provider,
            scanner: ResourceScanner::new(config.region_size, config.world, config.scan),
            region_size: config.region_size,
            thresholds: config.thresholds,
            capture: config.capture,
            metrics: Arc::clone(&metrics),
        });

        let coordinator = Self {
            directory,
            evaluator,
            metrics,
            views,
            commands: tx.downgrade(),
            cycles: HashMap::new(),
            in_flight: HashSet::new(),
            next_cycle: 0,
        };
        let task = tokio::spawn(coordinator.run(rx));

        (
            GrowthHandle {
                commands: tx,
                views: view_rx,
            },
            task,
        )
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Trigger { trigger, reply } => self.start_cycle(trigger, reply).await,
                Command::NameRegion {
                    coordinates,
                    name,
                    rename,
                    reply,
                } => {
                    let outcome = if rename {
                        self.directory.rename_region(coordinates, &name).await
                    } else {
                        self.directory.name_region(coordinates, &name).await
                    };
                    if outcome.is_ok() {
                        self.publish();
                    }
                    let _ = reply.send(outcome.map_err(GrowthError::from));
                }
                Command::ScanFinished { cycle, evaluation } => self.scan_finished(cycle, evaluation).await,
                Command::Shutdown => break,
            }
        }
        log::info!("Growth coordinator stopped");
    }

    async fn start_cycle(&mut self, trigger: Trigger, reply: Reply<CycleSummary>) {
        let target = match trigger {
            Trigger::Rescan(region) => region,
            Trigger::Periodic => self.directory.open_region().unwrap_or(self.directory.frontier()),
            Trigger::AddRegion => self.directory.frontier(),
        };

        if self.in_flight.contains(&target) {
            log::info!("Region {} is already being evaluated; ignoring {:?}", target, trigger);
            self.metrics.record_coalesced_trigger();
            let _ = reply.send(Err(GrowthError::InFlight(target)));
            return;
        }

        let mut allocated = Vec::new();
        let needs_allocation = match trigger {
            Trigger::AddRegion => true,
            Trigger::Periodic => self.directory.open_region().is_none(),
            Trigger::Rescan(_) => false,
        };
        if needs_allocation {
            match self.directory.allocate_next().await {
                Ok(opened) => {
                    self.publish();
                    allocated.push(opened);
                }
                Err(e) => {
                    log::error!("Cannot open a new region: {}", e);
                    let _ = reply.send(Err(e.into()));
                    return;
                }
            }
        }

        self.metrics.record_cycle();
        let id = self.next_cycle;
        self.next_cycle += 1;
        self.cycles.insert(
            id,
            Cycle {
                trigger,
                evaluations: Vec::new(),
                allocated,
                reply,
            },
        );

        if !self.dispatch(id, target) {
            self.finish(id, None);
        }
    }

    /// Hands `region` to a worker. False if the writer is shutting down.
    fn dispatch(&mut self, cycle: u64, region: GridCoordinate) -> bool {
        let Some(tx) = self.commands.upgrade() else {
            return false;
        };
        self.in_flight.insert(region);

        let evaluator = Arc::clone(&self.evaluator);
        tokio::spawn(async move {
            let evaluation = evaluator.evaluate(region).await;
            if tx.send(Command::ScanFinished { cycle, evaluation }).await.is_err() {
                log::debug!("Dropping scan of region {}: coordinator stopped", region);
            }
        });
        true
    }

    async fn scan_finished(&mut self, id: u64, evaluation: Evaluation) {
        self.in_flight.remove(&evaluation.region);
        for line in &evaluation.report {
            log::info!("{}", line);
        }

        let Some(cycle) = self.cycles.get_mut(&id) else {
            return;
        };
        let passed = evaluation.verdict.passed();
        let grows = cycle.trigger.grows();
        cycle.evaluations.push(evaluation);

        if passed || !grows {
            self.finish(id, None);
            return;
        }

        let next = match self.directory.allocate_next().await {
            Ok(next) => next,
            Err(e) => {
                log::error!("Growth stopped, cannot open a new region: {}", e);
                self.finish(id, Some(e));
                return;
            }
        };
        self.publish();
        if let Some(cycle) = self.cycles.get_mut(&id) {
            cycle.allocated.push(next);
        }

        if self.in_flight.contains(&next) {
            log::info!("Region {} is already being evaluated; ending this cycle", next);
            self.finish(id, None);
        } else if !self.dispatch(id, next) {
            self.finish(id, None);
        }
    }

    fn finish(&mut self, id: u64, halted: Option<DirectoryError>) {
        let Some(cycle) = self.cycles.remove(&id) else {
            return;
        };
        let summary = CycleSummary {
            trigger: cycle.trigger,
            evaluations: cycle.evaluations,
            allocated: cycle.allocated,
            open_region: self.directory.open_region(),
            halted,
        };
        log::info!(
            "{:?} cycle done: {} region(s) evaluated, {} opened, open region {}",
            summary.trigger,
            summary.evaluations.len(),
            summary.allocated.len(),
            summary
                .open_region
                .map_or_else(|| "none".to_string(), |c| c.to_string())
        );
        let _ = cycle.reply.send(Ok(summary));
    }

    fn publish(&self) {
        self.views.send_replace(self.directory.view());
    }
}
