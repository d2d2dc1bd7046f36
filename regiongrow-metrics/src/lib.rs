use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct GrowthMetrics {
    // Capture
    pub total_captures: AtomicUsize,
    pub total_capture_time_us: AtomicU64,
    pub total_tiles_captured: AtomicUsize,
    pub total_tile_retries: AtomicUsize,
    pub total_tiles_unavailable: AtomicUsize,
    pub total_recaptures: AtomicUsize,

    // Scan
    pub total_scans: AtomicUsize,
    pub total_scan_time_us: AtomicU64,
    pub max_scan_time_us: AtomicU64,
    pub total_cells_examined: AtomicU64,
    pub total_scans_passed: AtomicUsize,

    // Directory
    pub total_allocations: AtomicUsize,
    pub total_persistence_failures: AtomicUsize,

    // Triggers
    pub total_cycles: AtomicUsize,
    pub total_coalesced_triggers: AtomicUsize,

    // Session
    pub start_time: Option<Instant>,
    pub config_summary: String,
}

impl GrowthMetrics {
    pub fn new(config_summary: String) -> Self {
        Self {
            start_time: Some(Instant::now()),
            config_summary,
            ..Default::default()
        }
    }

    pub fn record_capture(&self, duration: Duration, tiles: usize, retries: usize, unavailable: usize) {
        self.total_captures.fetch_add(1, Ordering::Relaxed);
        self.total_capture_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_tiles_captured.fetch_add(tiles, Ordering::Relaxed);
        self.total_tile_retries.fetch_add(retries, Ordering::Relaxed);
        self.total_tiles_unavailable.fetch_add(unavailable, Ordering::Relaxed);
    }

    pub fn record_recapture(&self) {
        self.total_recaptures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scan(&self, duration: Duration, cells_examined: u64) {
        self.total_scans.fetch_add(1, Ordering::Relaxed);
        let us = duration.as_micros() as u64;
        self.total_scan_time_us.fetch_add(us, Ordering::Relaxed);
        self.max_scan_time_us.fetch_max(us, Ordering::Relaxed);
        self.total_cells_examined.fetch_add(cells_examined, Ordering::Relaxed);
    }

    pub fn record_scan_passed(&self) {
        self.total_scans_passed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_allocation(&self) {
        self.total_allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_failure(&self) {
        self.total_persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle(&self) {
        self.total_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced_trigger(&self) {
        self.total_coalesced_triggers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn allocations(&self) -> usize {
        self.total_allocations.load(Ordering::Relaxed)
    }

    pub fn generate_report(&self) -> String {
        let uptime = self.start_time.unwrap_or_else(Instant::now).elapsed();

        let captures = self.total_captures.load(Ordering::Relaxed);
        let capture_time = self.total_capture_time_us.load(Ordering::Relaxed) as f64 / 1000.0; // ms
        let capture_avg = if captures > 0 { capture_time / captures as f64 } else { 0.0 };
        let tiles = self.total_tiles_captured.load(Ordering::Relaxed);
        let retries = self.total_tile_retries.load(Ordering::Relaxed);
        let unavailable = self.total_tiles_unavailable.load(Ordering::Relaxed);
        let recaptures = self.total_recaptures.load(Ordering::Relaxed);

        let scans = self.total_scans.load(Ordering::Relaxed);
        let scan_time = self.total_scan_time_us.load(Ordering::Relaxed) as f64 / 1000.0;
        let scan_max = self.max_scan_time_us.load(Ordering::Relaxed) as f64 / 1000.0;
        let scan_avg = if scans > 0 { scan_time / scans as f64 } else { 0.0 };
        let cells = self.total_cells_examined.load(Ordering::Relaxed);
        let cells_avg = if scans > 0 { cells as f64 / scans as f64 } else { 0.0 };
        let passed = self.total_scans_passed.load(Ordering::Relaxed);
        let pass_rate = if scans > 0 { (passed as f64 / scans as f64) * 100.0 } else { 0.0 };

        let allocations = self.total_allocations.load(Ordering::Relaxed);
        let persistence_failures = self.total_persistence_failures.load(Ordering::Relaxed);
        let cycles = self.total_cycles.load(Ordering::Relaxed);
        let coalesced = self.total_coalesced_triggers.load(Ordering::Relaxed);

        format!(
            "Region Growth Report\n\
             ====================\n\
             Configuration: {}\n\
             Session Duration: {:.2?}\n\n\
             [Capture]\n\
             Captures: {}\n\
             Avg Time: {:.2} ms/capture\n\
             Tiles: {}\n\
             Tile Retries: {}\n\
             Tiles Unavailable: {}\n\
             Whole-Region Recaptures: {}\n\n\
             [Scan]\n\
             Scans: {}\n\
             Avg Time: {:.2} ms/scan\n\
             Max Time: {:.2} ms\n\
             Avg Cells Examined: {:.0}\n\
             Passed: {} ({:.1}%)\n\n\
             [Directory]\n\
             Regions Allocated: {}\n\
             Persistence Failures: {}\n\n\
             [Triggers]\n\
             Cycles Started: {}\n\
             Coalesced: {}\n",
            self.config_summary,
            uptime,
            captures, capture_avg, tiles, retries, unavailable, recaptures,
            scans, scan_avg, scan_max, cells_avg, passed, pass_rate,
            allocations, persistence_failures,
            cycles, coalesced
        )
    }
}
