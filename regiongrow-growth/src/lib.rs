//! Region growth: evaluate the open region and open new ones while it falls
//! short.

pub mod config;
pub mod coordinator;
pub mod decision;
pub mod report;
pub mod triggers;

pub use config::{CaptureConfig, ConfigError, GrowthConfig};
pub use coordinator::{CycleSummary, Evaluation, GrowthError, GrowthHandle, RegionGrowthCoordinator, Trigger};
pub use decision::{Thresholds, Verdict};
pub use triggers::spawn_periodic;
