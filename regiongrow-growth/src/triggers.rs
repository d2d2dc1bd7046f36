use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::coordinator::{GrowthError, GrowthHandle};

/// Re-evaluates the open region every `every`, starting immediately.
///
/// Ends when the coordinator stops.
pub fn spawn_periodic(handle: GrowthHandle, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match handle.periodic().await {
                Ok(summary) => {
                    if let Some(e) = summary.halted {
                        log::error!("Periodic growth halted: {}", e);
                    }
                }
                Err(GrowthError::InFlight(region)) => {
                    log::debug!("Skipping periodic scan, region {} still in progress", region)
                }
                Err(GrowthError::Stopped) => break,
                Err(e) => log::error!("Periodic scan failed: {}", e),
            }
        }
    })
}
