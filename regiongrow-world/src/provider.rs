//! Snapshot capture with bounded retries.
//!
//! A chunk can report itself loaded before its blocks exist. Capture loads
//! every tile once, then retries the suspect ones in rounds separated by a
//! fixed delay. Tiles still missing after the last round are recorded as
//! [`Tile::Unavailable`] instead of failing the capture.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rayon::prelude::*;
use regiongrow_grid::BlockBox;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{ChunkSnapshot, ChunkSource, SnapshotGrid, Tile, WorldBounds};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("chunk {chunk_x},{chunk_z} unavailable after {attempts} attempts")]
    TileUnavailable { chunk_x: i32, chunk_z: i32, attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl RetryPolicy {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            retry_delay_ms: 750,
        }
    }
}

/// Supplies an immutable snapshot grid covering a block rectangle.
#[async_trait]
pub trait WorldSnapshotProvider: Send + Sync {
    async fn capture(&self, area: BlockBox) -> SnapshotGrid;
}

/// Tiles the requested area into chunks and loads them from a [`ChunkSource`].
///
/// Captures are serialised: only one capture at a time issues chunk loads.
pub struct TiledSnapshotProvider {
    source: Arc<dyn ChunkSource>,
    bounds: WorldBounds,
    policy: RetryPolicy,
    gate: Mutex<()>,
}

impl TiledSnapshotProvider {
    pub fn new(source: Arc<dyn ChunkSource>, bounds: WorldBounds, policy: RetryPolicy) -> Self {
        Self {
            source,
            bounds,
            policy,
            gate: Mutex::new(()),
        }
    }

    async fn load_round(&self, positions: Vec<(i32, i32)>) -> Vec<((i32, i32), Option<ChunkSnapshot>)> {
        let source = Arc::clone(&self.source);
        let fallback = positions.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            positions
                .into_par_iter()
                .map(|pos| (pos, load_checked(source.as_ref(), pos)))
                .collect::<Vec<_>>()
        })
        .await;

        match loaded {
            Ok(results) => results,
            Err(e) => {
                log::warn!("Chunk loading worker failed: {}", e);
                fallback.into_iter().map(|pos| (pos, None)).collect()
            }
        }
    }
}

fn load_checked(source: &dyn ChunkSource, (chunk_x, chunk_z): (i32, i32)) -> Option<ChunkSnapshot> {
    match source.load_chunk(chunk_x, chunk_z) {
        Ok(snapshot) if snapshot.is_suspect() => {
            log::debug!("Chunk {},{} looks unpopulated", chunk_x, chunk_z);
            None
        }
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            log::debug!("Failed to load chunk {},{}: {:#}", chunk_x, chunk_z, e);
            None
        }
    }
}

#[async_trait]
impl WorldSnapshotProvider for TiledSnapshotProvider {
    async fn capture(&self, area: BlockBox) -> SnapshotGrid {
        let _guard = self.gate.lock().await;

        let (min_cx, min_cz, max_cx, max_cz) = area.chunk_range();
        let width = (max_cx - min_cx + 1).max(0) as usize;
        let depth = (max_cz - min_cz + 1).max(0) as usize;

        let mut slots: Vec<Option<ChunkSnapshot>> = vec![None; width * depth];
        let index = |cx: i32, cz: i32| (cx - min_cx) as usize * depth + (cz - min_cz) as usize;

        let mut pending: Vec<(i32, i32)> = (min_cx..=max_cx)
            .flat_map(|cx| (min_cz..=max_cz).map(move |cz| (cx, cz)))
            .collect();
        let mut retries = 0;
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            if pending.is_empty() {
                break;
            }
            if attempt > 1 {
                retries += pending.len();
                log::debug!(
                    "Retrying {} chunk(s), attempt {}/{}",
                    pending.len(),
                    attempt,
                    attempts
                );
                tokio::time::sleep(self.policy.retry_delay()).await;
            }

            let mut still_pending = Vec::new();
            for (pos, loaded) in self.load_round(std::mem::take(&mut pending)).await {
                match loaded {
                    Some(snapshot) => slots[index(pos.0, pos.1)] = Some(snapshot),
                    None => still_pending.push(pos),
                }
            }
            pending = still_pending;
        }

        let failures: Vec<CaptureError> = pending
            .iter()
            .map(|&(chunk_x, chunk_z)| CaptureError::TileUnavailable { chunk_x, chunk_z, attempts })
            .collect();
        for err in &failures {
            log::warn!("{}", err);
        }

        let tiles = slots
            .into_iter()
            .map(|slot| slot.map_or(Tile::Unavailable, Tile::Captured))
            .collect();
        SnapshotGrid::new(min_cx, min_cz, width, depth, self.bounds, tiles)
            .with_retries(retries)
            .with_failures(failures)
    }
}
