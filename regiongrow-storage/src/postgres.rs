use anyhow::{Context, Result};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use regiongrow_grid::GridCoordinate;
use tokio_postgres::NoTls;

use crate::{RegionRecord, RegionStore};

/// Region records in two tables, keyed by coordinates and by name.
pub struct PostgresRegionStore {
    pool: Pool,
}

impl PostgresRegionStore {
    pub async fn new(connection_string: &str) -> Result<Self> {
        let mut cfg = Config::new();
        cfg.url = Some(connection_string.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("Failed to create Postgres pool")?;

        let store = Self { pool };
        store.init_schema().await?;

        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        client
            .batch_execute(
                "
                CREATE TABLE IF NOT EXISTS regions_by_coordinates (
                    coordinates TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    updated_at TIMESTAMP DEFAULT NOW()
                );
                CREATE TABLE IF NOT EXISTS regions_by_name (
                    name TEXT PRIMARY KEY,
                    coordinates TEXT NOT NULL,
                    updated_at TIMESTAMP DEFAULT NOW()
                );
            ",
            )
            .await
            .context("Failed to init region schema")?;
        Ok(())
    }
}

#[async_trait]
impl RegionStore for PostgresRegionStore {
    async fn load_regions(&self) -> Result<Vec<RegionRecord>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let rows = client
            .query("SELECT coordinates, name FROM regions_by_coordinates", &[])
            .await
            .context("Failed to load regions")?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let coordinates: String = row.get(0);
            let name: String = row.get(1);
            match coordinates.parse::<GridCoordinate>() {
                Ok(coordinates) => records.push(RegionRecord { coordinates, name }),
                Err(e) => log::warn!("Skipping region row {:?}: {}", name, e),
            }
        }
        Ok(records)
    }

    async fn save_region(&self, record: &RegionRecord) -> Result<()> {
        let mut client = self.pool.get().await.context("Failed to get DB connection")?;
        let coordinates = record.coordinates.to_string();

        let tx = client.transaction().await?;
        tx.execute(
            "INSERT INTO regions_by_coordinates (coordinates, name, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (coordinates) DO UPDATE SET name = $2, updated_at = NOW()",
            &[&coordinates, &record.name],
        )
        .await
        .context("Failed to upsert region by coordinates")?;
        tx.execute(
            "INSERT INTO regions_by_name (name, coordinates, updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (name) DO UPDATE SET coordinates = $2, updated_at = NOW()",
            &[&record.name, &coordinates],
        )
        .await
        .context("Failed to upsert region by name")?;
        tx.commit().await.context("Failed to commit region")?;

        Ok(())
    }

    async fn delete_region(&self, record: &RegionRecord) -> Result<()> {
        let mut client = self.pool.get().await.context("Failed to get DB connection")?;
        let coordinates = record.coordinates.to_string();

        let tx = client.transaction().await?;
        tx.execute(
            "DELETE FROM regions_by_coordinates WHERE coordinates = $1",
            &[&coordinates],
        )
        .await?;
        tx.execute("DELETE FROM regions_by_name WHERE name = $1", &[&record.name])
            .await?;
        tx.commit().await.context("Failed to commit region delete")?;

        Ok(())
    }
}
