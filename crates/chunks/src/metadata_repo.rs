use std::sync::Arc;

use chrono::{DateTime, Utc};
use dem::WorldVersionCache;
use sqlx::{PgPool, Row};

use crate::error::ChunkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatus {
    Pending,
    Ready,
    Failed,
}

impl ChunkStatus {
    fn as_str(self) -> &'static str {
        match self {
            ChunkStatus::Pending => "pending",
            ChunkStatus::Ready => "ready",
            ChunkStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Result<Self, ChunkError> {
        match s {
            "pending" => Ok(ChunkStatus::Pending),
            "ready" => Ok(ChunkStatus::Ready),
            "failed" => Ok(ChunkStatus::Failed),
            other => Err(ChunkError::Invariant(format!("unknown chunk status {other:?}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkMetadataRow {
    pub chunk_x: i64,
    pub chunk_z: i64,
    pub layer: String,
    pub resolution: u16,
    pub object_key: Option<String>,
    pub checksum: Option<String>,
    pub status: ChunkStatus,
    pub generated_at: Option<DateTime<Utc>>,
}

fn row_to_metadata(row: sqlx::postgres::PgRow) -> Result<ChunkMetadataRow, ChunkError> {
    let status: String = row.get("status");
    let resolution: i32 = row.get("resolution");
    Ok(ChunkMetadataRow {
        chunk_x: row.get("chunk_x"),
        chunk_z: row.get("chunk_z"),
        layer: row.get("layer"),
        resolution: resolution as u16,
        object_key: row.get("s3_key"),
        checksum: row.get("checksum"),
        status: ChunkStatus::parse(&status)?,
        generated_at: row.get("generated_at"),
    })
}

/// Postgres-backed repository for `world_chunks`, keyed by
/// `(world_version, chunk_x, chunk_z, layer, resolution)`.
pub struct ChunkMetadataRepo {
    pool: PgPool,
    versions: Arc<WorldVersionCache>,
}

impl ChunkMetadataRepo {
    pub fn new(pool: PgPool, versions: Arc<WorldVersionCache>) -> Self {
        Self { pool, versions }
    }

    fn resolve(&self, version: &str) -> Result<i64, ChunkError> {
        self.versions
            .get(version)
            .map(|v| v.id.get())
            .ok_or_else(|| ChunkError::UnknownWorldVersion(version.to_string()))
    }

    pub async fn get(
        &self,
        version: &str,
        chunk_x: i64,
        chunk_z: i64,
        layer: &str,
        resolution: u16,
    ) -> Result<Option<ChunkMetadataRow>, ChunkError> {
        let world_version_id = self.resolve(version)?;

        let row = sqlx::query(
            r#"
            SELECT chunk_x, chunk_z, layer, resolution, s3_key, checksum, status, generated_at
            FROM world_chunks
            WHERE world_version_id = $1 AND chunk_x = $2 AND chunk_z = $3 AND layer = $4 AND resolution = $5
            "#,
        )
        .bind(world_version_id)
        .bind(chunk_x)
        .bind(chunk_z)
        .bind(layer)
        .bind(resolution as i32)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_metadata).transpose()
    }

    pub async fn is_ready(
        &self,
        version: &str,
        chunk_x: i64,
        chunk_z: i64,
        layer: &str,
        resolution: u16,
    ) -> Result<bool, ChunkError> {
        Ok(self
            .get(version, chunk_x, chunk_z, layer, resolution)
            .await?
            .map(|row| row.status == ChunkStatus::Ready)
            .unwrap_or(false))
    }

    /// Inserts or updates the row to `status = "ready"`. Idempotent: the
    /// same natural key always converges to the same `(object_key,
    /// checksum)` pair because chunk content is deterministic.
    pub async fn upsert_ready(
        &self,
        version: &str,
        chunk_x: i64,
        chunk_z: i64,
        layer: &str,
        resolution: u16,
        object_key: &str,
        checksum: &str,
    ) -> Result<(), ChunkError> {
        let world_version_id = self.resolve(version)?;

        sqlx::query(
            r#"
            INSERT INTO world_chunks
                (world_version_id, chunk_x, chunk_z, layer, resolution, s3_key, checksum, status, generated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'ready', now())
            ON CONFLICT (world_version_id, chunk_x, chunk_z, layer, resolution)
            DO UPDATE SET s3_key = EXCLUDED.s3_key, checksum = EXCLUDED.checksum,
                          status = 'ready', generated_at = now()
            "#,
        )
        .bind(world_version_id)
        .bind(chunk_x)
        .bind(chunk_z)
        .bind(layer)
        .bind(resolution as i32)
        .bind(object_key)
        .bind(checksum)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a fabrication failure so a reader's `GetChunkStatus` can
    /// distinguish "never attempted" from "attempted and failed" instead of
    /// polling a pending row forever.
    pub async fn mark_failed(
        &self,
        version: &str,
        chunk_x: i64,
        chunk_z: i64,
        layer: &str,
        resolution: u16,
    ) -> Result<(), ChunkError> {
        let world_version_id = self.resolve(version)?;

        sqlx::query(
            r#"
            INSERT INTO world_chunks (world_version_id, chunk_x, chunk_z, layer, resolution, status, generated_at)
            VALUES ($1, $2, $3, $4, $5, 'failed', now())
            ON CONFLICT (world_version_id, chunk_x, chunk_z, layer, resolution)
            DO UPDATE SET status = 'failed', generated_at = now()
            "#,
        )
        .bind(world_version_id)
        .bind(chunk_x)
        .bind(chunk_z)
        .bind(layer)
        .bind(resolution as i32)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [ChunkStatus::Pending, ChunkStatus::Ready, ChunkStatus::Failed] {
            assert_eq!(ChunkStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_an_invariant_violation() {
        assert!(matches!(ChunkStatus::parse("bogus"), Err(ChunkError::Invariant(_))));
    }
}
