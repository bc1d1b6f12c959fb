use std::sync::Arc;

use chrono::{DateTime, Utc};
use foundation::{Id, WorldVersionId};
use sqlx::{PgPool, Row};

use crate::error::DemError;
use crate::world_version::WorldVersionCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemTileStatus {
    Missing,
    Downloading,
    Ready,
    Failed,
}

impl DemTileStatus {
    fn as_str(self) -> &'static str {
        match self {
            DemTileStatus::Missing => "missing",
            DemTileStatus::Downloading => "downloading",
            DemTileStatus::Ready => "ready",
            DemTileStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Result<Self, DemError> {
        match s {
            "missing" => Ok(DemTileStatus::Missing),
            "downloading" => Ok(DemTileStatus::Downloading),
            "ready" => Ok(DemTileStatus::Ready),
            "failed" => Ok(DemTileStatus::Failed),
            other => Err(DemError::InvalidFormat(format!("unknown dem tile status {other:?}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemTileRow {
    pub id: Id,
    pub world_version_id: WorldVersionId,
    pub tile_key: String,
    pub status: DemTileStatus,
    pub object_key: Option<String>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn row_to_dem_tile(row: sqlx::postgres::PgRow) -> Result<DemTileRow, DemError> {
    let status: String = row.get("status");
    Ok(DemTileRow {
        id: Id::new(row.get("id")),
        world_version_id: WorldVersionId::new(row.get("world_version_id")),
        tile_key: row.get("tile_key"),
        status: DemTileStatus::parse(&status)?,
        object_key: row.get("s3_key"),
        last_error: row.get("last_error"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Postgres-backed repository for `dem_tiles`, scoped by
/// `(world_version, tile_key)`. Every method resolves the version string to
/// a `WorldVersionId` via the shared cache first; an unknown version never
/// reaches the database.
pub struct DemStatusRepo {
    pool: PgPool,
    versions: Arc<WorldVersionCache>,
}

impl DemStatusRepo {
    pub fn new(pool: PgPool, versions: Arc<WorldVersionCache>) -> Self {
        Self { pool, versions }
    }

    fn resolve(&self, version: &str) -> Result<WorldVersionId, DemError> {
        self.versions
            .get(version)
            .map(|v| v.id)
            .ok_or_else(|| DemError::UnknownWorldVersion(version.to_string()))
    }

    /// Idempotent upsert of status="missing". On an existing row, bumps
    /// `updated_at` and returns the current row as-is (it does not demote a
    /// row that has already advanced past missing).
    pub async fn get_or_create_missing(&self, version: &str, tile_key: &str) -> Result<DemTileRow, DemError> {
        let world_version_id = self.resolve(version)?;

        let row = sqlx::query(
            r#"
            INSERT INTO dem_tiles (world_version_id, tile_key, status)
            VALUES ($1, $2, 'missing')
            ON CONFLICT (world_version_id, tile_key)
            DO UPDATE SET updated_at = now()
            RETURNING id, world_version_id, tile_key, status, s3_key, last_error, created_at, updated_at
            "#,
        )
        .bind(world_version_id.get())
        .bind(tile_key)
        .fetch_one(&self.pool)
        .await?;

        row_to_dem_tile(row)
    }

    /// Conditional update: missing -> downloading. Returns whether this
    /// call won the claim; must be a single atomic statement so concurrent
    /// callers cannot both win.
    pub async fn try_claim(&self, version: &str, tile_key: &str) -> Result<bool, DemError> {
        let world_version_id = self.resolve(version)?;

        let result = sqlx::query(
            r#"
            UPDATE dem_tiles
            SET status = 'downloading', updated_at = now()
            WHERE world_version_id = $1 AND tile_key = $2 AND status = 'missing'
            "#,
        )
        .bind(world_version_id.get())
        .bind(tile_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_ready(&self, version: &str, tile_key: &str, object_key: &str) -> Result<(), DemError> {
        let world_version_id = self.resolve(version)?;

        sqlx::query(
            r#"
            UPDATE dem_tiles
            SET status = 'ready', s3_key = $3, last_error = NULL, updated_at = now()
            WHERE world_version_id = $1 AND tile_key = $2
            "#,
        )
        .bind(world_version_id.get())
        .bind(tile_key)
        .bind(object_key)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_failed(&self, version: &str, tile_key: &str, error: &str) -> Result<(), DemError> {
        let world_version_id = self.resolve(version)?;

        sqlx::query(
            r#"
            UPDATE dem_tiles
            SET status = 'failed', last_error = $3, updated_at = now()
            WHERE world_version_id = $1 AND tile_key = $2
            "#,
        )
        .bind(world_version_id.get())
        .bind(tile_key)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_by_status(
        &self,
        version: &str,
        status: DemTileStatus,
        limit: i64,
    ) -> Result<Vec<DemTileRow>, DemError> {
        let world_version_id = self.resolve(version)?;

        let rows = sqlx::query(
            r#"
            SELECT id, world_version_id, tile_key, status, s3_key, last_error, created_at, updated_at
            FROM dem_tiles
            WHERE world_version_id = $1 AND status = $2
            ORDER BY created_at ASC
            LIMIT $3
            "#,
        )
        .bind(world_version_id.get())
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_dem_tile).collect()
    }

    pub async fn get_status(&self, version: &str, tile_key: &str) -> Result<Option<DemTileRow>, DemError> {
        let world_version_id = self.resolve(version)?;

        let row = sqlx::query(
            r#"
            SELECT id, world_version_id, tile_key, status, s3_key, last_error, created_at, updated_at
            FROM dem_tiles
            WHERE world_version_id = $1 AND tile_key = $2
            "#,
        )
        .bind(world_version_id.get())
        .bind(tile_key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_dem_tile).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            DemTileStatus::Missing,
            DemTileStatus::Downloading,
            DemTileStatus::Ready,
            DemTileStatus::Failed,
        ] {
            assert_eq!(DemTileStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_string_is_invalid_format() {
        assert!(matches!(
            DemTileStatus::parse("bogus"),
            Err(DemError::InvalidFormat(_))
        ));
    }
}
