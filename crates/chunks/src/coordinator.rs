use std::sync::Arc;

use dem::{DemStatusRepo, DemTileStatus};
use foundation::math::Geodesy;
use tokio::sync::Semaphore;

use crate::error::ChunkError;
use crate::metadata_repo::{ChunkMetadataRepo, ChunkMetadataRow, ChunkStatus};
use crate::object_writer::ChunkObjectWriter;
use crate::sampler::ChunkSampler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStatusView {
    NotFound,
    Pending,
    Ready,
    Failed,
}

/// Default bound on concurrent metadata-commit writes; the backpressure
/// control for detached fabrication tasks. The exact number is
/// configuration, not a correctness property.
pub const DEFAULT_DB_WRITE_SEMAPHORE_PERMITS: usize = 16;

/// The control plane: request-time status lookup, DEM-readiness gating,
/// fire-and-forget generation, and two-phase publish (object upload before
/// metadata commit).
pub struct ChunkCoordinator {
    geodesy: Geodesy,
    dem_status: Arc<DemStatusRepo>,
    metadata: Arc<ChunkMetadataRepo>,
    sampler: Arc<ChunkSampler>,
    writer: Arc<ChunkObjectWriter>,
    db_write_semaphore: Arc<Semaphore>,
}

impl ChunkCoordinator {
    pub fn new(
        geodesy: Geodesy,
        dem_status: Arc<DemStatusRepo>,
        metadata: Arc<ChunkMetadataRepo>,
        sampler: Arc<ChunkSampler>,
        writer: Arc<ChunkObjectWriter>,
        db_write_semaphore: Arc<Semaphore>,
    ) -> Self {
        Self {
            geodesy,
            dem_status,
            metadata,
            sampler,
            writer,
            db_write_semaphore,
        }
    }

    /// Pure metadata lookup; never touches the object store.
    pub async fn get_chunk_status(
        &self,
        version: &str,
        chunk_x: i64,
        chunk_z: i64,
        layer: &str,
        resolution: u16,
    ) -> Result<ChunkStatusView, ChunkError> {
        let row = self.metadata.get(version, chunk_x, chunk_z, layer, resolution).await?;
        Ok(match row {
            None => ChunkStatusView::NotFound,
            Some(row) => match row.status {
                ChunkStatus::Pending => ChunkStatusView::Pending,
                ChunkStatus::Ready => ChunkStatusView::Ready,
                ChunkStatus::Failed => ChunkStatusView::Failed,
            },
        })
    }

    pub async fn get_chunk_metadata(
        &self,
        version: &str,
        chunk_x: i64,
        chunk_z: i64,
        layer: &str,
        resolution: u16,
    ) -> Result<Option<ChunkMetadataRow>, ChunkError> {
        self.metadata.get(version, chunk_x, chunk_z, layer, resolution).await
    }

    /// Combines C+A+G: computes the chunk's geographic origin, derives the
    /// gating DEM tile's key, and reports whether that tile is ready.
    /// Creates the DEM row as "missing" on first reference, so `H` will
    /// eventually pick it up even if nothing else ever requests that tile
    /// directly.
    pub async fn is_dem_ready_for_chunk(
        &self,
        version: &str,
        chunk_x: i64,
        chunk_z: i64,
    ) -> Result<(bool, String), ChunkError> {
        let (lat, lon) = self.geodesy.chunk_origin_lat_lon(chunk_x, chunk_z);
        let tile_key = srtm::compute_tile_name(lat, lon).map_err(dem::DemError::from)?;

        self.dem_status.get_or_create_missing(version, &tile_key).await?;
        let row = self.dem_status.get_status(version, &tile_key).await?;
        let ready = row.map(|r| r.status == DemTileStatus::Ready).unwrap_or(false);

        Ok((ready, tile_key))
    }

    /// Schedules chunk fabrication, gated on DEM readiness. The coordinator
    /// never blocks on a DEM download: if the gating tile isn't ready yet
    /// it refuses to schedule and the caller must poll again later.
    pub async fn trigger_generation(
        self: &Arc<Self>,
        version: &str,
        chunk_x: i64,
        chunk_z: i64,
        layer: &str,
        resolution: u16,
    ) -> Result<(), ChunkError> {
        if let Some(row) = self.metadata.get(version, chunk_x, chunk_z, layer, resolution).await? {
            if row.status == ChunkStatus::Ready {
                return Ok(());
            }
        }

        let (ready, tile_key) = self.is_dem_ready_for_chunk(version, chunk_x, chunk_z).await?;
        if !ready {
            return Err(ChunkError::DemTileNotReady { tile_key });
        }

        let this = Arc::clone(self);
        let version = version.to_string();
        let layer = layer.to_string();
        tokio::spawn(async move {
            if let Err(e) = this.fabricate(&version, chunk_x, chunk_z, &layer, resolution).await {
                tracing::error!(
                    version = %version, chunk_x, chunk_z, layer = %layer, resolution,
                    error = %e, "chunk fabrication failed"
                );
                if let Err(mark_err) = this
                    .metadata
                    .mark_failed(&version, chunk_x, chunk_z, &layer, resolution)
                    .await
                {
                    tracing::error!(error = %mark_err, "failed to record chunk fabrication failure");
                }
            }
        });

        Ok(())
    }

    /// J -> M -> L, strictly in that order: object publication must
    /// precede the metadata commit so a Ready row is never observed
    /// without retrievable bytes behind it.
    async fn fabricate(
        &self,
        version: &str,
        chunk_x: i64,
        chunk_z: i64,
        layer: &str,
        resolution: u16,
    ) -> Result<(), ChunkError> {
        let chunk = self.sampler.sample(chunk_x, chunk_z, resolution).await?;
        let (object_key, checksum) = self.writer.write(&chunk, version).await?;

        let _permit = self
            .db_write_semaphore
            .acquire()
            .await
            .map_err(|_| ChunkError::Invariant("db write semaphore closed".to_string()))?;

        self.metadata
            .upsert_ready(version, chunk_x, chunk_z, layer, resolution, &object_key, &checksum)
            .await
    }
}
