use std::sync::Arc;
use std::time::Duration;

use crate::error::DemError;
use crate::fetcher::SrtmFetcher;
use crate::index::DemTileIndex;
use crate::status_repo::{DemStatusRepo, DemTileRow, DemTileStatus};
use crate::store::LocalDemStore;
use crate::world_version::WorldVersionCache;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MISSING_BATCH_LIMIT: i64 = 5;
const DOWNLOADING_BATCH_LIMIT: i64 = 2;

/// Long-lived background task advancing the DEM ingestion state machine.
/// Single-threaded cooperative polling: one tick processes every active
/// world version's missing/downloading batches sequentially.
pub struct DemDownloadWorker {
    fetcher: SrtmFetcher,
    store: LocalDemStore,
    repo: Arc<DemStatusRepo>,
    index: Arc<DemTileIndex>,
    versions: Arc<WorldVersionCache>,
    poll_interval: Duration,
}

impl DemDownloadWorker {
    pub fn new(
        fetcher: SrtmFetcher,
        store: LocalDemStore,
        repo: Arc<DemStatusRepo>,
        index: Arc<DemTileIndex>,
        versions: Arc<WorldVersionCache>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            fetcher,
            store,
            repo,
            index,
            versions,
            poll_interval,
        }
    }

    /// Runs until `shutdown` reports `true`. Cancellation is checked before
    /// each tick and before each row within a tick, so the worker never
    /// leaves more than one row claimed-but-unresolved on the way out.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {}
                _ = tokio::time::sleep(self.poll_interval) => {
                    if !*shutdown.borrow() {
                        self.tick(&shutdown).await;
                    }
                }
            }
            if *shutdown.borrow() {
                break;
            }
        }
    }

    pub async fn tick(&self, shutdown: &tokio::sync::watch::Receiver<bool>) {
        for version in self.versions.active_versions() {
            if *shutdown.borrow() {
                return;
            }

            let missing = match self
                .repo
                .list_by_status(&version.version, DemTileStatus::Missing, MISSING_BATCH_LIMIT)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(version = %version.version, error = %e, "failed to list missing dem tiles");
                    continue;
                }
            };

            let downloading = match self
                .repo
                .list_by_status(&version.version, DemTileStatus::Downloading, DOWNLOADING_BATCH_LIMIT)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!(version = %version.version, error = %e, "failed to list downloading dem tiles");
                    continue;
                }
            };

            for row in missing.into_iter().chain(downloading.into_iter()) {
                if *shutdown.borrow() {
                    return;
                }
                self.process_row(&version.version, row).await;
            }
        }
    }

    async fn process_row(&self, version: &str, row: DemTileRow) {
        match self.repo.try_claim(version, &row.tile_key).await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                tracing::warn!(tile = %row.tile_key, error = %e, "failed to claim dem tile");
                return;
            }
        }

        tracing::debug!(tile = %row.tile_key, "claimed dem tile for download");

        if let Err(e) = self.download_and_persist(version, &row.tile_key).await {
            tracing::warn!(tile = %row.tile_key, error = %e, "dem tile download failed");
            if let Err(mark_err) = self.repo.mark_failed(version, &row.tile_key, &e.to_string()).await {
                tracing::warn!(tile = %row.tile_key, error = %mark_err, "failed to record dem tile failure");
            }
        }
    }

    async fn download_and_persist(&self, version: &str, tile_key: &str) -> Result<(), DemError> {
        let raw = self.fetcher.fetch(tile_key).await?;
        // Validates that the byte length is one of the two legal SRTM
        // sizes; the decoded samples themselves aren't needed here.
        srtm::decode(&raw)?;

        let object_key = self.store.write_tile(tile_key, raw).await?;
        self.repo.mark_ready(version, tile_key, &object_key).await?;

        let descriptor = srtm::parse_tile_name(tile_key)?;
        self.index.add(descriptor);
        Ok(())
    }
}
