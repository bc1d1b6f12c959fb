use std::sync::Arc;

use dashmap::DashMap;
use srtm::TileDescriptor;
use tokio::sync::Mutex;

use crate::error::DemError;
use crate::fetcher::SrtmFetcher;
use crate::index::DemTileIndex;
use crate::store::LocalDemStore;

/// Ensures a DEM tile covering `(lat, lon)` is present locally and indexed,
/// fetching it from the public dataset at most once per tile even under
/// concurrent callers.
pub struct DemResolver {
    fetcher: SrtmFetcher,
    store: LocalDemStore,
    index: Arc<DemTileIndex>,
    tile_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DemResolver {
    pub fn new(fetcher: SrtmFetcher, store: LocalDemStore, index: Arc<DemTileIndex>) -> Self {
        Self {
            fetcher,
            store,
            index,
            tile_locks: DashMap::new(),
        }
    }

    fn lock_for(&self, tile_name: &str) -> Arc<Mutex<()>> {
        self.tile_locks
            .entry(tile_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Per-tile single-flight: concurrent resolves for the same tile
    /// serialize on a keyed mutex created on demand; concurrent resolves
    /// for different tiles proceed in parallel.
    pub async fn resolve(&self, lat: f64, lon: f64) -> Result<TileDescriptor, DemError> {
        let tile_name = srtm::compute_tile_name(lat, lon)?;

        if let Some(descriptor) = self.index.find_containing(lat, lon) {
            return Ok(descriptor);
        }

        let lock = self.lock_for(&tile_name);
        let _guard = lock.lock().await;

        // Double-check: another caller may have populated the index while
        // we were waiting for the lock.
        if let Some(descriptor) = self.index.find_containing(lat, lon) {
            return Ok(descriptor);
        }

        let raw = self.fetcher.fetch(&tile_name).await?;
        srtm::decode(&raw)?;
        self.store.write_tile(&tile_name, raw).await?;

        let descriptor = srtm::parse_tile_name(&tile_name)?;
        self.index.add(descriptor.clone());
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objstore::FilesystemObjectStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn resolve_returns_immediately_when_already_indexed() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(DemTileIndex::new());
        index.add(srtm::parse_tile_name("N46W113").unwrap());

        let resolver = DemResolver::new(
            SrtmFetcher::with_base_url("http://127.0.0.1:1/unused"),
            LocalDemStore::new(Arc::new(FilesystemObjectStore::new(dir.path()))),
            index,
        );

        let descriptor = resolver.resolve(46.3, -112.7).await.unwrap();
        assert_eq!(descriptor.object_key, "dem/srtm/N46W113.hgt");
    }

    #[tokio::test]
    async fn out_of_range_point_is_rejected_before_any_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DemResolver::new(
            SrtmFetcher::with_base_url("http://127.0.0.1:1/unused"),
            LocalDemStore::new(Arc::new(FilesystemObjectStore::new(dir.path()))),
            Arc::new(DemTileIndex::new()),
        );

        let err = resolver.resolve(120.0, 0.0).await.unwrap_err();
        assert!(matches!(err, DemError::OutOfRange(_)));
    }

    #[test]
    fn lock_for_returns_the_same_mutex_for_the_same_tile() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DemResolver::new(
            SrtmFetcher::with_base_url("http://127.0.0.1:1/unused"),
            LocalDemStore::new(Arc::new(FilesystemObjectStore::new(dir.path()))),
            Arc::new(DemTileIndex::new()),
        );

        let a = resolver.lock_for("N46W113");
        let b = resolver.lock_for("N46W113");
        assert!(Arc::ptr_eq(&a, &b));

        let c = resolver.lock_for("N47W113");
        assert!(!Arc::ptr_eq(&a, &c));
    }

    // Guards against a regression where the fast path and the post-lock
    // double-check both skip straight to fetching: once the index is
    // populated, a second concurrent resolve for the same tile must not
    // re-enter the fetch path.
    #[tokio::test]
    async fn populated_index_short_circuits_without_the_lock_path() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        CALLS.store(0, Ordering::SeqCst);

        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(DemTileIndex::new());
        let resolver = DemResolver::new(
            SrtmFetcher::with_base_url("http://127.0.0.1:1/unused"),
            LocalDemStore::new(Arc::new(FilesystemObjectStore::new(dir.path()))),
            index.clone(),
        );

        index.add(srtm::parse_tile_name("N46W113").unwrap());
        let _ = resolver.resolve(46.1, -112.9).await.unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }
}
