use std::sync::Arc;

use objstore::ObjectStore;

use crate::error::DemError;
use crate::index::DemTileIndex;

const DEM_PREFIX: &str = "dem/srtm";

/// Scans the local object store under `dem/srtm/` at process start and
/// populates `index` from whatever tiles are already present. An empty or
/// absent prefix is acceptable: the system then runs in pure-lazy-fetch
/// mode via the resolver.
pub async fn populate_index_from_store(
    store: &Arc<dyn ObjectStore>,
    index: &DemTileIndex,
) -> Result<usize, DemError> {
    let keys = store.list_prefix(DEM_PREFIX).await?;
    let mut added = 0;

    for key in keys {
        let Some(file_name) = key.rsplit('/').next() else {
            continue;
        };
        let Some(tile_name) = file_name.strip_suffix(".hgt") else {
            continue;
        };

        match srtm::parse_tile_name(tile_name) {
            Ok(descriptor) => {
                index.add(descriptor);
                added += 1;
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "skipping unparseable dem object during index init");
            }
        }
    }

    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use objstore::FilesystemObjectStore;

    #[tokio::test]
    async fn populates_index_from_existing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(FilesystemObjectStore::new(dir.path()));
        store.put("dem/srtm/N46W113.hgt", vec![0; 4]).await.unwrap();
        store.put("dem/srtm/N47W113.hgt", vec![0; 4]).await.unwrap();

        let index = DemTileIndex::new();
        let added = populate_index_from_store(&store, &index).await.unwrap();

        assert_eq!(added, 2);
        assert_eq!(index.len(), 2);
        assert!(index.find_containing(46.5, -112.5).is_some());
    }

    #[tokio::test]
    async fn empty_prefix_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn ObjectStore> = Arc::new(FilesystemObjectStore::new(dir.path()));
        let index = DemTileIndex::new();
        let added = populate_index_from_store(&store, &index).await.unwrap();
        assert_eq!(added, 0);
        assert!(index.is_empty());
    }
}
