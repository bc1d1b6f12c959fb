use std::sync::Arc;

use objstore::ObjectStore;

use crate::error::DemError;

const DEM_PREFIX: &str = "dem/srtm";

/// Thin wrapper translating tile names to object store keys under
/// `dem/srtm/`.
#[derive(Clone)]
pub struct LocalDemStore {
    store: Arc<dyn ObjectStore>,
}

impl LocalDemStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn object_key(tile_name: &str) -> String {
        format!("{DEM_PREFIX}/{tile_name}.hgt")
    }

    pub async fn write_tile(&self, tile_name: &str, bytes: Vec<u8>) -> Result<String, DemError> {
        let key = Self::object_key(tile_name);
        self.store.put(&key, bytes).await?;
        Ok(key)
    }

    pub async fn read_tile(&self, tile_name: &str) -> Result<Option<Vec<u8>>, DemError> {
        let key = Self::object_key(tile_name);
        Ok(self.store.get(&key).await?)
    }

    pub async fn exists(&self, tile_name: &str) -> Result<bool, DemError> {
        let key = Self::object_key(tile_name);
        Ok(self.store.exists(&key).await?)
    }
}
