use dashmap::DashMap;
use srtm::TileDescriptor;

/// Thread-safe mapping from object key to DEM tile descriptor. Read-mostly;
/// a process-wide singleton with lifetime = process, never evicted.
#[derive(Default)]
pub struct DemTileIndex {
    tiles: DashMap<String, TileDescriptor>,
}

impl DemTileIndex {
    pub fn new() -> Self {
        Self {
            tiles: DashMap::new(),
        }
    }

    /// Idempotent: inserting the same object key again overwrites the prior
    /// descriptor (last write wins).
    pub fn add(&self, descriptor: TileDescriptor) {
        self.tiles.insert(descriptor.object_key.clone(), descriptor);
    }

    /// Returns the first descriptor whose half-open bounds contain the
    /// point, or `None` if no tile is locally indexed for it yet.
    pub fn find_containing(&self, lat: f64, lon: f64) -> Option<TileDescriptor> {
        self.tiles
            .iter()
            .find(|entry| entry.value().contains(lat, lon))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
