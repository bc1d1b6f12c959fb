use std::sync::Arc;

use dashmap::DashMap;
use dem::{DemError, DemResolver};
use foundation::math::Geodesy;
use objstore::ObjectStore;
use srtm::RawTile;

use crate::error::ChunkError;
use crate::terrain_chunk::TerrainChunk;

/// Builds a `(resolution+1)^2` heightmap for a chunk, resolving each vertex's
/// DEM tile independently so a chunk edge that lands exactly on a tile seam
/// samples across it correctly instead of clamping to the wrong side.
pub struct ChunkSampler {
    geodesy: Geodesy,
    resolver: Arc<DemResolver>,
    object_store: Arc<dyn ObjectStore>,
    raw_tile_cache: DashMap<String, Arc<RawTile>>,
}

impl ChunkSampler {
    pub fn new(geodesy: Geodesy, resolver: Arc<DemResolver>, object_store: Arc<dyn ObjectStore>) -> Self {
        Self {
            geodesy,
            resolver,
            object_store,
            raw_tile_cache: DashMap::new(),
        }
    }

    async fn load_tile(&self, object_key: &str) -> Result<Arc<RawTile>, ChunkError> {
        if let Some(tile) = self.raw_tile_cache.get(object_key) {
            return Ok(tile.clone());
        }

        let bytes = self
            .object_store
            .get(object_key)
            .await?
            .ok_or_else(|| ChunkError::ObjectStore(format!("dem tile object {object_key} missing from store")))?;

        let tile = srtm::decode(&bytes).map_err(DemError::from)?;
        let tile = Arc::new(tile);
        self.raw_tile_cache.insert(object_key.to_string(), tile.clone());
        Ok(tile)
    }

    /// Generates the heightmap for `(chunk_x, chunk_z)` at `resolution`.
    /// The per-cell integer arithmetic here is load-bearing: it is what
    /// makes the right edge of chunk `(k, _)` compute bit-identical world
    /// coordinates to the left edge of chunk `(k+1, _)`.
    pub async fn sample(&self, chunk_x: i64, chunk_z: i64, resolution: u16) -> Result<TerrainChunk, ChunkError> {
        if resolution < 1 {
            return Err(ChunkError::OutOfRange(format!(
                "resolution {resolution} must be >= 1"
            )));
        }

        let r = resolution as i64;
        let grid_size = resolution as usize + 1;
        let cell_size = self.geodesy.chunk_size_meters / r as f64;

        let mut heights = vec![0.0f64; grid_size * grid_size];

        for z in 0..=r {
            for x in 0..=r {
                let global_cell_x = chunk_x * r + x;
                let global_cell_z = chunk_z * r + z;
                let world_x = global_cell_x as f64 * cell_size;
                let world_z = global_cell_z as f64 * cell_size;

                let (lat, lon) = self.geodesy.world_meters_to_lat_lon(world_x, world_z);
                let descriptor = self.resolver.resolve(lat, lon).await?;
                let tile = self.load_tile(&descriptor.object_key).await?;
                let sample = srtm::sample_elevation(lat, lon, &descriptor, &tile);

                heights[z as usize * grid_size + x as usize] = sample;
            }
        }

        Ok(normalize(chunk_x, chunk_z, resolution, heights))
    }
}

fn normalize(chunk_x: i64, chunk_z: i64, resolution: u16, heights: Vec<f64>) -> TerrainChunk {
    let missing = srtm::MISSING as f64;

    let mut min_elevation = f64::INFINITY;
    let mut max_elevation = f64::NEG_INFINITY;
    let mut any_present = false;

    for &h in &heights {
        if h != missing {
            any_present = true;
            min_elevation = min_elevation.min(h);
            max_elevation = max_elevation.max(h);
        }
    }

    if !any_present {
        min_elevation = 0.0;
        max_elevation = 0.0;
    }

    let heights: Vec<f32> = heights
        .into_iter()
        .map(|h| if h == missing { 0.0 } else { h as f32 })
        .collect();

    TerrainChunk {
        chunk_x,
        chunk_z,
        resolution,
        heights,
        min_elevation,
        max_elevation,
    }
}
