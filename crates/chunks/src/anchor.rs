use dem::WorldVersionCache;

use crate::error::ChunkError;
use crate::metadata_repo::{ChunkMetadataRepo, ChunkStatus};
use crate::object_writer::ChunkObjectWriter;
use crate::terrain_chunk::TerrainChunk;

pub const ANCHOR_LAYER: &str = "terrain";
pub const ANCHOR_RESOLUTION: u16 = 2;

fn anchor_chunk() -> TerrainChunk {
    TerrainChunk {
        chunk_x: 0,
        chunk_z: 0,
        resolution: ANCHOR_RESOLUTION,
        heights: vec![0.0; 9],
        min_elevation: 0.0,
        max_elevation: 0.0,
    }
}

/// At process start, seeds a flat `(0,0)` anchor chunk for every active
/// world version that doesn't already have a ready one. Fixes the
/// world-to-earth mapping for each version before any real request arrives.
/// Idempotent: a repeated run observes the existing ready row and does
/// nothing for that version.
pub async fn seed_anchor_chunks(
    versions: &WorldVersionCache,
    metadata: &ChunkMetadataRepo,
    writer: &ChunkObjectWriter,
) -> Result<usize, ChunkError> {
    let mut seeded = 0;

    for version in versions.active_versions() {
        let already_ready = metadata
            .get(&version.version, 0, 0, ANCHOR_LAYER, ANCHOR_RESOLUTION)
            .await?
            .map(|row| row.status == ChunkStatus::Ready)
            .unwrap_or(false);

        if already_ready {
            continue;
        }

        let chunk = anchor_chunk();
        let (object_key, checksum) = writer.write(&chunk, &version.version).await?;
        metadata
            .upsert_ready(
                &version.version,
                0,
                0,
                ANCHOR_LAYER,
                ANCHOR_RESOLUTION,
                &object_key,
                &checksum,
            )
            .await?;
        seeded += 1;
        tracing::info!(version = %version.version, "seeded anchor chunk");
    }

    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_chunk_is_flat_and_zeroed() {
        let chunk = anchor_chunk();
        assert_eq!(chunk.resolution, 2);
        assert_eq!(chunk.heights, vec![0.0; 9]);
        assert_eq!(chunk.min_elevation, 0.0);
        assert_eq!(chunk.max_elevation, 0.0);
    }
}
