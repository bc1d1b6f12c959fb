use crate::error::ChunkError;
use crate::terrain_chunk::TerrainChunk;

pub const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 1 + 2 + 8 + 8; // version + resolution + min + max

fn expected_len(resolution: u16) -> usize {
    HEADER_LEN + 4 * (resolution as usize + 1) * (resolution as usize + 1)
}

/// Serializes a [`TerrainChunk`] to the versioned little-endian wire format:
///
/// ```text
/// u8  version = 1
/// u16 resolution R
/// f64 minElevation
/// f64 maxElevation
/// f32 heights[(R+1)^2]   // row-major, z*(R+1)+x
/// ```
pub fn serialize(chunk: &TerrainChunk) -> Result<Vec<u8>, ChunkError> {
    let grid_size = chunk.resolution as usize + 1;
    let expected_heights = grid_size * grid_size;
    if chunk.heights.len() != expected_heights {
        return Err(ChunkError::Invariant(format!(
            "heights length {} does not match (resolution+1)^2 = {expected_heights}",
            chunk.heights.len()
        )));
    }

    let mut out = Vec::with_capacity(expected_len(chunk.resolution));
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&chunk.resolution.to_le_bytes());
    out.extend_from_slice(&chunk.min_elevation.to_le_bytes());
    out.extend_from_slice(&chunk.max_elevation.to_le_bytes());
    for h in &chunk.heights {
        out.extend_from_slice(&h.to_le_bytes());
    }

    Ok(out)
}

/// Deserializes bytes produced by [`serialize`]. `chunk_x`/`chunk_z` are not
/// part of the wire format (they're implied by the object key the bytes
/// were read from) and are threaded through by the caller.
pub fn deserialize(data: &[u8], chunk_x: i64, chunk_z: i64) -> Result<TerrainChunk, ChunkError> {
    if data.is_empty() {
        return Err(ChunkError::SizeMismatch {
            expected: HEADER_LEN,
            found: 0,
        });
    }

    let version = data[0];
    if version != FORMAT_VERSION {
        return Err(ChunkError::UnsupportedVersion {
            found: version as u16,
        });
    }

    if data.len() < HEADER_LEN {
        return Err(ChunkError::SizeMismatch {
            expected: HEADER_LEN,
            found: data.len(),
        });
    }

    let resolution = u16::from_le_bytes([data[1], data[2]]);
    let expected = expected_len(resolution);
    if data.len() != expected {
        return Err(ChunkError::SizeMismatch {
            expected,
            found: data.len(),
        });
    }

    let min_elevation = f64::from_le_bytes(data[3..11].try_into().unwrap());
    let max_elevation = f64::from_le_bytes(data[11..19].try_into().unwrap());

    let grid_size = resolution as usize + 1;
    let mut heights = Vec::with_capacity(grid_size * grid_size);
    for chunk_bytes in data[HEADER_LEN..].chunks_exact(4) {
        heights.push(f32::from_le_bytes(chunk_bytes.try_into().unwrap()));
    }

    Ok(TerrainChunk {
        chunk_x,
        chunk_z,
        resolution,
        heights,
        min_elevation,
        max_elevation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk(resolution: u16) -> TerrainChunk {
        let grid_size = resolution as usize + 1;
        let heights: Vec<f32> = (0..grid_size * grid_size).map(|i| i as f32 * 0.5).collect();
        TerrainChunk {
            chunk_x: 3,
            chunk_z: -4,
            resolution,
            heights,
            min_elevation: 0.0,
            max_elevation: (grid_size * grid_size - 1) as f64 * 0.5,
        }
    }

    #[test]
    fn round_trip_is_bit_identical() {
        let chunk = sample_chunk(16);
        let bytes = serialize(&chunk).unwrap();
        let decoded = deserialize(&bytes, chunk.chunk_x, chunk.chunk_z).unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn serialize_is_byte_stable_across_runs() {
        let chunk = sample_chunk(4);
        let a = serialize(&chunk).unwrap();
        let b = serialize(&chunk).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn size_matches_19_plus_4_times_grid_squared() {
        for r in [1u16, 2, 4, 8, 16, 32, 64, 100] {
            let chunk = sample_chunk(r);
            let bytes = serialize(&chunk).unwrap();
            assert_eq!(bytes.len(), 19 + 4 * (r as usize + 1) * (r as usize + 1));
        }
    }

    #[test]
    fn heights_length_mismatch_is_an_invariant_violation() {
        let mut chunk = sample_chunk(4);
        chunk.heights.pop();
        assert!(matches!(serialize(&chunk), Err(ChunkError::Invariant(_))));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let chunk = sample_chunk(4);
        let mut bytes = serialize(&chunk).unwrap();
        bytes[0] = 9;
        assert!(matches!(
            deserialize(&bytes, 0, 0),
            Err(ChunkError::UnsupportedVersion { found: 9 })
        ));
    }

    #[test]
    fn truncated_payload_is_a_size_mismatch() {
        let chunk = sample_chunk(4);
        let mut bytes = serialize(&chunk).unwrap();
        bytes.pop();
        assert!(matches!(
            deserialize(&bytes, 0, 0),
            Err(ChunkError::SizeMismatch { .. })
        ));
    }
}
