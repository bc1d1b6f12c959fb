use crate::error::SrtmError;

/// Missing-data sentinel used throughout the SRTM format and the sampler.
pub const MISSING: i16 = -32768;

const SRTM3_DIM: usize = 1201;
const SRTM1_DIM: usize = 3601;

/// A decoded SRTM `.hgt` tile: square, row-major, row 0 = north edge.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTile {
    pub width: usize,
    pub height: usize,
    pub elevations: Vec<i16>,
}

impl RawTile {
    pub fn get(&self, row: usize, col: usize) -> i16 {
        self.elevations[row * self.width + col]
    }
}

/// Decodes big-endian signed 16-bit SRTM samples. Accepts exactly
/// `2 * 1201^2` or `2 * 3601^2` bytes; any other length is `InvalidFormat`.
pub fn decode(bytes: &[u8]) -> Result<RawTile, SrtmError> {
    let dim = match bytes.len() {
        n if n == 2 * SRTM3_DIM * SRTM3_DIM => SRTM3_DIM,
        n if n == 2 * SRTM1_DIM * SRTM1_DIM => SRTM1_DIM,
        n => {
            return Err(SrtmError::invalid_format(format!(
                "expected {} or {} bytes, got {n}",
                2 * SRTM3_DIM * SRTM3_DIM,
                2 * SRTM1_DIM * SRTM1_DIM
            )))
        }
    };

    let mut elevations = Vec::with_capacity(dim * dim);
    for chunk in bytes.chunks_exact(2) {
        elevations.push(i16::from_be_bytes([chunk[0], chunk[1]]));
    }

    Ok(RawTile {
        width: dim,
        height: dim,
        elevations,
    })
}

/// Inverse of [`decode`]: re-encodes a tile to big-endian bytes, row-major.
/// Used by the download worker's round-trip validation and by tests.
pub fn encode(tile: &RawTile) -> Vec<u8> {
    let mut out = Vec::with_capacity(tile.elevations.len() * 2);
    for sample in &tile.elevations {
        out.extend_from_slice(&sample.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        let err = decode(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, SrtmError::InvalidFormat { .. }));
    }

    #[test]
    fn decodes_zero_filled_srtm3_tile() {
        let bytes = vec![0u8; 2 * SRTM3_DIM * SRTM3_DIM];
        let tile = decode(&bytes).unwrap();
        assert_eq!(tile.width, SRTM3_DIM);
        assert_eq!(tile.height, SRTM3_DIM);
        assert_eq!(tile.elevations.len(), SRTM3_DIM * SRTM3_DIM);
        assert!(tile.elevations.iter().all(|&e| e == 0));
    }

    #[test]
    fn round_trips_srtm3_and_srtm1() {
        for dim in [SRTM3_DIM, SRTM1_DIM] {
            let elevations: Vec<i16> = (0..dim * dim)
                .map(|i| ((i % 4000) as i32 - 2000) as i16)
                .collect();
            let tile = RawTile {
                width: dim,
                height: dim,
                elevations,
            };
            let bytes = encode(&tile);
            let decoded = decode(&bytes).unwrap();
            assert_eq!(decoded, tile);
        }
    }

    #[test]
    fn missing_sentinel_is_preserved() {
        let dim = SRTM3_DIM;
        let mut elevations = vec![0i16; dim * dim];
        elevations[0] = MISSING;
        elevations[dim * dim - 1] = MISSING;
        let tile = RawTile {
            width: dim,
            height: dim,
            elevations,
        };
        let bytes = encode(&tile);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.get(0, 0), MISSING);
        assert_eq!(decoded.elevations[dim * dim - 1], MISSING);
    }
}
