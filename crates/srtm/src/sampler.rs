use crate::codec::{RawTile, MISSING};
use crate::tile_name::TileDescriptor;

/// Fractional-grid bilinear interpolation with missing-data propagation.
/// `fx` is the eastward fraction, `fy` the southward fraction, both in
/// `[0, 1]`. If any corner equals [`MISSING`] the result is `MISSING` as an
/// `f64` rather than an interpolated guess.
pub fn bilinear(z00: i16, z10: i16, z01: i16, z11: i16, fx: f64, fy: f64) -> f64 {
    if z00 == MISSING || z10 == MISSING || z01 == MISSING || z11 == MISSING {
        return MISSING as f64;
    }
    (1.0 - fx) * (1.0 - fy) * z00 as f64
        + fx * (1.0 - fy) * z10 as f64
        + (1.0 - fx) * fy * z01 as f64
        + fx * fy * z11 as f64
}

/// Samples elevation at `(lat, lon)` within `tile`, whose geographic bounds
/// are given by `descriptor`. Coordinates outside the tile are clamped to
/// the nearest edge rather than rejected; the resolver is responsible for
/// routing a point to the tile that actually contains it.
pub fn sample_elevation(lat: f64, lon: f64, descriptor: &TileDescriptor, tile: &RawTile) -> f64 {
    let dim = tile.width;
    let last = (dim - 1) as f64;

    let x = (lon - descriptor.min_lon) / 1.0 * last;
    let y = (descriptor.max_lat - lat) / 1.0 * last;

    let x = x.clamp(0.0, last);
    let y = y.clamp(0.0, last);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(dim - 1);
    let y1 = (y0 + 1).min(dim - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let z00 = tile.get(y0, x0);
    let z10 = tile.get(y0, x1);
    let z01 = tile.get(y1, x0);
    let z11 = tile.get(y1, x1);

    bilinear(z00, z10, z01, z11, fx, fy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_name::parse_tile_name;

    fn flat_tile(dim: usize, value: i16) -> RawTile {
        RawTile {
            width: dim,
            height: dim,
            elevations: vec![value; dim * dim],
        }
    }

    fn gradient_tile(dim: usize) -> RawTile {
        let mut elevations = vec![0i16; dim * dim];
        for row in 0..dim {
            for col in 0..dim {
                elevations[row * dim + col] = (1000 + row) as i16;
            }
        }
        RawTile {
            width: dim,
            height: dim,
            elevations,
        }
    }

    #[test]
    fn corners_are_exact() {
        for (fx, fy) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
            let expected = match (fx, fy) {
                (0.0, 0.0) => 1.0,
                (1.0, 0.0) => 2.0,
                (0.0, 1.0) => 3.0,
                _ => 4.0,
            };
            assert_eq!(bilinear(1, 2, 3, 4, fx, fy), expected);
        }
    }

    #[test]
    fn center_is_arithmetic_mean() {
        let mean = bilinear(10, 20, 30, 40, 0.5, 0.5);
        assert_eq!(mean, 25.0);
    }

    #[test]
    fn any_missing_corner_propagates() {
        assert_eq!(bilinear(MISSING, 0, 0, 0, 0.3, 0.7), MISSING as f64);
        assert_eq!(bilinear(0, MISSING, 0, 0, 0.3, 0.7), MISSING as f64);
        assert_eq!(bilinear(0, 0, MISSING, 0, 0.3, 0.7), MISSING as f64);
        assert_eq!(bilinear(0, 0, 0, MISSING, 0.3, 0.7), MISSING as f64);
    }

    #[test]
    fn flat_tile_samples_the_constant_everywhere() {
        let descriptor = parse_tile_name("N46W113").unwrap();
        let tile = flat_tile(1201, 1500);
        let sample = sample_elevation(46.3, -112.7, &descriptor, &tile);
        assert_eq!(sample, 1500.0);
    }

    #[test]
    fn gradient_tile_sample_matches_row_index_formula() {
        let descriptor = parse_tile_name("N46W113").unwrap();
        let tile = gradient_tile(1201);
        // Exact grid point: row 5, col 0 -> lat = maxLat - 5/1200, lon = minLon
        let lat = descriptor.max_lat - 5.0 / 1200.0;
        let lon = descriptor.min_lon;
        let sample = sample_elevation(lat, lon, &descriptor, &tile);
        assert_eq!(sample, 1005.0);
    }
}
