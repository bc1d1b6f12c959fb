//! Flat-earth world-meters <-> lat/lon mapping.
//!
//! No globe projection: a chunked world is small enough relative to the
//! planet that a single linear scale factor per axis, fixed at startup from
//! the origin latitude, is indistinguishable from a full geodesic
//! computation at chunk scale.

/// Standard meters-per-degree-of-latitude approximation (WGS84 mean).
pub const DEFAULT_METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Fixed mapping between world meters and lat/lon, anchored at `origin_lat`
/// / `origin_lon`. `meters_per_degree_lon` is derived once from
/// `origin_lat` and never recomputed per chunk.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Geodesy {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub chunk_size_meters: f64,
    pub meters_per_degree_lat: f64,
    meters_per_degree_lon: f64,
}

impl Geodesy {
    pub fn new(
        origin_lat: f64,
        origin_lon: f64,
        chunk_size_meters: f64,
        meters_per_degree_lat: f64,
    ) -> Self {
        let meters_per_degree_lon =
            meters_per_degree_lat * (origin_lat * std::f64::consts::PI / 180.0).cos();
        Self {
            origin_lat,
            origin_lon,
            chunk_size_meters,
            meters_per_degree_lat,
            meters_per_degree_lon,
        }
    }

    /// Convenience constructor using the standard WGS84 meters-per-degree-lat.
    pub fn with_default_scale(origin_lat: f64, origin_lon: f64, chunk_size_meters: f64) -> Self {
        Self::new(
            origin_lat,
            origin_lon,
            chunk_size_meters,
            DEFAULT_METERS_PER_DEGREE_LAT,
        )
    }

    pub fn meters_per_degree_lon(&self) -> f64 {
        self.meters_per_degree_lon
    }

    /// Maps a world-meters offset (north, east of the origin) to (lat, lon).
    pub fn world_meters_to_lat_lon(&self, world_x: f64, world_z: f64) -> (f64, f64) {
        // worldZ is north displacement, worldX is east displacement, matching
        // the sampler's (globalCellX, globalCellZ) -> (worldX, worldZ) naming.
        let north_meters = world_z;
        let east_meters = world_x;
        let lat = self.origin_lat + north_meters / self.meters_per_degree_lat;
        let lon = self.origin_lon + east_meters / self.meters_per_degree_lon;
        (lat, lon)
    }

    /// Lat/lon of the (0,0) corner vertex of chunk (chunk_x, chunk_z).
    pub fn chunk_origin_lat_lon(&self, chunk_x: i64, chunk_z: i64) -> (f64, f64) {
        let world_x = chunk_x as f64 * self.chunk_size_meters;
        let world_z = chunk_z as f64 * self.chunk_size_meters;
        self.world_meters_to_lat_lon(world_x, world_z)
    }
}

#[cfg(test)]
mod tests {
    use super::Geodesy;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_itself() {
        let g = Geodesy::with_default_scale(46.0, -113.0, 100.0);
        let (lat, lon) = g.world_meters_to_lat_lon(0.0, 0.0);
        assert_close(lat, 46.0, 1e-12);
        assert_close(lon, -113.0, 1e-12);
    }

    #[test]
    fn north_offset_increases_latitude_only() {
        let g = Geodesy::with_default_scale(46.0, -113.0, 100.0);
        let (lat, lon) = g.world_meters_to_lat_lon(0.0, g.meters_per_degree_lat);
        assert_close(lat, 47.0, 1e-9);
        assert_close(lon, -113.0, 1e-12);
    }

    #[test]
    fn east_offset_uses_cosine_scaled_longitude() {
        let g = Geodesy::with_default_scale(46.0, -113.0, 100.0);
        let (lat, lon) = g.world_meters_to_lat_lon(g.meters_per_degree_lon(), 0.0);
        assert_close(lat, 46.0, 1e-12);
        assert_close(lon, -112.0, 1e-9);
    }

    #[test]
    fn chunk_origin_is_cell_aligned() {
        let g = Geodesy::with_default_scale(46.0, -113.0, 100.0);
        let (lat0, lon0) = g.chunk_origin_lat_lon(0, 0);
        assert_close(lat0, 46.0, 1e-12);
        assert_close(lon0, -113.0, 1e-12);

        let (lat1, _) = g.chunk_origin_lat_lon(0, 1);
        assert_close(lat1, 46.0 + 100.0 / g.meters_per_degree_lat, 1e-12);
    }

    #[test]
    fn adjacent_chunk_edges_agree_bit_for_bit() {
        let g = Geodesy::with_default_scale(46.0, -113.0, 100.0);
        let r = 10i64;
        let cell_size = g.chunk_size_meters / r as f64;

        // Right edge of chunk (0,0) at x=R must equal left edge of chunk
        // (1,0) at x=0, using the same integer-cell arithmetic the sampler
        // uses.
        let world_x_right = (0 * r + r) as f64 * cell_size;
        let world_x_left = (1 * r + 0) as f64 * cell_size;
        assert_eq!(world_x_right.to_bits(), world_x_left.to_bits());
    }
}
