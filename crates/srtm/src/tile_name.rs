use crate::error::SrtmError;

/// A decoded SRTM tile name: the 1x1 degree cell it names, plus the object
/// key it is stored under. Bounds are half-open: `[min, min+1)` on both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDescriptor {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub object_key: String,
}

impl TileDescriptor {
    /// Half-open containment: the south/west edges are inside, the
    /// north/east edges are not.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat < self.max_lat && lon >= self.min_lon && lon < self.max_lon
    }
}

/// Computes the canonical `"{N|S}LL{E|W}LLL"` tile name for a point, using
/// floor semantics (toward negative infinity) so the name always identifies
/// the southwest corner of the containing 1x1 degree cell.
pub fn compute_tile_name(lat: f64, lon: f64) -> Result<String, SrtmError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(SrtmError::out_of_range(format!("lat {lat} out of [-90, 90]")));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(SrtmError::out_of_range(format!(
            "lon {lon} out of [-180, 180]"
        )));
    }

    let lat_floor = lat.floor() as i64;
    let lon_floor = lon.floor() as i64;

    let (ns, lat_mag) = if lat_floor >= 0 {
        ('N', lat_floor)
    } else {
        ('S', -lat_floor)
    };
    let (ew, lon_mag) = if lon_floor >= 0 {
        ('E', lon_floor)
    } else {
        ('W', -lon_floor)
    };

    Ok(format!("{ns}{lat_mag:02}{ew}{lon_mag:03}"))
}

/// Parses a tile name produced by [`compute_tile_name`] (or equivalent)
/// back into a [`TileDescriptor`]. Direction letters are matched
/// case-insensitively, but `name`'s original case is preserved verbatim in
/// the derived object key.
pub fn parse_tile_name(name: &str) -> Result<TileDescriptor, SrtmError> {
    let bytes = name.as_bytes();
    if bytes.len() != 7 {
        return Err(SrtmError::invalid_format(format!(
            "tile name {name:?} must be exactly 7 characters"
        )));
    }

    let ns = bytes[0] as char;
    let lat_digits = &name[1..3];
    let ew = bytes[3] as char;
    let lon_digits = &name[4..7];

    let lat_mag: i64 = lat_digits
        .parse()
        .map_err(|_| SrtmError::invalid_format(format!("bad latitude digits in {name:?}")))?;
    let lon_mag: i64 = lon_digits
        .parse()
        .map_err(|_| SrtmError::invalid_format(format!("bad longitude digits in {name:?}")))?;

    let min_lat = match ns.to_ascii_uppercase() {
        'N' => lat_mag as f64,
        'S' => -(lat_mag as f64),
        _ => {
            return Err(SrtmError::invalid_format(format!(
                "unknown hemisphere letter {ns:?} in {name:?}"
            )))
        }
    };
    let min_lon = match ew.to_ascii_uppercase() {
        'E' => lon_mag as f64,
        'W' => -(lon_mag as f64),
        _ => {
            return Err(SrtmError::invalid_format(format!(
                "unknown hemisphere letter {ew:?} in {name:?}"
            )))
        }
    };

    Ok(TileDescriptor {
        min_lat,
        max_lat: min_lat + 1.0,
        min_lon,
        max_lon: min_lon + 1.0,
        object_key: format!("dem/srtm/{name}.hgt"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_semantics_match_spec_examples() {
        assert_eq!(compute_tile_name(46.5, -113.2).unwrap(), "N46W114");
        assert_eq!(compute_tile_name(-12.1, 44.9).unwrap(), "S13E044");
        assert_eq!(compute_tile_name(0.1, 0.1).unwrap(), "N00E000");
        assert_eq!(compute_tile_name(89.9, 179.9).unwrap(), "N89E179");
        assert_eq!(compute_tile_name(-89.9, -179.9).unwrap(), "S90W180");
    }

    #[test]
    fn s6_example_matches_spec_scenario() {
        assert_eq!(compute_tile_name(45.5, 10.5).unwrap(), "N45E010");
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        assert!(matches!(
            compute_tile_name(90.1, 0.0),
            Err(SrtmError::OutOfRange { .. })
        ));
        assert!(matches!(
            compute_tile_name(0.0, 180.1),
            Err(SrtmError::OutOfRange { .. })
        ));
    }

    #[test]
    fn parse_after_compute_yields_half_open_bounds() {
        for (lat, lon) in [(46.5, -113.2), (-12.1, 44.9), (0.1, 0.1)] {
            let name = compute_tile_name(lat, lon).unwrap();
            let desc = parse_tile_name(&name).unwrap();
            let floor_lat = lat.floor();
            let floor_lon = lon.floor();
            assert_eq!(desc.min_lat, floor_lat);
            assert_eq!(desc.max_lat, floor_lat + 1.0);
            assert_eq!(desc.min_lon, floor_lon);
            assert_eq!(desc.max_lon, floor_lon + 1.0);
            assert!(desc.contains(floor_lat, floor_lon));
            assert!(!desc.contains(floor_lat + 1.0, floor_lon));
            assert!(!desc.contains(floor_lat, floor_lon + 1.0));
        }
    }

    #[test]
    fn parse_is_case_insensitive_but_preserves_key_case() {
        let desc = parse_tile_name("n46w114").unwrap();
        assert_eq!(desc.min_lat, 46.0);
        assert_eq!(desc.min_lon, -114.0);
        assert_eq!(desc.object_key, "dem/srtm/n46w114.hgt");
    }
}
