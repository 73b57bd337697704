//! Local flat-earth conversions between metre offsets and degrees.

use serde::{Deserialize, Serialize};

/// Metres spanned by one degree of latitude.
pub const M_PER_DEG_LAT: f64 = 111_320.0;

/// Fixed geographic anchor all generated points are offsets from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub lat: f64,
    pub lng: f64,
}

impl SourceLocation {
    /// Bursa Nilüfer district centre.
    pub const NILUFER: SourceLocation = SourceLocation {
        lat: 40.232,
        lng: 28.949,
    };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Position reached by moving `distance_m` along `bearing_deg`.
    ///
    /// Longitude is scaled by the cosine of the source latitude, not the
    /// destination's, so this is only valid within a few tens of kilometres.
    pub fn offset(&self, bearing_deg: f64, distance_m: f64) -> (f64, f64) {
        let theta = bearing_deg.to_radians();
        let dx = distance_m * theta.sin();
        let dy = distance_m * theta.cos();
        (
            self.lat + meters_to_deg_lat(dy),
            self.lng + meters_to_deg_lng(dx, self.lat),
        )
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::NILUFER
    }
}

pub fn meters_to_deg_lat(d_m: f64) -> f64 {
    d_m / M_PER_DEG_LAT
}

pub fn meters_to_deg_lng(d_m: f64, lat: f64) -> f64 {
    d_m / (M_PER_DEG_LAT * lat.to_radians().cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_degree_of_latitude() {
        assert!((meters_to_deg_lat(111_320.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn longitude_degrees_widen_away_from_equator() {
        let at_equator = meters_to_deg_lng(1_000.0, 0.0);
        let at_source = meters_to_deg_lng(1_000.0, 40.232);
        assert!((at_equator - meters_to_deg_lat(1_000.0)).abs() < 1e-12);
        assert!(at_source > at_equator);
    }

    #[test]
    fn offset_follows_bearing() {
        let source = SourceLocation::new(10.0, 20.0);

        let (lat, lng) = source.offset(0.0, 1_000.0);
        assert!(lat > source.lat);
        assert!((lng - source.lng).abs() < 1e-12);

        let (lat, lng) = source.offset(90.0, 1_000.0);
        assert!((lat - source.lat).abs() < 1e-9);
        assert!(lng > source.lng);

        let (lat, _) = source.offset(180.0, 1_000.0);
        assert!(lat < source.lat);
    }
}
