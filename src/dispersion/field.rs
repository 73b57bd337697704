use serde::{Deserialize, Serialize};

use super::{
    color::AqiBand,
    compass::{compass, Compass},
    fan::Fan,
    geo::SourceLocation,
};

/// Concentrations of the five tracked pollutants.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pollutants {
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub so2: f64,
    pub co: f64,
}

impl Pollutants {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            pm25: self.pm25 * factor,
            pm10: self.pm10 * factor,
            no2: self.no2 * factor,
            so2: self.so2 * factor,
            co: self.co * factor,
        }
    }

    /// Two decimals, three for CO.
    pub fn rounded(&self) -> Self {
        Self {
            pm25: round_to(self.pm25, 2),
            pm10: round_to(self.pm10, 2),
            no2: round_to(self.no2, 2),
            so2: round_to(self.so2, 2),
            co: round_to(self.co, 3),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> {
        [self.pm25, self.pm10, self.no2, self.so2, self.co].into_iter()
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplePoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(flatten)]
    pub pollutants: Pollutants,
    pub distance_m: u32,
    #[serde(rename = "cloudRadius")]
    pub cloud_radius: u32,
    pub color: AqiBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMeta {
    pub source: SourceLocation,
    pub wind_speed: f64,
    pub wind_dir_deg: f64,
    pub wind_dir_compass: Compass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispersionField {
    pub meta: FieldMeta,
    pub points: Vec<SamplePoint>,
}

impl DispersionField {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Concatenates per-ray samples in fan order. Overlapping rays keep their
/// duplicate points.
pub fn assemble(
    fan: &Fan,
    sampled_rays: Vec<Vec<SamplePoint>>,
    wind_speed: f64,
    wind_dir_deg: f64,
    source: SourceLocation,
) -> DispersionField {
    debug_assert_eq!(fan.len(), sampled_rays.len());
    let points = sampled_rays.into_iter().flatten().collect();
    DispersionField {
        meta: FieldMeta {
            source,
            wind_speed,
            wind_dir_deg,
            wind_dir_compass: compass(wind_dir_deg),
        },
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispersion::fan::build_fan;

    fn point(distance_m: u32) -> SamplePoint {
        SamplePoint {
            lat: 1.0,
            lng: 2.0,
            pollutants: Pollutants::default(),
            distance_m,
            cloud_radius: 60,
            color: AqiBand::Good,
        }
    }

    #[test]
    fn rounding_keeps_co_precision() {
        let p = Pollutants {
            pm25: 1.23456,
            pm10: 2.0049,
            no2: 0.0,
            so2: 9.999,
            co: 0.12345,
        }
        .rounded();
        assert_eq!(p.pm25, 1.23);
        assert_eq!(p.pm10, 2.0);
        assert_eq!(p.so2, 10.0);
        assert_eq!(p.co, 0.123);
    }

    #[test]
    fn assemble_preserves_ray_order() {
        let fan = build_fan(0.0, 0.0, 2);
        let rays = vec![
            vec![point(1), point(2)],
            vec![point(3)],
            vec![point(4), point(5)],
        ];
        let field = assemble(&fan, rays, 0.0, 0.0, SourceLocation::NILUFER);
        let order: Vec<u32> = field.points.iter().map(|p| p.distance_m).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
        assert_eq!(field.meta.wind_dir_compass, Compass::N);
    }

    #[test]
    fn sample_point_wire_format() {
        let value = serde_json::to_value(point(500)).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "lat",
            "lng",
            "pm25",
            "pm10",
            "no2",
            "so2",
            "co",
            "distance_m",
            "cloudRadius",
            "color",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(object.len(), 10);
        assert_eq!(value["color"], "#2ecc71");
    }
}
