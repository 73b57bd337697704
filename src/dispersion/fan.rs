//! Angular fan of ray bearings around the dominant wind direction.

/// Half-width of the fan at zero wind.
pub const BASE_SPREAD_DEG: f64 = 60.0;
/// Narrowest half-width regardless of wind speed.
pub const MIN_SPREAD_DEG: f64 = 15.0;
/// Degrees of half-width lost per m/s of wind.
pub const SPREAD_PER_MPS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub bearing_deg: f64,
    /// Absolute angle between this ray and the central wind bearing.
    pub offset_deg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fan {
    pub central_bearing_deg: f64,
    pub spread_deg: f64,
    pub rays: Vec<Ray>,
}

impl Fan {
    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    pub fn central_ray(&self) -> Option<&Ray> {
        self.rays.get(self.rays.len() / 2)
    }
}

/// Strong wind gives a tight plume, calm wind a diffuse one.
pub fn spread_for(wind_speed: f64) -> f64 {
    (BASE_SPREAD_DEG - SPREAD_PER_MPS * wind_speed).max(MIN_SPREAD_DEG)
}

/// Builds `2 * (num_rays / 2) + 1` rays evenly spaced over
/// `[-spread, +spread]`. An even `num_rays` therefore yields one more ray
/// than requested; counts below one collapse to a single central ray.
pub fn build_fan(wind_dir_deg: f64, wind_speed: f64, num_rays: i32) -> Fan {
    let spread_deg = spread_for(wind_speed);
    let num_rays = num_rays.max(1);
    let half = num_rays / 2;
    let denom = f64::from(half.max(1));

    let rays = (-half..=half)
        .map(|i| {
            let frac = f64::from(i) / denom;
            Ray {
                bearing_deg: wind_dir_deg + frac * spread_deg,
                offset_deg: (frac * spread_deg).abs(),
            }
        })
        .collect();

    Fan {
        central_bearing_deg: wind_dir_deg,
        spread_deg,
        rays,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread_narrows_with_wind_and_floors() {
        assert_eq!(spread_for(0.0), 60.0);
        assert_eq!(spread_for(5.0), 45.0);
        assert_eq!(spread_for(15.0), 15.0);
        assert_eq!(spread_for(40.0), 15.0);
    }

    #[test]
    fn odd_count_is_symmetric() {
        let fan = build_fan(90.0, 0.0, 5);
        let bearings: Vec<f64> = fan.rays.iter().map(|r| r.bearing_deg).collect();
        assert_eq!(bearings, vec![30.0, 60.0, 90.0, 120.0, 150.0]);
        assert_eq!(fan.central_ray().map(|r| r.offset_deg), Some(0.0));
        assert_eq!(fan.rays[0].offset_deg, 60.0);
        assert_eq!(fan.rays[4].offset_deg, 60.0);
    }

    #[test]
    fn even_count_produces_one_extra_ray() {
        let fan = build_fan(0.0, 3.0, 4);
        assert_eq!(fan.len(), 2 * (4 / 2) + 1);
        assert_eq!(fan.len(), 5);
    }

    #[test]
    fn two_rays_become_three() {
        let fan = build_fan(0.0, 0.0, 2);
        let bearings: Vec<f64> = fan.rays.iter().map(|r| r.bearing_deg).collect();
        assert_eq!(bearings, vec![-60.0, 0.0, 60.0]);
    }

    #[test]
    fn non_positive_count_clamps_to_single_ray() {
        for requested in [0, -3, 1] {
            let fan = build_fan(45.0, 2.0, requested);
            assert_eq!(fan.len(), 1);
            assert_eq!(fan.rays[0].bearing_deg, 45.0);
            assert_eq!(fan.rays[0].offset_deg, 0.0);
        }
    }
}
