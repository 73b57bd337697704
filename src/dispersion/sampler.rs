//! Walks each ray outward, decaying the base concentrations.

use std::num::NonZeroU32;

use super::{
    color::color_for,
    fan::Ray,
    field::{Pollutants, SamplePoint},
    geo::SourceLocation,
    DispersionError,
};

/// Distance over which concentration falls to 1/e.
pub const DECAY_LENGTH_KM: f64 = 2.0;
const LATERAL_EPSILON: f64 = 1e-6;
const BASE_CLOUD_RADIUS: f64 = 120.0;
const MIN_CLOUD_RADIUS: u32 = 60;

/// Sampling distances `step, 2·step, …` up to and including the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSchedule {
    step_m: NonZeroU32,
    max_distance_m: u32,
}

impl StepSchedule {
    pub fn new(step_m: u32, max_distance_m: u32) -> Result<Self, DispersionError> {
        let step_m = NonZeroU32::new(step_m).ok_or(DispersionError::ZeroStep)?;
        Ok(Self {
            step_m,
            max_distance_m,
        })
    }

    pub fn len(&self) -> usize {
        (self.max_distance_m / self.step_m.get()) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn distances(&self) -> impl Iterator<Item = u32> {
        let step = self.step_m.get();
        (1..=self.max_distance_m / step).map(move |k| k * step)
    }
}

/// Gaussian falloff in angular offset with σ = spread / 2.
pub fn lateral_weight(offset_deg: f64, spread_deg: f64) -> f64 {
    let sigma = spread_deg / 2.0;
    (-(offset_deg * offset_deg) / (2.0 * sigma * sigma + LATERAL_EPSILON)).exp()
}

pub fn distance_decay(distance_m: f64) -> f64 {
    (-(distance_m / 1000.0) / DECAY_LENGTH_KM).exp()
}

/// Marker radius in metres; faster wind draws larger clouds.
pub fn cloud_radius(wind_speed: f64) -> u32 {
    let radius = (BASE_CLOUD_RADIUS * (1.0 + wind_speed / 5.0)).round();
    if radius.is_finite() && radius > f64::from(MIN_CLOUD_RADIUS) {
        radius as u32
    } else {
        MIN_CLOUD_RADIUS
    }
}

/// Everything a ray walk needs that is shared across the fan.
#[derive(Debug, Clone)]
pub struct RaySampler {
    pub source: SourceLocation,
    pub base: Pollutants,
    pub spread_deg: f64,
    pub schedule: StepSchedule,
    pub cloud_radius: u32,
}

impl RaySampler {
    pub fn sample(&self, ray: &Ray) -> Vec<SamplePoint> {
        let weight = lateral_weight(ray.offset_deg, self.spread_deg);
        self.schedule
            .distances()
            .map(|distance_m| {
                let d = f64::from(distance_m);
                let decayed = self.base.scaled(distance_decay(d) * weight);
                let (lat, lng) = self.source.offset(ray.bearing_deg, d);
                SamplePoint {
                    lat,
                    lng,
                    pollutants: decayed.rounded(),
                    distance_m,
                    cloud_radius: self.cloud_radius,
                    color: color_for(decayed.pm25),
                }
            })
            .collect()
    }
}

/// Free-standing form of [`RaySampler::sample`].
pub fn sample_ray(
    ray: &Ray,
    base: &Pollutants,
    spread_deg: f64,
    max_distance_m: u32,
    step_m: u32,
    wind_speed: f64,
    source: SourceLocation,
) -> Result<Vec<SamplePoint>, DispersionError> {
    let sampler = RaySampler {
        source,
        base: *base,
        spread_deg,
        schedule: StepSchedule::new(step_m, max_distance_m)?,
        cloud_radius: cloud_radius(wind_speed),
    };
    Ok(sampler.sample(ray))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Pollutants {
        Pollutants {
            pm25: 100.0,
            pm10: 80.0,
            no2: 40.0,
            so2: 10.0,
            co: 1.0,
        }
    }

    #[test]
    fn schedule_includes_maximum() {
        let schedule = StepSchedule::new(500, 2000).unwrap();
        assert_eq!(
            schedule.distances().collect::<Vec<_>>(),
            vec![500, 1000, 1500, 2000]
        );
        assert_eq!(schedule.len(), 4);
    }

    #[test]
    fn schedule_stops_before_overshoot() {
        let schedule = StepSchedule::new(300, 1000).unwrap();
        assert_eq!(
            schedule.distances().collect::<Vec<_>>(),
            vec![300, 600, 900]
        );
    }

    #[test]
    fn schedule_empty_when_step_exceeds_maximum() {
        let schedule = StepSchedule::new(6000, 5000).unwrap();
        assert!(schedule.is_empty());
        assert_eq!(schedule.distances().count(), 0);
    }

    #[test]
    fn zero_step_is_rejected() {
        assert!(matches!(
            StepSchedule::new(0, 5000),
            Err(DispersionError::ZeroStep)
        ));
    }

    #[test]
    fn lateral_weight_is_one_on_centre() {
        assert_eq!(lateral_weight(0.0, 45.0), 1.0);
        assert_eq!(lateral_weight(0.0, 0.0), 1.0);
        assert!(lateral_weight(45.0, 45.0) < lateral_weight(22.5, 45.0));
    }

    #[test]
    fn decay_hits_one_over_e_at_decay_length() {
        let at_decay_length = distance_decay(DECAY_LENGTH_KM * 1000.0);
        assert!((at_decay_length - (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(distance_decay(0.0), 1.0);
    }

    #[test]
    fn cloud_radius_grows_with_wind() {
        assert_eq!(cloud_radius(0.0), 120);
        assert_eq!(cloud_radius(5.0), 240);
        assert_eq!(cloud_radius(2.5), 180);
        assert!(cloud_radius(10.0) > cloud_radius(5.0));
    }

    #[test]
    fn cloud_radius_floors_at_sixty() {
        assert_eq!(cloud_radius(-4.0), 60);
        assert_eq!(cloud_radius(f64::NAN), 60);
    }

    #[test]
    fn samples_decay_monotonically_along_a_ray() {
        let ray = Ray {
            bearing_deg: 30.0,
            offset_deg: 10.0,
        };
        let points = sample_ray(&ray, &base(), 45.0, 5000, 500, 5.0, SourceLocation::NILUFER)
            .unwrap();
        assert_eq!(points.len(), 10);
        for pair in points.windows(2) {
            assert!(pair[0].distance_m < pair[1].distance_m);
            assert!(pair[0].pollutants.pm25 >= pair[1].pollutants.pm25);
            assert!(pair[0].pollutants.co >= pair[1].pollutants.co);
        }
    }

    #[test]
    fn channels_round_to_their_precision() {
        let ray = Ray {
            bearing_deg: 0.0,
            offset_deg: 0.0,
        };
        let points =
            sample_ray(&ray, &base(), 45.0, 1000, 1000, 5.0, SourceLocation::NILUFER).unwrap();
        let p = &points[0];
        assert_eq!(p.pollutants.pm25, 60.65);
        assert_eq!(p.pollutants.pm10, 48.52);
        assert_eq!(p.pollutants.co, 0.607);
    }
}
