//! Downwind dispersion field generator.
//!
//! A fan of rays is spread around the wind bearing, each ray is walked
//! outward in fixed steps with exponential distance decay and Gaussian
//! lateral falloff, and the samples are projected onto lat/lng offsets
//! from a fixed source.
//!
//! Bearings follow the direction the wind blows *toward*, clockwise from
//! geographic north: a 0° wind places the plume due north of the source.
//! The compass label in the field header uses the same bearing.

pub mod color;
pub mod compass;
pub mod fan;
pub mod field;
pub mod geo;
pub mod sampler;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use color::{color_for, AqiBand};
pub use compass::{compass, Compass};
pub use fan::{build_fan, Fan, Ray};
pub use field::{assemble, DispersionField, FieldMeta, Pollutants, SamplePoint};
pub use geo::SourceLocation;
pub use sampler::{sample_ray, RaySampler, StepSchedule};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispersionError {
    #[error("step_m must be greater than zero")]
    ZeroStep,
}

fn default_wind_speed() -> f64 {
    3.0
}

fn default_wind_dir_deg() -> f64 {
    45.0
}

fn default_base_pm25() -> f64 {
    22.0
}

fn default_base_pm10() -> f64 {
    35.0
}

fn default_base_no2() -> f64 {
    18.0
}

fn default_base_so2() -> f64 {
    6.0
}

fn default_base_co() -> f64 {
    0.7
}

fn default_num_rays() -> i32 {
    9
}

fn default_max_distance_m() -> u32 {
    5000
}

fn default_step_m() -> u32 {
    500
}

/// One simulation request. Missing fields take the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInput {
    /// m/s, non-negative.
    #[serde(default = "default_wind_speed")]
    pub wind_speed: f64,
    /// Bearing the wind blows toward, 0–360.
    #[serde(default = "default_wind_dir_deg")]
    pub wind_dir_deg: f64,
    #[serde(default = "default_base_pm25")]
    pub base_pm25: f64,
    #[serde(default = "default_base_pm10")]
    pub base_pm10: f64,
    #[serde(default = "default_base_no2")]
    pub base_no2: f64,
    #[serde(default = "default_base_so2")]
    pub base_so2: f64,
    #[serde(default = "default_base_co")]
    pub base_co: f64,
    /// Odd counts give a symmetric fan; see [`build_fan`] for even counts.
    #[serde(default = "default_num_rays")]
    pub num_rays: i32,
    #[serde(default = "default_max_distance_m")]
    pub max_distance_m: u32,
    #[serde(default = "default_step_m")]
    pub step_m: u32,
}

impl Default for SimulationInput {
    fn default() -> Self {
        Self {
            wind_speed: default_wind_speed(),
            wind_dir_deg: default_wind_dir_deg(),
            base_pm25: default_base_pm25(),
            base_pm10: default_base_pm10(),
            base_no2: default_base_no2(),
            base_so2: default_base_so2(),
            base_co: default_base_co(),
            num_rays: default_num_rays(),
            max_distance_m: default_max_distance_m(),
            step_m: default_step_m(),
        }
    }
}

impl SimulationInput {
    pub fn base(&self) -> Pollutants {
        Pollutants {
            pm25: self.base_pm25,
            pm10: self.base_pm10,
            no2: self.base_no2,
            so2: self.base_so2,
            co: self.base_co,
        }
    }

    pub fn with_base(mut self, base: Pollutants) -> Self {
        self.base_pm25 = base.pm25;
        self.base_pm10 = base.pm10;
        self.base_no2 = base.no2;
        self.base_so2 = base.so2;
        self.base_co = base.co;
        self
    }

    /// Number of points [`DispersionModel::generate`] will emit.
    pub fn point_count(&self) -> Result<usize, DispersionError> {
        let schedule = StepSchedule::new(self.step_m, self.max_distance_m)?;
        let half = self.num_rays.max(1) / 2;
        let rays = (2 * half + 1) as usize;
        Ok(rays.saturating_mul(schedule.len()))
    }
}

/// Generator bound to one emission source.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DispersionModel {
    source: SourceLocation,
}

impl DispersionModel {
    pub fn new(source: SourceLocation) -> Self {
        Self { source }
    }

    pub fn generate(&self, input: &SimulationInput) -> Result<DispersionField, DispersionError> {
        let schedule = StepSchedule::new(input.step_m, input.max_distance_m)?;
        let fan = build_fan(input.wind_dir_deg, input.wind_speed, input.num_rays);
        let sampler = RaySampler {
            source: self.source,
            base: input.base(),
            spread_deg: fan.spread_deg,
            schedule,
            cloud_radius: sampler::cloud_radius(input.wind_speed),
        };
        let sampled: Vec<Vec<SamplePoint>> = fan.rays.iter().map(|ray| sampler.sample(ray)).collect();
        let field = assemble(
            &fan,
            sampled,
            input.wind_speed,
            input.wind_dir_deg,
            self.source,
        );
        debug!(
            rays = fan.len(),
            spread_deg = fan.spread_deg,
            points = field.points.len(),
            "generated dispersion field"
        );
        Ok(field)
    }
}

/// Generates a field around the default Nilüfer source.
pub fn generate_dispersion_field(
    input: &SimulationInput,
) -> Result<DispersionField, DispersionError> {
    DispersionModel::default().generate(input)
}
