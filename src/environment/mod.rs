//! Live air-quality and wind readings that feed the dispersion model.

pub mod aqi;
pub mod open_meteo;
pub mod report;
pub mod wind;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispersion::{Pollutants, SimulationInput};

pub use aqi::pm25_to_aqi;
pub use open_meteo::OpenMeteoFeed;
pub use report::{
    AirQuality, BoundingBox, CurrentConditions, CurrentSnapshot, EnvironmentReport, Location,
    Wind,
};
pub use wind::{wind_vector, WindVector};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Upstream API error: {0}")]
    Upstream(String),
    #[error("Upstream API error: missing weather current fields")]
    MissingWind,
    #[error("Upstream API error: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Pollutant readings with gaps where the upstream had none.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AirSample {
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
}

impl AirSample {
    /// Missing channels fall back to `fallback`.
    pub fn or(&self, fallback: &Pollutants) -> Pollutants {
        Pollutants {
            pm25: self.pm2_5.unwrap_or(fallback.pm25),
            pm10: self.pm10.unwrap_or(fallback.pm10),
            no2: self.no2.unwrap_or(fallback.no2),
            so2: self.so2.unwrap_or(fallback.so2),
            co: self.co.unwrap_or(fallback.co),
        }
    }
}

/// A point-in-time reading at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: Option<String>,
    pub air: AirSample,
    pub wind_speed: f64,
    /// Meteorological "from" direction in degrees.
    pub wind_direction: f64,
}

impl Observation {
    /// Simulation input driven by this reading. Open-Meteo reports where
    /// the wind comes from; the plume travels the opposite way.
    pub fn to_simulation_input(&self, template: &SimulationInput) -> SimulationInput {
        SimulationInput {
            wind_speed: self.wind_speed.max(0.0),
            wind_dir_deg: (self.wind_direction + 180.0).rem_euclid(360.0),
            ..template.clone()
        }
        .with_base(self.air.or(&template.base()))
    }
}

/// Hourly history plus forecast, all series the same length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    pub pm2_5: Vec<Option<f64>>,
    pub pm10: Vec<Option<f64>>,
    pub wind_speed: Vec<Option<f64>>,
    pub wind_direction: Vec<Option<f64>>,
}

impl HourlySeries {
    /// Truncates every series to the shortest non-empty one. Weather
    /// timestamps win over air-quality timestamps when both exist.
    pub fn aligned(
        air_time: Vec<String>,
        weather_time: Vec<String>,
        mut pm2_5: Vec<Option<f64>>,
        mut pm10: Vec<Option<f64>>,
        mut wind_speed: Vec<Option<f64>>,
        mut wind_direction: Vec<Option<f64>>,
    ) -> Self {
        let mut time = if weather_time.is_empty() {
            air_time
        } else {
            weather_time
        };
        let n = [
            time.len(),
            pm2_5.len(),
            pm10.len(),
            wind_speed.len(),
            wind_direction.len(),
        ]
        .into_iter()
        .filter(|len| *len > 0)
        .min()
        .unwrap_or(0);

        time.truncate(n);
        pm2_5.truncate(n);
        pm10.truncate(n);
        wind_speed.truncate(n);
        wind_direction.truncate(n);

        Self {
            time,
            pm2_5,
            pm10,
            wind_speed,
            wind_direction,
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub current: Observation,
    pub hourly: HourlySeries,
}

/// Source of current and hourly environment readings.
pub trait EnvironmentFeed: Send + Sync + 'static {
    fn current(
        &self,
        at: Coordinates,
    ) -> impl Future<Output = Result<Observation, FeedError>> + Send;

    fn full(&self, at: Coordinates)
        -> impl Future<Output = Result<FeedSnapshot, FeedError>> + Send;
}

/// Feed that always answers with the same snapshot, regardless of position.
#[derive(Debug, Clone)]
pub struct StaticFeed {
    snapshot: FeedSnapshot,
}

impl StaticFeed {
    pub fn new(snapshot: FeedSnapshot) -> Self {
        Self { snapshot }
    }

    /// Calm reading built from simulation defaults, for running offline.
    pub fn from_input(input: &SimulationInput) -> Self {
        let air = AirSample {
            pm2_5: Some(input.base_pm25),
            pm10: Some(input.base_pm10),
            no2: Some(input.base_no2),
            so2: Some(input.base_so2),
            co: Some(input.base_co),
        };
        Self::new(FeedSnapshot {
            current: Observation {
                timestamp: None,
                air,
                wind_speed: input.wind_speed,
                wind_direction: (input.wind_dir_deg + 180.0).rem_euclid(360.0),
            },
            hourly: HourlySeries::default(),
        })
    }
}

impl EnvironmentFeed for StaticFeed {
    async fn current(&self, _at: Coordinates) -> Result<Observation, FeedError> {
        Ok(self.snapshot.current.clone())
    }

    async fn full(&self, _at: Coordinates) -> Result<FeedSnapshot, FeedError> {
        Ok(self.snapshot.clone())
    }
}
