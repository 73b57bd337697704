//! Response shapes served to the map client, derived from feed readings.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{
    aqi::pm25_to_aqi,
    wind::{wind_vector, WindVector},
    AirSample, Coordinates, FeedSnapshot, HourlySeries, Observation,
};
use crate::dispersion::field::round_to;

/// Degrees of lat/lon per m/s of wind used for the spread hint.
const SPREAD_SCALE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub district: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            city: "Bursa".to_string(),
            district: "Nilüfer".to_string(),
            lat: 40.2133,
            lon: 28.9771,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// South-west corner, centre, north-east corner.
    pub fn diagonal(&self) -> [Coordinates; 3] {
        [
            Coordinates {
                lat: self.lat_min,
                lon: self.lon_min,
            },
            Coordinates {
                lat: (self.lat_min + self.lat_max) / 2.0,
                lon: (self.lon_min + self.lon_max) / 2.0,
            },
            Coordinates {
                lat: self.lat_max,
                lon: self.lon_max,
            },
        ]
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            lat_min: 40.170,
            lat_max: 40.260,
            lon_min: 28.900,
            lon_max: 29.050,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
    pub aqi: Option<u32>,
}

impl From<AirSample> for AirQuality {
    fn from(sample: AirSample) -> Self {
        Self {
            pm2_5: sample.pm2_5,
            pm10: sample.pm10,
            no2: sample.no2,
            so2: sample.so2,
            co: sample.co,
            aqi: sample.pm2_5.map(pm25_to_aqi),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    /// Whole degrees, truncated.
    pub direction: i64,
    pub vector: WindVector,
}

impl Wind {
    pub fn new(speed: f64, direction: f64) -> Self {
        Self {
            speed,
            direction: direction as i64,
            vector: wind_vector(speed, direction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpreadHint {
    pub lat: f64,
    pub lon: f64,
}

/// `/environment/current` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location: Location,
    pub timestamp: String,
    pub air_quality: AirQuality,
    pub wind: Wind,
    pub spread: SpreadHint,
}

impl CurrentConditions {
    pub fn new(location: Location, observation: &Observation) -> Self {
        let wind = Wind::new(observation.wind_speed, observation.wind_direction);
        let spread = SpreadHint {
            lat: round_to(location.lat + wind.vector.vy * SPREAD_SCALE, 3),
            lon: round_to(location.lon + wind.vector.vx * SPREAD_SCALE, 3),
        };
        Self {
            location,
            timestamp: now_rfc3339(),
            air_quality: observation.air.into(),
            wind,
            spread,
        }
    }

    pub fn snapshot(&self) -> CurrentSnapshot {
        CurrentSnapshot {
            timestamp: self.timestamp.clone(),
            air_quality: self.air_quality,
            wind: self.wind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSnapshot {
    pub timestamp: String,
    pub air_quality: AirQuality,
    pub wind: Wind,
}

/// `/environment/full` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub location: Location,
    pub current: CurrentSnapshot,
    pub hourly: HourlySeries,
}

impl EnvironmentReport {
    pub fn new(location: Location, snapshot: FeedSnapshot) -> Self {
        let FeedSnapshot { current, hourly } = snapshot;
        Self {
            location,
            current: CurrentSnapshot {
                timestamp: current.timestamp.clone().unwrap_or_else(now_rfc3339),
                air_quality: current.air.into(),
                wind: Wind::new(current.wind_speed, current.wind_direction),
            },
            hourly,
        }
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
