//! Open-Meteo air-quality and forecast client.

use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    AirSample, Coordinates, EnvironmentFeed, FeedError, FeedSnapshot, HourlySeries, Observation,
};
use crate::config::FeedConfig;

const AIR_CURRENT_FIELDS: &str = "pm10,pm2_5,nitrogen_dioxide,sulphur_dioxide,carbon_monoxide";
const AIR_HOURLY_FIELDS: &str = "pm10,pm2_5";
const WIND_FIELDS: &str = "wind_speed_10m,wind_direction_10m";

#[derive(Debug, Default, Deserialize)]
struct AirResponse {
    #[serde(default)]
    current: Option<AirCurrent>,
    #[serde(default)]
    hourly: Option<AirHourly>,
}

#[derive(Debug, Default, Deserialize)]
struct AirCurrent {
    time: Option<String>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    #[serde(alias = "no2")]
    nitrogen_dioxide: Option<f64>,
    #[serde(alias = "so2")]
    sulphur_dioxide: Option<f64>,
    #[serde(alias = "co")]
    carbon_monoxide: Option<f64>,
}

impl AirCurrent {
    fn sample(&self) -> AirSample {
        AirSample {
            pm2_5: self.pm2_5,
            pm10: self.pm10,
            no2: self.nitrogen_dioxide,
            so2: self.sulphur_dioxide,
            co: self.carbon_monoxide,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AirHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    pm2_5: Vec<Option<f64>>,
    #[serde(default)]
    pm10: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    current: Option<WeatherCurrent>,
    #[serde(default)]
    hourly: Option<WeatherHourly>,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherCurrent {
    time: Option<String>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    wind_direction_10m: Vec<Option<f64>>,
}

/// Rejects bodies shaped like `{"error": true, "reason": "..."}`.
fn decode<T: DeserializeOwned>(body: Value) -> Result<T, FeedError> {
    if body.get("error").and_then(Value::as_bool) == Some(true) {
        let reason = body
            .get("reason")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown upstream error");
        return Err(FeedError::Upstream(reason.to_string()));
    }
    Ok(serde_json::from_value(body)?)
}

fn observation(air: &AirResponse, weather: &WeatherResponse) -> Result<Observation, FeedError> {
    let air_current = air.current.as_ref();
    let weather_current = weather.current.as_ref();
    let (wind_speed, wind_direction) = weather_current
        .and_then(|w| w.wind_speed_10m.zip(w.wind_direction_10m))
        .ok_or(FeedError::MissingWind)?;
    Ok(Observation {
        timestamp: air_current
            .and_then(|a| a.time.clone())
            .or_else(|| weather_current.and_then(|w| w.time.clone())),
        air: air_current.map(AirCurrent::sample).unwrap_or_default(),
        wind_speed,
        wind_direction,
    })
}

fn parse_current(air: Value, weather: Value) -> Result<Observation, FeedError> {
    let air: AirResponse = decode(air)?;
    let weather: WeatherResponse = decode(weather)?;
    observation(&air, &weather)
}

fn parse_full(
    air_current: Value,
    air_hourly: Value,
    weather: Value,
) -> Result<FeedSnapshot, FeedError> {
    let air_current: AirResponse = decode(air_current)?;
    let air_hourly: AirResponse = decode(air_hourly)?;
    let weather: WeatherResponse = decode(weather)?;

    let current = observation(&air_current, &weather)?;
    let ah = air_hourly.hourly.unwrap_or_default();
    let wh = weather.hourly.unwrap_or_default();
    let hourly = HourlySeries::aligned(
        ah.time,
        wh.time,
        ah.pm2_5,
        ah.pm10,
        wh.wind_speed_10m,
        wh.wind_direction_10m,
    );
    Ok(FeedSnapshot { current, hourly })
}

#[derive(Debug, Clone)]
pub struct OpenMeteoFeed {
    http: reqwest::Client,
    config: FeedConfig,
}

impl OpenMeteoFeed {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value, FeedError> {
        debug!(url, "querying upstream");
        let response = self
            .http
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()
            .inspect_err(|err| warn!(url, "upstream returned {err}"))?;
        Ok(response.json::<Value>().await?)
    }

    fn position(at: Coordinates) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", at.lat.to_string()),
            ("longitude", at.lon.to_string()),
        ]
    }

    fn history(&self) -> [(&'static str, String); 2] {
        [
            ("past_days", self.config.past_days.to_string()),
            ("forecast_days", self.config.forecast_days.to_string()),
        ]
    }

    async fn air_current(&self, at: Coordinates) -> Result<Value, FeedError> {
        let mut params = Self::position(at);
        params.push(("current", AIR_CURRENT_FIELDS.to_string()));
        self.get_json(
            &self.config.air_quality_url,
            &params,
            self.config.current_timeout(),
        )
        .await
    }

    async fn air_hourly(&self, at: Coordinates) -> Result<Value, FeedError> {
        let mut params = Self::position(at);
        params.push(("hourly", AIR_HOURLY_FIELDS.to_string()));
        params.extend(self.history());
        params.push(("domains", self.config.air_quality_domain.clone()));
        self.get_json(
            &self.config.air_quality_url,
            &params,
            self.config.hourly_timeout(),
        )
        .await
    }

    async fn weather(&self, at: Coordinates, with_hourly: bool) -> Result<Value, FeedError> {
        let mut params = Self::position(at);
        params.push(("current", WIND_FIELDS.to_string()));
        params.push(("wind_speed_unit", "ms".to_string()));
        let timeout = if with_hourly {
            params.push(("hourly", WIND_FIELDS.to_string()));
            params.extend(self.history());
            self.config.hourly_timeout()
        } else {
            self.config.current_timeout()
        };
        self.get_json(&self.config.forecast_url, &params, timeout)
            .await
    }
}

impl EnvironmentFeed for OpenMeteoFeed {
    async fn current(&self, at: Coordinates) -> Result<Observation, FeedError> {
        let (air, weather) = tokio::try_join!(self.air_current(at), self.weather(at, false))?;
        parse_current(air, weather)
    }

    async fn full(&self, at: Coordinates) -> Result<FeedSnapshot, FeedError> {
        let (air_current, air_hourly, weather) = tokio::try_join!(
            self.air_current(at),
            self.air_hourly(at),
            self.weather(at, true)
        )?;
        parse_full(air_current, air_hourly, weather)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn weather() -> Value {
        json!({
            "current": {"time": "2024-05-01T12:00", "wind_speed_10m": 3.4, "wind_direction_10m": 210},
            "hourly": {
                "time": ["2024-05-01T00:00", "2024-05-01T01:00", "2024-05-01T02:00"],
                "wind_speed_10m": [1.0, 2.0, null],
                "wind_direction_10m": [10, 20, 30]
            }
        })
    }

    #[test]
    fn parses_current_reading() {
        let air = json!({
            "current": {"time": "2024-05-01T11:45", "pm2_5": 18.2, "pm10": 25.0,
                        "nitrogen_dioxide": 12.0, "sulphur_dioxide": 3.1, "carbon_monoxide": 210.0}
        });
        let observation = parse_current(air, weather()).unwrap();
        assert_eq!(observation.timestamp.as_deref(), Some("2024-05-01T11:45"));
        assert_eq!(observation.air.pm2_5, Some(18.2));
        assert_eq!(observation.air.no2, Some(12.0));
        assert_eq!(observation.air.co, Some(210.0));
        assert_eq!(observation.wind_speed, 3.4);
        assert_eq!(observation.wind_direction, 210.0);
    }

    #[test]
    fn short_pollutant_keys_are_accepted() {
        let air = json!({"current": {"no2": 7.0, "so2": 1.0, "co": 0.3}});
        let observation = parse_current(air, weather()).unwrap();
        assert_eq!(observation.air.no2, Some(7.0));
        assert_eq!(observation.air.so2, Some(1.0));
        assert_eq!(observation.air.pm2_5, None);
        assert_eq!(observation.timestamp.as_deref(), Some("2024-05-01T12:00"));
    }

    #[test]
    fn upstream_error_body_is_rejected() {
        let air = json!({"error": true, "reason": "Latitude must be in range"});
        let err = parse_current(air, weather()).unwrap_err();
        assert!(matches!(err, FeedError::Upstream(ref reason) if reason == "Latitude must be in range"));
        assert_eq!(
            err.to_string(),
            "Upstream API error: Latitude must be in range"
        );
    }

    #[test]
    fn missing_wind_is_an_error() {
        let err = parse_current(json!({"current": {}}), json!({"current": {"time": "x"}}))
            .unwrap_err();
        assert!(matches!(err, FeedError::MissingWind));
    }

    #[test]
    fn full_snapshot_aligns_hourly_series() {
        let air_hourly = json!({
            "hourly": {
                "time": ["a", "b", "c", "d"],
                "pm2_5": [10.0, 11.0, 12.0, 13.0],
                "pm10": [20.0, 21.0]
            }
        });
        let snapshot = parse_full(json!({"current": {"pm2_5": 9.0}}), air_hourly, weather()).unwrap();
        assert_eq!(snapshot.hourly.len(), 2);
        assert_eq!(snapshot.hourly.time[0], "2024-05-01T00:00");
        assert_eq!(snapshot.hourly.pm2_5, vec![Some(10.0), Some(11.0)]);
        assert_eq!(snapshot.hourly.wind_speed, vec![Some(1.0), Some(2.0)]);
        assert_eq!(snapshot.current.air.pm2_5, Some(9.0));
    }
}
