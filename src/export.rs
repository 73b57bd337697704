//! CSV export of current and hourly environment records.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::environment::{pm25_to_aqi, wind_vector, CurrentSnapshot, EnvironmentReport, Location};

/// Byte-order mark so spreadsheet tools pick UTF-8 for district names.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const CURRENT_HEADER: [&str; 15] = [
    "timestamp",
    "city",
    "district",
    "latitude",
    "longitude",
    "pm2_5",
    "pm10",
    "no2",
    "so2",
    "co",
    "aqi",
    "wind_speed",
    "wind_direction",
    "wind_vx",
    "wind_vy",
];

const HOURLY_HEADER: [&str; 9] = [
    "time",
    "pm2_5",
    "pm10",
    "wind_speed",
    "wind_direction",
    "city",
    "district",
    "latitude",
    "longitude",
];

const COMPREHENSIVE_HEADER: [&str; 16] = [
    "data_type",
    "timestamp",
    "city",
    "district",
    "latitude",
    "longitude",
    "pm2_5",
    "pm10",
    "no2",
    "so2",
    "co",
    "aqi",
    "wind_speed",
    "wind_direction",
    "wind_vx",
    "wind_vy",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv encoding error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Current,
    Hourly,
    Comprehensive,
}

impl ExportKind {
    fn label(self) -> &'static str {
        match self {
            ExportKind::Current => "current",
            ExportKind::Hourly => "hourly",
            ExportKind::Comprehensive => "comprehensive",
        }
    }

    /// Column names, written even when there are no rows.
    fn header(self) -> &'static [&'static str] {
        match self {
            ExportKind::Current => &CURRENT_HEADER,
            ExportKind::Hourly => &HOURLY_HEADER,
            ExportKind::Comprehensive => &COMPREHENSIVE_HEADER,
        }
    }

    /// `environment_<kind>_<YYYYmmdd_HHMMSS>.csv`
    pub fn file_name(self) -> String {
        format!(
            "environment_{}_{}.csv",
            self.label(),
            Local::now().format("%Y%m%d_%H%M%S")
        )
    }
}

#[derive(Serialize)]
struct CurrentRow<'a> {
    timestamp: &'a str,
    city: &'a str,
    district: &'a str,
    latitude: f64,
    longitude: f64,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    no2: Option<f64>,
    so2: Option<f64>,
    co: Option<f64>,
    aqi: Option<u32>,
    wind_speed: f64,
    wind_direction: i64,
    wind_vx: f64,
    wind_vy: f64,
}

#[derive(Serialize)]
struct HourlyRow<'a> {
    time: &'a str,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    wind_speed: Option<f64>,
    wind_direction: Option<f64>,
    city: &'a str,
    district: &'a str,
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
struct ComprehensiveRow<'a> {
    data_type: &'static str,
    timestamp: &'a str,
    city: &'a str,
    district: &'a str,
    latitude: f64,
    longitude: f64,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    no2: Option<f64>,
    so2: Option<f64>,
    co: Option<f64>,
    aqi: Option<u32>,
    wind_speed: Option<f64>,
    wind_direction: Option<f64>,
    wind_vx: Option<f64>,
    wind_vy: Option<f64>,
}

impl<'a> ComprehensiveRow<'a> {
    fn hourly(report: &'a EnvironmentReport, index: usize) -> Self {
        let hourly = &report.hourly;
        let pm2_5 = hourly.pm2_5.get(index).copied().flatten();
        let wind_speed = hourly.wind_speed.get(index).copied().flatten();
        let wind_direction = hourly.wind_direction.get(index).copied().flatten();
        let vector = wind_speed
            .zip(wind_direction)
            .map(|(speed, direction)| wind_vector(speed, direction));
        Self {
            data_type: "hourly",
            timestamp: &hourly.time[index],
            city: &report.location.city,
            district: &report.location.district,
            latitude: report.location.lat,
            longitude: report.location.lon,
            pm2_5,
            pm10: hourly.pm10.get(index).copied().flatten(),
            no2: None,
            so2: None,
            co: None,
            aqi: pm2_5.map(pm25_to_aqi),
            wind_speed,
            wind_direction,
            wind_vx: vector.map(|v| v.vx),
            wind_vy: vector.map(|v| v.vy),
        }
    }
}

/// Writes CSV files into one output directory, creating it on demand.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    output_dir: PathBuf,
}

impl CsvExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn writer(
        &self,
        kind: ExportKind,
        file_name: Option<&str>,
    ) -> Result<(PathBuf, csv::Writer<File>), ExportError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = match file_name {
            Some(name) => self.output_dir.join(name),
            None => self.output_dir.join(kind.file_name()),
        };
        let mut file = File::create(&path)?;
        file.write_all(UTF8_BOM)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(kind.header())?;
        Ok((path, writer))
    }

    pub fn write_current(
        &self,
        location: &Location,
        current: &CurrentSnapshot,
        file_name: Option<&str>,
    ) -> Result<PathBuf, ExportError> {
        let (path, mut writer) = self.writer(ExportKind::Current, file_name)?;
        let air = &current.air_quality;
        writer.serialize(CurrentRow {
            timestamp: &current.timestamp,
            city: &location.city,
            district: &location.district,
            latitude: location.lat,
            longitude: location.lon,
            pm2_5: air.pm2_5,
            pm10: air.pm10,
            no2: air.no2,
            so2: air.so2,
            co: air.co,
            aqi: air.aqi,
            wind_speed: current.wind.speed,
            wind_direction: current.wind.direction,
            wind_vx: current.wind.vector.vx,
            wind_vy: current.wind.vector.vy,
        })?;
        writer.flush()?;
        info!(path = %path.display(), "wrote current export");
        Ok(path)
    }

    pub fn write_hourly(
        &self,
        report: &EnvironmentReport,
        file_name: Option<&str>,
    ) -> Result<PathBuf, ExportError> {
        let (path, mut writer) = self.writer(ExportKind::Hourly, file_name)?;
        let location = &report.location;
        let hourly = &report.hourly;
        for (index, time) in hourly.time.iter().enumerate() {
            writer.serialize(HourlyRow {
                time,
                pm2_5: hourly.pm2_5.get(index).copied().flatten(),
                pm10: hourly.pm10.get(index).copied().flatten(),
                wind_speed: hourly.wind_speed.get(index).copied().flatten(),
                wind_direction: hourly.wind_direction.get(index).copied().flatten(),
                city: &location.city,
                district: &location.district,
                latitude: location.lat,
                longitude: location.lon,
            })?;
        }
        writer.flush()?;
        info!(path = %path.display(), rows = hourly.len(), "wrote hourly export");
        Ok(path)
    }

    /// One `current` row followed by one `hourly` row per hour.
    pub fn write_comprehensive(
        &self,
        report: &EnvironmentReport,
        file_name: Option<&str>,
    ) -> Result<PathBuf, ExportError> {
        let (path, mut writer) = self.writer(ExportKind::Comprehensive, file_name)?;
        let current = &report.current;
        let air = &current.air_quality;
        writer.serialize(ComprehensiveRow {
            data_type: "current",
            timestamp: &current.timestamp,
            city: &report.location.city,
            district: &report.location.district,
            latitude: report.location.lat,
            longitude: report.location.lon,
            pm2_5: air.pm2_5,
            pm10: air.pm10,
            no2: air.no2,
            so2: air.so2,
            co: air.co,
            aqi: air.aqi,
            wind_speed: Some(current.wind.speed),
            wind_direction: Some(current.wind.direction as f64),
            wind_vx: Some(current.wind.vector.vx),
            wind_vy: Some(current.wind.vector.vy),
        })?;
        for index in 0..report.hourly.len() {
            writer.serialize(ComprehensiveRow::hourly(report, index))?;
        }
        writer.flush()?;
        info!(
            path = %path.display(),
            rows = report.hourly.len() + 1,
            "wrote comprehensive export"
        );
        Ok(path)
    }
}
