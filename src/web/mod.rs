mod error;
mod validation;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    config::ServiceConfig,
    dispersion::{DispersionField, DispersionModel, SimulationInput},
    environment::{
        report::now_rfc3339, AirQuality, BoundingBox, CurrentConditions, EnvironmentFeed,
        EnvironmentReport, Location, Wind,
    },
    export::CsvExporter,
};

pub use error::ApiError;
pub use validation::validate;

const ENDPOINTS: [&str; 10] = [
    "/health",
    "/test",
    "/simulate",
    "/simulate/live",
    "/environment/current",
    "/environment/full",
    "/environment/bounding-box",
    "/export/csv",
    "/export/csv/separate",
    "/export/csv/current",
];

pub struct AppState<F> {
    model: DispersionModel,
    feed: F,
    exporter: CsvExporter,
    location: Location,
    bounding_box: BoundingBox,
    defaults: SimulationInput,
    max_points: usize,
}

impl<F: EnvironmentFeed> AppState<F> {
    pub fn new(config: &ServiceConfig, feed: F) -> Self {
        Self {
            model: DispersionModel::new(config.source),
            feed,
            exporter: CsvExporter::new(config.export.output_dir.clone()),
            location: config.location.clone(),
            bounding_box: config.bounding_box,
            defaults: config.simulation.clone(),
            max_points: config.limits.max_points,
        }
    }

    fn simulate(&self, input: &SimulationInput) -> Result<DispersionField, ApiError> {
        validate(input, self.max_points)?;
        let field = self.model.generate(input)?;
        info!(
            wind_speed = input.wind_speed,
            wind_dir_deg = input.wind_dir_deg,
            points = field.points.len(),
            "simulated dispersion"
        );
        Ok(field)
    }

    async fn report(&self) -> Result<EnvironmentReport, ApiError> {
        let snapshot = self.feed.full(self.location.coordinates()).await?;
        Ok(EnvironmentReport::new(self.location.clone(), snapshot))
    }
}

pub fn router<F: EnvironmentFeed>(state: AppState<F>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/test", get(test_endpoint::<F>))
        .route(
            "/simulate",
            get(simulate_default::<F>)
                .post(simulate::<F>)
                .options(preflight),
        )
        .route("/simulate/live", get(simulate_live::<F>))
        .route("/environment/current", get(environment_current::<F>))
        .route("/environment/full", get(environment_full::<F>))
        .route(
            "/environment/bounding-box",
            get(environment_bounding_box::<F>),
        )
        .route("/export/csv", get(export_csv::<F>))
        .route("/export/csv/separate", get(export_csv_separate::<F>))
        .route("/export/csv/current", get(export_csv_current::<F>))
        .layer(middleware::map_response(allow_any_origin))
        .with_state(Arc::new(state))
}

pub async fn run<F: EnvironmentFeed>(config: ServiceConfig, feed: F) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("dispersion API live at http://{addr} (Ctrl+C to stop)");

    axum::serve(listener, router(AppState::new(&config, feed)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down dispersion API");
}

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "content-type"),
        ],
    )
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "Bursa Nilüfer air pollution dispersion API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn test_endpoint<F: EnvironmentFeed>(State(state): State<Arc<AppState<F>>>) -> Json<Value> {
    Json(json!({
        "message": "API is working",
        "bounding_box": state.bounding_box,
    }))
}

async fn simulate<F: EnvironmentFeed>(
    State(state): State<Arc<AppState<F>>>,
    payload: Result<Json<SimulationInput>, JsonRejection>,
) -> Result<Json<DispersionField>, ApiError> {
    let Json(input) = payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    Ok(Json(state.simulate(&input)?))
}

async fn simulate_default<F: EnvironmentFeed>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<DispersionField>, ApiError> {
    Ok(Json(state.simulate(&state.defaults)?))
}

/// Runs the model on the feed's current reading for the configured district.
async fn simulate_live<F: EnvironmentFeed>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<DispersionField>, ApiError> {
    let observation = state.feed.current(state.location.coordinates()).await?;
    let input = observation.to_simulation_input(&state.defaults);
    Ok(Json(state.simulate(&input)?))
}

async fn environment_current<F: EnvironmentFeed>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<CurrentConditions>, ApiError> {
    let observation = state.feed.current(state.location.coordinates()).await?;
    Ok(Json(CurrentConditions::new(
        state.location.clone(),
        &observation,
    )))
}

async fn environment_full<F: EnvironmentFeed>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<EnvironmentReport>, ApiError> {
    Ok(Json(state.report().await?))
}

#[derive(Serialize)]
struct BoundingBoxPoint {
    lat: f64,
    lon: f64,
    air_quality: AirQuality,
    wind: Wind,
}

#[derive(Serialize)]
struct BoundingBoxResponse {
    bounding_box: BoundingBox,
    points: Vec<BoundingBoxPoint>,
    total_points: usize,
}

async fn environment_bounding_box<F: EnvironmentFeed>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<BoundingBoxResponse>, ApiError> {
    let [sw, centre, ne] = state.bounding_box.diagonal();
    let feed = &state.feed;
    let readings = tokio::try_join!(feed.current(sw), feed.current(centre), feed.current(ne))?;
    let points: Vec<BoundingBoxPoint> = [(sw, readings.0), (centre, readings.1), (ne, readings.2)]
        .into_iter()
        .map(|(at, observation)| BoundingBoxPoint {
            lat: at.lat,
            lon: at.lon,
            air_quality: observation.air.into(),
            wind: Wind::new(observation.wind_speed, observation.wind_direction),
        })
        .collect();
    Ok(Json(BoundingBoxResponse {
        bounding_box: state.bounding_box,
        total_points: points.len(),
        points,
    }))
}

#[derive(Serialize)]
struct DataSummary {
    current_records: usize,
    hourly_records: usize,
    total_records: usize,
}

#[derive(Serialize)]
struct ExportResponse {
    message: &'static str,
    file: PathBuf,
    export_timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_summary: Option<DataSummary>,
}

#[derive(Serialize)]
struct ExportFiles {
    current_data: PathBuf,
    hourly_data: PathBuf,
}

#[derive(Serialize)]
struct SeparateExportResponse {
    message: &'static str,
    files: ExportFiles,
    export_timestamp: String,
}

async fn export_csv<F: EnvironmentFeed>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<ExportResponse>, ApiError> {
    let report = state.report().await?;
    let hourly_records = report.hourly.len();
    let exporter = state.exporter.clone();
    let file =
        tokio::task::spawn_blocking(move || exporter.write_comprehensive(&report, None)).await??;
    Ok(Json(ExportResponse {
        message: "Comprehensive CSV file created successfully",
        file,
        export_timestamp: now_rfc3339(),
        data_summary: Some(DataSummary {
            current_records: 1,
            hourly_records,
            total_records: hourly_records + 1,
        }),
    }))
}

async fn export_csv_separate<F: EnvironmentFeed>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<SeparateExportResponse>, ApiError> {
    let report = state.report().await?;
    let exporter = state.exporter.clone();
    let files = tokio::task::spawn_blocking(move || -> Result<ExportFiles, ApiError> {
        Ok(ExportFiles {
            current_data: exporter.write_current(&report.location, &report.current, None)?,
            hourly_data: exporter.write_hourly(&report, None)?,
        })
    })
    .await??;
    Ok(Json(SeparateExportResponse {
        message: "Separate CSV files created successfully",
        files,
        export_timestamp: now_rfc3339(),
    }))
}

async fn export_csv_current<F: EnvironmentFeed>(
    State(state): State<Arc<AppState<F>>>,
) -> Result<Json<ExportResponse>, ApiError> {
    let observation = state.feed.current(state.location.coordinates()).await?;
    let current = CurrentConditions::new(state.location.clone(), &observation);
    let exporter = state.exporter.clone();
    let file = tokio::task::spawn_blocking(move || {
        exporter.write_current(&current.location, &current.snapshot(), None)
    })
    .await??;
    Ok(Json(ExportResponse {
        message: "Current data CSV created successfully",
        file,
        export_timestamp: now_rfc3339(),
        data_summary: None,
    }))
}
