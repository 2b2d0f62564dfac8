//! HTTP API поверх пайплайна MLD

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::pipeline::MldPipeline;
use crate::types::{
    FeaturesOutput, PipelineRequest, ProfilesOutput, SequenceRequest, SequencesOutput,
};

#[derive(Clone)]
pub struct AppState {
    default_config: Arc<PipelineConfig>,
}

impl AppState {
    pub fn new(default_config: PipelineConfig) -> Self {
        Self {
            default_config: Arc::new(default_config),
        }
    }

    fn pipeline(&self, config: Option<&PipelineConfig>) -> MldPipeline {
        MldPipeline::new(config.unwrap_or(&self.default_config))
    }
}

/// Ошибки схемы и признаков -> 422 с текстом ошибки
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!("Request rejected: {}", self.0);
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/features", post(features))
        .route("/api/mld", post(mld))
        .route("/api/sequences", post(sequences))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Argo MLD feature API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn features(
    State(state): State<AppState>,
    Json(req): Json<PipelineRequest>,
) -> Result<Json<FeaturesOutput>, ApiError> {
    tracing::info!("Features request: {} records", req.records.n_rows());

    let dataset = state.pipeline(req.config.as_ref()).prepare_features(&req.records)?;

    Ok(Json(FeaturesOutput {
        n_rows: dataset.n_rows(),
        x: dataset.x.rows().into_iter().map(|r| r.to_vec()).collect(),
        y: dataset.y.column(0).to_vec(),
        feature_names: dataset.feature_names,
    }))
}

async fn mld(
    State(state): State<AppState>,
    Json(req): Json<PipelineRequest>,
) -> Result<Json<ProfilesOutput>, ApiError> {
    tracing::info!("MLD request: {} records", req.records.n_rows());

    let profiles = state.pipeline(req.config.as_ref()).profile_summaries(&req.records)?;
    Ok(Json(ProfilesOutput { profiles }))
}

async fn sequences(
    State(state): State<AppState>,
    Json(req): Json<SequenceRequest>,
) -> Result<Json<SequencesOutput>, ApiError> {
    tracing::info!(
        "Sequences request: {} records, {} time steps",
        req.records.n_rows(),
        req.time_steps
    );

    let set = state
        .pipeline(req.config.as_ref())
        .prepare_sequences(&req.records, req.time_steps, req.scale)?;

    let target_range = set.scaler_y.as_ref().and_then(|s| {
        let min = s.data_min()?.first().copied()?;
        let max = s.data_max()?.first().copied()?;
        Some([min, max])
    });

    Ok(Json(SequencesOutput {
        time_steps: req.time_steps,
        n_windows: set.x.shape()[0],
        x: set
            .x
            .outer_iter()
            .map(|window| window.rows().into_iter().map(|r| r.to_vec()).collect())
            .collect(),
        y: set.y.column(0).to_vec(),
        feature_names: set.feature_names,
        target_range,
    }))
}
