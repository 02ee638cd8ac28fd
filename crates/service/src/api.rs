//! HTTP API for predictions, model management, health and metrics

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use predictor_lib::{
    HealthReport, InferenceError, ModelService, StudentRecord, TrainingError, UnhealthyResponse,
    ValidationError,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Endpoints advertised by the health check
pub const ENDPOINTS: [&str; 4] = [
    "/api/v1/predecir",
    "/api/v1/modelo/info",
    "/api/v1/modelo/entrenar",
    "/api/v1/health",
];

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ModelService>,
    pub version: &'static str,
}

impl AppState {
    pub fn new(service: Arc<ModelService>, version: &'static str) -> Self {
        Self { service, version }
    }
}

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                detail: None,
                field: None,
            },
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.body.detail = Some(detail.into());
        self
    }

    pub fn with_field(mut self, field: Option<&str>) -> Self {
        self.body.field = field.map(str::to_string);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Generic 500; the cause is logged, never returned
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        error!(error = %cause, "Internal error while handling request");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request("Invalid input data")
            .with_detail(err.to_string())
            .with_field(err.field())
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::ModelUnavailable => Self::bad_request(err.to_string()),
            InferenceError::Store(_) | InferenceError::Internal(_) => Self::internal(err),
        }
    }
}

impl From<TrainingError> for ApiError {
    fn from(err: TrainingError) -> Self {
        if err.is_data_problem() {
            warn!(error = %err, "Training rejected by dataset");
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Training failed")
                .with_detail(err.to_string())
        } else {
            Self::internal(err)
        }
    }
}

/// Body of a training request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrainRequest {
    #[serde(default, alias = "forzar_reentrenamiento")]
    pub force: bool,
}

/// Run CPU-bound work on the blocking pool
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(ApiError::internal)
}

/// Predict a student's third-trimester score
async fn predict(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request("Invalid JSON body").with_detail(e.to_string()))?;
    let record = StudentRecord::try_from(&value)?;

    let service = state.service.clone();
    let prediction = blocking(move || service.predict(&record)).await??;
    Ok(Json(prediction).into_response())
}

/// Describe the loaded model
async fn model_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.info())
}

/// Train a model, or load the existing one unless forced
async fn train(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        TrainRequest::default()
    } else {
        serde_json::from_slice::<TrainRequest>(&body).map_err(|e| {
            ApiError::bad_request("Invalid training request").with_detail(e.to_string())
        })?
    };

    info!(force = request.force, "Training requested");
    let service = state.service.clone();
    let report = blocking(move || service.train(request.force)).await??;
    Ok(Json(report).into_response())
}

/// Health check - 200 with service state, 503 if it cannot be determined
async fn health(State(state): State<Arc<AppState>>) -> Response {
    let service = state.service.clone();
    let version = state.version;
    match tokio::task::spawn_blocking(move || HealthReport::collect(&service, version, &ENDPOINTS))
        .await
    {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(UnhealthyResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<Response, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(ApiError::internal)?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response())
}

/// Service routes, each reachable with and without a trailing slash
fn service_routes() -> Router<Arc<AppState>> {
    let endpoints: [(&str, MethodRouter<Arc<AppState>>); 4] = [
        ("/predecir", post(predict)),
        ("/modelo/info", get(model_info)),
        ("/modelo/entrenar", post(train)),
        ("/health", get(health)),
    ];

    endpoints
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| {
            router
                .route(&format!("{}/", path), handler.clone())
                .route(path, handler)
        })
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(service_routes())
        .nest("/api/v1", service_routes())
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve<F>(addr: &str, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
