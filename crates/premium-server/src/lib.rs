//! HTTP surface of the premium classifier.
//!
//! Routes:
//! - `GET /`              health
//! - `POST /predict`      `{"predicted_category": ...}`
//! - `POST /predict_proba` `{"classes": [...], "proba": [...]}` or 400
//! - `GET /metrics`       Prometheus text

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use premium_core::{
    error::CoreError,
    pipeline::AppCore,
    schema::{ErrorBody, HealthResponse, PredictResponse, ProbaResponse, RawInput},
};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<AppCore>,
    pub prom: PrometheusHandle,
}

impl AppState {
    pub fn new(core: AppCore, prom: PrometheusHandle) -> Self {
        Self {
            core: Arc::new(core),
            prom,
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(#[from] JsonRejection),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Rejected(r) => r.status(),
            ApiError::Core(CoreError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Core(CoreError::CapabilityUnavailable) => StatusCode::BAD_REQUEST,
            ApiError::Core(CoreError::Inference(e)) => {
                tracing::error!(err = %format!("{e:#}"), "inference failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let error = match self {
            ApiError::Rejected(r) => r.body_text(),
            ApiError::Core(e) => e.to_string(),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/predict_proba", post(predict_proba))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until ctrl-c.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(err = %e, "ctrl-c handler failed");
            }
            tracing::info!("shutting down");
        })
        .await
}

async fn root(State(st): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        service: st.core.cfg.service_name.clone(),
    })
}

async fn predict(
    State(st): State<AppState>,
    payload: Result<Json<RawInput>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(raw) = payload?;
    Ok(Json(st.core.predict(raw)?))
}

async fn predict_proba(
    State(st): State<AppState>,
    payload: Result<Json<RawInput>, JsonRejection>,
) -> Result<Json<ProbaResponse>, ApiError> {
    let Json(raw) = payload?;
    Ok(Json(st.core.predict_proba(raw)?))
}

async fn metrics(State(st): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, st.prom.render())
}
