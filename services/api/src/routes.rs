use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use grant_admin::adverts::{advert_router, AdvertEventPublisher, AdvertRepository, GrantAdvertService};
use serde_json::json;
use std::sync::Arc;

/// Advert routes plus the operational endpoints every deployment exposes.
pub(crate) fn with_advert_routes<R, E>(
    service: Arc<GrantAdvertService<R, E>>,
    lambda_secret: Option<String>,
) -> Router
where
    R: AdvertRepository + 'static,
    E: AdvertEventPublisher + 'static,
{
    advert_router(service, lambda_secret)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
