//! Health check handler.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::Serialize;
use std::collections::BTreeMap;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub checks: BTreeMap<&'static str, &'static str>,
}

/// GET /health - Health check.
///
/// Intentionally unauthenticated and outside the admission gate so load
/// balancer probes keep passing while the download slots are saturated.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let mut checks = BTreeMap::new();
    checks.insert(
        "storage",
        status_of(state.storage.health_check().await.is_ok()),
    );
    checks.insert("dataset_api", status_of(state.dataset.checker().await.is_ok()));
    checks.insert("filter_api", status_of(state.filter.checker().await.is_ok()));
    checks.insert("image_api", status_of(state.image.checker().await.is_ok()));
    checks.insert("files_api", status_of(state.files.checker().await.is_ok()));
    checks.insert(
        "identity_api",
        status_of(state.identity.checker().await.is_ok()),
    );

    let status = if checks.values().all(|s| *s == "ok") {
        "ok"
    } else {
        "degraded"
    };

    Ok(Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        checks,
    }))
}

fn status_of(ok: bool) -> &'static str {
    if ok { "ok" } else { "unhealthy" }
}
