//! Route configuration.

use crate::admission::admission_middleware;
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    // Suffixed final segments ({version}.csv etc.) are parsed inside the
    // handlers since axum does not route on /{param}.ext.
    let download_routes = Router::new()
        .route(
            "/downloads/datasets/{dataset_id}/editions/{edition}/versions/{file}",
            get(handlers::download_dataset_version),
        )
        .route(
            "/downloads/filter-outputs/{file}",
            get(handlers::download_filter_output),
        )
        .route(
            "/downloads/instances/{file}",
            get(handlers::download_instance),
        )
        .route(
            "/images/{image_id}/{variant}/{filename}",
            get(handlers::download_image),
        )
        .route("/v1/files/{*path}", get(handlers::download_file))
        // Bounded concurrency applies to everything that can touch storage.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admission_middleware,
        ));

    // Health stays outside the admission gate.
    Router::new()
        .merge(download_routes)
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
