//! REST API layer: route handlers, DTOs, OpenAPI document and router
//! composition.
//!
//! Ingress endpoints are mounted under `/api/v1`; health and status live
//! at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// OpenAPI document for the HTTP surface.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::system::health_handler,
        handlers::system::realtime_status_handler,
        handlers::ingress::notify_vitals,
        handlers::ingress::notify_lab_result,
        handlers::ingress::notify_alert,
        handlers::ingress::notify_insight,
        handlers::ingress::notify_patient_change,
        handlers::ingress::notify_system_status,
    ),
    tags(
        (name = "System", description = "Health and hub status"),
        (name = "Notify", description = "Ingress hooks for collaborator services"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the full application: REST endpoints, the WebSocket endpoint at
/// `ws_path`, tracing and CORS layers, and (with the `swagger-ui` feature)
/// the Swagger UI.
pub fn build_app(state: AppState, ws_path: &str) -> Router {
    let router = build_router().route(ws_path, get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route(
        "/api-docs/openapi.json",
        get(|| async { axum::Json(ApiDoc::openapi()) }),
    );

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
