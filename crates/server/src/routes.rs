use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::{Health, ServiceInfo};
use service::snapshot::Snapshot;

use crate::errors;
use crate::state::AppState;

pub mod webhooks;

pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo::new(env!("CARGO_PKG_VERSION")))
}

/// Liveness only; does not touch storage.
pub async fn health() -> Json<Health> {
    Json(Health::now())
}

pub async fn get_data(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.snapshots.load().await)
}

/// Build the full application router: descriptor, read endpoints and webhooks
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/data", get(get_data));

    let hooks = Router::new()
        .route("/api/webhook", post(webhooks::general))
        .route("/api/webhook/price", post(webhooks::price))
        .route("/api/webhook/predictions", post(webhooks::predictions))
        .route("/api/webhook/patterns", post(webhooks::patterns))
        .route("/api/webhook/signals", post(webhooks::signals))
        .route("/api/webhook/reports", post(webhooks::reports));

    public
        .merge(hooks)
        .with_state(state)
        .layer(CatchPanicLayer::custom(errors::handle_panic))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
