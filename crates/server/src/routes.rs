use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::collections::CollectionStore;

use crate::errors;
use crate::openapi::ApiDoc;

pub mod coins;

/// Shared state handed to every request handler: the single store handle,
/// constructed once at startup.
#[derive(Clone)]
pub struct ServerState {
    pub coins: Arc<dyn CollectionStore>,
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: coin routes, health, and API docs.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let docs = SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi());

    let api = Router::new()
        .route(
            "/:user_id/coins",
            get(coins::get_coins)
                .post(coins::add_coin)
                .put(coins::replace_coins),
        )
        .route("/health", get(health))
        .with_state(state);

    Router::new()
        .merge(docs)
        .merge(api)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
        .layer(CatchPanicLayer::custom(errors::panic_response))
}
