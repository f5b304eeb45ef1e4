pub mod orders;
pub mod partner;
pub mod session;
pub mod ws;

use std::sync::Arc;

use axum::extract::{FromRequest, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, DispatchError};
use crate::models::session::ActionResult;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(session::router())
        .merge(partner::router())
        .merge(orders::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// JSON body extractor whose rejections render as an `ActionResult` failure.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub(crate) struct ApiJson<T>(pub T);

/// Maps a controller outcome onto the `{ success, error }` body.
pub(crate) fn action<T>(result: Result<T, DispatchError>) -> Result<Json<ActionResult>, AppError> {
    result.map(|_| Json(ActionResult::ok())).map_err(AppError::from)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    authenticated: bool,
    online: bool,
    pending_request: bool,
    current_order: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    state
        .read(|controller| {
            Json(HealthResponse {
                status: "ok",
                authenticated: controller.is_authenticated(),
                online: controller.partner().is_some_and(|partner| partner.is_online),
                pending_request: controller.pending_request().is_some(),
                current_order: controller.current_order().is_some(),
            })
        })
        .await
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
