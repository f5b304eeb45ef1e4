use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::api::rest::ApiJson;
use crate::error::{AppError, DispatchError};
use crate::models::session::{ActionResult, SessionView};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/login", post(login))
        .route("/session/logout", post(logout))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<SessionView>, AppError> {
    if payload.username.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(DispatchError::Validation(
            "Please enter both username and password".to_string(),
        )
        .into());
    }

    let view = state.login(payload.username, payload.password).await?;
    Ok(Json(view))
}

async fn logout(State(state): State<Arc<AppState>>) -> Json<ActionResult> {
    state.logout().await;
    Json(ActionResult::ok())
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    Json(state.read(|controller| controller.session_view()).await)
}
