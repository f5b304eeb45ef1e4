use std::sync::Arc;

use axum::extract::State;
use axum::routing::{patch, post, put};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::api::rest::{action, ApiJson};
use crate::engine::timers;
use crate::error::AppError;
use crate::models::partner::{DocumentKind, Partner, PartnerUpdate};
use crate::models::session::{ActionResult, DeviceConditions};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/partner", patch(update_partner))
        .route("/partner/documents", post(attach_document))
        .route("/partner/onboarding/complete", post(complete_onboarding))
        .route("/partner/verification/approve", post(approve_verification))
        .route("/partner/online", post(toggle_online))
        .route("/partner/device", put(set_device_conditions))
        .route("/partner/activity", post(record_activity))
}

#[derive(Deserialize)]
pub struct AttachDocumentRequest {
    pub kind: DocumentKind,
    pub uri: String,
}

#[derive(Serialize)]
pub struct OnlineResponse {
    pub success: bool,
    pub is_online: bool,
}

async fn update_partner(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<PartnerUpdate>,
) -> Result<Json<Partner>, AppError> {
    let partner = state
        .act(move |controller, _now| controller.update_partner_details(payload).cloned())
        .await?;
    Ok(Json(partner))
}

async fn attach_document(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<AttachDocumentRequest>,
) -> Result<Json<ActionResult>, AppError> {
    action(
        state
            .act(move |controller, _now| controller.attach_document(payload.kind, payload.uri))
            .await,
    )
}

async fn complete_onboarding(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ActionResult>, AppError> {
    state
        .act(|controller, now| controller.complete_onboarding(now))
        .await?;
    timers::schedule_verification(&state);
    Ok(Json(ActionResult::ok()))
}

async fn approve_verification(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ActionResult>, AppError> {
    action(
        state
            .act(|controller, now| controller.approve_verification(now))
            .await,
    )
}

async fn toggle_online(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OnlineResponse>, AppError> {
    let is_online = state
        .act(|controller, now| controller.toggle_online(now))
        .await?;
    Ok(Json(OnlineResponse {
        success: true,
        is_online,
    }))
}

async fn set_device_conditions(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<DeviceConditions>,
) -> Json<ActionResult> {
    state
        .act(move |controller, _now| controller.set_device_conditions(payload))
        .await;
    Json(ActionResult::ok())
}

async fn record_activity(State(state): State<Arc<AppState>>) -> Json<ActionResult> {
    state.act(|controller, _now| controller.reset_idle()).await;
    Json(ActionResult::ok())
}
