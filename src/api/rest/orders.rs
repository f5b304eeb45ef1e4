use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::rest::ApiJson;
use crate::engine::timers;
use crate::error::{AppError, DispatchError};
use crate::models::earnings::{DeliveryRecord, Earnings};
use crate::models::notification::Notification;
use crate::models::order::{Order, OrderStatus, RejectionReason};
use crate::models::session::ActionResult;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/generate", post(generate_order))
        .route("/orders/pending", get(get_pending_request))
        .route("/orders/pending/accept", post(accept_order))
        .route("/orders/pending/reject", post(reject_order))
        .route("/orders/current", get(get_current_order))
        .route("/orders/current/status", post(advance_order))
        .route("/orders/current/complete", post(complete_delivery))
        .route("/earnings", get(get_earnings))
        .route("/history", get(list_history))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id", delete(dismiss_notification))
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub reason: RejectionReason,
}

#[derive(Deserialize)]
pub struct AdvanceRequest {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    pub pin: String,
}

#[derive(Serialize)]
pub struct CompleteResponse {
    pub success: bool,
    pub record: DeliveryRecord,
}

/// Offers a request right away instead of waiting for the feed delay.
async fn generate_order(State(state): State<Arc<AppState>>) -> Json<Option<Order>> {
    Json(timers::offer_order(&state).await)
}

async fn get_pending_request(State(state): State<Arc<AppState>>) -> Json<Option<Order>> {
    Json(state.read(|controller| controller.pending_request().cloned()).await)
}

async fn accept_order(State(state): State<Arc<AppState>>) -> Result<Json<Order>, AppError> {
    let order = state
        .act(|controller, now| controller.accept_order(now))
        .await?;

    state.cancel_request_timer(order.id);
    state.metrics.outcome("accepted");
    Ok(Json(order))
}

async fn reject_order(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RejectRequest>,
) -> Result<Json<ActionResult>, AppError> {
    let (order_id, outcome) = state
        .act(move |controller, now| {
            let order_id = controller
                .pending_request()
                .map(|order| order.id)
                .ok_or(DispatchError::NoPendingRequest)?;
            let outcome = controller.reject_order(payload.reason, now)?;
            Ok::<_, DispatchError>((order_id, outcome))
        })
        .await?;

    state.cancel_request_timer(order_id);
    state.observe_rejection(&outcome, "rejected");
    info!(order_id = %order_id, reason = %payload.reason, "order rejected by partner");
    Ok(Json(ActionResult::ok()))
}

async fn get_current_order(State(state): State<Arc<AppState>>) -> Json<Option<Order>> {
    Json(state.read(|controller| controller.current_order().cloned()).await)
}

async fn advance_order(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<AdvanceRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .act(move |controller, now| controller.advance_order(payload.status, now))
        .await?;
    Ok(Json(order))
}

async fn complete_delivery(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CompleteRequest>,
) -> Result<Json<CompleteResponse>, AppError> {
    let record = state
        .act(move |controller, now| controller.complete_delivery(&payload.pin, now))
        .await?;

    state.metrics.outcome("delivered");
    state.metrics.delivery_earnings_total.inc_by(record.earnings);
    Ok(Json(CompleteResponse {
        success: true,
        record,
    }))
}

async fn get_earnings(State(state): State<Arc<AppState>>) -> Json<Earnings> {
    Json(state.read(|controller| controller.earnings()).await)
}

async fn list_history(State(state): State<Arc<AppState>>) -> Json<Vec<DeliveryRecord>> {
    Json(state.read(|controller| controller.history().to_vec()).await)
}

async fn list_notifications(State(state): State<Arc<AppState>>) -> Json<Vec<Notification>> {
    Json(
        state
            .read(|controller| controller.notifications().iter().cloned().collect())
            .await,
    )
}

async fn dismiss_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ActionResult>, AppError> {
    let removed = state
        .act(move |controller, _now| controller.dismiss_notification(id))
        .await;

    if !removed {
        return Err(AppError::NotFound(format!("notification {id} not found")));
    }
    Ok(Json(ActionResult::ok()))
}
