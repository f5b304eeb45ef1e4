use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::order::OrderStatus;
use crate::models::session::ActionResult;

/// Recoverable failures of controller operations. The display text is the
/// message shown to the partner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("You are temporarily blocked due to frequent rejections")]
    Blocked,

    #[error("Account not verified yet")]
    NotVerified,

    #[error("Onboarding not completed yet")]
    NotOnboarded,

    #[error("{0}")]
    Validation(String),

    #[error("Cannot go offline during active delivery")]
    ActiveDelivery,

    #[error("Invalid PIN. Please check with customer.")]
    InvalidPin,

    #[error("No active order")]
    NoActiveOrder,

    #[error("No pending order request")]
    NoPendingRequest,

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl DispatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::InvalidCredentials | DispatchError::NotLoggedIn => {
                StatusCode::UNAUTHORIZED
            }
            DispatchError::Blocked | DispatchError::NotVerified | DispatchError::NotOnboarded => {
                StatusCode::FORBIDDEN
            }
            DispatchError::Validation(_) | DispatchError::InvalidPin => StatusCode::BAD_REQUEST,
            DispatchError::NoActiveOrder | DispatchError::NoPendingRequest => StatusCode::NOT_FOUND,
            DispatchError::ActiveDelivery | DispatchError::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Dispatch(err) => err.status_code(),
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            AppError::Dispatch(err) => err.to_string(),
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg,
            other => other.to_string(),
        };

        (status, Json(ActionResult::failed(message))).into_response()
    }
}
