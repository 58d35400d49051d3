// seatflow-server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use seatflow::{FlowError, SettleError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error(transparent)]
  Settlement(#[from] SettleError),

  #[error("Flow Error: {0}")]
  Flow(#[from] FlowError),
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Settlement(SettleError::InvalidSignature { .. }) | AppError::Settlement(SettleError::MalformedPayload { .. }) => {
        StatusCode::BAD_REQUEST
      }
      AppError::Settlement(SettleError::OrderNotFound(_)) => StatusCode::NOT_FOUND,
      AppError::Settlement(SettleError::GatewayNotConfigured(_)) => StatusCode::SERVICE_UNAVAILABLE,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let body = match self {
      AppError::Settlement(SettleError::InvalidSignature { .. }) => {
        tracing::warn!(application_error = %self, "Rejecting webhook");
        json!({"success": false, "error": "Invalid signature"})
      }
      AppError::Settlement(SettleError::MalformedPayload { reason, .. }) => {
        tracing::warn!(application_error = %self, "Rejecting webhook");
        json!({"success": false, "error": format!("Invalid payload: {reason}")})
      }
      AppError::Settlement(SettleError::OrderNotFound(order_id)) => {
        tracing::warn!(order_id = %order_id, "Webhook for unknown order");
        json!({"success": false, "error": "Order not found", "orderId": order_id})
      }
      AppError::Settlement(SettleError::GatewayNotConfigured(gateway)) => {
        tracing::warn!(gateway = %gateway, "Webhook for disabled gateway");
        json!({"success": false, "error": format!("{gateway} webhooks are not enabled")})
      }
      _ => {
        // Detail stays in the logs.
        tracing::error!(application_error = %self, "Responding with internal error");
        json!({"success": false, "error": "Internal server error"})
      }
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
