// seatflow-server/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use seatflow::{settle, NotifiedStatus, PaymentGateway, SettleError, SettlementReport, WebhookDelivery};
use std::sync::Arc;

pub const CASHFREE_SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const CASHFREE_TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
  pub success: bool,
  pub message: &'static str,
  pub order_id: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub transaction_id: Option<String>,
  pub already_completed: bool,
  pub recorded: bool,
  pub seats_adjusted: bool,
}

impl From<SettlementReport> for WebhookResponse {
  fn from(report: SettlementReport) -> Self {
    let message = match report.status {
      NotifiedStatus::Success if report.seats_adjusted => "Payment confirmed",
      NotifiedStatus::Success if report.seats_in_progress => "Payment recorded; seat update in progress",
      NotifiedStatus::Success => "Payment already processed",
      _ if !report.recorded => "Payment already completed; notification ignored",
      NotifiedStatus::Failure => "Payment failure recorded",
      NotifiedStatus::Pending => "Payment status recorded",
    };
    Self {
      success: true,
      message,
      order_id: report.order_id,
      transaction_id: report.transaction_id,
      already_completed: report.already_completed,
      recorded: report.recorded,
      seats_adjusted: report.seats_adjusted,
    }
  }
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
  req
    .headers()
    .get(name)
    .and_then(|value| value.to_str().ok())
    .map(str::to_string)
}

async fn settle_delivery(
  app_state: &AppState,
  gateway: Arc<dyn PaymentGateway>,
  delivery: WebhookDelivery,
) -> Result<HttpResponse, AppError> {
  let report = settle(
    &app_state.flows,
    app_state.store.clone(),
    gateway,
    delivery,
    app_state.seat_claim_lease,
  )
  .await?;

  info!(
    order_id = %report.order_id,
    already_completed = report.already_completed,
    seats_adjusted = report.seats_adjusted,
    seats = report.applied_seats(),
    "Webhook settled."
  );
  Ok(HttpResponse::Ok().json(WebhookResponse::from(report)))
}

#[instrument(
  name = "handler::payu_webhook",
  skip(app_state, body),
  fields(delivery_id = %Uuid::new_v4(), body_len = body.len())
)]
pub async fn payu_webhook_handler(app_state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, AppError> {
  let delivery = WebhookDelivery::from_body(body.to_vec());
  settle_delivery(&app_state, app_state.payu.clone(), delivery).await
}

#[instrument(
  name = "handler::cashfree_webhook",
  skip(app_state, req, body),
  fields(delivery_id = %Uuid::new_v4(), body_len = body.len())
)]
pub async fn cashfree_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let gateway = app_state
    .cashfree
    .clone()
    .ok_or(SettleError::GatewayNotConfigured("cashfree"))?;

  let delivery = WebhookDelivery {
    body: body.to_vec(),
    signature: header(&req, CASHFREE_SIGNATURE_HEADER),
    timestamp: header(&req, CASHFREE_TIMESTAMP_HEADER),
  };
  settle_delivery(&app_state, gateway, delivery).await
}

pub async fn payu_webhook_info() -> HttpResponse {
  HttpResponse::Ok().json(json!({
    "endpoint": "/api/payments/payu/webhook",
    "method": "POST",
    "contentType": "application/x-www-form-urlencoded",
    "description": "PayU payment callback. Verified with the reverse SHA-512 hash in the `hash` field.",
    "fields": ["key", "txnid", "mihpayid", "status", "amount", "productinfo", "firstname", "email", "udf1-udf5", "mode", "hash"],
  }))
}

pub async fn cashfree_webhook_info() -> HttpResponse {
  HttpResponse::Ok().json(json!({
    "endpoint": "/api/payments/cashfree/webhook",
    "method": "POST",
    "contentType": "application/json",
    "description": "Cashfree payment webhook. Verified with HMAC-SHA256 over timestamp and raw body.",
    "headers": [CASHFREE_SIGNATURE_HEADER, CASHFREE_TIMESTAMP_HEADER],
  }))
}
