// seatflow/src/gateway/cashfree.rs

//! Cashfree payment webhooks (JSON).
//!
//! Signature: `base64(hmac_sha256(secret, x-webhook-timestamp + raw_body))`,
//! sent in `x-webhook-signature`.

use super::{signatures_match, PaymentGateway, WebhookDelivery};
use crate::error::{SettleError, SettleResult};
use crate::model::{NotifiedStatus, PaymentNotification};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

const GATEWAY: &str = "cashfree";

#[derive(Debug, Deserialize)]
struct CashfreeEvent {
  data: CashfreeEventData,
}

#[derive(Debug, Deserialize)]
struct CashfreeEventData {
  order: CashfreeOrder,
  #[serde(default)]
  payment: Option<CashfreePayment>,
}

#[derive(Debug, Deserialize)]
struct CashfreeOrder {
  order_id: String,
  #[serde(default)]
  order_amount: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct CashfreePayment {
  #[serde(default)]
  cf_payment_id: Option<JsonValue>,
  #[serde(default)]
  payment_status: Option<String>,
  #[serde(default)]
  payment_group: Option<String>,
  #[serde(default)]
  payment_message: Option<String>,
}

#[derive(Clone)]
pub struct CashfreeGateway {
  webhook_secret: String,
}

impl std::fmt::Debug for CashfreeGateway {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CashfreeGateway").field("webhook_secret", &"[REDACTED]").finish()
  }
}

impl CashfreeGateway {
  pub fn new(webhook_secret: impl Into<String>) -> Self {
    Self {
      webhook_secret: webhook_secret.into(),
    }
  }

  /// Base64 signature Cashfree is expected to send for `timestamp` and `body`.
  pub fn sign(&self, timestamp: &str, body: &[u8]) -> SettleResult<String> {
    let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
      .map_err(|_| SettleError::GatewayNotConfigured(GATEWAY))?;
    mac.update(timestamp.as_bytes());
    mac.update(body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
  }
}

/// Renders an id that Cashfree sends either as a number or a string.
fn scalar_to_string(value: &JsonValue) -> Option<String> {
  match value {
    JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
    JsonValue::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn notified_status(status: Option<&str>) -> NotifiedStatus {
  match status.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
    Some("SUCCESS") => NotifiedStatus::Success,
    Some("FAILED") | Some("USER_DROPPED") | Some("CANCELLED") => NotifiedStatus::Failure,
    _ => NotifiedStatus::Pending,
  }
}

impl PaymentGateway for CashfreeGateway {
  fn name(&self) -> &'static str {
    GATEWAY
  }

  fn authenticate(&self, delivery: &WebhookDelivery) -> SettleResult<PaymentNotification> {
    let (Some(signature), Some(timestamp)) = (delivery.signature.as_deref(), delivery.timestamp.as_deref()) else {
      warn!("Cashfree webhook without signature headers");
      return Err(SettleError::InvalidSignature { gateway: GATEWAY });
    };

    let expected = self.sign(timestamp, &delivery.body)?;
    if !signatures_match(expected.as_bytes(), signature.trim().as_bytes()) {
      warn!("Cashfree webhook signature mismatch");
      return Err(SettleError::InvalidSignature { gateway: GATEWAY });
    }

    let raw: JsonValue = serde_json::from_slice(&delivery.body).map_err(|e| SettleError::MalformedPayload {
      gateway: GATEWAY,
      reason: format!("invalid JSON: {e}"),
    })?;
    let event: CashfreeEvent = serde_json::from_value(raw.clone()).map_err(|e| SettleError::MalformedPayload {
      gateway: GATEWAY,
      reason: format!("unexpected event shape: {e}"),
    })?;

    let order_id = event.data.order.order_id.trim().to_string();
    if order_id.is_empty() {
      return Err(SettleError::MalformedPayload {
        gateway: GATEWAY,
        reason: "missing data.order.order_id".to_string(),
      });
    }

    let payment = event.data.payment;
    let status = notified_status(payment.as_ref().and_then(|p| p.payment_status.as_deref()));
    let transaction_id = payment.as_ref().and_then(|p| p.cf_payment_id.as_ref()).and_then(scalar_to_string);
    let payment_method = payment
      .as_ref()
      .and_then(|p| p.payment_group.clone())
      .or_else(|| Some(GATEWAY.to_string()));
    let failure_reason = match status {
      NotifiedStatus::Success => None,
      _ => payment.as_ref().and_then(|p| p.payment_message.clone()),
    };

    Ok(PaymentNotification {
      gateway: GATEWAY,
      order_id,
      transaction_id,
      status,
      payment_method,
      amount: event.data.order.order_amount.as_ref().and_then(scalar_to_string),
      failure_reason,
      raw,
    })
  }
}
