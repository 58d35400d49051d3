// seatflow/src/model/notification.rs

use serde::Serialize;

/// Payment outcome as reported by a gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifiedStatus {
  Success,
  Failure,
  Pending,
}

/// A gateway delivery after authentication, normalised across gateways.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotification {
  pub gateway: &'static str,
  pub order_id: String,
  pub transaction_id: Option<String>,
  pub status: NotifiedStatus,
  pub payment_method: Option<String>,
  pub amount: Option<String>,
  pub failure_reason: Option<String>,
  /// The delivery's fields, stored verbatim on the order.
  pub raw: serde_json::Value,
}
