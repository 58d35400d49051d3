// seatflow/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::inventory::SeatKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Completed,
  Failed,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Completed => "completed",
      PaymentStatus::Failed => "failed",
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" | "pending_manual" => Ok(PaymentStatus::Pending),
      "completed" => Ok(PaymentStatus::Completed),
      "failed" => Ok(PaymentStatus::Failed),
      other => Err(format!("unknown payment status '{other}'")),
    }
  }
}

/// One purchased line. Only workshop lines carry a slug and schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub workshop_slug: Option<String>,
  #[serde(default)]
  pub schedule_id: Option<String>,
  #[serde(default)]
  pub quantity: i64,
}

impl OrderItem {
  /// The inventory record this line draws from, if it is a seated workshop line.
  pub fn seat_key(&self) -> Option<SeatKey> {
    let slug = self.workshop_slug.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let schedule = self.schedule_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    Some(SeatKey::new(slug, schedule))
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: String,
  pub payment_status: PaymentStatus,
  /// Fulfillment status; mirrors `payment_status`.
  pub status: PaymentStatus,
  pub transaction_id: Option<String>,
  pub payment_method: Option<String>,
  pub payment_date: Option<DateTime<Utc>>,
  pub gateway_response: Option<serde_json::Value>,
  pub failure_reason: Option<String>,
  pub seat_inventory_adjusted: bool,
  pub seat_claimed_at: Option<DateTime<Utc>>,
  pub items: Vec<OrderItem>,
}

impl Order {
  /// A fresh order as checkout creates it.
  pub fn pending(id: impl Into<String>, items: Vec<OrderItem>) -> Self {
    Self {
      id: id.into(),
      payment_status: PaymentStatus::Pending,
      status: PaymentStatus::Pending,
      transaction_id: None,
      payment_method: None,
      payment_date: None,
      gateway_response: None,
      failure_reason: None,
      seat_inventory_adjusted: false,
      seat_claimed_at: None,
      items,
    }
  }

  pub fn is_completed(&self) -> bool {
    self.payment_status == PaymentStatus::Completed
  }
}

/// Status fields written in one overwrite when a notification is recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentUpdate {
  pub payment_status: PaymentStatus,
  pub transaction_id: Option<String>,
  pub payment_method: Option<String>,
  pub payment_date: DateTime<Utc>,
  pub gateway_response: serde_json::Value,
  pub failure_reason: Option<String>,
}

impl PaymentUpdate {
  /// Applies the update to an in-memory order. Stores that persist field by
  /// field must produce the same result.
  pub fn apply_to(&self, order: &mut Order) {
    order.payment_status = self.payment_status;
    order.status = self.payment_status;
    if self.transaction_id.is_some() {
      order.transaction_id = self.transaction_id.clone();
    }
    if self.payment_method.is_some() {
      order.payment_method = self.payment_method.clone();
    }
    order.payment_date = Some(self.payment_date);
    order.gateway_response = Some(self.gateway_response.clone());
    order.failure_reason = self.failure_reason.clone();
  }
}
