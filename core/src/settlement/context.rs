// seatflow/src/settlement/context.rs

//! Per-run state of the settlement and replay flows, and what they report.

use crate::error::{SettleError, SettleResult};
use crate::gateway::{PaymentGateway, WebhookDelivery};
use crate::model::{NotifiedStatus, Order, PaymentNotification, SeatKey};
use crate::store::SettlementStore;
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;

/// What happened to one order line during seat adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeatAdjustmentOutcome {
  /// `seats_remaining` was decremented by the line quantity.
  Applied,
  /// The conditional decrement found fewer seats than requested; nothing changed.
  InsufficientSeats,
  /// An earlier, interrupted attempt already settled this line.
  AlreadySettled,
  /// Neither the inventory record nor the schedule yields a positive seat total.
  SkippedUnresolvedTotal,
  /// The line has no workshop slug, no schedule, or no positive quantity.
  SkippedNotSeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAdjustment {
  pub item: String,
  pub key: Option<SeatKey>,
  pub quantity: i64,
  pub outcome: SeatAdjustmentOutcome,
}

/// Context of the webhook settlement flow.
///
/// Steps fill `notification`, `order`, `was_completed`, `recorded`, `claimed`
/// and `adjustments` in that order.
pub struct WebhookCtx {
  pub store: Arc<dyn SettlementStore>,
  pub gateway: Arc<dyn PaymentGateway>,
  pub delivery: WebhookDelivery,
  pub lease: Duration,

  pub notification: Option<PaymentNotification>,
  pub order: Option<Order>,
  /// The order was already `completed` before this delivery was recorded.
  pub was_completed: bool,
  /// This delivery's status update was written.
  pub recorded: bool,
  /// The claim was lost to a delivery that has not finished the seat phase yet.
  pub seats_in_progress: bool,
  /// This delivery won the seat-adjustment claim.
  pub claimed: bool,
  /// Set once `finalize_seat_adjustment` has flipped the one-shot flag.
  pub finalized: bool,
  pub adjustments: Vec<SeatAdjustment>,
}

impl WebhookCtx {
  pub fn new(
    store: Arc<dyn SettlementStore>,
    gateway: Arc<dyn PaymentGateway>,
    delivery: WebhookDelivery,
    lease: Duration,
  ) -> Self {
    Self {
      store,
      gateway,
      delivery,
      lease,
      notification: None,
      order: None,
      was_completed: false,
      recorded: false,
      seats_in_progress: false,
      claimed: false,
      finalized: false,
      adjustments: Vec::new(),
    }
  }

  /// Summarises a finished (completed or halted) run.
  pub fn report(&self) -> SettleResult<SettlementReport> {
    let notification = self
      .notification
      .as_ref()
      .ok_or_else(|| SettleError::Internal("settlement finished without an authenticated notification".into()))?;

    Ok(SettlementReport {
      gateway: notification.gateway,
      order_id: notification.order_id.clone(),
      transaction_id: notification.transaction_id.clone(),
      status: notification.status,
      already_completed: self.was_completed,
      recorded: self.recorded,
      seats_in_progress: self.seats_in_progress,
      seats_adjusted: self.finalized,
      adjustments: self.adjustments.clone(),
    })
  }
}

/// Context of the replay flow run by reconciliation for one order.
pub struct ReplayCtx {
  pub store: Arc<dyn SettlementStore>,
  pub lease: Duration,
  pub order: Order,
  pub claimed: bool,
  pub finalized: bool,
  pub adjustments: Vec<SeatAdjustment>,
}

impl ReplayCtx {
  pub fn new(store: Arc<dyn SettlementStore>, order: Order, lease: Duration) -> Self {
    Self {
      store,
      lease,
      order,
      claimed: false,
      finalized: false,
      adjustments: Vec::new(),
    }
  }
}

/// Outcome of settling one webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
  pub gateway: &'static str,
  pub order_id: String,
  pub transaction_id: Option<String>,
  pub status: NotifiedStatus,
  pub already_completed: bool,
  /// The notification's status was written to the order.
  pub recorded: bool,
  /// Another delivery holds the seat claim and has not finalized yet.
  pub seats_in_progress: bool,
  /// This delivery applied the order's seat effects and set the flag.
  pub seats_adjusted: bool,
  pub adjustments: Vec<SeatAdjustment>,
}

impl SettlementReport {
  pub fn applied_seats(&self) -> i64 {
    self
      .adjustments
      .iter()
      .filter(|a| a.outcome == SeatAdjustmentOutcome::Applied)
      .map(|a| a.quantity)
      .sum()
  }
}
