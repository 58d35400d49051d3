// seatflow/src/settlement/seats.rs

//! The seat phase shared by webhook settlement and reconciliation replay:
//! claim, adjust every seated line, finalize.

use super::context::{SeatAdjustment, SeatAdjustmentOutcome};
use crate::error::{SettleError, SettleResult};
use crate::model::{Order, OrderItem, SeatKey};
use crate::store::{LineSettlement, SettlementStore};
use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};

/// Takes the one-shot seat-adjustment claim for `order_id`.
#[instrument(name = "seats::claim", skip(store), fields(lease_secs = lease.num_seconds()))]
pub async fn claim(store: &dyn SettlementStore, order_id: &str, lease: Duration) -> SettleResult<bool> {
  let won = store.claim_seat_adjustment(order_id, Utc::now(), lease).await?;
  if won {
    debug!("seat adjustment claimed");
  } else {
    info!("seat adjustment already applied or claimed elsewhere");
  }
  Ok(won)
}

/// Seat total for a key: the inventory record's, else the schedule's.
/// Anything that is not a positive count is unresolved.
async fn resolve_seats_total(store: &dyn SettlementStore, key: &SeatKey) -> SettleResult<(Option<i64>, bool)> {
  if let Some(existing) = store.find_inventory(key).await? {
    if existing.seats_total > 0 {
      return Ok((Some(existing.seats_total), true));
    }
  }
  let configured = store.schedule_seats_total(&key.schedule_id).await?;
  Ok((configured.filter(|total| *total > 0), false))
}

async fn adjust_item(
  store: &dyn SettlementStore,
  order_id: &str,
  line: usize,
  item: &OrderItem,
) -> SettleResult<SeatAdjustment> {
  let key = item.seat_key();
  let adjustment = |outcome| SeatAdjustment {
    item: item.name.clone(),
    key: key.clone(),
    quantity: item.quantity,
    outcome,
  };

  let Some(seat_key) = key.as_ref().filter(|_| item.quantity > 0) else {
    debug!(item = %item.name, "line is not seated");
    return Ok(adjustment(SeatAdjustmentOutcome::SkippedNotSeated));
  };

  let (seats_total, exists) = resolve_seats_total(store, seat_key).await?;
  let Some(seats_total) = seats_total else {
    warn!(key = %seat_key, "no positive seat total for schedule; skipping line");
    return Ok(adjustment(SeatAdjustmentOutcome::SkippedUnresolvedTotal));
  };

  if !exists {
    store.ensure_inventory(seat_key, seats_total).await?;
  }

  match store.settle_line(order_id, line, seat_key, item.quantity).await? {
    LineSettlement::Decremented => {
      info!(key = %seat_key, quantity = item.quantity, "seats decremented");
      Ok(adjustment(SeatAdjustmentOutcome::Applied))
    }
    LineSettlement::InsufficientSeats => {
      warn!(key = %seat_key, quantity = item.quantity, "not enough seats left; line not decremented");
      Ok(adjustment(SeatAdjustmentOutcome::InsufficientSeats))
    }
    LineSettlement::AlreadySettled => {
      info!(key = %seat_key, line, "line settled by an earlier attempt");
      Ok(adjustment(SeatAdjustmentOutcome::AlreadySettled))
    }
  }
}

/// Applies every line of `order` in order. A store error stops at the failing
/// line; lines settled before it stay in the ledger and are skipped on retry.
#[instrument(name = "seats::adjust", skip_all, fields(order_id = %order.id, items = order.items.len()))]
pub async fn adjust(store: &dyn SettlementStore, order: &Order) -> SettleResult<Vec<SeatAdjustment>> {
  let mut adjustments = Vec::with_capacity(order.items.len());
  for (line, item) in order.items.iter().enumerate() {
    adjustments.push(adjust_item(store, &order.id, line, item).await?);
  }
  Ok(adjustments)
}

#[instrument(name = "seats::finalize", skip(store))]
pub async fn finalize(store: &dyn SettlementStore, order_id: &str) -> SettleResult<()> {
  if !store.mark_seats_adjusted(order_id).await? {
    return Err(SettleError::OrderNotFound(order_id.to_string()));
  }
  info!("seat inventory adjusted");
  Ok(())
}
