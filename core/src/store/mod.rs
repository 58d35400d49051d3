// seatflow/src/store/mod.rs

//! The persistence seam for settlement.
//!
//! Every mutation the settlement flow performs is one atomic conditional
//! operation on the store. Only `settle_line` touches two records (the line
//! ledger entry and the inventory counter), and it must do so atomically.

pub mod memory;

use crate::error::StoreError;
use crate::model::{Order, PaymentUpdate, SeatInventory, SeatKey};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

pub use memory::InMemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSettlement {
  Decremented,
  InsufficientSeats,
  /// An earlier attempt already settled this line.
  AlreadySettled,
}

#[async_trait]
pub trait SettlementStore: Send + Sync {
  async fn find_order(&self, order_id: &str) -> StoreResult<Option<Order>>;

  /// Overwrites the order's status fields.
  ///
  /// An update to a non-`completed` status only applies while the stored order
  /// is not `completed`, checked in the same atomic write. Returns `false` when
  /// nothing was written: no such order, or a downgrade that was refused.
  async fn record_payment(&self, order_id: &str, update: &PaymentUpdate) -> StoreResult<bool>;

  /// Atomically claims the right to apply this order's seat effects.
  ///
  /// Matches only when `seat_inventory_adjusted` is false and there is no
  /// claim younger than `lease`; on a match `seat_claimed_at` is set to `now`
  /// and `true` is returned. Exactly one of any number of concurrent callers
  /// can win a given claim window.
  async fn claim_seat_adjustment(&self, order_id: &str, now: DateTime<Utc>, lease: Duration) -> StoreResult<bool>;

  /// Sets the one-shot `seat_inventory_adjusted` flag.
  async fn mark_seats_adjusted(&self, order_id: &str) -> StoreResult<bool>;

  async fn find_inventory(&self, key: &SeatKey) -> StoreResult<Option<SeatInventory>>;

  /// Configured seat count of a schedule, if the schedule exists and sets one.
  async fn schedule_seats_total(&self, schedule_id: &str) -> StoreResult<Option<i64>>;

  /// Creates the inventory record with `seats_remaining = seats_total` if it
  /// does not exist yet. Never touches an existing record.
  async fn ensure_inventory(&self, key: &SeatKey, seats_total: i64) -> StoreResult<()>;

  /// Settles line `line` of `order_id` against the inventory at `key`.
  ///
  /// In one atomic operation the line is entered into the order's line
  /// ledger and `seats_remaining` is decremented by `quantity` where
  /// `seats_remaining >= quantity` holds at write time. A line already in
  /// the ledger is left alone, so replays never decrement it twice.
  async fn settle_line(&self, order_id: &str, line: usize, key: &SeatKey, quantity: i64) -> StoreResult<LineSettlement>;

  /// Completed orders whose seats were never adjusted and that hold no live claim.
  async fn unsettled_orders(&self, now: DateTime<Utc>, lease: Duration, limit: i64) -> StoreResult<Vec<Order>>;
}

/// Whether a claim taken at `claimed_at` still blocks other claimants at `now`.
pub fn claim_is_live(claimed_at: Option<DateTime<Utc>>, now: DateTime<Utc>, lease: Duration) -> bool {
  claimed_at.is_some_and(|at| at > now - lease)
}
