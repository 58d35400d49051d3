// seatflow/src/store/memory.rs

//! In-process `SettlementStore`.
//!
//! Each operation takes one lock for its whole read-modify-write, which gives
//! the same single-record atomicity a database row update gives. Used by the
//! test suites and by local runs without a database.

use super::{claim_is_live, LineSettlement, SettlementStore, StoreResult};
use crate::model::{Order, PaymentStatus, PaymentUpdate, SeatInventory, SeatKey};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Default)]
struct Tables {
  orders: HashMap<String, Order>,
  inventory: BTreeMap<SeatKey, SeatInventory>,
  schedules: HashMap<String, Option<i64>>,
  settled_lines: HashSet<(String, usize)>,
  decrements_applied: u64,
  writes: u64,
}

#[derive(Default)]
pub struct InMemoryStore {
  tables: Mutex<Tables>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert_order(&self, order: Order) {
    self.tables.lock().orders.insert(order.id.clone(), order);
  }

  /// Registers a schedule. `None` models a schedule without a configured seat count.
  pub fn insert_schedule(&self, schedule_id: impl Into<String>, seats_total: Option<i64>) {
    self.tables.lock().schedules.insert(schedule_id.into(), seats_total);
  }

  pub fn insert_inventory(&self, inventory: SeatInventory) {
    self.tables.lock().inventory.insert(inventory.key.clone(), inventory);
  }

  pub fn order(&self, order_id: &str) -> Option<Order> {
    self.tables.lock().orders.get(order_id).cloned()
  }

  pub fn inventory(&self, key: &SeatKey) -> Option<SeatInventory> {
    self.tables.lock().inventory.get(key).cloned()
  }

  /// Number of conditional decrements that actually applied.
  pub fn decrements_applied(&self) -> u64 {
    self.tables.lock().decrements_applied
  }

  /// Number of mutating operations that changed something.
  pub fn writes(&self) -> u64 {
    self.tables.lock().writes
  }
}

#[async_trait]
impl SettlementStore for InMemoryStore {
  async fn find_order(&self, order_id: &str) -> StoreResult<Option<Order>> {
    Ok(self.tables.lock().orders.get(order_id).cloned())
  }

  async fn record_payment(&self, order_id: &str, update: &PaymentUpdate) -> StoreResult<bool> {
    let mut tables = self.tables.lock();
    let Some(order) = tables.orders.get_mut(order_id) else {
      return Ok(false);
    };
    if order.is_completed() && update.payment_status != PaymentStatus::Completed {
      return Ok(false);
    }
    update.apply_to(order);
    tables.writes += 1;
    Ok(true)
  }

  async fn claim_seat_adjustment(&self, order_id: &str, now: DateTime<Utc>, lease: Duration) -> StoreResult<bool> {
    let mut tables = self.tables.lock();
    let Some(order) = tables.orders.get_mut(order_id) else {
      return Ok(false);
    };
    if order.seat_inventory_adjusted || claim_is_live(order.seat_claimed_at, now, lease) {
      return Ok(false);
    }
    order.seat_claimed_at = Some(now);
    tables.writes += 1;
    Ok(true)
  }

  async fn mark_seats_adjusted(&self, order_id: &str) -> StoreResult<bool> {
    let mut tables = self.tables.lock();
    let Some(order) = tables.orders.get_mut(order_id) else {
      return Ok(false);
    };
    order.seat_inventory_adjusted = true;
    tables.writes += 1;
    Ok(true)
  }

  async fn find_inventory(&self, key: &SeatKey) -> StoreResult<Option<SeatInventory>> {
    Ok(self.tables.lock().inventory.get(key).cloned())
  }

  async fn schedule_seats_total(&self, schedule_id: &str) -> StoreResult<Option<i64>> {
    Ok(self.tables.lock().schedules.get(schedule_id).copied().flatten())
  }

  async fn ensure_inventory(&self, key: &SeatKey, seats_total: i64) -> StoreResult<()> {
    let mut tables = self.tables.lock();
    if tables.inventory.contains_key(key) {
      return Ok(());
    }
    tables.inventory.insert(
      key.clone(),
      SeatInventory {
        key: key.clone(),
        seats_total,
        seats_remaining: seats_total,
        updated_at: Utc::now(),
      },
    );
    tables.writes += 1;
    Ok(())
  }

  async fn settle_line(&self, order_id: &str, line: usize, key: &SeatKey, quantity: i64) -> StoreResult<LineSettlement> {
    let mut tables = self.tables.lock();
    if !tables.settled_lines.insert((order_id.to_string(), line)) {
      return Ok(LineSettlement::AlreadySettled);
    }
    let applied = match tables.inventory.get_mut(key) {
      Some(record) if record.seats_remaining >= quantity => {
        record.seats_remaining -= quantity;
        record.updated_at = Utc::now();
        true
      }
      _ => false,
    };
    tables.writes += 1;
    if !applied {
      return Ok(LineSettlement::InsufficientSeats);
    }
    tables.decrements_applied += 1;
    Ok(LineSettlement::Decremented)
  }

  async fn unsettled_orders(&self, now: DateTime<Utc>, lease: Duration, limit: i64) -> StoreResult<Vec<Order>> {
    let tables = self.tables.lock();
    let mut found: Vec<Order> = tables
      .orders
      .values()
      .filter(|o| o.payment_status == PaymentStatus::Completed)
      .filter(|o| !o.seat_inventory_adjusted && !claim_is_live(o.seat_claimed_at, now, lease))
      .cloned()
      .collect();
    found.sort_by(|a, b| a.payment_date.cmp(&b.payment_date).then_with(|| a.id.cmp(&b.id)));
    found.truncate(usize::try_from(limit).unwrap_or(0));
    Ok(found)
  }
}
