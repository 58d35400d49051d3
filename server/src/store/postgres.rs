// seatflow-server/src/store/postgres.rs

//! PostgreSQL `SettlementStore`.
//!
//! Every mutation is a single statement whose `WHERE` clause carries the
//! condition, so PostgreSQL's row locking provides the atomicity the
//! settlement flow relies on.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use seatflow::store::{LineSettlement, SettlementStore, StoreResult};
use seatflow::{Order, OrderItem, PaymentStatus, PaymentUpdate, SeatInventory, SeatKey, StoreError};
use sqlx::types::Json;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

const ORDER_COLUMNS: &str = "id, payment_status, status, transaction_id, payment_method, payment_date, \
   gateway_response, failure_reason, seat_inventory_adjusted, seat_claimed_at, items";

#[derive(FromRow)]
struct OrderRow {
  id: String,
  payment_status: String,
  status: String,
  transaction_id: Option<String>,
  payment_method: Option<String>,
  payment_date: Option<DateTime<Utc>>,
  gateway_response: Option<serde_json::Value>,
  failure_reason: Option<String>,
  seat_inventory_adjusted: bool,
  seat_claimed_at: Option<DateTime<Utc>>,
  items: Json<Vec<OrderItem>>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    let parse_status = |raw: &str| {
      raw
        .parse::<PaymentStatus>()
        .map_err(|e| StoreError::Corrupt(format!("order {}: {}", row.id, e)))
    };
    Ok(Order {
      payment_status: parse_status(&row.payment_status)?,
      status: parse_status(&row.status)?,
      transaction_id: row.transaction_id,
      payment_method: row.payment_method,
      payment_date: row.payment_date,
      gateway_response: row.gateway_response,
      failure_reason: row.failure_reason,
      seat_inventory_adjusted: row.seat_inventory_adjusted,
      seat_claimed_at: row.seat_claimed_at,
      items: row.items.0,
      id: row.id,
    })
  }
}

#[derive(FromRow)]
struct InventoryRow {
  workshop_slug: String,
  schedule_id: String,
  seats_total: i64,
  seats_remaining: i64,
  updated_at: DateTime<Utc>,
}

impl From<InventoryRow> for SeatInventory {
  fn from(row: InventoryRow) -> Self {
    SeatInventory {
      key: SeatKey::new(row.workshop_slug, row.schedule_id),
      seats_total: row.seats_total,
      seats_remaining: row.seats_remaining,
      updated_at: row.updated_at,
    }
  }
}

fn backend(e: sqlx::Error) -> StoreError {
  StoreError::Backend(e.into())
}

#[derive(Clone)]
pub struct PgSettlementStore {
  pool: PgPool,
}

impl PgSettlementStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str, max_connections: u32) -> crate::errors::Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    Ok(Self::new(pool))
  }

  /// Applies the bundled schema migrations.
  pub async fn migrate(&self) -> crate::errors::Result<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl SettlementStore for PgSettlementStore {
  #[instrument(name = "pg::find_order", skip(self), err(Display))]
  async fn find_order(&self, order_id: &str) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
      .bind(order_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    row.map(Order::try_from).transpose()
  }

  #[instrument(name = "pg::record_payment", skip(self, update), fields(status = %update.payment_status), err(Display))]
  async fn record_payment(&self, order_id: &str, update: &PaymentUpdate) -> StoreResult<bool> {
    let result = sqlx::query(
      "UPDATE orders
       SET payment_status = $2,
           status = $2,
           transaction_id = COALESCE($3, transaction_id),
           payment_method = COALESCE($4, payment_method),
           payment_date = $5,
           gateway_response = $6,
           failure_reason = $7,
           updated_at = NOW()
       WHERE id = $1
         AND ($2 = 'completed' OR payment_status <> 'completed')",
    )
    .bind(order_id)
    .bind(update.payment_status.as_str())
    .bind(update.transaction_id.as_deref())
    .bind(update.payment_method.as_deref())
    .bind(update.payment_date)
    .bind(&update.gateway_response)
    .bind(update.failure_reason.as_deref())
    .execute(&self.pool)
    .await
    .map_err(backend)?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "pg::claim_seat_adjustment", skip(self), err(Display))]
  async fn claim_seat_adjustment(&self, order_id: &str, now: DateTime<Utc>, lease: Duration) -> StoreResult<bool> {
    let result = sqlx::query(
      "UPDATE orders
       SET seat_claimed_at = $2, updated_at = NOW()
       WHERE id = $1
         AND seat_inventory_adjusted = FALSE
         AND (seat_claimed_at IS NULL OR seat_claimed_at <= $3)",
    )
    .bind(order_id)
    .bind(now)
    .bind(now - lease)
    .execute(&self.pool)
    .await
    .map_err(backend)?;
    Ok(result.rows_affected() == 1)
  }

  #[instrument(name = "pg::mark_seats_adjusted", skip(self), err(Display))]
  async fn mark_seats_adjusted(&self, order_id: &str) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE orders SET seat_inventory_adjusted = TRUE, updated_at = NOW() WHERE id = $1")
      .bind(order_id)
      .execute(&self.pool)
      .await
      .map_err(backend)?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "pg::find_inventory", skip(self), fields(key = %key), err(Display))]
  async fn find_inventory(&self, key: &SeatKey) -> StoreResult<Option<SeatInventory>> {
    let row: Option<InventoryRow> = sqlx::query_as(
      "SELECT workshop_slug, schedule_id, seats_total, seats_remaining, updated_at
       FROM workshop_seat_inventory
       WHERE workshop_slug = $1 AND schedule_id = $2",
    )
    .bind(&key.workshop_slug)
    .bind(&key.schedule_id)
    .fetch_optional(&self.pool)
    .await
    .map_err(backend)?;
    Ok(row.map(SeatInventory::from))
  }

  #[instrument(name = "pg::schedule_seats_total", skip(self), err(Display))]
  async fn schedule_seats_total(&self, schedule_id: &str) -> StoreResult<Option<i64>> {
    let row: Option<(Option<i64>,)> = sqlx::query_as("SELECT seats_total FROM workshop_schedules WHERE id = $1")
      .bind(schedule_id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;
    Ok(row.and_then(|(total,)| total))
  }

  #[instrument(name = "pg::ensure_inventory", skip(self), fields(key = %key), err(Display))]
  async fn ensure_inventory(&self, key: &SeatKey, seats_total: i64) -> StoreResult<()> {
    sqlx::query(
      "INSERT INTO workshop_seat_inventory (workshop_slug, schedule_id, seats_total, seats_remaining, updated_at)
       VALUES ($1, $2, $3, $3, NOW())
       ON CONFLICT (workshop_slug, schedule_id) DO NOTHING",
    )
    .bind(&key.workshop_slug)
    .bind(&key.schedule_id)
    .bind(seats_total)
    .execute(&self.pool)
    .await
    .map_err(backend)?;
    Ok(())
  }

  #[instrument(name = "pg::settle_line", skip(self), fields(key = %key), err(Display))]
  async fn settle_line(&self, order_id: &str, line: usize, key: &SeatKey, quantity: i64) -> StoreResult<LineSettlement> {
    let line_index =
      i32::try_from(line).map_err(|_| StoreError::Corrupt(format!("order {order_id}: line index {line} out of range")))?;
    // One statement, so the ledger row and the decrement commit together.
    let (entered, decremented): (bool, bool) = sqlx::query_as(
      "WITH entered AS (
         INSERT INTO order_seat_lines (order_id, line_index, workshop_slug, schedule_id, quantity)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (order_id, line_index) DO NOTHING
         RETURNING order_id
       ), decremented AS (
         UPDATE workshop_seat_inventory
         SET seats_remaining = seats_remaining - $5, updated_at = NOW()
         WHERE workshop_slug = $3 AND schedule_id = $4 AND seats_remaining >= $5
           AND EXISTS (SELECT 1 FROM entered)
         RETURNING 1
       )
       SELECT EXISTS (SELECT 1 FROM entered), EXISTS (SELECT 1 FROM decremented)",
    )
    .bind(order_id)
    .bind(line_index)
    .bind(&key.workshop_slug)
    .bind(&key.schedule_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await
    .map_err(backend)?;

    Ok(match (entered, decremented) {
      (false, _) => LineSettlement::AlreadySettled,
      (true, true) => LineSettlement::Decremented,
      (true, false) => LineSettlement::InsufficientSeats,
    })
  }

  #[instrument(name = "pg::unsettled_orders", skip(self), err(Display))]
  async fn unsettled_orders(&self, now: DateTime<Utc>, lease: Duration, limit: i64) -> StoreResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders
       WHERE payment_status = 'completed'
         AND seat_inventory_adjusted = FALSE
         AND (seat_claimed_at IS NULL OR seat_claimed_at <= $1)
       ORDER BY payment_date ASC NULLS FIRST, id
       LIMIT $2"
    ))
    .bind(now - lease)
    .bind(limit)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;
    rows.into_iter().map(Order::try_from).collect()
  }
}
