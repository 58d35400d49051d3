// seatflow/src/model/inventory.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite identity of a seat inventory record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatKey {
  pub workshop_slug: String,
  pub schedule_id: String,
}

impl SeatKey {
  pub fn new(workshop_slug: impl Into<String>, schedule_id: impl Into<String>) -> Self {
    Self {
      workshop_slug: workshop_slug.into(),
      schedule_id: schedule_id.into(),
    }
  }
}

impl fmt::Display for SeatKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.workshop_slug, self.schedule_id)
  }
}

/// Remaining capacity for one (workshop, schedule) pair.
///
/// `seats_remaining` never goes below zero: stores only decrement it through a
/// conditional update that requires enough seats to be left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatInventory {
  #[serde(flatten)]
  pub key: SeatKey,
  pub seats_total: i64,
  pub seats_remaining: i64,
  pub updated_at: DateTime<Utc>,
}
