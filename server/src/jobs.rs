// seatflow-server/src/jobs.rs

//! Background reconciliation of orders whose seat phase never finished.

use crate::errors::AppError;
use crate::state::AppState;
use seatflow::Reconciler;
use std::time::Duration;
use tracing::{error, info};

/// Spawns the reconciliation loop on the current actix system.
///
/// Returns `None` when `interval_secs` is `0`.
pub fn spawn_reconciler(state: &AppState, interval_secs: u64, batch_size: i64) -> Option<actix_rt::task::JoinHandle<()>> {
  if interval_secs == 0 {
    info!("Seat reconciliation disabled.");
    return None;
  }

  let reconciler = Reconciler::<AppError>::new(state.flows.clone(), state.store.clone(), state.seat_claim_lease, batch_size);
  info!(interval_secs, batch_size, "Starting seat reconciliation task.");

  Some(actix_rt::spawn(async move {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      if let Err(e) = reconciler.run_once().await {
        error!(error = %e, "Seat reconciliation pass failed.");
      }
    }
  }))
}
