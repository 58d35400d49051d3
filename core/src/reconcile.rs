// seatflow/src/reconcile.rs

//! Replays the seat phase for completed orders whose seats were never adjusted.
//!
//! Such orders come from a delivery that crashed, timed out or hit a store
//! error after winning the claim. Once the claim's lease expires the order
//! shows up in `unsettled_orders` and the replay flow takes a fresh claim.
//! Lines the interrupted attempt already settled are in the line ledger and
//! are not decremented again.

use crate::error::{FlowError, SettleError};
use crate::flow::{ContextData, FlowOutcome, FlowRegistry};
use crate::settlement::ReplayCtx;
use crate::store::SettlementStore;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
  pub scanned: usize,
  pub replayed: usize,
  /// Orders another claimant got to first.
  pub skipped: usize,
  pub failed: usize,
}

pub struct Reconciler<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  registry: Arc<FlowRegistry<AppErr>>,
  store: Arc<dyn SettlementStore>,
  lease: Duration,
  batch_size: i64,
}

impl<AppErr> Reconciler<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + From<SettleError> + Send + Sync + 'static,
{
  pub fn new(registry: Arc<FlowRegistry<AppErr>>, store: Arc<dyn SettlementStore>, lease: Duration, batch_size: i64) -> Self {
    Self {
      registry,
      store,
      lease,
      batch_size,
    }
  }

  /// One reconciliation pass over at most `batch_size` orders.
  ///
  /// A failing order is counted and logged; the pass continues with the next one.
  #[instrument(name = "Reconciler::run_once", skip(self), fields(batch_size = self.batch_size), err(Display))]
  pub async fn run_once(&self) -> Result<ReconcileReport, AppErr> {
    let orders = self
      .store
      .unsettled_orders(Utc::now(), self.lease, self.batch_size)
      .await
      .map_err(SettleError::from)?;

    let mut report = ReconcileReport {
      scanned: orders.len(),
      ..ReconcileReport::default()
    };

    for order in orders {
      let order_id = order.id.clone();
      let ctx = ContextData::new(ReplayCtx::new(self.store.clone(), order, self.lease));
      match self.registry.run(ctx.clone()).await {
        Ok(FlowOutcome::Completed) => {
          let applied = ctx.read().adjustments.len();
          info!(order_id = %order_id, lines = applied, "replayed seat adjustment");
          report.replayed += 1;
        }
        Ok(FlowOutcome::Halted) => report.skipped += 1,
        Err(e) => {
          error!(order_id = %order_id, error = %e, "seat replay failed");
          report.failed += 1;
        }
      }
    }

    if report.scanned > 0 {
      info!(?report, "reconciliation pass finished");
    }
    Ok(report)
  }
}
