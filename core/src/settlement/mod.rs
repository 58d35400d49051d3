// seatflow/src/settlement/mod.rs

//! Webhook settlement: authenticate, record the payment, then apply the
//! order's seat effects at most once.
//!
//! The seat phase is gated by an atomic claim on the order
//! (`seat_inventory_adjusted = false` and no live lease). Whether the order was
//! already `completed` is reported but never gates, so a delivery retried
//! after a crash between recording and finalizing still applies the seats.

pub mod context;
pub mod flows;
pub mod seats;

pub use context::{ReplayCtx, SeatAdjustment, SeatAdjustmentOutcome, SettlementReport, WebhookCtx};
pub use flows::{register_flows, replay_flow, settlement_flow, REPLAY_FLOW, SETTLEMENT_FLOW};

use crate::error::{FlowError, SettleError};
use crate::flow::{ContextData, FlowRegistry};
use crate::gateway::{PaymentGateway, WebhookDelivery};
use crate::store::SettlementStore;
use chrono::Duration;
use std::sync::Arc;
use tracing::instrument;

/// Settles one webhook delivery through the flow registered for [`WebhookCtx`].
#[instrument(name = "settle", skip_all, fields(gateway = gateway.name(), body_len = delivery.body.len()))]
pub async fn settle<AppErr>(
  registry: &FlowRegistry<AppErr>,
  store: Arc<dyn SettlementStore>,
  gateway: Arc<dyn PaymentGateway>,
  delivery: WebhookDelivery,
  lease: Duration,
) -> Result<SettlementReport, AppErr>
where
  AppErr: std::error::Error + From<FlowError> + From<SettleError> + Send + Sync + 'static,
{
  let ctx = ContextData::new(WebhookCtx::new(store, gateway, delivery, lease));
  registry.run(ctx.clone()).await?;
  let report = ctx.read().report()?;
  Ok(report)
}
