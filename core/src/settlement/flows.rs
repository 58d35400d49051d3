// seatflow/src/settlement/flows.rs

//! Step definitions and handlers of the settlement and replay flows.

use super::context::{ReplayCtx, WebhookCtx};
use super::seats;
use crate::error::{FlowError, SettleError, SettleResult};
use crate::flow::{ContextData, Flow, FlowRegistry, SkipCondition, StepControl};
use crate::model::{NotifiedStatus, PaymentStatus, PaymentUpdate};
use chrono::Utc;
use tracing::{info, warn};

pub const SETTLEMENT_FLOW: &str = "payment_settlement";
pub const REPLAY_FLOW: &str = "seat_replay";

/// Steps of the webhook settlement flow, in execution order.
pub const SETTLEMENT_STEPS: [&str; 6] = [
  "authenticate_delivery",
  "load_order",
  "record_payment_status",
  "claim_seat_adjustment",
  "adjust_seat_inventory",
  "finalize_seat_adjustment",
];

pub const REPLAY_STEPS: [&str; 3] = ["claim_seat_adjustment", "adjust_seat_inventory", "finalize_seat_adjustment"];

async fn authenticate_delivery(ctx: ContextData<WebhookCtx>) -> SettleResult<StepControl> {
  let notification = {
    let guard = ctx.read();
    guard.gateway.authenticate(&guard.delivery)?
  };
  info!(
    gateway = notification.gateway,
    order_id = %notification.order_id,
    status = ?notification.status,
    "webhook authenticated"
  );
  ctx.write().notification = Some(notification);
  Ok(StepControl::Continue)
}

fn order_id_of(ctx: &ContextData<WebhookCtx>) -> SettleResult<String> {
  ctx
    .read()
    .notification
    .as_ref()
    .map(|n| n.order_id.clone())
    .ok_or_else(|| SettleError::Internal("no authenticated notification in context".into()))
}

async fn load_order(ctx: ContextData<WebhookCtx>) -> SettleResult<StepControl> {
  let order_id = order_id_of(&ctx)?;
  let store = ctx.read().store.clone();

  let Some(order) = store.find_order(&order_id).await? else {
    warn!(order_id = %order_id, "webhook for unknown order");
    return Err(SettleError::OrderNotFound(order_id));
  };

  let mut guard = ctx.write();
  guard.was_completed = order.is_completed();
  guard.order = Some(order);
  Ok(StepControl::Continue)
}

async fn record_payment_status(ctx: ContextData<WebhookCtx>) -> SettleResult<StepControl> {
  let (store, notification, was_completed) = {
    let guard = ctx.read();
    let notification = guard
      .notification
      .clone()
      .ok_or_else(|| SettleError::Internal("no authenticated notification in context".into()))?;
    (guard.store.clone(), notification, guard.was_completed)
  };
  let order_id = notification.order_id.as_str();

  let payment_status = match notification.status {
    NotifiedStatus::Success => PaymentStatus::Completed,
    NotifiedStatus::Failure => PaymentStatus::Failed,
    NotifiedStatus::Pending => PaymentStatus::Pending,
  };

  if was_completed && payment_status != PaymentStatus::Completed {
    warn!(order_id, status = %payment_status, "ignoring non-success notification for a completed order");
    return Ok(StepControl::Halt);
  }

  let update = PaymentUpdate {
    payment_status,
    transaction_id: notification.transaction_id.clone(),
    payment_method: notification.payment_method.clone(),
    payment_date: Utc::now(),
    gateway_response: notification.raw.clone(),
    failure_reason: notification.failure_reason.clone(),
  };
  if !store.record_payment(order_id, &update).await? {
    if payment_status == PaymentStatus::Completed {
      return Err(SettleError::OrderNotFound(order_id.to_string()));
    }
    warn!(order_id, status = %payment_status, "order completed by another delivery; notification ignored");
    ctx.write().was_completed = true;
    return Ok(StepControl::Halt);
  }
  ctx.write().recorded = true;

  if payment_status != PaymentStatus::Completed {
    info!(order_id, status = %payment_status, "payment not successful; no seat changes");
    return Ok(StepControl::Halt);
  }
  if was_completed {
    info!(order_id, "duplicate success notification");
  }
  Ok(StepControl::Continue)
}

async fn claim_for_webhook(ctx: ContextData<WebhookCtx>) -> SettleResult<StepControl> {
  let (store, order_id, lease) = {
    let guard = ctx.read();
    let order_id = guard.order.as_ref().map(|o| o.id.clone());
    (guard.store.clone(), order_id, guard.lease)
  };
  let order_id = order_id.ok_or_else(|| SettleError::Internal("no order loaded".into()))?;

  if !seats::claim(store.as_ref(), &order_id, lease).await? {
    let in_progress = store
      .find_order(&order_id)
      .await?
      .is_some_and(|order| !order.seat_inventory_adjusted);
    ctx.write().seats_in_progress = in_progress;
    return Ok(StepControl::Halt);
  }
  ctx.write().claimed = true;
  Ok(StepControl::Continue)
}

async fn adjust_for_webhook(ctx: ContextData<WebhookCtx>) -> SettleResult<StepControl> {
  let (store, order) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.order.clone())
  };
  let order = order.ok_or_else(|| SettleError::Internal("no order loaded".into()))?;

  let adjustments = seats::adjust(store.as_ref(), &order).await?;
  ctx.write().adjustments = adjustments;
  Ok(StepControl::Continue)
}

async fn finalize_for_webhook(ctx: ContextData<WebhookCtx>) -> SettleResult<StepControl> {
  let (store, order_id) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.order.as_ref().map(|o| o.id.clone()))
  };
  let order_id = order_id.ok_or_else(|| SettleError::Internal("no order loaded".into()))?;

  seats::finalize(store.as_ref(), &order_id).await?;
  ctx.write().finalized = true;
  Ok(StepControl::Continue)
}

/// Builds the flow that settles one authenticated webhook delivery.
pub fn settlement_flow() -> Flow<WebhookCtx, SettleError> {
  let steps: Vec<(&str, bool, Option<SkipCondition<WebhookCtx>>)> =
    SETTLEMENT_STEPS.iter().map(|name| (*name, false, None)).collect();
  let mut flow = Flow::new(SETTLEMENT_FLOW, &steps);

  flow.on("authenticate_delivery", authenticate_delivery);
  flow.on("load_order", load_order);
  flow.on("record_payment_status", record_payment_status);
  flow.on("claim_seat_adjustment", claim_for_webhook);
  flow.on("adjust_seat_inventory", adjust_for_webhook);
  flow.on("finalize_seat_adjustment", finalize_for_webhook);
  flow
}

async fn claim_for_replay(ctx: ContextData<ReplayCtx>) -> SettleResult<StepControl> {
  let (store, order_id, lease) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.order.id.clone(), guard.lease)
  };
  if !seats::claim(store.as_ref(), &order_id, lease).await? {
    return Ok(StepControl::Halt);
  }
  ctx.write().claimed = true;
  Ok(StepControl::Continue)
}

async fn adjust_for_replay(ctx: ContextData<ReplayCtx>) -> SettleResult<StepControl> {
  let (store, order) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.order.clone())
  };
  let adjustments = seats::adjust(store.as_ref(), &order).await?;
  ctx.write().adjustments = adjustments;
  Ok(StepControl::Continue)
}

async fn finalize_for_replay(ctx: ContextData<ReplayCtx>) -> SettleResult<StepControl> {
  let (store, order_id) = {
    let guard = ctx.read();
    (guard.store.clone(), guard.order.id.clone())
  };
  seats::finalize(store.as_ref(), &order_id).await?;
  ctx.write().finalized = true;
  Ok(StepControl::Continue)
}

/// Builds the flow reconciliation runs for a completed order whose seats were never adjusted.
pub fn replay_flow() -> Flow<ReplayCtx, SettleError> {
  let steps: Vec<(&str, bool, Option<SkipCondition<ReplayCtx>>)> =
    REPLAY_STEPS.iter().map(|name| (*name, false, None)).collect();
  let mut flow = Flow::new(REPLAY_FLOW, &steps);

  flow.on("claim_seat_adjustment", claim_for_replay);
  flow.on("adjust_seat_inventory", adjust_for_replay);
  flow.on("finalize_seat_adjustment", finalize_for_replay);
  flow
}

/// Registers both flows for their context types.
pub fn register_flows<AppErr>(registry: &FlowRegistry<AppErr>)
where
  AppErr: std::error::Error + From<FlowError> + From<SettleError> + Send + Sync + 'static,
{
  registry.register(settlement_flow());
  registry.register(replay_flow());
}
