// seatflow/src/lib.rs

//! Seatflow: idempotent seat settlement for payment-gateway webhooks.
//!
//! A webhook delivery runs through a named-step [`Flow`]:
//!  - `authenticate_delivery` verifies the gateway signature and parses the payload.
//!  - `load_order` finds the order the payment is for.
//!  - `record_payment_status` overwrites the order's payment fields.
//!  - `claim_seat_adjustment` atomically claims the one-shot seat phase.
//!  - `adjust_seat_inventory` conditionally decrements each seated line.
//!  - `finalize_seat_adjustment` sets `seat_inventory_adjusted`.
//!
//! Storage sits behind [`SettlementStore`]; [`Reconciler`] replays the seat
//! phase for orders a crashed delivery left behind.

pub mod error;
pub mod flow;
pub mod gateway;
pub mod model;
pub mod reconcile;
pub mod settlement;
pub mod store;

pub use crate::error::{FlowError, SettleError, SettleResult, StoreError};
pub use crate::flow::{ContextData, Flow, FlowOutcome, FlowRegistry, SkipCondition, StepControl, StepDef};
pub use crate::gateway::{CashfreeGateway, PaymentGateway, PayuGateway, WebhookDelivery};
pub use crate::model::{
  NotifiedStatus, Order, OrderItem, PaymentNotification, PaymentStatus, PaymentUpdate, SeatInventory, SeatKey,
};
pub use crate::reconcile::{ReconcileReport, Reconciler};
pub use crate::settlement::{
  register_flows, settle, SeatAdjustment, SeatAdjustmentOutcome, SettlementReport, WebhookCtx, ReplayCtx,
};
pub use crate::store::{InMemoryStore, LineSettlement, SettlementStore, StoreResult};
