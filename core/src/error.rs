// seatflow/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Errors raised by the flow engine itself.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Required step '{step_name}' in flow '{flow}' has no handlers")]
  HandlerMissing { flow: String, step_name: String },

  #[error("No flow registered for context type {type_name}")]
  NotRegistered { type_name: String },

  #[error("Context type mismatch in flow '{flow}' (expected {expected_type})")]
  TypeMismatch { flow: String, expected_type: String },

  #[error("Handler failed: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for FlowError {
  fn from(source: AnyhowError) -> Self {
    FlowError::HandlerError { source }
  }
}

/// Errors from a `SettlementStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Store backend error: {0}")]
  Backend(#[source] AnyhowError),

  /// A stored record could not be mapped onto the domain model.
  #[error("Corrupt record: {0}")]
  Corrupt(String),
}

/// Everything that can go wrong while settling a webhook delivery.
///
/// The variants follow the handling taxonomy: authentication failures and
/// malformed payloads are rejected before any write, a missing order is
/// reported with the attempted id, and everything else is internal.
#[derive(Debug, Error)]
pub enum SettleError {
  #[error("Webhook signature verification failed for {gateway}")]
  InvalidSignature { gateway: &'static str },

  #[error("Malformed {gateway} payload: {reason}")]
  MalformedPayload { gateway: &'static str, reason: String },

  #[error("Order not found: {0}")]
  OrderNotFound(String),

  #[error("Gateway {0} is not configured")]
  GatewayNotConfigured(&'static str),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Flow(#[from] FlowError),

  #[error("Internal settlement error: {0}")]
  Internal(String),
}

pub type SettleResult<T, E = SettleError> = std::result::Result<T, E>;
