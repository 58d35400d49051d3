// seatflow/src/gateway/mod.rs

//! Gateway adapters: authenticate a raw webhook delivery and normalise it
//! into a [`PaymentNotification`].

pub mod cashfree;
pub mod payu;

use crate::error::SettleResult;
use crate::model::PaymentNotification;
use subtle::ConstantTimeEq;

pub use cashfree::CashfreeGateway;
pub use payu::PayuGateway;

/// A webhook request as received, before any parsing.
#[derive(Debug, Clone, Default)]
pub struct WebhookDelivery {
  pub body: Vec<u8>,
  /// Signature header, for gateways that sign out of band.
  pub signature: Option<String>,
  /// Signature timestamp header, for gateways that sign it.
  pub timestamp: Option<String>,
}

impl WebhookDelivery {
  pub fn from_body(body: impl Into<Vec<u8>>) -> Self {
    Self {
      body: body.into(),
      ..Self::default()
    }
  }
}

pub trait PaymentGateway: Send + Sync {
  /// Short name used in logs, errors and stored payloads.
  fn name(&self) -> &'static str;

  /// Verifies the delivery against the shared secret and parses it.
  ///
  /// Must not return a notification unless the signature matched; the secret
  /// itself never appears in errors or logs.
  fn authenticate(&self, delivery: &WebhookDelivery) -> SettleResult<PaymentNotification>;
}

/// Constant-time comparison of two signature encodings.
///
/// The length check leaks only the length, which is public for a given algorithm.
pub(crate) fn signatures_match(expected: &[u8], provided: &[u8]) -> bool {
  if expected.len() != provided.len() {
    return false;
  }
  expected.ct_eq(provided).into()
}
