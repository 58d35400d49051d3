// seatflow/src/gateway/payu.rs

//! PayU success/failure callbacks (`application/x-www-form-urlencoded`).
//!
//! PayU signs the callback with its "reverse hash":
//!
//! ```text
//! sha512([additional_charges|]salt|status||||||udf5|udf4|udf3|udf2|udf1|email|firstname|productinfo|amount|txnid|key)
//! ```
//!
//! hex encoded, sent in the `hash` field.

use super::{signatures_match, PaymentGateway, WebhookDelivery};
use crate::error::{SettleError, SettleResult};
use crate::model::{NotifiedStatus, PaymentNotification};
use serde::Deserialize;
use sha2::{Digest, Sha512};
use tracing::warn;

const GATEWAY: &str = "payu";

#[derive(Debug, Deserialize)]
struct PayuCallback {
  #[serde(default)]
  txnid: String,
  mihpayid: Option<String>,
  #[serde(default)]
  status: String,
  #[serde(default)]
  amount: String,
  #[serde(default)]
  productinfo: String,
  #[serde(default)]
  firstname: String,
  #[serde(default)]
  email: String,
  #[serde(default)]
  udf1: String,
  #[serde(default)]
  udf2: String,
  #[serde(default)]
  udf3: String,
  #[serde(default)]
  udf4: String,
  #[serde(default)]
  udf5: String,
  mode: Option<String>,
  #[serde(default)]
  hash: String,
  additional_charges: Option<String>,
  #[serde(rename = "error_Message")]
  error_message: Option<String>,
}

#[derive(Clone)]
pub struct PayuGateway {
  merchant_key: String,
  merchant_salt: String,
}

impl std::fmt::Debug for PayuGateway {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PayuGateway")
      .field("merchant_key", &self.merchant_key)
      .field("merchant_salt", &"[REDACTED]")
      .finish()
  }
}

impl PayuGateway {
  pub fn new(merchant_key: impl Into<String>, merchant_salt: impl Into<String>) -> Self {
    Self {
      merchant_key: merchant_key.into(),
      merchant_salt: merchant_salt.into(),
    }
  }

  /// Reverse hash PayU is expected to send for these callback fields.
  pub fn reverse_hash(&self, fields: &ReverseHashFields<'_>) -> String {
    let mut parts: Vec<&str> = Vec::with_capacity(19);
    if let Some(charges) = fields.additional_charges.filter(|c| !c.is_empty()) {
      parts.push(charges);
    }
    parts.extend([self.merchant_salt.as_str(), fields.status, "", "", "", "", ""]);
    parts.extend([fields.udf5, fields.udf4, fields.udf3, fields.udf2, fields.udf1]);
    parts.extend([fields.email, fields.firstname, fields.productinfo, fields.amount, fields.txnid]);
    parts.push(self.merchant_key.as_str());
    hex::encode(Sha512::digest(parts.join("|").as_bytes()))
  }
}

/// The callback fields covered by the reverse hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReverseHashFields<'a> {
  pub status: &'a str,
  pub udf1: &'a str,
  pub udf2: &'a str,
  pub udf3: &'a str,
  pub udf4: &'a str,
  pub udf5: &'a str,
  pub email: &'a str,
  pub firstname: &'a str,
  pub productinfo: &'a str,
  pub amount: &'a str,
  pub txnid: &'a str,
  pub additional_charges: Option<&'a str>,
}

impl<'a> From<&'a PayuCallback> for ReverseHashFields<'a> {
  fn from(cb: &'a PayuCallback) -> Self {
    Self {
      status: &cb.status,
      udf1: &cb.udf1,
      udf2: &cb.udf2,
      udf3: &cb.udf3,
      udf4: &cb.udf4,
      udf5: &cb.udf5,
      email: &cb.email,
      firstname: &cb.firstname,
      productinfo: &cb.productinfo,
      amount: &cb.amount,
      txnid: &cb.txnid,
      additional_charges: cb.additional_charges.as_deref(),
    }
  }
}

fn notified_status(status: &str) -> NotifiedStatus {
  match status.trim().to_ascii_lowercase().as_str() {
    "success" => NotifiedStatus::Success,
    "failure" => NotifiedStatus::Failure,
    _ => NotifiedStatus::Pending,
  }
}

fn non_empty(value: Option<&String>) -> Option<String> {
  value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

impl PaymentGateway for PayuGateway {
  fn name(&self) -> &'static str {
    GATEWAY
  }

  fn authenticate(&self, delivery: &WebhookDelivery) -> SettleResult<PaymentNotification> {
    let malformed = |reason: String| SettleError::MalformedPayload {
      gateway: GATEWAY,
      reason,
    };

    let pairs: Vec<(String, String)> =
      serde_urlencoded::from_bytes(&delivery.body).map_err(|e| malformed(format!("invalid form body: {e}")))?;
    let callback: PayuCallback =
      serde_urlencoded::from_bytes(&delivery.body).map_err(|e| malformed(format!("invalid callback fields: {e}")))?;

    if callback.txnid.trim().is_empty() {
      return Err(malformed("missing txnid".to_string()));
    }
    if callback.hash.is_empty() {
      warn!(txnid = %callback.txnid, "PayU callback without hash");
      return Err(SettleError::InvalidSignature { gateway: GATEWAY });
    }

    let expected = self.reverse_hash(&ReverseHashFields::from(&callback));
    let provided = callback.hash.trim().to_ascii_lowercase();
    if !signatures_match(expected.as_bytes(), provided.as_bytes()) {
      warn!(txnid = %callback.txnid, "PayU reverse hash mismatch");
      return Err(SettleError::InvalidSignature { gateway: GATEWAY });
    }

    let raw = serde_json::Value::Object(
      pairs
        .into_iter()
        .map(|(k, v)| (k, serde_json::Value::String(v)))
        .collect(),
    );
    let status = notified_status(&callback.status);
    let failure_reason = match status {
      NotifiedStatus::Success => None,
      _ => non_empty(callback.error_message.as_ref()).or_else(|| Some(format!("PayU status '{}'", callback.status))),
    };

    Ok(PaymentNotification {
      gateway: GATEWAY,
      order_id: callback.txnid.trim().to_string(),
      transaction_id: non_empty(callback.mihpayid.as_ref()),
      status,
      payment_method: non_empty(callback.mode.as_ref()),
      amount: Some(callback.amount.clone()).filter(|a| !a.is_empty()),
      failure_reason,
      raw,
    })
  }
}
