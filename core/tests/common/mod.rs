// tests/common/mod.rs
#![allow(dead_code)]

use seatflow::{
  ContextData, FlowError, FlowRegistry, InMemoryStore, Order, OrderItem, PayuGateway, SettleError, StepControl,
  WebhookDelivery,
};
use std::sync::Arc;
use tracing::Level;

// --- Flow engine fixtures ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub halt_at: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct OtherContext {
  pub value: i32,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Flow engine error: {0}")]
  Flow(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> seatflow::flow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = step_name, counter = guard.counter, "executed");
      if guard.halt_at.as_deref() == Some(step_name) {
        return Ok(StepControl::Halt);
      }
      Ok(StepControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> seatflow::flow::Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

// --- Tracing setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Settlement fixtures ---
pub const PAYU_KEY: &str = "gtKFFx";
pub const PAYU_SALT: &str = "eCwWELxi";
pub const CASHFREE_SECRET: &str = "cf_test_secret";

pub fn payu() -> Arc<PayuGateway> {
  Arc::new(PayuGateway::new(PAYU_KEY, PAYU_SALT))
}

pub fn registry() -> Arc<FlowRegistry<SettleError>> {
  let registry = FlowRegistry::new();
  seatflow::register_flows(&registry);
  Arc::new(registry)
}

pub fn seated_item(slug: &str, schedule_id: &str, quantity: i64) -> OrderItem {
  OrderItem {
    name: format!("{slug} workshop"),
    workshop_slug: Some(slug.to_string()),
    schedule_id: Some(schedule_id.to_string()),
    quantity,
  }
}

/// Order `O1` for two seats of `basic-swar-yoga` on schedule `S1` (60 seats).
pub fn store_with_o1() -> Arc<InMemoryStore> {
  let store = InMemoryStore::new();
  store.insert_schedule("S1", Some(60));
  store.insert_order(Order::pending("O1", vec![seated_item("basic-swar-yoga", "S1", 2)]));
  Arc::new(store)
}

/// A correctly hashed PayU callback body.
pub fn payu_body(txnid: &str, status: &str, mihpayid: &str) -> Vec<u8> {
  let gateway = PayuGateway::new(PAYU_KEY, PAYU_SALT);
  let fields = seatflow::gateway::payu::ReverseHashFields {
    txnid,
    amount: "1500.00",
    productinfo: "Workshop",
    firstname: "Asha",
    email: "asha@example.com",
    status,
    ..Default::default()
  };
  let hash = gateway.reverse_hash(&fields);
  let pairs: Vec<(&str, &str)> = vec![
    ("key", PAYU_KEY),
    ("txnid", txnid),
    ("mihpayid", mihpayid),
    ("status", status),
    ("amount", "1500.00"),
    ("productinfo", "Workshop"),
    ("firstname", "Asha"),
    ("email", "asha@example.com"),
    ("mode", "UPI"),
    ("hash", hash.as_str()),
  ];
  serde_urlencoded::to_string(&pairs).unwrap().into_bytes()
}

pub fn payu_delivery(txnid: &str, status: &str) -> WebhookDelivery {
  WebhookDelivery::from_body(payu_body(txnid, status, "403993715521"))
}
