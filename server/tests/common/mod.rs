// tests/common/mod.rs
#![allow(dead_code)]

use chrono::Duration;
use once_cell::sync::Lazy;
use seatflow::gateway::payu::ReverseHashFields;
use seatflow::{CashfreeGateway, InMemoryStore, Order, OrderItem, PayuGateway};
use seatflow_server::AppState;
use std::sync::Arc;
use tracing::Level;

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

pub const PAYU_KEY: &str = "gtKFFx";
pub const PAYU_SALT: &str = "eCwWELxi";
pub const CASHFREE_SECRET: &str = "cf_test_secret";

/// Order `O1` for two seats of `basic-swar-yoga` on schedule `S1` (60 seats).
pub fn seeded_store() -> Arc<InMemoryStore> {
  let store = InMemoryStore::new();
  store.insert_schedule("S1", Some(60));
  store.insert_order(Order::pending(
    "O1",
    vec![OrderItem {
      name: "Basic Swar Yoga".to_string(),
      workshop_slug: Some("basic-swar-yoga".to_string()),
      schedule_id: Some("S1".to_string()),
      quantity: 2,
    }],
  ));
  Arc::new(store)
}

pub fn app_state(store: Arc<InMemoryStore>, with_cashfree: bool) -> AppState {
  AppState::new(
    store,
    PayuGateway::new(PAYU_KEY, PAYU_SALT),
    with_cashfree.then(|| CashfreeGateway::new(CASHFREE_SECRET)),
    Duration::seconds(300),
  )
}

pub fn payu_form(txnid: &str, status: &str) -> String {
  let hash = PayuGateway::new(PAYU_KEY, PAYU_SALT).reverse_hash(&ReverseHashFields {
    status,
    txnid,
    amount: "1500.00",
    productinfo: "Workshop",
    firstname: "Asha",
    email: "asha@example.com",
    ..Default::default()
  });
  let pairs: Vec<(&str, &str)> = vec![
    ("key", PAYU_KEY),
    ("txnid", txnid),
    ("mihpayid", "403993715521"),
    ("status", status),
    ("amount", "1500.00"),
    ("productinfo", "Workshop"),
    ("firstname", "Asha"),
    ("email", "asha@example.com"),
    ("mode", "CC"),
    ("hash", hash.as_str()),
  ];
  serde_urlencoded::to_string(&pairs).unwrap()
}
