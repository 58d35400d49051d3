// seatflow-server/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use seatflow::{CashfreeGateway, FlowRegistry, PayuGateway, SettlementStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn SettlementStore>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub payu: Arc<PayuGateway>,
  /// `None` when no Cashfree secret is configured.
  pub cashfree: Option<Arc<CashfreeGateway>>,
  pub seat_claim_lease: chrono::Duration,
}

impl AppState {
  /// Builds the state and registers the settlement and replay flows.
  pub fn new(
    store: Arc<dyn SettlementStore>,
    payu: PayuGateway,
    cashfree: Option<CashfreeGateway>,
    seat_claim_lease: chrono::Duration,
  ) -> Self {
    let flows = FlowRegistry::<AppError>::new();
    seatflow::register_flows(&flows);
    Self {
      store,
      flows: Arc::new(flows),
      payu: Arc::new(payu),
      cashfree: cashfree.map(Arc::new),
      seat_claim_lease,
    }
  }

  pub fn from_config(store: Arc<dyn SettlementStore>, config: &AppConfig) -> Self {
    Self::new(
      store,
      PayuGateway::new(&config.payu_merchant_key, &config.payu_merchant_salt),
      config.cashfree_webhook_secret.as_deref().map(CashfreeGateway::new),
      config.seat_claim_lease(),
    )
  }
}
