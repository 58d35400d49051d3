// seatflow-server/src/main.rs

use seatflow_server::store::PgSettlementStore;
use seatflow_server::web::configure_app_routes;
use seatflow_server::{jobs, AppConfig, AppState};

use actix_web::{web as actix_data, App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let builder = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration

  if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
  tracing::error!(error = %e, "{context}");
  std::io::Error::other(format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing();
  tracing::info!("Starting seat settlement server...");

  let app_config = AppConfig::from_env().map_err(|e| startup_error("Failed to load application configuration", e))?;

  let store = PgSettlementStore::connect(&app_config.database_url, 10)
    .await
    .map_err(|e| startup_error("Failed to connect to the database", e))?;
  tracing::info!("Successfully connected to the database.");

  if app_config.run_migrations {
    store.migrate().await.map_err(|e| startup_error("Failed to run migrations", e))?;
    tracing::info!("Database migrations applied.");
  }

  let app_state = AppState::from_config(Arc::new(store), &app_config);
  tracing::info!(cashfree_enabled = app_state.cashfree.is_some(), "Settlement flows registered.");

  let _reconciler = jobs::spawn_reconciler(
    &app_state,
    app_config.reconcile_interval_secs,
    app_config.reconcile_batch_size,
  );

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
