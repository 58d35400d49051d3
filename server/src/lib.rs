// seatflow-server/src/lib.rs

//! HTTP surface for seat settlement: PayU and Cashfree webhook routes over a
//! PostgreSQL store, plus the background reconciliation task.

pub mod config;
pub mod errors;
pub mod jobs;
pub mod state;
pub mod store;
pub mod web;

pub use crate::config::AppConfig;
pub use crate::errors::AppError;
pub use crate::state::AppState;
