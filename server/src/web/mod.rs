// seatflow-server/src/web/mod.rs

pub mod handlers;
pub mod routes;

pub use routes::configure_app_routes;
