// seatflow-server/src/store/mod.rs

pub mod postgres;

pub use postgres::PgSettlementStore;
