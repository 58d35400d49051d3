// seatflow/src/model/mod.rs

//! Domain records touched by settlement.

pub mod inventory;
pub mod notification;
pub mod order;

pub use inventory::{SeatInventory, SeatKey};
pub use notification::{NotifiedStatus, PaymentNotification};
pub use order::{Order, OrderItem, PaymentStatus, PaymentUpdate};
