//! Domain services: carts, checkout, seats.

pub mod carts;
pub mod checkout;
pub mod seats;
