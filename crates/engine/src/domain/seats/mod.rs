//! Seat maps: advisory availability polling and tentative selection.

pub mod models;
pub mod poller;

pub use models::{Seat, SeatStatus, TentativeSelection};
pub use poller::SeatPoller;
