//! Seat models.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::carts::models::SeatRef;

/// Occupancy of a single seat as last reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    /// Free to select.
    Available,
    /// Sold or held server-side.
    Taken,
}

/// One seat in an event's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Seat identifier/label, unique within the event.
    pub id: SeatRef,
    /// Section the seat belongs to.
    pub section: String,
    /// Row within the section.
    pub row: String,
    /// Seat number within the row.
    pub number: u32,
    /// Last reported occupancy.
    pub status: SeatStatus,
}

/// A client-local, non-binding seat choice.
///
/// This is a hint, not a lock: nothing is reserved server-side, two shoppers
/// can tentatively hold the same seat at once, and the authoritative
/// reservation happens only at order creation. The distinct type exists so a
/// tentative choice can never be passed where a confirmed reservation is
/// expected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TentativeSelection {
    seats: BTreeSet<SeatRef>,
}

impl TentativeSelection {
    /// Start with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a seat in or out of the selection. Returns `true` when the seat
    /// is selected after the call.
    pub fn toggle(&mut self, seat: SeatRef) -> bool {
        if self.seats.remove(&seat) {
            false
        } else {
            self.seats.insert(seat);
            true
        }
    }

    /// Whether a seat is currently selected.
    #[must_use]
    pub fn contains(&self, seat: &SeatRef) -> bool {
        self.seats.contains(seat)
    }

    /// Selected seats in label order.
    pub fn seats(&self) -> impl Iterator<Item = &SeatRef> {
        self.seats.iter()
    }

    /// Number of selected seats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Drop every selected seat.
    pub fn clear(&mut self) {
        self.seats.clear();
    }

    /// Keep only the seats a predicate still reports as selectable.
    ///
    /// Used with the poller's availability lookup to shed seats that sold
    /// while the shopper was deciding.
    pub fn retain_where<F: FnMut(&SeatRef) -> bool>(&mut self, mut selectable: F) {
        self.seats.retain(|seat| selectable(seat));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_selects_then_deselects() {
        let mut selection = TentativeSelection::new();
        let seat = SeatRef::new("A-1");

        assert!(selection.toggle(seat.clone()), "first toggle selects");
        assert!(selection.contains(&seat), "seat is held");
        assert!(!selection.toggle(seat.clone()), "second toggle deselects");
        assert!(selection.is_empty(), "selection is empty again");
    }

    #[test]
    fn retain_where_sheds_unselectable_seats() {
        let mut selection = TentativeSelection::new();
        selection.toggle(SeatRef::new("A-1"));
        selection.toggle(SeatRef::new("A-2"));

        selection.retain_where(|seat| seat.as_str() != "A-1");

        assert!(!selection.contains(&SeatRef::new("A-1")), "A-1 shed");
        assert!(selection.contains(&SeatRef::new("A-2")), "A-2 kept");
    }
}
