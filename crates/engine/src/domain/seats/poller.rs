//! Seat availability poller.
//!
//! Periodically refreshes one event's seat roster from the backend while a
//! seat map is on screen. The snapshot is advisory: selection stays
//! client-local and non-binding, and the authoritative availability check
//! happens at order creation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{backend::SeatBackend, domain::carts::models::SeatRef};

use super::models::{Seat, SeatStatus};

/// Last fetched roster, indexed for lookup.
#[derive(Debug, Default)]
struct Snapshot {
    by_ref: FxHashMap<SeatRef, SeatStatus>,
    sections: Vec<(String, Vec<Seat>)>,
}

/// Polls the seat roster of a single event.
///
/// Unknown seats read as available: the poller must not block a selection the
/// server might still accept, and the server rejects genuinely taken seats at
/// order creation anyway. A failed refresh keeps the previous snapshot.
pub struct SeatPoller {
    backend: Arc<dyn SeatBackend>,
    event_ref: String,
    snapshot: Mutex<Snapshot>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for SeatPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeatPoller")
            .field("event_ref", &self.event_ref)
            .finish_non_exhaustive()
    }
}

impl SeatPoller {
    /// Create a poller for one event. No polling starts until
    /// [`Self::activate`].
    #[must_use]
    pub fn new(backend: Arc<dyn SeatBackend>, event_ref: impl Into<String>) -> Self {
        Self {
            backend,
            event_ref: event_ref.into(),
            snapshot: Mutex::new(Snapshot::default()),
            task: Mutex::new(None),
        }
    }

    /// The event this poller watches.
    #[must_use]
    pub fn event_ref(&self) -> &str {
        &self.event_ref
    }

    /// Fetch the roster once and replace the snapshot.
    ///
    /// # Errors
    ///
    /// Backend failures; the previous snapshot is kept on failure.
    pub async fn refresh(&self) -> Result<(), crate::backend::RemoteError> {
        let seats = self.backend.list_seats(self.event_ref.clone()).await?;

        let mut by_ref = FxHashMap::default();
        let mut sections: Vec<(String, Vec<Seat>)> = Vec::new();

        for seat in seats {
            by_ref.insert(seat.id.clone(), seat.status);

            match sections.iter_mut().find(|(name, _)| *name == seat.section) {
                Some((_, seats)) => seats.push(seat),
                None => sections.push((seat.section.clone(), vec![seat])),
            }
        }

        debug!(event = %self.event_ref, seats = by_ref.len(), "seat roster refreshed");

        if let Ok(mut snapshot) = self.snapshot.lock() {
            *snapshot = Snapshot { by_ref, sections };
        }

        Ok(())
    }

    /// Last known status of a seat. Unknown seats read as available.
    #[must_use]
    pub fn availability(&self, seat: &SeatRef) -> SeatStatus {
        self.snapshot
            .lock()
            .ok()
            .and_then(|snapshot| snapshot.by_ref.get(seat).copied())
            .unwrap_or(SeatStatus::Available)
    }

    /// Whether a seat can currently be selected.
    #[must_use]
    pub fn is_selectable(&self, seat: &SeatRef) -> bool {
        self.availability(seat) == SeatStatus::Available
    }

    /// The roster grouped by section, in first-seen order.
    #[must_use]
    pub fn sections(&self) -> Vec<(String, Vec<Seat>)> {
        self.snapshot
            .lock()
            .map(|snapshot| snapshot.sections.clone())
            .unwrap_or_default()
    }

    /// Start polling at the given period, replacing any previous poll task.
    ///
    /// The first refresh happens immediately. Refresh failures are logged and
    /// skipped; the task keeps its schedule.
    pub fn activate(self: &Arc<Self>, period: Duration) {
        let poller = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);

            loop {
                ticker.tick().await;

                if let Err(error) = poller.refresh().await {
                    warn!(event = %poller.event_ref, %error, "seat refresh failed");
                }
            }
        });

        if let Ok(mut task) = self.task.lock() {
            if let Some(previous) = task.replace(handle) {
                previous.abort();
            }
        }
    }

    /// Stop polling. The snapshot stays readable.
    pub fn deactivate(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for SeatPoller {
    fn drop(&mut self) {
        self.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use crate::backend::{MockSeatBackend, RemoteError};

    use super::*;

    fn seat(id: &str, section: &str, number: u32, status: SeatStatus) -> Seat {
        Seat {
            id: SeatRef::new(id),
            section: section.to_owned(),
            row: "A".to_owned(),
            number,
            status,
        }
    }

    fn roster() -> Vec<Seat> {
        vec![
            seat("A-1", "Stalls", 1, SeatStatus::Available),
            seat("A-2", "Stalls", 2, SeatStatus::Taken),
            seat("B-1", "Balcony", 1, SeatStatus::Available),
        ]
    }

    #[tokio::test]
    async fn refresh_indexes_the_roster() {
        let mut backend = MockSeatBackend::new();
        backend
            .expect_list_seats()
            .withf(|event| event == "evt-1")
            .returning(|_| Ok(roster()));

        let poller = SeatPoller::new(Arc::new(backend), "evt-1");
        poller.refresh().await.expect("refresh should succeed");

        assert_eq!(poller.availability(&SeatRef::new("A-1")), SeatStatus::Available);
        assert_eq!(poller.availability(&SeatRef::new("A-2")), SeatStatus::Taken);
        assert!(!poller.is_selectable(&SeatRef::new("A-2")));
    }

    #[tokio::test]
    async fn unknown_seats_read_as_available() {
        let poller = SeatPoller::new(Arc::new(MockSeatBackend::new()), "evt-1");

        assert_eq!(
            poller.availability(&SeatRef::new("Z-99")),
            SeatStatus::Available,
            "no snapshot yet, nothing is blocked"
        );
    }

    #[tokio::test]
    async fn sections_group_in_first_seen_order() {
        let mut backend = MockSeatBackend::new();
        backend.expect_list_seats().returning(|_| Ok(roster()));

        let poller = SeatPoller::new(Arc::new(backend), "evt-1");
        poller.refresh().await.expect("refresh should succeed");

        let sections = poller.sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].0, "Stalls");
        assert_eq!(sections[0].1.len(), 2);
        assert_eq!(sections[1].0, "Balcony");
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_previous_snapshot() {
        let mut backend = MockSeatBackend::new();
        backend.expect_list_seats().times(1).returning(|_| Ok(roster()));
        backend
            .expect_list_seats()
            .returning(|_| Err(RemoteError::Unavailable("down".to_owned())));

        let poller = SeatPoller::new(Arc::new(backend), "evt-1");
        poller.refresh().await.expect("first refresh should succeed");

        let result = poller.refresh().await;
        assert!(result.is_err(), "second refresh fails");

        assert_eq!(
            poller.availability(&SeatRef::new("A-2")),
            SeatStatus::Taken,
            "snapshot from the successful refresh survives"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn activate_polls_on_the_period() {
        let mut backend = MockSeatBackend::new();
        backend.expect_list_seats().returning(|_| Ok(roster()));

        let poller = Arc::new(SeatPoller::new(Arc::new(backend), "evt-1"));
        poller.activate(Duration::from_secs(5));

        // First tick fires immediately.
        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;

        assert_eq!(poller.availability(&SeatRef::new("A-2")), SeatStatus::Taken);

        poller.deactivate();
    }
}
