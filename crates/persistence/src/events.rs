//! Change feed for store mutations.
//!
//! Subscribers get a typed delta per committed write instead of a snapshot
//! of the whole collection, so they can re-read exactly the record that
//! changed. Delivery is at-least-once for live subscribers; a receiver that
//! falls behind the channel capacity observes `RecvError::Lagged` and should
//! re-read the collections it cares about.

use domain::models::{CleaningRequestStatus, ReservationStatus};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Delta published after a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    RoomUpdated {
        room_id: Uuid,
    },
    ReservationUpserted {
        reservation_id: Uuid,
        room_id: Uuid,
        status: ReservationStatus,
    },
    CleaningRequestUpserted {
        request_id: Uuid,
        room_id: Uuid,
        status: CleaningRequestStatus,
    },
    UserInserted {
        user_id: Uuid,
    },
}

/// Broadcast bus shared by all repositories of one store.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Publish a delta. A send with no live subscribers is not an error.
    pub fn publish(&self, event: StoreEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::trace!(?event, "No subscribers for store event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
