//! Wiring for the in-memory store.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::events::{EventBus, StoreEvent};
use crate::repositories::{
    MemoryCleaningRequestRepository, MemoryReservationRepository, MemoryRoomRepository,
    MemoryUserRepository,
};

/// All four in-memory collections sharing one change feed.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    pub rooms: Arc<MemoryRoomRepository>,
    pub reservations: Arc<MemoryReservationRepository>,
    pub cleaning_requests: Arc<MemoryCleaningRequestRepository>,
    pub users: Arc<MemoryUserRepository>,
    events: EventBus,
}

impl MemoryStore {
    pub fn new(event_capacity: usize) -> Self {
        let events = EventBus::new(event_capacity);
        Self {
            rooms: Arc::new(MemoryRoomRepository::new(events.clone())),
            reservations: Arc::new(MemoryReservationRepository::new(events.clone())),
            cleaning_requests: Arc::new(MemoryCleaningRequestRepository::new(events.clone())),
            users: Arc::new(MemoryUserRepository::new(events.clone())),
            events,
        }
    }

    /// Subscribe to the store-wide change feed.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{RoomRepository, UserRepository};
    use domain::models::{Role, Room, UserAccount};

    #[tokio::test]
    async fn test_mutations_from_any_collection_share_one_feed() {
        let store = MemoryStore::default();
        let mut feed = store.subscribe();

        let room = Room::new("101", 2, 1);
        let room_id = room.id;
        store.rooms.insert(room).await.unwrap();

        let user = UserAccount::new("Ana", "ana@example.com", Role::User);
        let user_id = user.id;
        store.users.insert(user).await.unwrap();

        assert_eq!(feed.recv().await.unwrap(), StoreEvent::RoomUpdated { room_id });
        assert_eq!(feed.recv().await.unwrap(), StoreEvent::UserInserted { user_id });
    }
}
