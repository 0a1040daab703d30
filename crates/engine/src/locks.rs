//! Per-room serialization point.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Registry of per-room async mutexes.
///
/// Mutating room-scoped operations hold the room's lock across their whole
/// check-then-write sequence, so two concurrent bookings of the same room
/// cannot both pass the availability check. Operations on different rooms do
/// not contend.
#[derive(Debug, Default)]
pub struct RoomLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a room, creating it on first use. The guard is
    /// owned so it can be held across awaits.
    pub async fn acquire(&self, room_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(room_id).or_default())
        };
        lock.lock_owned().await
    }
}
