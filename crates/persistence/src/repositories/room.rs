//! Room repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use domain::error::{Entity, StoreError};
use domain::models::{
    ActionSource, CleaningStatus, DeviceAction, DeviceActionKind, DeviceActor, DoorStatus,
    LightStatus, Room,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::events::{EventBus, StoreEvent};

/// One committed device write: the log entry plus the field updates it
/// implies. Applied atomically under the store lock so the door-action log
/// is appended in commit order.
#[derive(Debug, Clone)]
pub struct DeviceMutation {
    pub action: DeviceAction,
    pub door_status: Option<DoorStatus>,
    pub light_status: Option<LightStatus>,
    /// New auto-lock deadline; `Some(None)` clears an existing one.
    pub lock_deadline: Option<Option<DateTime<Utc>>>,
    /// Manual door actions bump the epoch so outstanding auto-lock timers
    /// are superseded.
    pub bump_epoch: bool,
}

/// Room reads and conditional updates.
#[async_trait::async_trait]
pub trait RoomRepository: Send + Sync {
    async fn insert(&self, room: Room) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Room>, StoreError>;

    /// All rooms, ordered by display number.
    async fn list(&self) -> Result<Vec<Room>, StoreError>;

    /// Flip the occupancy flag, optionally changing cleaning status in the
    /// same write (checkout marks the room for cleaning).
    async fn set_occupancy(
        &self,
        id: Uuid,
        occupied: bool,
        cleaning_status: Option<CleaningStatus>,
    ) -> Result<(), StoreError>;

    /// Update cleaning status; completion also stamps `last_cleaned`.
    async fn set_cleaning_status(
        &self,
        id: Uuid,
        status: CleaningStatus,
        cleaned_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Apply a device mutation and return the room's lock epoch after the
    /// write.
    async fn apply_device_mutation(
        &self,
        id: Uuid,
        mutation: DeviceMutation,
    ) -> Result<u64, StoreError>;

    /// Auto-relock compare-and-swap: lock the door and append an `auto_lock`
    /// entry only if the door is still unlocked, the epoch still matches the
    /// unlock that scheduled the timer, and the deadline has passed. Returns
    /// whether the relock fired.
    async fn relock_if_expired(
        &self,
        id: Uuid,
        epoch: u64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}

/// In-memory room collection.
#[derive(Debug, Default)]
pub struct MemoryRoomRepository {
    rooms: RwLock<HashMap<Uuid, Room>>,
    events: EventBus,
}

impl MemoryRoomRepository {
    pub fn new(events: EventBus) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            events,
        }
    }
}

#[async_trait::async_trait]
impl RoomRepository for MemoryRoomRepository {
    async fn insert(&self, room: Room) -> Result<(), StoreError> {
        let room_id = room.id;
        self.rooms.write().await.insert(room_id, room);
        self.events.publish(StoreEvent::RoomUpdated { room_id });
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Room>, StoreError> {
        let mut rooms: Vec<Room> = self.rooms.read().await.values().cloned().collect();
        rooms.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(rooms)
    }

    async fn set_occupancy(
        &self,
        id: Uuid,
        occupied: bool,
        cleaning_status: Option<CleaningStatus>,
    ) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&id).ok_or(StoreError::Missing {
            entity: Entity::Room,
            id,
        })?;
        room.is_occupied = occupied;
        if let Some(status) = cleaning_status {
            room.cleaning_status = status;
        }
        room.updated_at = Utc::now();
        drop(rooms);
        self.events.publish(StoreEvent::RoomUpdated { room_id: id });
        Ok(())
    }

    async fn set_cleaning_status(
        &self,
        id: Uuid,
        status: CleaningStatus,
        cleaned_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&id).ok_or(StoreError::Missing {
            entity: Entity::Room,
            id,
        })?;
        room.cleaning_status = status;
        if let Some(at) = cleaned_at {
            room.last_cleaned = at;
        }
        room.updated_at = Utc::now();
        drop(rooms);
        self.events.publish(StoreEvent::RoomUpdated { room_id: id });
        Ok(())
    }

    async fn apply_device_mutation(
        &self,
        id: Uuid,
        mutation: DeviceMutation,
    ) -> Result<u64, StoreError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&id).ok_or(StoreError::Missing {
            entity: Entity::Room,
            id,
        })?;

        if let Some(door) = mutation.door_status {
            room.door_status = door;
        }
        if let Some(light) = mutation.light_status {
            room.light_status = light;
        }
        if let Some(deadline) = mutation.lock_deadline {
            room.lock_deadline = deadline;
        }
        if mutation.bump_epoch {
            room.lock_epoch += 1;
        }
        room.door_actions.push(mutation.action);
        room.updated_at = Utc::now();
        let epoch = room.lock_epoch;
        drop(rooms);

        self.events.publish(StoreEvent::RoomUpdated { room_id: id });
        Ok(epoch)
    }

    async fn relock_if_expired(
        &self,
        id: Uuid,
        epoch: u64,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&id).ok_or(StoreError::Missing {
            entity: Entity::Room,
            id,
        })?;

        let due = room.door_status == DoorStatus::Unlocked
            && room.lock_epoch == epoch
            && room.lock_deadline.is_some_and(|deadline| deadline <= now);
        if !due {
            return Ok(false);
        }

        room.door_status = DoorStatus::Locked;
        room.lock_deadline = None;
        room.door_actions.push(DeviceAction {
            kind: DeviceActionKind::AutoLock,
            actor: DeviceActor::System,
            source: ActionSource::Auto,
            at: now,
        });
        room.updated_at = Utc::now();
        drop(rooms);

        self.events.publish(StoreEvent::RoomUpdated { room_id: id });
        Ok(true)
    }
}
