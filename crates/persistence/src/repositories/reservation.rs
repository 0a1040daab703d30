//! Reservation repository.

use std::collections::HashMap;

use chrono::Utc;
use domain::error::{Entity, StoreError};
use domain::models::{Reservation, ReservationStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::events::{EventBus, StoreEvent};

/// Reservation reads and the guarded status transition.
#[async_trait::async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn insert(&self, reservation: Reservation) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, StoreError>;

    /// Active reservations for one room; the availability scan reads this
    /// instead of the whole collection.
    async fn active_for_room(&self, room_id: Uuid) -> Result<Vec<Reservation>, StoreError>;

    /// The active reservation a user holds on a room, if any.
    async fn active_for_room_and_user(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError>;

    /// A user's reservations, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, StoreError>;

    /// Stale-state guard: move `id` from `expected` to `next` in one step.
    /// Fails with `Conflict` if the persisted status no longer matches
    /// `expected`, so a transition is never applied over a concurrent one.
    async fn set_status_if(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        next: ReservationStatus,
    ) -> Result<Reservation, StoreError>;
}

/// In-memory reservation collection.
#[derive(Debug, Default)]
pub struct MemoryReservationRepository {
    reservations: RwLock<HashMap<Uuid, Reservation>>,
    events: EventBus,
}

impl MemoryReservationRepository {
    pub fn new(events: EventBus) -> Self {
        Self {
            reservations: RwLock::new(HashMap::new()),
            events,
        }
    }
}

#[async_trait::async_trait]
impl ReservationRepository for MemoryReservationRepository {
    async fn insert(&self, reservation: Reservation) -> Result<(), StoreError> {
        let event = StoreEvent::ReservationUpserted {
            reservation_id: reservation.id,
            room_id: reservation.room_id,
            status: reservation.status,
        };
        self.reservations
            .write()
            .await
            .insert(reservation.id, reservation);
        self.events.publish(event);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn active_for_room(&self, room_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .filter(|reservation| reservation.room_id == room_id && reservation.is_active())
            .cloned()
            .collect())
    }

    async fn active_for_room_and_user(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError> {
        Ok(self
            .reservations
            .read()
            .await
            .values()
            .find(|reservation| {
                reservation.room_id == room_id
                    && reservation.user_id == user_id
                    && reservation.is_active()
            })
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        let mut reservations: Vec<Reservation> = self
            .reservations
            .read()
            .await
            .values()
            .filter(|reservation| reservation.user_id == user_id)
            .cloned()
            .collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    async fn set_status_if(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        next: ReservationStatus,
    ) -> Result<Reservation, StoreError> {
        let mut reservations = self.reservations.write().await;
        let reservation = reservations.get_mut(&id).ok_or(StoreError::Missing {
            entity: Entity::Reservation,
            id,
        })?;
        if reservation.status != expected {
            return Err(StoreError::Conflict {
                entity: Entity::Reservation,
                id,
            });
        }
        reservation.status = next;
        reservation.updated_at = Utc::now();
        let updated = reservation.clone();
        drop(reservations);

        self.events.publish(StoreEvent::ReservationUpserted {
            reservation_id: updated.id,
            room_id: updated.room_id,
            status: updated.status,
        });
        Ok(updated)
    }
}
