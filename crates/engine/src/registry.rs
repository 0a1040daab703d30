//! Room registry: provisioning and read models.
//!
//! Reads are where two derived facts get materialized:
//! - the current guest is computed from the active reservation covering
//!   "now", never read from a stored field;
//! - an overdue auto-lock deadline is reconciled on the spot, so a timer
//!   lost to a process restart still results in a locked door.

use std::sync::Arc;

use domain::error::{Entity, EngineError};
use domain::models::{Actor, CurrentGuest, Room, RoomDetails};
use persistence::repositories::{ReservationRepository, RoomRepository, UserRepository};
use uuid::Uuid;

use crate::clock::Clock;

pub struct RoomRegistry {
    rooms: Arc<dyn RoomRepository>,
    reservations: Arc<dyn ReservationRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl RoomRegistry {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        reservations: Arc<dyn ReservationRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            reservations,
            users,
            clock,
        }
    }

    /// Add a room to the inventory. Admin only.
    pub async fn provision_room(
        &self,
        actor: &Actor,
        number: &str,
        beds: u8,
        rooms: u8,
    ) -> Result<Uuid, EngineError> {
        if !actor.is_admin() {
            return Err(EngineError::Unauthorized {
                user_id: actor.id,
                role: actor.role,
                attempted: "provision rooms",
            });
        }
        let room = Room::new(number, beds, rooms);
        let room_id = room.id;
        self.rooms.insert(room).await?;
        tracing::info!(room_id = %room_id, number = %number, "Room provisioned");
        Ok(room_id)
    }

    /// Room snapshot with the derived guest, after lock reconciliation.
    pub async fn room_details(&self, room_id: Uuid) -> Result<RoomDetails, EngineError> {
        let mut room = self.require_room(room_id).await?;

        let now = self.clock.now();
        if room.lock_overdue(now) {
            let relocked = self
                .rooms
                .relock_if_expired(room_id, room.lock_epoch, now)
                .await?;
            if relocked {
                tracing::info!(room_id = %room_id, "Overdue door relocked on read");
                room = self.require_room(room_id).await?;
            }
        }

        let current_guest = self.current_guest(room_id).await?;
        Ok(RoomDetails {
            room,
            current_guest,
        })
    }

    /// All rooms, ordered by number, without derived guest data.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, EngineError> {
        Ok(self.rooms.list().await?)
    }

    /// The guest whose active reservation covers "now", if any.
    async fn current_guest(&self, room_id: Uuid) -> Result<Option<CurrentGuest>, EngineError> {
        let now = self.clock.now();
        let active = self.reservations.active_for_room(room_id).await?;
        let Some(reservation) = active
            .into_iter()
            .find(|reservation| reservation.stay.contains(now))
        else {
            return Ok(None);
        };

        let name = self
            .users
            .find_by_id(reservation.user_id)
            .await?
            .map(|user| user.name)
            .unwrap_or_default();
        Ok(Some(CurrentGuest {
            user_id: reservation.user_id,
            name,
            check_in: reservation.stay.check_in(),
            check_out: reservation.stay.check_out(),
        }))
    }

    async fn require_room(&self, room_id: Uuid) -> Result<Room, EngineError> {
        self.rooms
            .find_by_id(room_id)
            .await?
            .ok_or(EngineError::not_found(Entity::Room, room_id))
    }
}
