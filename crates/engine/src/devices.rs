//! Door and light control with timed auto-relock.
//!
//! Access is granted to admins, to cleaners with an open request assigned on
//! the room, and to the holder of an active reservation on the room. A
//! manual unlock by anyone but a cleaner schedules a re-lock after a
//! configurable delay; the deadline is persisted on the room so a lost
//! in-process timer is reconciled on the next read.

use std::sync::Arc;
use std::time::Duration;

use domain::error::{EngineError, Entity};
use domain::models::{
    ActionSource, Actor, DeviceAction, DeviceActionKind, DeviceActor, DoorStatus, LightStatus,
    Room,
};
use persistence::repositories::{
    CleaningRequestRepository, DeviceMutation, ReservationRepository, RoomRepository,
};
use uuid::Uuid;

use crate::clock::Clock;

pub struct DeviceService {
    rooms: Arc<dyn RoomRepository>,
    reservations: Arc<dyn ReservationRepository>,
    requests: Arc<dyn CleaningRequestRepository>,
    clock: Arc<dyn Clock>,
    auto_lock_delay: Duration,
}

impl DeviceService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        reservations: Arc<dyn ReservationRepository>,
        requests: Arc<dyn CleaningRequestRepository>,
        clock: Arc<dyn Clock>,
        auto_lock_delay: Duration,
    ) -> Self {
        Self {
            rooms,
            reservations,
            requests,
            clock,
            auto_lock_delay,
        }
    }

    /// Whether the actor may operate devices in this room.
    pub async fn check_access(&self, room_id: Uuid, actor: &Actor) -> Result<bool, EngineError> {
        if actor.is_admin() {
            return Ok(true);
        }
        if actor.is_cleaner() {
            return Ok(self.requests.has_open_assignment(room_id, actor.id).await?);
        }
        Ok(self
            .reservations
            .active_for_room_and_user(room_id, actor.id)
            .await?
            .is_some())
    }

    /// Unlock the door.
    ///
    /// For non-cleaner actors an auto-relock fires after the configured
    /// delay. Each manual door action bumps the room's lock epoch, so a
    /// newer unlock supersedes any timer still pending from an earlier one:
    /// only the latest schedule can produce an `auto_lock` entry.
    pub async fn unlock_door(&self, actor: &Actor, room_id: Uuid) -> Result<(), EngineError> {
        self.authorize(room_id, actor).await?;

        let now = self.clock.now();
        let relock_after = (!actor.is_cleaner()).then(|| {
            now + chrono::Duration::from_std(self.auto_lock_delay)
                .unwrap_or_else(|_| chrono::Duration::seconds(30))
        });
        let epoch = self
            .rooms
            .apply_device_mutation(
                room_id,
                DeviceMutation {
                    action: DeviceAction {
                        kind: DeviceActionKind::Unlock,
                        actor: DeviceActor::User(actor.id),
                        source: ActionSource::Manual,
                        at: now,
                    },
                    door_status: Some(DoorStatus::Unlocked),
                    light_status: None,
                    lock_deadline: Some(relock_after),
                    bump_epoch: true,
                },
            )
            .await?;

        tracing::info!(
            room_id = %room_id,
            user_id = %actor.id,
            auto_lock = relock_after.is_some(),
            "Door unlocked"
        );

        if relock_after.is_some() {
            let rooms = Arc::clone(&self.rooms);
            let clock = Arc::clone(&self.clock);
            let delay = self.auto_lock_delay;
            tokio::spawn(async move {
                clock.sleep(delay).await;
                match rooms.relock_if_expired(room_id, epoch, clock.now()).await {
                    Ok(true) => tracing::info!(room_id = %room_id, "Auto-lock engaged"),
                    Ok(false) => {}
                    Err(error) => {
                        tracing::warn!(room_id = %room_id, %error, "Auto-lock write failed")
                    }
                }
            });
        }
        Ok(())
    }

    /// Lock the door, cancelling any pending auto-relock.
    pub async fn lock_door(&self, actor: &Actor, room_id: Uuid) -> Result<(), EngineError> {
        self.authorize(room_id, actor).await?;

        self.rooms
            .apply_device_mutation(
                room_id,
                DeviceMutation {
                    action: DeviceAction {
                        kind: DeviceActionKind::Lock,
                        actor: DeviceActor::User(actor.id),
                        source: ActionSource::Manual,
                        at: self.clock.now(),
                    },
                    door_status: Some(DoorStatus::Locked),
                    light_status: None,
                    lock_deadline: Some(None),
                    bump_epoch: true,
                },
            )
            .await?;
        tracing::info!(room_id = %room_id, user_id = %actor.id, "Door locked");
        Ok(())
    }

    /// Flip the light. Returns the state after the toggle.
    pub async fn toggle_light(
        &self,
        actor: &Actor,
        room_id: Uuid,
    ) -> Result<LightStatus, EngineError> {
        self.authorize(room_id, actor).await?;

        let room = self.require_room(room_id).await?;
        let next = room.light_status.toggled();
        let kind = match next {
            LightStatus::On => DeviceActionKind::LightOn,
            LightStatus::Off => DeviceActionKind::LightOff,
        };
        self.rooms
            .apply_device_mutation(
                room_id,
                DeviceMutation {
                    action: DeviceAction {
                        kind,
                        actor: DeviceActor::User(actor.id),
                        source: ActionSource::Manual,
                        at: self.clock.now(),
                    },
                    door_status: None,
                    light_status: Some(next),
                    lock_deadline: None,
                    bump_epoch: false,
                },
            )
            .await?;
        tracing::info!(room_id = %room_id, user_id = %actor.id, light = %next, "Light toggled");
        Ok(next)
    }

    async fn authorize(&self, room_id: Uuid, actor: &Actor) -> Result<(), EngineError> {
        // Missing room surfaces as NotFound before any access judgement.
        self.require_room(room_id).await?;
        if self.check_access(room_id, actor).await? {
            Ok(())
        } else {
            Err(EngineError::AccessDenied {
                room_id,
                user_id: actor.id,
            })
        }
    }

    async fn require_room(&self, room_id: Uuid) -> Result<Room, EngineError> {
        self.rooms
            .find_by_id(room_id)
            .await?
            .ok_or(EngineError::not_found(Entity::Room, room_id))
    }
}
