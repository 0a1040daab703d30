//! Reservation lifecycle: create, cancel, complete.
//!
//! `active -> {cancelled, completed}`, both terminal. Re-terminating a
//! reservation reports the specific error rather than succeeding silently;
//! retries can tell "already done" from "done by someone else just now".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::error::{EngineError, Entity, StoreError};
use domain::models::{
    Actor, CleaningStatus, Reservation, ReservationStatus, StayRange,
};
use domain::services::{Notification, NotificationKind, NotificationSink};
use persistence::repositories::{ReservationRepository, RoomRepository, UserRepository};
use uuid::Uuid;

use crate::availability::AvailabilityChecker;
use crate::locks::RoomLocks;

pub struct ReservationService {
    rooms: Arc<dyn RoomRepository>,
    reservations: Arc<dyn ReservationRepository>,
    users: Arc<dyn UserRepository>,
    availability: AvailabilityChecker,
    locks: Arc<RoomLocks>,
    notifier: Arc<dyn NotificationSink>,
}

impl ReservationService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        reservations: Arc<dyn ReservationRepository>,
        users: Arc<dyn UserRepository>,
        locks: Arc<RoomLocks>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let availability = AvailabilityChecker::new(Arc::clone(&reservations));
        Self {
            rooms,
            reservations,
            users,
            availability,
            locks,
            notifier,
        }
    }

    pub fn availability(&self) -> &AvailabilityChecker {
        &self.availability
    }

    /// Book a room for `[check_in, check_out)` on behalf of the actor.
    ///
    /// The availability check and the reservation write happen under the
    /// room's lock, so two concurrent bookings of overlapping stays cannot
    /// both succeed.
    pub async fn create(
        &self,
        actor: &Actor,
        room_id: Uuid,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    ) -> Result<Uuid, EngineError> {
        let stay = StayRange::new(check_in, check_out)?;
        if !actor.role.may_book() {
            return Err(EngineError::RoleNotAllowed { role: actor.role });
        }
        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or(EngineError::not_found(Entity::Room, room_id))?;

        let _guard = self.locks.acquire(room_id).await;
        if self.availability.is_occupied(room_id, &stay).await? {
            return Err(EngineError::RoomOccupied { room_id });
        }

        let reservation = Reservation::new(actor.id, room_id, stay);
        let reservation_id = reservation.id;
        self.reservations.insert(reservation).await?;
        // Second, non-transactional write: a failure here surfaces to the
        // caller so the occupancy flag can be reconciled instead of drifting
        // silently.
        self.rooms.set_occupancy(room_id, true, None).await?;
        drop(_guard);

        tracing::info!(
            reservation_id = %reservation_id,
            room_id = %room_id,
            user_id = %actor.id,
            "Reservation created"
        );

        let admin_ids: Vec<Uuid> = self
            .users
            .admins()
            .await?
            .into_iter()
            .map(|admin| admin.id)
            .collect();
        self.notifier
            .notify(
                &admin_ids,
                Notification::new(
                    NotificationKind::Reservation,
                    "New reservation",
                    format!(
                        "Room {} reserved from {} to {}",
                        room.number,
                        check_in.format("%Y-%m-%d"),
                        check_out.format("%Y-%m-%d")
                    ),
                )
                .with_data(serde_json::json!({
                    "reservation_id": reservation_id,
                    "room_id": room_id,
                })),
            )
            .await;
        self.notifier
            .notify(
                &[actor.id],
                Notification::new(
                    NotificationKind::Reservation,
                    "Reservation confirmed",
                    format!(
                        "Room {} is yours from {} to {}",
                        room.number,
                        check_in.format("%Y-%m-%d"),
                        check_out.format("%Y-%m-%d")
                    ),
                )
                .with_data(serde_json::json!({ "reservation_id": reservation_id })),
            )
            .await;

        Ok(reservation_id)
    }

    /// Cancel an active reservation and release the room.
    pub async fn cancel(&self, reservation_id: Uuid) -> Result<Reservation, EngineError> {
        let updated = self
            .terminate(reservation_id, ReservationStatus::Cancelled, "cancel")
            .await?;

        let room_number = self.room_number(updated.room_id).await;
        self.notifier
            .notify(
                &[updated.user_id],
                Notification::new(
                    NotificationKind::Reservation,
                    "Reservation cancelled",
                    format!("Your reservation for room {room_number} has been cancelled"),
                )
                .with_data(serde_json::json!({ "reservation_id": reservation_id })),
            )
            .await;
        Ok(updated)
    }

    /// Complete a stay (checkout) and release the room.
    pub async fn complete(&self, reservation_id: Uuid) -> Result<Reservation, EngineError> {
        self.terminate(reservation_id, ReservationStatus::Completed, "complete")
            .await
    }

    /// A user's reservations, newest first.
    pub async fn for_user(&self, user_id: Uuid) -> Result<Vec<Reservation>, EngineError> {
        Ok(self.reservations.list_for_user(user_id).await?)
    }

    async fn terminate(
        &self,
        reservation_id: Uuid,
        next: ReservationStatus,
        attempted: &'static str,
    ) -> Result<Reservation, EngineError> {
        let reservation = self
            .reservations
            .find_by_id(reservation_id)
            .await?
            .ok_or(EngineError::not_found(Entity::Reservation, reservation_id))?;
        Self::terminal_error(&reservation, attempted)?;

        let _guard = self.locks.acquire(reservation.room_id).await;
        let updated = match self
            .reservations
            .set_status_if(reservation_id, ReservationStatus::Active, next)
            .await
        {
            Ok(updated) => updated,
            // Lost a race with another terminal transition: re-read and
            // report the state that actually won.
            Err(StoreError::Conflict { .. }) => {
                let current = self
                    .reservations
                    .find_by_id(reservation_id)
                    .await?
                    .ok_or(EngineError::not_found(Entity::Reservation, reservation_id))?;
                Self::terminal_error(&current, attempted)?;
                return Err(StoreError::Conflict {
                    entity: Entity::Reservation,
                    id: reservation_id,
                }
                .into());
            }
            Err(error) => return Err(error.into()),
        };

        self.rooms
            .set_occupancy(
                updated.room_id,
                false,
                Some(CleaningStatus::NeedsCleaning),
            )
            .await?;
        drop(_guard);

        tracing::info!(
            reservation_id = %reservation_id,
            room_id = %updated.room_id,
            status = %updated.status,
            "Reservation closed"
        );
        Ok(updated)
    }

    fn terminal_error(
        reservation: &Reservation,
        attempted: &'static str,
    ) -> Result<(), EngineError> {
        match reservation.status {
            ReservationStatus::Active => Ok(()),
            ReservationStatus::Cancelled if attempted == "cancel" => {
                Err(EngineError::AlreadyCancelled { id: reservation.id })
            }
            status => Err(EngineError::InvalidState {
                id: reservation.id,
                status,
                attempted,
            }),
        }
    }

    async fn room_number(&self, room_id: Uuid) -> String {
        match self.rooms.find_by_id(room_id).await {
            Ok(Some(room)) => room.number,
            _ => room_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use domain::models::{Role, Room};
    use domain::services::RecordingNotifier;
    use persistence::MemoryStore;

    struct Fixture {
        service: ReservationService,
        notifier: Arc<RecordingNotifier>,
        room_id: Uuid,
        guest: Actor,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::default();
        let notifier = Arc::new(RecordingNotifier::new());
        let room = Room::new("204", 2, 1);
        let room_id = room.id;
        store.rooms.insert(room).await.unwrap();

        let service = ReservationService::new(
            store.rooms.clone(),
            store.reservations.clone(),
            store.users.clone(),
            Arc::new(RoomLocks::new()),
            notifier.clone(),
        );
        Fixture {
            service,
            notifier,
            room_id,
            guest: Actor::new(Uuid::new_v4(), Role::User),
        }
    }

    fn date(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_range() {
        let fx = fixture().await;
        let result = fx
            .service
            .create(&fx.guest, fx.room_id, date(5), date(1))
            .await;
        assert!(matches!(result, Err(EngineError::InvalidRange { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_cleaner() {
        let fx = fixture().await;
        let cleaner = Actor::new(Uuid::new_v4(), Role::Cleaner);
        let result = fx
            .service
            .create(&cleaner, fx.room_id, date(1), date(5))
            .await;
        assert!(matches!(result, Err(EngineError::RoleNotAllowed { .. })));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_room() {
        let fx = fixture().await;
        let result = fx
            .service
            .create(&fx.guest, Uuid::new_v4(), date(1), date(5))
            .await;
        assert!(matches!(
            result,
            Err(EngineError::NotFound {
                entity: Entity::Room,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_overlap_and_allows_back_to_back() {
        let fx = fixture().await;
        fx.service
            .create(&fx.guest, fx.room_id, date(3), date(7))
            .await
            .unwrap();

        let overlap = fx
            .service
            .create(&fx.guest, fx.room_id, date(1), date(5))
            .await;
        assert!(matches!(overlap, Err(EngineError::RoomOccupied { .. })));

        // Checkout day equals the next check-in: allowed.
        fx.service
            .create(&fx.guest, fx.room_id, date(7), date(9))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_notifies_guest() {
        let fx = fixture().await;
        fx.service
            .create(&fx.guest, fx.room_id, date(1), date(5))
            .await
            .unwrap();

        let sent = fx.notifier.sent_to(fx.guest.id).await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Reservation confirmed");
        assert!(sent[0].body.contains("204"));
    }

    #[tokio::test]
    async fn test_cancel_twice_reports_already_cancelled() {
        let fx = fixture().await;
        let id = fx
            .service
            .create(&fx.guest, fx.room_id, date(1), date(5))
            .await
            .unwrap();

        fx.service.cancel(id).await.unwrap();
        let second = fx.service.cancel(id).await;
        assert!(matches!(second, Err(EngineError::AlreadyCancelled { .. })));
    }

    #[tokio::test]
    async fn test_cancel_completed_is_invalid_state() {
        let fx = fixture().await;
        let id = fx
            .service
            .create(&fx.guest, fx.room_id, date(1), date(5))
            .await
            .unwrap();

        fx.service.complete(id).await.unwrap();
        let result = fx.service.cancel(id).await;
        assert!(matches!(
            result,
            Err(EngineError::InvalidState {
                status: ReservationStatus::Completed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_complete_twice_is_invalid_state() {
        let fx = fixture().await;
        let id = fx
            .service
            .create(&fx.guest, fx.room_id, date(1), date(5))
            .await
            .unwrap();

        fx.service.complete(id).await.unwrap();
        let second = fx.service.complete(id).await;
        assert!(matches!(second, Err(EngineError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_terminated_stay_frees_room_and_marks_cleaning() {
        let fx = fixture().await;
        let id = fx
            .service
            .create(&fx.guest, fx.room_id, date(1), date(5))
            .await
            .unwrap();
        fx.service.complete(id).await.unwrap();

        let room = fx
            .service
            .rooms
            .find_by_id(fx.room_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!room.is_occupied);
        assert_eq!(room.cleaning_status, CleaningStatus::NeedsCleaning);
    }
}
