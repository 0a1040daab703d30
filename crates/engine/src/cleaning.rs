//! Cleaning request workflow.
//!
//! `pending -> {approved, rejected}`, `approved -> completed`. A request is
//! created against the guest's active reservation and auto-assigned to the
//! first cleaner with no other open request.

use std::sync::Arc;

use chrono::Utc;
use domain::error::{EngineError, Entity, StoreError};
use domain::models::{
    Actor, CleaningRequest, CleaningRequestStatus, CleaningStatus, RequestType, Role, UserAccount,
};
use domain::services::{Notification, NotificationKind, NotificationSink};
use persistence::repositories::{
    CleaningRequestRepository, Completion, RequestFilter, ReservationRepository, RoomRepository,
    UserRepository,
};
use uuid::Uuid;

pub struct CleaningService {
    rooms: Arc<dyn RoomRepository>,
    reservations: Arc<dyn ReservationRepository>,
    requests: Arc<dyn CleaningRequestRepository>,
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn NotificationSink>,
}

impl CleaningService {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        reservations: Arc<dyn ReservationRepository>,
        requests: Arc<dyn CleaningRequestRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            rooms,
            reservations,
            requests,
            users,
            notifier,
        }
    }

    /// File a cleaning request for the actor's current stay.
    ///
    /// Requires an active reservation with the given id, held by the actor,
    /// on the given room. Auto-assigns a free cleaner when one exists;
    /// otherwise the request stays unassigned until an admin steps in.
    pub async fn create_request(
        &self,
        actor: &Actor,
        room_id: Uuid,
        reservation_id: Uuid,
        request_type: RequestType,
        notes: Option<String>,
    ) -> Result<Uuid, EngineError> {
        let holds_reservation = self
            .reservations
            .find_by_id(reservation_id)
            .await?
            .is_some_and(|reservation| {
                reservation.is_active()
                    && reservation.user_id == actor.id
                    && reservation.room_id == room_id
            });
        if !holds_reservation {
            return Err(EngineError::NoActiveReservation {
                room_id,
                user_id: actor.id,
            });
        }
        let room = self
            .rooms
            .find_by_id(room_id)
            .await?
            .ok_or(EngineError::not_found(Entity::Room, room_id))?;

        let mut request =
            CleaningRequest::new(room_id, actor.id, reservation_id, request_type, notes);
        let assignee = self.first_free_cleaner().await?;
        if let Some(cleaner) = &assignee {
            request.assigned_to = Some(cleaner.id);
            request.assigned_at = Some(Utc::now());
        }
        let request_id = request.id;
        self.requests.insert(request).await?;

        tracing::info!(
            request_id = %request_id,
            room_id = %room_id,
            user_id = %actor.id,
            request_type = %request_type,
            assigned = assignee.is_some(),
            "Cleaning request created"
        );

        if let Some(cleaner) = assignee {
            self.notify_task(cleaner.id, request_id, &room.number, request_type)
                .await;
        }
        Ok(request_id)
    }

    /// Advance a request along its transition table.
    ///
    /// Only cleaners and admins process requests. Completion stamps the
    /// acting cleaner and flips the room's cleaning status.
    pub async fn update_status(
        &self,
        actor: &Actor,
        request_id: Uuid,
        next: CleaningRequestStatus,
    ) -> Result<CleaningRequest, EngineError> {
        if !actor.role.may_process_cleaning() {
            return Err(EngineError::Unauthorized {
                user_id: actor.id,
                role: actor.role,
                attempted: "process cleaning requests",
            });
        }
        let request = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(EngineError::not_found(Entity::CleaningRequest, request_id))?;
        if !request.status.can_transition_to(next) {
            return Err(EngineError::InvalidTransition {
                id: request_id,
                from: request.status,
                to: next,
            });
        }

        let completion = (next == CleaningRequestStatus::Completed).then(|| Completion {
            by: actor.id,
            at: Utc::now(),
        });
        let updated = match self
            .requests
            .update_status_if(request_id, request.status, next, completion)
            .await
        {
            Ok(updated) => updated,
            // Someone else moved the request first; report against the
            // status that actually won.
            Err(StoreError::Conflict { .. }) => {
                let current = self
                    .requests
                    .find_by_id(request_id)
                    .await?
                    .ok_or(EngineError::not_found(Entity::CleaningRequest, request_id))?;
                return Err(EngineError::InvalidTransition {
                    id: request_id,
                    from: current.status,
                    to: next,
                });
            }
            Err(error) => return Err(error.into()),
        };

        tracing::info!(
            request_id = %request_id,
            from = %request.status,
            to = %next,
            actor_id = %actor.id,
            "Cleaning request transitioned"
        );

        match next {
            CleaningRequestStatus::Approved => {
                self.rooms
                    .set_cleaning_status(updated.room_id, CleaningStatus::InProgress, None)
                    .await?;
            }
            CleaningRequestStatus::Completed => {
                self.rooms
                    .set_cleaning_status(updated.room_id, CleaningStatus::Clean, Some(Utc::now()))
                    .await?;
                self.notifier
                    .notify(
                        &[updated.user_id],
                        Notification::new(
                            NotificationKind::Cleaning,
                            "Cleaning completed",
                            "Your room has been cleaned",
                        )
                        .with_data(serde_json::json!({ "request_id": request_id })),
                    )
                    .await;
            }
            CleaningRequestStatus::Rejected => {
                self.notifier
                    .notify(
                        &[updated.user_id],
                        Notification::new(
                            NotificationKind::Cleaning,
                            "Cleaning request declined",
                            "Your cleaning request could not be scheduled",
                        )
                        .with_data(serde_json::json!({ "request_id": request_id })),
                    )
                    .await;
            }
            CleaningRequestStatus::Pending => {}
        }
        Ok(updated)
    }

    /// Admin override of auto-assignment.
    pub async fn assign_cleaner(
        &self,
        actor: &Actor,
        request_id: Uuid,
        cleaner_id: Uuid,
    ) -> Result<CleaningRequest, EngineError> {
        if !actor.is_admin() {
            return Err(EngineError::Unauthorized {
                user_id: actor.id,
                role: actor.role,
                attempted: "assign cleaners",
            });
        }
        let cleaner = self
            .users
            .find_by_id(cleaner_id)
            .await?
            .ok_or(EngineError::not_found(Entity::User, cleaner_id))?;
        if cleaner.role != Role::Cleaner {
            return Err(EngineError::Unauthorized {
                user_id: cleaner_id,
                role: cleaner.role,
                attempted: "take cleaning assignments",
            });
        }
        let request = self
            .requests
            .find_by_id(request_id)
            .await?
            .ok_or(EngineError::not_found(Entity::CleaningRequest, request_id))?;

        let updated = self.requests.assign(request_id, cleaner_id, Utc::now()).await?;
        tracing::info!(
            request_id = %request_id,
            cleaner_id = %cleaner_id,
            admin_id = %actor.id,
            "Cleaner assigned"
        );

        let room_number = match self.rooms.find_by_id(request.room_id).await? {
            Some(room) => room.number,
            None => request.room_id.to_string(),
        };
        self.notify_task(cleaner_id, request_id, &room_number, updated.request_type)
            .await;
        Ok(updated)
    }

    /// Cleaners with no open request assigned to them. Derived, not stored.
    pub async fn available_cleaners(&self) -> Result<Vec<UserAccount>, EngineError> {
        let busy = self.requests.busy_cleaner_ids().await?;
        Ok(self
            .users
            .cleaners()
            .await?
            .into_iter()
            .filter(|cleaner| !busy.contains(&cleaner.id))
            .collect())
    }

    /// Requests matching a filter, oldest first.
    pub async fn requests(
        &self,
        filter: RequestFilter,
    ) -> Result<Vec<CleaningRequest>, EngineError> {
        Ok(self.requests.list(filter).await?)
    }

    async fn first_free_cleaner(&self) -> Result<Option<UserAccount>, EngineError> {
        let busy = self.requests.busy_cleaner_ids().await?;
        Ok(self
            .users
            .cleaners()
            .await?
            .into_iter()
            .find(|cleaner| !busy.contains(&cleaner.id)))
    }

    async fn notify_task(
        &self,
        cleaner_id: Uuid,
        request_id: Uuid,
        room_number: &str,
        request_type: RequestType,
    ) {
        self.notifier
            .notify(
                &[cleaner_id],
                Notification::new(
                    NotificationKind::Cleaning,
                    "New cleaning task",
                    format!("You have been assigned room {room_number}"),
                )
                .with_data(serde_json::json!({
                    "request_id": request_id,
                    "request_type": request_type,
                })),
            )
            .await;
    }
}
