//! Engine error taxonomy.
//!
//! Every operation surfaces failures synchronously as one of these variants,
//! carrying the entity id and attempted transition so callers can render a
//! user-facing message. The engine never retries on its own.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CleaningRequestStatus, ReservationStatus, Role};

/// Kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Room,
    Reservation,
    CleaningRequest,
    User,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Room => write!(f, "room"),
            Entity::Reservation => write!(f, "reservation"),
            Entity::CleaningRequest => write!(f, "cleaning request"),
            Entity::User => write!(f, "user"),
        }
    }
}

/// Failures from the persistence layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    Missing { entity: Entity, id: Uuid },

    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: Entity, id: Uuid },
}

/// Typed failures surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("check-in {check_in} must fall before check-out {check_out}")]
    InvalidRange {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    },

    #[error("role {role} may not book rooms")]
    RoleNotAllowed { role: Role },

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: Uuid },

    #[error("room {room_id} already has a reservation overlapping the requested dates")]
    RoomOccupied { room_id: Uuid },

    #[error("reservation {id} is already cancelled")]
    AlreadyCancelled { id: Uuid },

    #[error("reservation {id} is {status}; cannot {attempted}")]
    InvalidState {
        id: Uuid,
        status: ReservationStatus,
        attempted: &'static str,
    },

    #[error("user {user_id} has no active reservation for room {room_id}")]
    NoActiveReservation { room_id: Uuid, user_id: Uuid },

    #[error("cleaning request {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: CleaningRequestStatus,
        to: CleaningRequestStatus,
    },

    #[error("user {user_id} may not operate devices in room {room_id}")]
    AccessDenied { room_id: Uuid, user_id: Uuid },

    #[error("{role} {user_id} may not {attempted}")]
    Unauthorized {
        user_id: Uuid,
        role: Role,
        attempted: &'static str,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn not_found(entity: Entity, id: Uuid) -> Self {
        EngineError::NotFound { entity, id }
    }
}
