//! Availability check: does any active reservation overlap a requested stay?

use std::sync::Arc;

use domain::error::EngineError;
use domain::models::StayRange;
use persistence::repositories::ReservationRepository;
use uuid::Uuid;

/// Read-only overlap scan over a room's active reservations.
///
/// Cancelled and completed reservations never block a booking, and
/// back-to-back stays (checkout instant equals the next check-in) are
/// allowed. Safe to call concurrently; it reflects whatever reservation
/// state is committed at call time.
#[derive(Clone)]
pub struct AvailabilityChecker {
    reservations: Arc<dyn ReservationRepository>,
}

impl AvailabilityChecker {
    pub fn new(reservations: Arc<dyn ReservationRepository>) -> Self {
        Self { reservations }
    }

    pub async fn is_occupied(&self, room_id: Uuid, stay: &StayRange) -> Result<bool, EngineError> {
        let active = self.reservations.active_for_room(room_id).await?;
        let occupied = active
            .iter()
            .any(|reservation| reservation.stay.overlaps(stay));
        if occupied {
            tracing::debug!(room_id = %room_id, "Requested stay overlaps an active reservation");
        }
        Ok(occupied)
    }
}
