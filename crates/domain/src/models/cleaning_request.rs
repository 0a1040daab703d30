//! Cleaning request model and its transition table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a cleaning request.
///
/// Legal transitions: `pending -> {approved, rejected}` and
/// `approved -> completed`. `Rejected` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningRequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl CleaningRequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CleaningRequestStatus::Rejected | CleaningRequestStatus::Completed
        )
    }

    /// Whether a request in this status keeps its assigned cleaner busy.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            CleaningRequestStatus::Pending | CleaningRequestStatus::Approved
        )
    }

    /// The transition table. Everything not listed here is rejected,
    /// including `pending -> completed` shortcuts and any move out of a
    /// terminal status.
    pub fn can_transition_to(self, next: CleaningRequestStatus) -> bool {
        matches!(
            (self, next),
            (
                CleaningRequestStatus::Pending,
                CleaningRequestStatus::Approved | CleaningRequestStatus::Rejected,
            ) | (
                CleaningRequestStatus::Approved,
                CleaningRequestStatus::Completed,
            )
        )
    }
}

impl std::fmt::Display for CleaningRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleaningRequestStatus::Pending => write!(f, "pending"),
            CleaningRequestStatus::Approved => write!(f, "approved"),
            CleaningRequestStatus::Rejected => write!(f, "rejected"),
            CleaningRequestStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Urgency of a cleaning request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    Regular,
    Urgent,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestType::Regular => write!(f, "regular"),
            RequestType::Urgent => write!(f, "urgent"),
        }
    }
}

/// A guest's request to have their room cleaned, tied to the active
/// reservation it was made under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CleaningRequest {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub reservation_id: Uuid,
    pub status: CleaningRequestStatus,
    pub request_type: RequestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CleaningRequest {
    pub fn new(
        room_id: Uuid,
        user_id: Uuid,
        reservation_id: Uuid,
        request_type: RequestType,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            room_id,
            user_id,
            reservation_id,
            status: CleaningRequestStatus::Pending,
            request_type,
            notes,
            assigned_to: None,
            assigned_at: None,
            completed_at: None,
            completed_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(CleaningRequestStatus::Pending.to_string(), "pending");
        assert_eq!(CleaningRequestStatus::Approved.to_string(), "approved");
        assert_eq!(CleaningRequestStatus::Rejected.to_string(), "rejected");
        assert_eq!(CleaningRequestStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn test_legal_transitions() {
        use CleaningRequestStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Completed));
    }

    #[test]
    fn test_illegal_transitions() {
        use CleaningRequestStatus::*;
        // No shortcut past approval.
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Approved.can_transition_to(Rejected));
        // Terminal statuses are final.
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Approved));
        assert!(!Rejected.can_transition_to(Approved));
        // Self-transitions are not transitions.
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn test_open_statuses_keep_cleaner_busy() {
        assert!(CleaningRequestStatus::Pending.is_open());
        assert!(CleaningRequestStatus::Approved.is_open());
        assert!(!CleaningRequestStatus::Rejected.is_open());
        assert!(!CleaningRequestStatus::Completed.is_open());
    }

    #[test]
    fn test_new_request_is_pending_and_unassigned() {
        let request = CleaningRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            RequestType::Urgent,
            Some("extra towels".to_string()),
        );
        assert_eq!(request.status, CleaningRequestStatus::Pending);
        assert!(request.assigned_to.is_none());
        assert!(request.assigned_at.is_none());
        assert!(request.completed_at.is_none());
    }
}
