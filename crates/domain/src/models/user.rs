//! Actors and user accounts.
//!
//! Authentication is handled outside the engine; every operation receives an
//! already-authenticated [`Actor`]. User accounts exist so the engine can
//! look up cleaners for auto-assignment and admins for notification fan-out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role supplied by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Cleaner,
    User,
}

impl Role {
    /// Cleaning staff cannot book rooms for themselves.
    pub fn may_book(self) -> bool {
        !matches!(self, Role::Cleaner)
    }

    /// Roles allowed to drive cleaning-request transitions.
    pub fn may_process_cleaning(self) -> bool {
        matches!(self, Role::Admin | Role::Cleaner)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Cleaner => write!(f, "cleaner"),
            Role::User => write!(f, "user"),
        }
    }
}

/// The authenticated caller of an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_cleaner(&self) -> bool {
        self.role == Role::Cleaner
    }
}

/// A stored user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
            created_at: Utc::now(),
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Cleaner.to_string(), "cleaner");
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn test_booking_permission() {
        assert!(Role::Admin.may_book());
        assert!(Role::User.may_book());
        assert!(!Role::Cleaner.may_book());
    }

    #[test]
    fn test_cleaning_processing_permission() {
        assert!(Role::Admin.may_process_cleaning());
        assert!(Role::Cleaner.may_process_cleaning());
        assert!(!Role::User.may_process_cleaning());
    }

    #[test]
    fn test_account_actor() {
        let account = UserAccount::new("Marta", "marta@example.com", Role::Cleaner);
        let actor = account.actor();
        assert_eq!(actor.id, account.id);
        assert!(actor.is_cleaner());
        assert!(!actor.is_admin());
    }
}
