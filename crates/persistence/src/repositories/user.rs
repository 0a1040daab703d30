//! User account repository.

use std::collections::HashMap;

use domain::error::StoreError;
use domain::models::{Role, UserAccount};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::events::{EventBus, StoreEvent};

/// User lookups needed by the engine: cleaner auto-assignment and admin
/// notification fan-out.
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: UserAccount) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, StoreError>;

    /// All accounts with the cleaner role, ordered by name for deterministic
    /// auto-assignment.
    async fn cleaners(&self) -> Result<Vec<UserAccount>, StoreError>;

    /// All admin accounts.
    async fn admins(&self) -> Result<Vec<UserAccount>, StoreError>;
}

/// In-memory user collection.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, UserAccount>>,
    events: EventBus,
}

impl MemoryUserRepository {
    pub fn new(events: EventBus) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            events,
        }
    }

    async fn with_role(&self, role: Role) -> Vec<UserAccount> {
        let mut users: Vec<UserAccount> = self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: UserAccount) -> Result<(), StoreError> {
        let user_id = user.id;
        self.users.write().await.insert(user_id, user);
        self.events.publish(StoreEvent::UserInserted { user_id });
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn cleaners(&self) -> Result<Vec<UserAccount>, StoreError> {
        Ok(self.with_role(Role::Cleaner).await)
    }

    async fn admins(&self) -> Result<Vec<UserAccount>, StoreError> {
        Ok(self.with_role(Role::Admin).await)
    }
}
