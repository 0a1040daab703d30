//! Cleaning request repository.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use domain::error::{Entity, StoreError};
use domain::models::{CleaningRequest, CleaningRequestStatus};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::events::{EventBus, StoreEvent};

/// Narrow query over cleaning requests. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilter {
    pub status: Option<CleaningRequestStatus>,
    pub room_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

impl RequestFilter {
    fn matches(&self, request: &CleaningRequest) -> bool {
        self.status.is_none_or(|status| request.status == status)
            && self.room_id.is_none_or(|room| request.room_id == room)
            && self.user_id.is_none_or(|user| request.user_id == user)
            && self
                .assigned_to
                .is_none_or(|cleaner| request.assigned_to == Some(cleaner))
    }
}

/// Stamp applied when a request is completed.
#[derive(Debug, Clone, Copy)]
pub struct Completion {
    pub by: Uuid,
    pub at: DateTime<Utc>,
}

/// Cleaning request reads, assignment, and the guarded status transition.
#[async_trait::async_trait]
pub trait CleaningRequestRepository: Send + Sync {
    async fn insert(&self, request: CleaningRequest) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CleaningRequest>, StoreError>;

    /// Requests matching the filter, oldest first.
    async fn list(&self, filter: RequestFilter) -> Result<Vec<CleaningRequest>, StoreError>;

    /// Cleaners currently tied up by a request in an open status. The
    /// available-cleaners view is derived against this set.
    async fn busy_cleaner_ids(&self) -> Result<HashSet<Uuid>, StoreError>;

    /// Whether the cleaner has an open request assigned on this room; the
    /// device access check relies on it.
    async fn has_open_assignment(
        &self,
        room_id: Uuid,
        cleaner_id: Uuid,
    ) -> Result<bool, StoreError>;

    /// Stale-state guard, mirroring the reservation transition: fails with
    /// `Conflict` when the persisted status is no longer `expected`.
    async fn update_status_if(
        &self,
        id: Uuid,
        expected: CleaningRequestStatus,
        next: CleaningRequestStatus,
        completion: Option<Completion>,
    ) -> Result<CleaningRequest, StoreError>;

    /// Assign (or re-assign) a cleaner to a request.
    async fn assign(
        &self,
        id: Uuid,
        cleaner_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<CleaningRequest, StoreError>;
}

/// In-memory cleaning request collection.
#[derive(Debug, Default)]
pub struct MemoryCleaningRequestRepository {
    requests: RwLock<HashMap<Uuid, CleaningRequest>>,
    events: EventBus,
}

impl MemoryCleaningRequestRepository {
    pub fn new(events: EventBus) -> Self {
        Self {
            requests: RwLock::new(HashMap::new()),
            events,
        }
    }

    fn publish(&self, request: &CleaningRequest) {
        self.events.publish(StoreEvent::CleaningRequestUpserted {
            request_id: request.id,
            room_id: request.room_id,
            status: request.status,
        });
    }
}

#[async_trait::async_trait]
impl CleaningRequestRepository for MemoryCleaningRequestRepository {
    async fn insert(&self, request: CleaningRequest) -> Result<(), StoreError> {
        let snapshot = request.clone();
        self.requests.write().await.insert(request.id, request);
        self.publish(&snapshot);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CleaningRequest>, StoreError> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: RequestFilter) -> Result<Vec<CleaningRequest>, StoreError> {
        let mut requests: Vec<CleaningRequest> = self
            .requests
            .read()
            .await
            .values()
            .filter(|request| filter.matches(request))
            .cloned()
            .collect();
        requests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(requests)
    }

    async fn busy_cleaner_ids(&self) -> Result<HashSet<Uuid>, StoreError> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|request| request.status.is_open())
            .filter_map(|request| request.assigned_to)
            .collect())
    }

    async fn has_open_assignment(
        &self,
        room_id: Uuid,
        cleaner_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.requests.read().await.values().any(|request| {
            request.room_id == room_id
                && request.assigned_to == Some(cleaner_id)
                && request.status.is_open()
        }))
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: CleaningRequestStatus,
        next: CleaningRequestStatus,
        completion: Option<Completion>,
    ) -> Result<CleaningRequest, StoreError> {
        let mut requests = self.requests.write().await;
        let request = requests.get_mut(&id).ok_or(StoreError::Missing {
            entity: Entity::CleaningRequest,
            id,
        })?;
        if request.status != expected {
            return Err(StoreError::Conflict {
                entity: Entity::CleaningRequest,
                id,
            });
        }
        request.status = next;
        if let Some(completion) = completion {
            request.completed_at = Some(completion.at);
            request.completed_by = Some(completion.by);
        }
        request.updated_at = Utc::now();
        let updated = request.clone();
        drop(requests);

        self.publish(&updated);
        Ok(updated)
    }

    async fn assign(
        &self,
        id: Uuid,
        cleaner_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<CleaningRequest, StoreError> {
        let mut requests = self.requests.write().await;
        let request = requests.get_mut(&id).ok_or(StoreError::Missing {
            entity: Entity::CleaningRequest,
            id,
        })?;
        request.assigned_to = Some(cleaner_id);
        request.assigned_at = Some(at);
        request.updated_at = Utc::now();
        let updated = request.clone();
        drop(requests);

        self.publish(&updated);
        Ok(updated)
    }
}
