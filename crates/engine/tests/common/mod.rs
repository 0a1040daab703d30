//! Common test utilities for integration tests.

// Allow dead code in this module - these are helper utilities that may not be
// used by all integration tests but are intentionally available.
#![allow(dead_code)]

use std::sync::Arc;

use domain::models::{Actor, Role, UserAccount};
use domain::services::RecordingNotifier;
use engine::{Clock, Engine, EngineConfig, SystemClock};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use persistence::repositories::UserRepository;
use persistence::MemoryStore;
use uuid::Uuid;

/// Assembled engine over a fresh in-memory store, with a recording
/// notification sink and one seeded admin.
pub struct TestEngine {
    pub engine: Arc<Engine>,
    pub store: MemoryStore,
    pub notifier: Arc<RecordingNotifier>,
    pub admin: Actor,
}

/// Engine on the wall clock.
pub async fn test_engine() -> TestEngine {
    engine_with_clock(Arc::new(SystemClock)).await
}

/// Engine on an arbitrary clock, for paused-time tests.
pub async fn engine_with_clock(clock: Arc<dyn Clock>) -> TestEngine {
    let config = EngineConfig::default();
    let notifier = Arc::new(RecordingNotifier::new());
    let (engine, store) = Engine::in_memory(&config, notifier.clone(), clock);
    let admin = seed_user(&store, Role::Admin).await;
    TestEngine {
        engine: Arc::new(engine),
        store,
        notifier,
        admin,
    }
}

/// Insert a user with a generated name and email, returning their actor.
pub async fn seed_user(store: &MemoryStore, role: Role) -> Actor {
    let account = UserAccount::new(
        Name().fake::<String>(),
        SafeEmail().fake::<String>(),
        role,
    );
    let actor = account.actor();
    store.users.insert(account).await.unwrap();
    actor
}

/// Provision a room as the fixture admin.
pub async fn provision_room(fx: &TestEngine, number: &str) -> Uuid {
    fx.engine
        .registry
        .provision_room(&fx.admin, number, 2, 1)
        .await
        .unwrap()
}
