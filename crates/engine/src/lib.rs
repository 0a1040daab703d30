//! Booking and operational-state engine for a small hotel.
//!
//! The engine owns the rules; it is embedded by whatever surface exposes it:
//! - availability and the reservation lifecycle (book, cancel, complete),
//! - the cleaning-request workflow with cleaner auto-assignment,
//! - in-room device control with a timed auto-relock,
//! - notification fan-out to admins, cleaners, and guests.
//!
//! All state goes through the repository traits in the `persistence` crate;
//! [`Engine::in_memory`] wires the bundled in-memory store.

pub mod availability;
pub mod cleaning;
pub mod clock;
pub mod config;
pub mod devices;
pub mod locks;
pub mod logging;
pub mod registry;
pub mod reservations;

use std::sync::Arc;

use domain::services::NotificationSink;
use persistence::repositories::{
    CleaningRequestRepository, ReservationRepository, RoomRepository, UserRepository,
};
use persistence::MemoryStore;

pub use crate::availability::AvailabilityChecker;
pub use crate::cleaning::CleaningService;
pub use crate::clock::{Clock, PausedClock, SystemClock};
pub use crate::config::EngineConfig;
pub use crate::devices::DeviceService;
pub use crate::locks::RoomLocks;
pub use crate::registry::RoomRegistry;
pub use crate::reservations::ReservationService;

/// The assembled engine: one service per workflow, sharing repositories,
/// the per-room lock registry, and the notification sink.
pub struct Engine {
    pub registry: RoomRegistry,
    pub reservations: ReservationService,
    pub cleaning: CleaningService,
    pub devices: DeviceService,
}

impl Engine {
    pub fn new(
        config: &EngineConfig,
        rooms: Arc<dyn RoomRepository>,
        reservations: Arc<dyn ReservationRepository>,
        requests: Arc<dyn CleaningRequestRepository>,
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let locks = Arc::new(RoomLocks::new());
        Self {
            registry: RoomRegistry::new(
                Arc::clone(&rooms),
                Arc::clone(&reservations),
                Arc::clone(&users),
                Arc::clone(&clock),
            ),
            reservations: ReservationService::new(
                Arc::clone(&rooms),
                Arc::clone(&reservations),
                Arc::clone(&users),
                Arc::clone(&locks),
                Arc::clone(&notifier),
            ),
            cleaning: CleaningService::new(
                Arc::clone(&rooms),
                Arc::clone(&reservations),
                Arc::clone(&requests),
                Arc::clone(&users),
                Arc::clone(&notifier),
            ),
            devices: DeviceService::new(
                rooms,
                reservations,
                requests,
                clock,
                config.auto_lock_delay(),
            ),
        }
    }

    /// Engine over a fresh in-memory store, returned alongside the store so
    /// callers can subscribe to its change feed.
    pub fn in_memory(
        config: &EngineConfig,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> (Self, MemoryStore) {
        let store = MemoryStore::new(config.event_capacity);
        let engine = Self::new(
            config,
            store.rooms.clone(),
            store.reservations.clone(),
            store.cleaning_requests.clone(),
            store.users.clone(),
            notifier,
            clock,
        );
        (engine, store)
    }
}
