//! Integration tests for door and light control.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use common::{engine_with_clock, provision_room, seed_user, test_engine, TestEngine};
use domain::error::EngineError;
use domain::models::{Actor, DeviceActionKind, DoorStatus, LightStatus, Role};
use engine::PausedClock;
use persistence::repositories::RoomRepository;
use uuid::Uuid;

/// Room with an active reservation held by a fresh guest.
async fn guest_with_stay(fx: &TestEngine, number: &str) -> (Uuid, Actor) {
    let room_id = provision_room(fx, number).await;
    let guest = seed_user(&fx.store, Role::User).await;
    let now = Utc::now();
    fx.engine
        .reservations
        .create(
            &guest,
            room_id,
            now - ChronoDuration::hours(1),
            now + ChronoDuration::days(1),
        )
        .await
        .unwrap();
    (room_id, guest)
}

// ============================================================================
// Access control
// ============================================================================

#[tokio::test]
async fn test_stranger_cannot_operate_devices() {
    let fx = test_engine().await;
    let (room_id, _guest) = guest_with_stay(&fx, "401").await;
    let stranger = seed_user(&fx.store, Role::User).await;

    let unlock = fx.engine.devices.unlock_door(&stranger, room_id).await;
    assert!(matches!(unlock, Err(EngineError::AccessDenied { .. })));
    let light = fx.engine.devices.toggle_light(&stranger, room_id).await;
    assert!(matches!(light, Err(EngineError::AccessDenied { .. })));
}

#[tokio::test]
async fn test_guest_toggles_light_during_stay() {
    let fx = test_engine().await;
    let (room_id, guest) = guest_with_stay(&fx, "402").await;

    assert_eq!(
        fx.engine.devices.toggle_light(&guest, room_id).await.unwrap(),
        LightStatus::On
    );
    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert_eq!(details.room.light_status, LightStatus::On);
    assert_eq!(
        details.room.door_actions.last().unwrap().kind,
        DeviceActionKind::LightOn
    );
}

// ============================================================================
// Auto-lock
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_guest_unlock_relocks_after_delay() {
    let fx = engine_with_clock(Arc::new(PausedClock::new())).await;
    let (room_id, guest) = guest_with_stay(&fx, "403").await;

    fx.engine.devices.unlock_door(&guest, room_id).await.unwrap();

    tokio::time::sleep(Duration::from_secs(29)).await;
    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert_eq!(details.room.door_status, DoorStatus::Unlocked);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert_eq!(details.room.door_status, DoorStatus::Locked);
    assert_eq!(
        details.room.door_actions.last().unwrap().kind,
        DeviceActionKind::AutoLock
    );
}

#[tokio::test(start_paused = true)]
async fn test_second_unlock_extends_the_window() {
    let fx = engine_with_clock(Arc::new(PausedClock::new())).await;
    let (room_id, guest) = guest_with_stay(&fx, "404").await;

    fx.engine.devices.unlock_door(&guest, room_id).await.unwrap();
    tokio::time::sleep(Duration::from_secs(20)).await;
    fx.engine.devices.unlock_door(&guest, room_id).await.unwrap();

    // 29s after the second unlock the first timer has long expired; the
    // door must still be open because that timer was superseded.
    tokio::time::sleep(Duration::from_secs(29)).await;
    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert_eq!(details.room.door_status, DoorStatus::Unlocked);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert_eq!(details.room.door_status, DoorStatus::Locked);
    let auto_locks = details
        .room
        .door_actions
        .iter()
        .filter(|action| action.kind == DeviceActionKind::AutoLock)
        .count();
    assert_eq!(auto_locks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_manual_lock_wins_over_timer() {
    let fx = engine_with_clock(Arc::new(PausedClock::new())).await;
    let (room_id, guest) = guest_with_stay(&fx, "405").await;

    fx.engine.devices.unlock_door(&guest, room_id).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    fx.engine.devices.lock_door(&guest, room_id).await.unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;
    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert_eq!(details.room.door_status, DoorStatus::Locked);
    assert!(details
        .room
        .door_actions
        .iter()
        .all(|action| action.kind != DeviceActionKind::AutoLock));
}

#[tokio::test]
async fn test_read_reconciles_deadline_without_timer() {
    let fx = test_engine().await;
    let (room_id, _guest) = guest_with_stay(&fx, "406").await;

    // A deadline in the past with no timer behind it, as after a restart.
    let mut room = fx.store.rooms.find_by_id(room_id).await.unwrap().unwrap();
    room.door_status = DoorStatus::Unlocked;
    room.lock_deadline = Some(Utc::now() - ChronoDuration::seconds(10));
    fx.store.rooms.insert(room).await.unwrap();

    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert_eq!(details.room.door_status, DoorStatus::Locked);
    assert!(details.room.lock_deadline.is_none());
}

// ============================================================================
// Cleaner access
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_assigned_cleaner_unlocks_without_auto_lock() {
    let fx = engine_with_clock(Arc::new(PausedClock::new())).await;
    let cleaner = seed_user(&fx.store, Role::Cleaner).await;
    let (room_id, guest) = guest_with_stay(&fx, "407").await;

    let reservation = &fx.engine.reservations.for_user(guest.id).await.unwrap()[0];
    fx.engine
        .cleaning
        .create_request(
            &guest,
            room_id,
            reservation.id,
            domain::models::RequestType::Regular,
            None,
        )
        .await
        .unwrap();

    fx.engine.devices.unlock_door(&cleaner, room_id).await.unwrap();
    tokio::time::sleep(Duration::from_secs(300)).await;

    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert_eq!(details.room.door_status, DoorStatus::Unlocked);
    assert!(details.room.lock_deadline.is_none());
}
