//! Integration tests for the reservation lifecycle.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{provision_room, seed_user, test_engine};
use domain::error::EngineError;
use domain::models::{CleaningStatus, ReservationStatus, Role};
use std::sync::Arc;

fn date(d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, d, 14, 0, 0).unwrap()
}

// ============================================================================
// Booking
// ============================================================================

#[tokio::test]
async fn test_booking_end_to_end() {
    let fx = test_engine().await;
    let room_id = provision_room(&fx, "204").await;
    let guest = seed_user(&fx.store, Role::User).await;

    let reservation_id = fx
        .engine
        .reservations
        .create(&guest, room_id, date(1), date(5))
        .await
        .unwrap();

    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert!(details.room.is_occupied);

    let mine = fx.engine.reservations.for_user(guest.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, reservation_id);
    assert_eq!(mine[0].status, ReservationStatus::Active);

    // Both the admin and the guest hear about the booking.
    assert_eq!(fx.notifier.sent_to(fx.admin.id).await.len(), 1);
    let guest_mail = fx.notifier.sent_to(guest.id).await;
    assert_eq!(guest_mail.len(), 1);
    assert_eq!(guest_mail[0].title, "Reservation confirmed");
}

#[tokio::test]
async fn test_concurrent_booking_has_single_winner() {
    let fx = test_engine().await;
    let room_id = provision_room(&fx, "205").await;
    let first = seed_user(&fx.store, Role::User).await;
    let second = seed_user(&fx.store, Role::User).await;

    let engine_a = Arc::clone(&fx.engine);
    let engine_b = Arc::clone(&fx.engine);
    let (a, b) = tokio::join!(
        tokio::spawn(async move {
            engine_a
                .reservations
                .create(&first, room_id, date(10), date(14))
                .await
        }),
        tokio::spawn(async move {
            engine_b
                .reservations
                .create(&second, room_id, date(12), date(16))
                .await
        }),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(EngineError::RoomOccupied { .. }))));
}

#[tokio::test]
async fn test_booking_other_room_unaffected() {
    let fx = test_engine().await;
    let first = provision_room(&fx, "206").await;
    let other = provision_room(&fx, "207").await;
    let guest = seed_user(&fx.store, Role::User).await;

    fx.engine
        .reservations
        .create(&guest, first, date(1), date(5))
        .await
        .unwrap();
    fx.engine
        .reservations
        .create(&guest, other, date(1), date(5))
        .await
        .unwrap();
}

// ============================================================================
// Cancellation and checkout
// ============================================================================

#[tokio::test]
async fn test_cancel_releases_room_and_notifies_guest() {
    let fx = test_engine().await;
    let room_id = provision_room(&fx, "208").await;
    let guest = seed_user(&fx.store, Role::User).await;

    let id = fx
        .engine
        .reservations
        .create(&guest, room_id, date(1), date(5))
        .await
        .unwrap();
    let cancelled = fx.engine.reservations.cancel(id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);

    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert!(!details.room.is_occupied);
    assert_eq!(details.room.cleaning_status, CleaningStatus::NeedsCleaning);

    let titles: Vec<String> = fx
        .notifier
        .sent_to(guest.id)
        .await
        .into_iter()
        .map(|n| n.title)
        .collect();
    assert!(titles.contains(&"Reservation cancelled".to_string()));

    // The slot is bookable again.
    fx.engine
        .reservations
        .create(&guest, room_id, date(1), date(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_checkout_marks_room_for_cleaning() {
    let fx = test_engine().await;
    let room_id = provision_room(&fx, "209").await;
    let guest = seed_user(&fx.store, Role::User).await;

    let id = fx
        .engine
        .reservations
        .create(&guest, room_id, date(1), date(5))
        .await
        .unwrap();
    let completed = fx.engine.reservations.complete(id).await.unwrap();
    assert_eq!(completed.status, ReservationStatus::Completed);

    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert!(!details.room.is_occupied);
    assert_eq!(details.room.cleaning_status, CleaningStatus::NeedsCleaning);
}

// ============================================================================
// Derived current guest
// ============================================================================

#[tokio::test]
async fn test_current_guest_appears_and_clears() {
    let fx = test_engine().await;
    let room_id = provision_room(&fx, "210").await;
    let guest = seed_user(&fx.store, Role::User).await;

    let now = Utc::now();
    let id = fx
        .engine
        .reservations
        .create(&guest, room_id, now - Duration::hours(2), now + Duration::days(2))
        .await
        .unwrap();

    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    let current = details.current_guest.unwrap();
    assert_eq!(current.user_id, guest.id);
    assert!(!current.name.is_empty());

    fx.engine.reservations.cancel(id).await.unwrap();
    let details = fx.engine.registry.room_details(room_id).await.unwrap();
    assert!(details.current_guest.is_none());
}
