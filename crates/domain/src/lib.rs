//! Domain layer for the hotel operations engine.
//!
//! This crate contains:
//! - Domain models (Room, Reservation, CleaningRequest)
//! - The notification sink seam
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
