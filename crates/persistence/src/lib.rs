//! Persistence layer for the hotel operations engine.
//!
//! This crate contains:
//! - Repository traits with narrow queries (by room, by status, by assignee)
//! - An in-memory document store implementing them
//! - A change-feed event bus publishing typed deltas on every mutation
//!
//! The production deployment talks to a managed realtime document store;
//! these traits are the boundary the engine sees. The in-memory store backs
//! tests and single-process deployments.

pub mod events;
pub mod memory;
pub mod repositories;

pub use events::{EventBus, StoreEvent};
pub use memory::MemoryStore;
