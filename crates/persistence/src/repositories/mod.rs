//! Repository traits and their in-memory implementations.

pub mod cleaning_request;
pub mod reservation;
pub mod room;
pub mod user;

pub use cleaning_request::{
    CleaningRequestRepository, Completion, MemoryCleaningRequestRepository, RequestFilter,
};
pub use reservation::{MemoryReservationRepository, ReservationRepository};
pub use room::{DeviceMutation, MemoryRoomRepository, RoomRepository};
pub use user::{MemoryUserRepository, UserRepository};
