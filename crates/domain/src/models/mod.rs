//! Domain models for rooms, reservations, cleaning requests, and actors.

pub mod cleaning_request;
pub mod reservation;
pub mod room;
pub mod user;

pub use cleaning_request::{CleaningRequest, CleaningRequestStatus, RequestType};
pub use reservation::{Reservation, ReservationStatus, StayRange};
pub use room::{
    ActionSource, CleaningStatus, CurrentGuest, DeviceAction, DeviceActionKind, DeviceActor,
    DoorStatus, LightStatus, Room, RoomDetails,
};
pub use user::{Actor, Role, UserAccount};
