//! Room aggregate: occupancy, cleaning state, and in-room device state.
//!
//! The room is the long-lived aggregate. Reservations and cleaning requests
//! reference it by id; the door-action log is owned by the room and is
//! append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cleaning state of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleaningStatus {
    Clean,
    NeedsCleaning,
    InProgress,
}

impl std::fmt::Display for CleaningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CleaningStatus::Clean => write!(f, "clean"),
            CleaningStatus::NeedsCleaning => write!(f, "needs_cleaning"),
            CleaningStatus::InProgress => write!(f, "in_progress"),
        }
    }
}

/// Door lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorStatus {
    Locked,
    Unlocked,
}

impl std::fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoorStatus::Locked => write!(f, "locked"),
            DoorStatus::Unlocked => write!(f, "unlocked"),
        }
    }
}

/// Light state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightStatus {
    On,
    Off,
}

impl LightStatus {
    /// The opposite state, used by the light toggle.
    pub fn toggled(self) -> Self {
        match self {
            LightStatus::On => LightStatus::Off,
            LightStatus::Off => LightStatus::On,
        }
    }
}

impl std::fmt::Display for LightStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LightStatus::On => write!(f, "on"),
            LightStatus::Off => write!(f, "off"),
        }
    }
}

/// Whether a device action was taken by a person or by the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    Manual,
    Auto,
}

/// What was done to the door or the lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceActionKind {
    Unlock,
    Lock,
    AutoLock,
    LightOn,
    LightOff,
}

impl std::fmt::Display for DeviceActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceActionKind::Unlock => write!(f, "unlock"),
            DeviceActionKind::Lock => write!(f, "lock"),
            DeviceActionKind::AutoLock => write!(f, "auto_lock"),
            DeviceActionKind::LightOn => write!(f, "light_on"),
            DeviceActionKind::LightOff => write!(f, "light_off"),
        }
    }
}

/// Who performed a device action. Auto-lock entries are attributed to the
/// system rather than the user whose unlock scheduled them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum DeviceActor {
    User(Uuid),
    System,
}

/// Append-only door/light log entry, owned by the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeviceAction {
    pub kind: DeviceActionKind,
    pub actor: DeviceActor,
    pub source: ActionSource,
    pub at: DateTime<Utc>,
}

/// A hotel room record as stored.
///
/// `lock_deadline` and `lock_epoch` back the auto-relock: the deadline is
/// persisted so an overdue unlock can be reconciled on read even if the
/// in-process timer was lost, and the epoch is bumped by every manual door
/// action so a superseded timer no-ops.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Room {
    pub id: Uuid,
    /// Display label, e.g. "204".
    pub number: String,
    pub beds: u8,
    pub rooms: u8,
    pub is_occupied: bool,
    pub cleaning_status: CleaningStatus,
    pub door_status: DoorStatus,
    pub light_status: LightStatus,
    pub last_cleaned: DateTime<Utc>,
    pub door_actions: Vec<DeviceAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_deadline: Option<DateTime<Utc>>,
    pub lock_epoch: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Create a freshly provisioned room: vacant, clean, locked, lights off.
    pub fn new(number: impl Into<String>, beds: u8, rooms: u8) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            beds,
            rooms,
            is_occupied: false,
            cleaning_status: CleaningStatus::Clean,
            door_status: DoorStatus::Locked,
            light_status: LightStatus::Off,
            last_cleaned: now,
            door_actions: Vec::new(),
            lock_deadline: None,
            lock_epoch: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the persisted auto-lock deadline has passed while the door
    /// is still unlocked.
    pub fn lock_overdue(&self, now: DateTime<Utc>) -> bool {
        self.door_status == DoorStatus::Unlocked
            && self.lock_deadline.is_some_and(|deadline| deadline <= now)
    }
}

/// Guest currently occupying a room, derived on read from the active
/// reservation covering "now". Never stored on the room record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CurrentGuest {
    pub user_id: Uuid,
    pub name: String,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
}

/// Read model combining the stored room with the derived guest snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RoomDetails {
    pub room: Room,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_guest: Option<CurrentGuest>,
}
