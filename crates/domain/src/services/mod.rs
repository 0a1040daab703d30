//! Domain services.

pub mod notification;

pub use notification::{
    LogNotifier, Notification, NotificationKind, NotificationSink, RecordingNotifier,
};
