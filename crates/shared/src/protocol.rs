//! Socket wire protocol: event names, room names and the frame envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server-pushed event names consumed by the client.
pub mod events {
    pub const ATTENDANCE_MARKED: &str = "attendance_marked";
    pub const ATTENDANCE_UPDATED: &str = "attendance_updated";
    pub const SCHEDULE_EVENT_CREATED: &str = "schedule_event_created";
    pub const SCHEDULE_EVENT_UPDATED: &str = "schedule_event_updated";
    pub const SCHEDULE_EVENT_DELETED: &str = "schedule_event_deleted";
    /// Carries a store action to dispatch as-is.
    pub const STATE_UPDATE: &str = "state-update";

    /// Client -> server room commands.
    pub const JOIN_ROOM: &str = "join_room";
    pub const LEAVE_ROOM: &str = "leave_room";
}

/// Well-known broadcast rooms.
pub mod rooms {
    pub const ATTENDANCE_UPDATES: &str = "attendance_updates";
    pub const TIMETABLE_UPDATES: &str = "timetable_updates";
}

/// One text frame on the socket: `{"event": "...", "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl SocketFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    pub fn join_room(room: &str) -> Self {
        Self::new(events::JOIN_ROOM, serde_json::json!({ "room": room }))
    }

    pub fn leave_room(room: &str) -> Self {
        Self::new(events::LEAVE_ROOM, serde_json::json!({ "room": room }))
    }

    /// Room id carried by a join/leave command.
    pub fn room(&self) -> Option<&str> {
        self.data.get("room").and_then(Value::as_str)
    }
}
