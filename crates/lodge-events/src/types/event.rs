use serde::{Deserialize, Serialize};

use super::{EventPayload, EventType};

/// One stored event: a store-assigned version plus its typed payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Position in the aggregate's log, dense from 0.
    pub version: i64,
    /// Typed payload.
    pub payload: EventPayload,
}

impl Event {
    /// Pair a payload with its assigned version.
    pub fn new(version: i64, payload: EventPayload) -> Self {
        Self { version, payload }
    }

    /// Discriminator of the payload.
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// `for_version` carried by the payload, if its kind has one.
    pub fn for_version(&self) -> Option<i64> {
        self.payload.for_version()
    }
}
