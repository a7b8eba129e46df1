//! Timestamped log records attached to a span.
use crate::Value;
use std::borrow::Cow;
use std::time::SystemTime;

/// A timestamped event logged on a span, with an optional payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// The name of this event.
    pub name: Cow<'static, str>,
    /// The time at which this event occurred.
    pub timestamp: SystemTime,
    /// Optional payload carried by the event.
    pub payload: Option<Value>,
}

impl Event {
    /// Create a new `Event`.
    pub fn new<T: Into<Cow<'static, str>>>(
        name: T,
        timestamp: SystemTime,
        payload: Option<Value>,
    ) -> Self {
        Event {
            name: name.into(),
            timestamp,
            payload,
        }
    }

    /// Create a new `Event` with a name, timestamped now.
    pub fn with_name<T: Into<Cow<'static, str>>>(name: T) -> Self {
        Event {
            name: name.into(),
            timestamp: SystemTime::now(),
            payload: None,
        }
    }
}
