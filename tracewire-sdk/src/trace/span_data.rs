use std::borrow::Cow;
use std::time::SystemTime;
use tracewire::trace::{Event, SpanContext};
use tracewire::KeyValue;

/// An immutable snapshot of a finished span, as handed to a
/// [`Recorder`].
///
/// [`Recorder`]: crate::trace::Recorder
#[derive(Clone, Debug, PartialEq)]
pub struct SpanData {
    /// The span's identity and baggage.
    pub span_context: SpanContext,
    /// The operation this span measured.
    pub operation_name: Cow<'static, str>,
    /// Span start time.
    pub start_time: SystemTime,
    /// Span finish time.
    pub end_time: SystemTime,
    /// Span tags, one entry per key.
    pub tags: Vec<KeyValue>,
    /// Ordered log records.
    pub logs: Vec<Event>,
}
