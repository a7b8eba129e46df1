//! Binary codec interface.
use crate::trace::{SpanContext, TraceResult};
use std::fmt;

/// Serializes and deserializes a [`SpanContext`] to and from a fixed byte
/// layout.
pub trait BinaryFormat: fmt::Debug {
    /// Serializes the span context into a byte vector.
    fn to_bytes(&self, context: &SpanContext) -> Vec<u8>;

    /// Deserializes a span context from a byte slice.
    ///
    /// Fails with [`TraceError::MalformedCarrier`] if the buffer is shorter
    /// than any length field demands or a declared length would read past
    /// the end; implementations must bounds-check every length-prefixed
    /// read before performing it.
    ///
    /// [`TraceError::MalformedCarrier`]: crate::trace::TraceError::MalformedCarrier
    fn from_bytes(&self, bytes: &[u8]) -> TraceResult<SpanContext>;
}
