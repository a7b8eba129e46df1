use crate::baggage::Baggage;
use crate::trace::TraceResult;
use crate::{SpanId, TraceFlags, TraceId};

/// Immutable portion of a span which can be serialized and propagated.
///
/// A `SpanContext` bundles the span's identity (trace id, span id, optional
/// parent span id), the sampling decision made at the root of the trace,
/// and the trace's [`Baggage`]. It is owned by exactly one span; every copy
/// handed to a child or a codec is a deep snapshot, so mutating one
/// context's baggage is never visible through another.
#[derive(Clone, Debug, PartialEq)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: SpanId,
    parent_span_id: Option<SpanId>,
    trace_flags: TraceFlags,
    baggage: Baggage,
}

impl SpanContext {
    /// Construct a new `SpanContext` from its parts.
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        parent_span_id: Option<SpanId>,
        trace_flags: TraceFlags,
        baggage: Baggage,
    ) -> Self {
        SpanContext {
            trace_id,
            span_id,
            parent_span_id,
            trace_flags,
            baggage,
        }
    }

    /// Construct the context of a new root span.
    ///
    /// The sampling decision is made exactly once, here; descendants inherit
    /// it verbatim and are never re-sampled.
    pub fn root(trace_id: TraceId, span_id: SpanId, sampled: bool) -> Self {
        SpanContext {
            trace_id,
            span_id,
            parent_span_id: None,
            trace_flags: TraceFlags::default().with_sampled(sampled),
            baggage: Baggage::new(),
        }
    }

    /// Construct the context of a child of this span.
    ///
    /// The child shares the trace id, records this context's span id as its
    /// parent, copies the sampling decision and receives a deep copy of the
    /// baggage.
    pub fn child(&self, span_id: SpanId) -> Self {
        SpanContext {
            trace_id: self.trace_id,
            span_id,
            parent_span_id: Some(self.span_id),
            trace_flags: self.trace_flags,
            baggage: self.baggage.clone(),
        }
    }

    /// The [`TraceId`] for this span context.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// The [`SpanId`] for this span context.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// The parent's [`SpanId`], if this is not a root context.
    pub fn parent_span_id(&self) -> Option<SpanId> {
        self.parent_span_id
    }

    /// Returns details about the trace.
    pub fn trace_flags(&self) -> TraceFlags {
        self.trace_flags
    }

    /// Returns `true` if the root of this trace was sampled.
    ///
    /// Spans that are not sampled are still finished locally but never reach
    /// a recorder.
    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }

    /// Returns `true` if the span context has a valid (non-zero) `trace_id`
    /// and a valid (non-zero) `span_id`.
    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }

    /// A reference to the context's [`Baggage`].
    pub fn baggage(&self) -> &Baggage {
        &self.baggage
    }

    /// Sets a baggage item on this context.
    ///
    /// Fails with [`TraceError::InvalidBaggageKey`] on a key that does not
    /// match `[a-z0-9][-a-z0-9]*` after lowercasing, leaving the existing
    /// baggage untouched. Contexts already copied elsewhere do not observe
    /// the new item.
    ///
    /// [`TraceError::InvalidBaggageKey`]: crate::trace::TraceError::InvalidBaggageKey
    pub fn set_baggage_item<K, V>(&mut self, key: K, value: V) -> TraceResult<Option<String>>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.baggage.insert(key, value)
    }

    /// Returns the baggage value for `key`, ignoring case.
    pub fn get_baggage_item<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.baggage.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_context() {
        let context = SpanContext::root(TraceId::from(7), SpanId::from(8), true);

        assert_eq!(context.trace_id(), TraceId::from(7));
        assert_eq!(context.span_id(), SpanId::from(8));
        assert_eq!(context.parent_span_id(), None);
        assert!(context.is_sampled());
        assert!(context.is_valid());
        assert!(context.baggage().is_empty());
    }

    #[test]
    fn child_inherits_identity() {
        let mut parent = SpanContext::root(TraceId::from(7), SpanId::from(8), false);
        parent.set_baggage_item("a", "1").unwrap();

        let child = parent.child(SpanId::from(9));

        assert_eq!(child.trace_id(), parent.trace_id());
        assert_eq!(child.span_id(), SpanId::from(9));
        assert_eq!(child.parent_span_id(), Some(parent.span_id()));
        assert!(!child.is_sampled());
        assert_eq!(child.get_baggage_item("a"), Some("1"));
    }

    #[test]
    fn child_baggage_is_isolated() {
        let mut parent = SpanContext::root(TraceId::from(1), SpanId::from(2), true);
        parent.set_baggage_item("a", "1").unwrap();

        let mut child = parent.child(SpanId::from(3));
        child.set_baggage_item("b", "2").unwrap();

        assert_eq!(parent.get_baggage_item("b"), None);
        assert_eq!(child.get_baggage_item("a"), Some("1"));

        // Appends after the copy are equally invisible to the child.
        parent.set_baggage_item("c", "3").unwrap();
        assert_eq!(child.get_baggage_item("c"), None);
    }

    #[test]
    fn baggage_keys_are_case_insensitive_across_generations() {
        let mut parent = SpanContext::root(TraceId::from(1), SpanId::from(2), true);
        parent.set_baggage_item("ota", "v1").unwrap();

        let child = parent.child(SpanId::from(3));
        assert_eq!(child.get_baggage_item("OTA"), Some("v1"));
    }

    #[test]
    fn zero_ids_are_invalid() {
        let context = SpanContext::root(TraceId::INVALID, SpanId::from(1), true);
        assert!(!context.is_valid());

        let context = SpanContext::root(TraceId::from(1), SpanId::INVALID, true);
        assert!(!context.is_valid());
    }
}
