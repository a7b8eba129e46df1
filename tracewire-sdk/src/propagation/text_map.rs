//! # Text-map propagator
use std::sync::OnceLock;
use tracewire::baggage::Baggage;
use tracewire::propagation::{Extractor, FieldIter, Injector, TextMapCarrier, TextMapFormat};
use tracewire::trace::SpanContext;
use tracewire::{SpanId, TraceFlags, TraceId};

const TRACE_ID_HEADER: &str = "tracewire-trace-id";
const BAGGAGE_PREFIX: &str = "tracewire-ctx-";
const NO_PARENT: &str = "0";

static TRACE_ID_HEADER_FIELD: OnceLock<[String; 1]> = OnceLock::new();

fn trace_id_header_field() -> &'static [String; 1] {
    TRACE_ID_HEADER_FIELD.get_or_init(|| [TRACE_ID_HEADER.to_owned()])
}

/// Propagates span contexts as delimited strings in a text-map carrier
/// such as a set of HTTP headers.
///
/// The identity travels in one entry:
///
/// `tracewire-trace-id: {trace-id}:{span-id}:{parent-span-id}:{flags}`
///
/// Ids are lowercase hex (16 digits on inject, shorter tolerated on
/// extract), a root's missing parent is the literal `0`, and bit 0 of the
/// hex `flags` field is the sampled flag. Each baggage item becomes its own
/// carrier entry under the `tracewire-ctx-` prefix, which keeps it clear of
/// unrelated carrier keys.
#[derive(Clone, Debug, Default)]
pub struct TextMapPropagator {
    _private: (),
}

impl TextMapPropagator {
    /// Create a new text-map propagator.
    pub fn new() -> Self {
        TextMapPropagator { _private: () }
    }

    /// Extract a span context from the identity entry, if usable.
    fn extract_span_context(&self, carrier: &dyn TextMapCarrier) -> Option<SpanContext> {
        let header_value = carrier.get(TRACE_ID_HEADER)?;
        let parts = header_value.split_terminator(':').collect::<Vec<&str>>();
        if parts.len() != 4 {
            return None;
        }

        let trace_id = extract_trace_id(parts[0])?;
        let span_id = extract_span_id(parts[1])?;
        let parent_span_id = extract_parent_span_id(parts[2])?;
        let trace_flags = extract_trace_flags(parts[3])?;
        let baggage = extract_baggage(carrier);

        let context = SpanContext::new(trace_id, span_id, parent_span_id, trace_flags, baggage);
        context.is_valid().then_some(context)
    }
}

/// Extract a trace id from its header part.
fn extract_trace_id(trace_id: &str) -> Option<TraceId> {
    if trace_id.len() > 16 {
        return None;
    }
    TraceId::from_hex(trace_id).ok()
}

/// Extract a span id from its header part.
fn extract_span_id(span_id: &str) -> Option<SpanId> {
    if span_id.len() > 16 {
        return None;
    }
    SpanId::from_hex(span_id).ok()
}

/// Extract the parent span id, with `0` meaning a root context.
fn extract_parent_span_id(parent_span_id: &str) -> Option<Option<SpanId>> {
    if parent_span_id == NO_PARENT {
        return Some(None);
    }
    let parent = extract_span_id(parent_span_id)?;
    Some((parent != SpanId::INVALID).then_some(parent))
}

/// Extract the flags part, keeping only the sampled bit.
fn extract_trace_flags(flags: &str) -> Option<TraceFlags> {
    if flags.is_empty() || flags.len() > 2 {
        return None;
    }
    let flags = u8::from_str_radix(flags, 16).ok()?;
    Some(TraceFlags::new(flags) & TraceFlags::SAMPLED)
}

/// Recover baggage items by stripping the namespace prefix. Non-prefixed
/// carrier keys are unrelated data and ignored.
fn extract_baggage(carrier: &dyn TextMapCarrier) -> Baggage {
    let mut baggage = Baggage::new();
    for key in carrier.keys() {
        let Some(item_key) = key.strip_prefix(BAGGAGE_PREFIX) else {
            continue;
        };
        let Some(value) = carrier.get(key) else {
            continue;
        };
        // Prefixed entries that fail key validation are foreign data; skip
        // them rather than poisoning the whole extraction.
        let _ = baggage.insert(item_key, value);
    }
    baggage
}

impl TextMapFormat for TextMapPropagator {
    fn inject(&self, context: &SpanContext, carrier: &mut dyn TextMapCarrier) {
        if !context.is_valid() {
            return;
        }

        let parent = context
            .parent_span_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| NO_PARENT.to_string());
        let header_value = format!(
            "{}:{}:{}:{:01x}",
            context.trace_id(),
            context.span_id(),
            parent,
            context.trace_flags() & TraceFlags::SAMPLED,
        );
        carrier.set(TRACE_ID_HEADER, header_value);

        for (key, value) in context.baggage() {
            carrier.set(&format!("{BAGGAGE_PREFIX}{key}"), value.clone());
        }
    }

    fn extract(&self, carrier: &dyn TextMapCarrier) -> Option<SpanContext> {
        self.extract_span_context(carrier)
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(trace_id_header_field())
    }
}
