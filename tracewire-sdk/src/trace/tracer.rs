//! Tracer orchestration.
use crate::propagation::{BinaryPropagator, TextMapPropagator};
use crate::trace::{Config, Span, SpanData};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::SystemTime;
use tracewire::propagation::{BinaryFormat, Carrier, Format, TextMapFormat};
use tracewire::trace::{SpanContext, TraceError, TraceResult};
use tracewire::KeyValue;

/// Orchestrates span creation, sampling, codec dispatch and the recorder
/// handoff.
///
/// A `Tracer` is built from an explicit [`Config`] and passed by reference
/// (or cheaply cloned; clones share the same configuration) to
/// instrumentation call sites. There is no hidden process-wide default.
#[derive(Clone, Debug)]
pub struct Tracer {
    inner: Arc<TracerInner>,
}

#[derive(Debug)]
struct TracerInner {
    config: Config,
    text_map_format: TextMapPropagator,
    binary_format: BinaryPropagator,
}

/// The parent argument accepted by [`Tracer::start_span`].
#[derive(Clone, Copy, Debug)]
pub enum Parent<'a> {
    /// A live span; its context is used.
    Span(&'a Span),
    /// A detached context, e.g. one recovered by
    /// [`Tracer::extract_context`].
    Context(&'a SpanContext),
}

impl<'a> Parent<'a> {
    fn span_context(self) -> &'a SpanContext {
        match self {
            Parent::Span(span) => span.context(),
            Parent::Context(context) => context,
        }
    }
}

impl<'a> From<&'a Span> for Parent<'a> {
    fn from(span: &'a Span) -> Self {
        Parent::Span(span)
    }
}

impl<'a> From<&'a SpanContext> for Parent<'a> {
    fn from(context: &'a SpanContext) -> Self {
        Parent::Context(context)
    }
}

/// Options for [`Tracer::start_span`].
#[derive(Debug, Default)]
pub struct SpanOptions<'a> {
    /// The parent to inherit from; the span starts a new trace when `None`.
    pub parent: Option<Parent<'a>>,
    /// Explicit start time; defaults to now.
    pub start_time: Option<SystemTime>,
    /// Initial tags, applied in order with last write winning per key.
    pub tags: Vec<KeyValue>,
}

impl Tracer {
    /// Create a tracer from the given configuration.
    pub fn with_config(config: Config) -> Self {
        Tracer {
            inner: Arc::new(TracerInner {
                config,
                text_map_format: TextMapPropagator::new(),
                binary_format: BinaryPropagator::new(),
            }),
        }
    }

    /// Start a new span.
    ///
    /// Without a parent this creates a root: a fresh trace id, and the
    /// sampler is consulted, the only point at which it ever is. With a
    /// parent the child inherits trace id, sampling decision and a deep
    /// copy of the baggage, and records the parent's span id.
    ///
    /// Fails with [`TraceError::EmptyOperationName`] when the operation
    /// name is empty.
    pub fn start_span<T>(&self, operation_name: T, options: SpanOptions<'_>) -> TraceResult<Span>
    where
        T: Into<Cow<'static, str>>,
    {
        let operation_name = operation_name.into();
        if operation_name.is_empty() {
            return Err(TraceError::EmptyOperationName);
        }

        let config = &self.inner.config;
        let context = match options.parent {
            Some(parent) => parent
                .span_context()
                .child(config.id_generator.new_span_id()),
            None => {
                let trace_id = config.id_generator.new_trace_id();
                let sampled = config.sampler.should_sample(trace_id);
                SpanContext::root(trace_id, config.id_generator.new_span_id(), sampled)
            }
        };

        let start_time = options.start_time.unwrap_or_else(SystemTime::now);
        Ok(Span::new(
            context,
            operation_name,
            start_time,
            options.tags,
            self.clone(),
        ))
    }

    /// Encode a span context into the carrier selected by `format`.
    ///
    /// Fails with [`TraceError::UnsupportedFormat`] when the format token
    /// does not select the kind of carrier supplied.
    pub fn inject(
        &self,
        context: &SpanContext,
        format: Format,
        carrier: Carrier<'_>,
    ) -> TraceResult<()> {
        match (format, carrier) {
            (Format::TextMap, Carrier::TextMap(carrier)) => {
                self.inner.text_map_format.inject(context, carrier);
                Ok(())
            }
            (Format::Binary, Carrier::Binary(carrier)) => {
                carrier.payload = self.inner.binary_format.to_bytes(context);
                Ok(())
            }
            (requested, carrier) => Err(TraceError::UnsupportedFormat {
                requested,
                supplied: carrier.format(),
            }),
        }
    }

    /// Decode a span context from the carrier selected by `format`.
    ///
    /// A text-map carrier without a usable identity entry yields
    /// `Ok(None)`; a binary carrier that cannot be decoded fails with
    /// [`TraceError::MalformedCarrier`].
    pub fn extract_context(
        &self,
        format: Format,
        carrier: Carrier<'_>,
    ) -> TraceResult<Option<SpanContext>> {
        match (format, carrier) {
            (Format::TextMap, Carrier::TextMap(carrier)) => {
                Ok(self.inner.text_map_format.extract(&*carrier))
            }
            (Format::Binary, Carrier::Binary(carrier)) => self
                .inner
                .binary_format
                .from_bytes(&carrier.payload)
                .map(Some),
            (requested, carrier) => Err(TraceError::UnsupportedFormat {
                requested,
                supplied: carrier.format(),
            }),
        }
    }

    /// Start a span continuing the trace found in the carrier.
    ///
    /// When the carrier holds no context (e.g. the request came from an
    /// uninstrumented client) a fresh root span is started instead, so
    /// missing inbound trace data never aborts the caller's request path.
    pub fn extract<T>(
        &self,
        operation_name: T,
        format: Format,
        carrier: Carrier<'_>,
    ) -> TraceResult<Span>
    where
        T: Into<Cow<'static, str>>,
    {
        match self.extract_context(format, carrier)? {
            Some(remote) => self.start_span(
                operation_name,
                SpanOptions {
                    parent: Some(Parent::Context(&remote)),
                    ..SpanOptions::default()
                },
            ),
            None => self.start_span(operation_name, SpanOptions::default()),
        }
    }

    /// Forward a finished span to the recorder iff its trace is sampled.
    ///
    /// Recorder health never leaks into the finishing span's control flow;
    /// failures are only visible out of band.
    pub(crate) fn record(&self, span: SpanData) {
        if !span.span_context.is_sampled() {
            return;
        }
        if let Err(error) = self.inner.config.recorder.record(span) {
            tracing::debug!(name: "record_failure", target: "tracewire_sdk", %error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{
        IncrementIdGenerator, InMemoryRecorder, Recorder, RecorderError, RecorderResult, Sampler,
    };
    use std::collections::HashMap;
    use tracewire::propagation::BinaryCarrier;
    use tracewire::{SpanId, TraceId};

    fn recording_tracer(sampler: Sampler) -> (Tracer, InMemoryRecorder) {
        let recorder = InMemoryRecorder::new();
        let tracer = Tracer::with_config(
            Config::default()
                .with_sampler(sampler)
                .with_recorder(recorder.clone()),
        );
        (tracer, recorder)
    }

    #[test]
    fn root_and_child_identities() {
        let tracer = Tracer::with_config(
            Config::default().with_id_generator(IncrementIdGenerator::new()),
        );

        let root = tracer.start_span("op-a", SpanOptions::default()).unwrap();
        assert_eq!(root.context().trace_id(), TraceId::from(1));
        assert_eq!(root.context().span_id(), SpanId::from(2));
        assert_eq!(root.context().parent_span_id(), None);

        let child = tracer
            .start_span(
                "op-b",
                SpanOptions {
                    parent: Some(Parent::Span(&root)),
                    ..SpanOptions::default()
                },
            )
            .unwrap();
        assert_eq!(child.context().trace_id(), root.context().trace_id());
        assert_eq!(child.context().span_id(), SpanId::from(3));
        assert_eq!(
            child.context().parent_span_id(),
            Some(root.context().span_id())
        );
    }

    #[test]
    fn empty_operation_name_is_rejected() {
        let (tracer, _) = recording_tracer(Sampler::AlwaysOn);
        assert_eq!(
            tracer.start_span("", SpanOptions::default()).err(),
            Some(TraceError::EmptyOperationName)
        );
    }

    #[test]
    fn end_to_end_text_map() {
        let (tracer, recorder) = recording_tracer(Sampler::TraceIdRatioBased(1.0));

        let mut root = tracer.start_span("op-a", SpanOptions::default()).unwrap();
        root.set_baggage_item("tenant", "acme").unwrap();
        assert!(root.context().is_sampled());

        let mut carrier: HashMap<String, String> = HashMap::new();
        tracer
            .inject(root.context(), Format::TextMap, Carrier::TextMap(&mut carrier))
            .unwrap();

        let mut child = tracer
            .extract("op-b", Format::TextMap, Carrier::TextMap(&mut carrier))
            .unwrap();

        assert_eq!(child.context().trace_id(), root.context().trace_id());
        assert_eq!(
            child.context().parent_span_id(),
            Some(root.context().span_id())
        );
        assert!(child.context().is_sampled());
        assert_eq!(child.get_baggage_item("tenant"), Some("acme"));

        child.finish().unwrap();
        root.finish().unwrap();
        assert_eq!(recorder.get_finished_spans().unwrap().len(), 2);
    }

    #[test]
    fn end_to_end_binary() {
        let (tracer, _) = recording_tracer(Sampler::AlwaysOn);

        let mut root = tracer.start_span("op-a", SpanOptions::default()).unwrap();
        root.set_baggage_item("user-id", "42").unwrap();

        let mut carrier = BinaryCarrier::default();
        tracer
            .inject(root.context(), Format::Binary, Carrier::Binary(&mut carrier))
            .unwrap();
        assert!(!carrier.payload.is_empty());

        let child = tracer
            .extract("op-b", Format::Binary, Carrier::Binary(&mut carrier))
            .unwrap();

        assert_eq!(child.context().trace_id(), root.context().trace_id());
        assert_eq!(
            child.context().parent_span_id(),
            Some(root.context().span_id())
        );
        assert!(child.context().is_sampled());
        assert_eq!(child.get_baggage_item("user-id"), Some("42"));
    }

    #[test]
    fn mismatched_format_and_carrier_fail_fast() {
        let (tracer, _) = recording_tracer(Sampler::AlwaysOn);
        let span = tracer.start_span("op", SpanOptions::default()).unwrap();

        let mut map: HashMap<String, String> = HashMap::new();
        assert_eq!(
            tracer.inject(span.context(), Format::Binary, Carrier::TextMap(&mut map)),
            Err(TraceError::UnsupportedFormat {
                requested: Format::Binary,
                supplied: Format::TextMap,
            })
        );

        let mut buffer = BinaryCarrier::default();
        assert_eq!(
            tracer
                .extract_context(Format::TextMap, Carrier::Binary(&mut buffer))
                .err(),
            Some(TraceError::UnsupportedFormat {
                requested: Format::TextMap,
                supplied: Format::Binary,
            })
        );
    }

    #[test]
    fn extract_without_context_starts_a_root() {
        let (tracer, _) = recording_tracer(Sampler::AlwaysOn);

        let mut carrier: HashMap<String, String> = HashMap::new();
        let span = tracer
            .extract("inbound", Format::TextMap, Carrier::TextMap(&mut carrier))
            .unwrap();

        assert!(span.context().is_valid());
        assert_eq!(span.context().parent_span_id(), None);
    }

    #[test]
    fn truncated_binary_carrier_surfaces_malformed() {
        let (tracer, _) = recording_tracer(Sampler::AlwaysOn);

        let mut carrier = BinaryCarrier::new(vec![0x01, 0x02, 0x03]);
        let result = tracer.extract_context(Format::Binary, Carrier::Binary(&mut carrier));
        assert!(matches!(result, Err(TraceError::MalformedCarrier(_))));
    }

    #[test]
    fn children_never_resample() {
        // The root decision travels with the context, so a tracer
        // configured to drop everything still samples children of a
        // sampled remote parent.
        let (sampling, _) = recording_tracer(Sampler::AlwaysOn);
        let root = sampling.start_span("op-a", SpanOptions::default()).unwrap();
        assert!(root.context().is_sampled());

        let (dropping, recorder) = recording_tracer(Sampler::AlwaysOff);
        let mut child = dropping
            .start_span(
                "op-b",
                SpanOptions {
                    parent: Some(Parent::Context(root.context())),
                    ..SpanOptions::default()
                },
            )
            .unwrap();
        assert!(child.context().is_sampled());

        child.finish().unwrap();
        assert_eq!(recorder.get_finished_spans().unwrap().len(), 1);
    }

    #[test]
    fn unsampled_spans_finish_locally_but_are_not_recorded() {
        let (tracer, recorder) = recording_tracer(Sampler::AlwaysOff);

        let mut span = tracer.start_span("op", SpanOptions::default()).unwrap();
        span.set_tag(KeyValue::new("local", true)).unwrap();
        span.log("still works", None).unwrap();
        span.finish().unwrap();

        assert!(span.is_finished());
        assert!(recorder.get_finished_spans().unwrap().is_empty());
    }

    #[derive(Debug)]
    struct FailingRecorder;

    impl Recorder for FailingRecorder {
        fn record(&self, _span: SpanData) -> RecorderResult<()> {
            Err(RecorderError::InternalFailure("backend unreachable".into()))
        }
    }

    #[test]
    fn recorder_failures_never_reach_the_caller() {
        let tracer = Tracer::with_config(
            Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_recorder(FailingRecorder),
        );

        let mut span = tracer.start_span("op", SpanOptions::default()).unwrap();
        assert_eq!(span.finish(), Ok(()));
    }

    #[test]
    fn parent_conversions() {
        let (tracer, _) = recording_tracer(Sampler::AlwaysOn);
        let root = tracer.start_span("op", SpanOptions::default()).unwrap();

        let from_span: Parent<'_> = (&root).into();
        assert_eq!(from_span.span_context(), root.context());

        let context = root.context().clone();
        let from_context: Parent<'_> = (&context).into();
        assert_eq!(from_context.span_context(), &context);
    }
}
