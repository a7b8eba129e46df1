//! # Span
//!
//! `Span`s represent a single operation within a trace. `Span`s can be
//! nested to form a trace tree. Each trace contains a root span, which
//! typically describes the end-to-end latency and, optionally, one or more
//! sub-spans for its sub-operations.
use crate::trace::{SpanData, Tracer};
use std::borrow::Cow;
use std::time::SystemTime;
use tracewire::trace::{Event, SpanContext, TraceError, TraceResult};
use tracewire::{KeyValue, Value};

/// Single operation within a trace.
///
/// A span is Open from creation until [`finish`] is called, exactly once.
/// Every mutating operation takes `&mut self` (one owner mutates a span,
/// which is the whole concurrency model) and fails with
/// [`TraceError::UseAfterFinish`] once the span is finished. Read
/// operations keep working after finish.
///
/// Dropping an unfinished span records nothing; a span is either finished
/// or it never happened as far as the backend is concerned.
///
/// [`finish`]: Span::finish
#[derive(Debug)]
pub struct Span {
    context: SpanContext,
    inner: Option<SpanInner>,
    tracer: Tracer,
}

/// Mutable state, taken on finish.
#[derive(Debug)]
struct SpanInner {
    operation_name: Cow<'static, str>,
    start_time: SystemTime,
    tags: Vec<KeyValue>,
    logs: Vec<Event>,
}

impl Span {
    pub(crate) fn new(
        context: SpanContext,
        operation_name: Cow<'static, str>,
        start_time: SystemTime,
        tags: Vec<KeyValue>,
        tracer: Tracer,
    ) -> Self {
        let mut initial_tags = Vec::with_capacity(tags.len());
        for tag in tags {
            upsert_tag(&mut initial_tags, tag);
        }

        Span {
            context,
            inner: Some(SpanInner {
                operation_name,
                start_time,
                tags: initial_tags,
                logs: Vec::new(),
            }),
            tracer,
        }
    }

    /// Returns the span's [`SpanContext`].
    pub fn context(&self) -> &SpanContext {
        &self.context
    }

    /// Returns `true` once the span has been finished.
    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    /// Sets a single tag. A later write to the same key replaces the
    /// earlier value.
    pub fn set_tag(&mut self, tag: KeyValue) -> TraceResult<()> {
        self.with_inner("set_tag", |inner| upsert_tag(&mut inner.tags, tag))
    }

    /// Updates the span's operation name.
    pub fn set_operation_name<T>(&mut self, operation_name: T) -> TraceResult<()>
    where
        T: Into<Cow<'static, str>>,
    {
        let operation_name = operation_name.into();
        if operation_name.is_empty() {
            return Err(TraceError::EmptyOperationName);
        }
        self.with_inner("set_operation_name", |inner| {
            inner.operation_name = operation_name
        })
    }

    /// Appends a log record timestamped now.
    pub fn log<T>(&mut self, event: T, payload: Option<Value>) -> TraceResult<()>
    where
        T: Into<Cow<'static, str>>,
    {
        self.log_with_timestamp(event, SystemTime::now(), payload)
    }

    /// Appends a log record with an explicit timestamp.
    pub fn log_with_timestamp<T>(
        &mut self,
        event: T,
        timestamp: SystemTime,
        payload: Option<Value>,
    ) -> TraceResult<()>
    where
        T: Into<Cow<'static, str>>,
    {
        let event = Event::new(event, timestamp, payload);
        self.with_inner("log", |inner| inner.logs.push(event))
    }

    /// Sets a baggage item on the span's context.
    ///
    /// The item is visible to children started afterwards, never to
    /// contexts copied before this call.
    pub fn set_baggage_item<K, V>(&mut self, key: K, value: V) -> TraceResult<Option<String>>
    where
        K: Into<String>,
        V: Into<String>,
    {
        if self.inner.is_none() {
            return Err(TraceError::UseAfterFinish("set_baggage_item"));
        }
        self.context.set_baggage_item(key, value)
    }

    /// Returns the baggage value for `key`, ignoring case.
    pub fn get_baggage_item<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.context.get_baggage_item(key)
    }

    /// Finishes the span, timestamped now.
    ///
    /// Hands an immutable snapshot to the tracer, which forwards it to the
    /// recorder iff the trace is sampled. The handoff is fire-and-forget:
    /// recorder health never affects this call's result.
    pub fn finish(&mut self) -> TraceResult<()> {
        self.finish_with_timestamp(SystemTime::now())
    }

    /// Finishes the span with an explicit end timestamp.
    pub fn finish_with_timestamp(&mut self, end_time: SystemTime) -> TraceResult<()> {
        let inner = self
            .inner
            .take()
            .ok_or(TraceError::UseAfterFinish("finish"))?;

        self.tracer.record(SpanData {
            span_context: self.context.clone(),
            operation_name: inner.operation_name,
            start_time: inner.start_time,
            end_time,
            tags: inner.tags,
            logs: inner.logs,
        });
        Ok(())
    }

    /// Operate on the mutable state while the span is open.
    fn with_inner<T, F>(&mut self, operation: &'static str, f: F) -> TraceResult<T>
    where
        F: FnOnce(&mut SpanInner) -> T,
    {
        self.inner
            .as_mut()
            .map(f)
            .ok_or(TraceError::UseAfterFinish(operation))
    }
}

fn upsert_tag(tags: &mut Vec<KeyValue>, tag: KeyValue) {
    match tags.iter_mut().find(|existing| existing.key == tag.key) {
        Some(existing) => existing.value = tag.value,
        None => tags.push(tag),
    }
}
