use crate::trace::SpanData;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// The sink that receives finished, sampled spans.
///
/// A recorder is the only component in the pipeline allowed to perform
/// I/O or block, but `record` itself is called inline from `Span::finish`
/// and must return promptly: hand the span to a queue, a channel or a
/// background worker rather than exporting it on the spot. The finishing
/// span never awaits completion. Failures are reported through the
/// returned result; the tracer isolates them and they never reach the
/// span's caller.
pub trait Recorder: Send + Sync + fmt::Debug {
    /// Record a finished span snapshot.
    fn record(&self, span: SpanData) -> RecorderResult<()>;
}

/// Errors a [`Recorder`] can report back to the tracer.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum RecorderError {
    /// The recorder has been shut down and no longer accepts spans.
    #[error("recorder already shut down")]
    AlreadyShutdown,

    /// Any other recorder-side failure.
    #[error("recorder failed: {0}")]
    InternalFailure(String),
}

/// Describe the result of recorder operations.
pub type RecorderResult<T> = Result<T, RecorderError>;

/// A recorder that drops every span. The default when no backend is
/// configured.
#[derive(Clone, Debug, Default)]
pub struct NoopRecorder {
    _private: (),
}

impl NoopRecorder {
    /// Create a new no-op recorder.
    pub fn new() -> Self {
        NoopRecorder::default()
    }
}

impl Recorder for NoopRecorder {
    fn record(&self, _span: SpanData) -> RecorderResult<()> {
        Ok(())
    }
}

/// A recorder that stores finished spans in memory.
///
/// Useful for testing and debugging. Clones share the same storage, so a
/// copy kept by the test can observe what the tracer recorded.
///
/// # Example
///
/// ```
/// use tracewire_sdk::trace::{Config, InMemoryRecorder, SpanOptions, Tracer};
///
/// let recorder = InMemoryRecorder::new();
/// let tracer = Tracer::with_config(Config::default().with_recorder(recorder.clone()));
///
/// let mut span = tracer.start_span("say hello", SpanOptions::default())?;
/// span.finish()?;
///
/// for span in recorder.get_finished_spans().unwrap() {
///     println!("{span:?}");
/// }
/// # Ok::<(), tracewire::trace::TraceError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryRecorder {
    spans: Arc<Mutex<Vec<SpanData>>>,
}

impl InMemoryRecorder {
    /// Create a new in-memory recorder with empty storage.
    pub fn new() -> Self {
        InMemoryRecorder::default()
    }

    /// Returns the finished spans recorded so far.
    ///
    /// # Errors
    ///
    /// Fails with [`RecorderError::InternalFailure`] if the internal lock
    /// cannot be acquired.
    pub fn get_finished_spans(&self) -> RecorderResult<Vec<SpanData>> {
        self.spans
            .lock()
            .map(|spans| spans.clone())
            .map_err(|_| RecorderError::InternalFailure("finished span store poisoned".into()))
    }

    /// Clears the internal storage of finished spans.
    pub fn reset(&self) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.clear();
        }
    }
}

impl Recorder for InMemoryRecorder {
    fn record(&self, span: SpanData) -> RecorderResult<()> {
        self.spans
            .lock()
            .map(|mut spans| spans.push(span))
            .map_err(|_| RecorderError::InternalFailure("finished span store poisoned".into()))
    }
}
