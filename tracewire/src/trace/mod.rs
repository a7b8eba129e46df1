//! The trace identity model.
//!
//! A **trace** is the set of spans sharing one [`TraceId`], representing a
//! single end-to-end logical operation. Each unit of work within it is
//! identified by a [`SpanContext`]: the portable identity-plus-baggage
//! subset of a span that can cross process boundaries through a
//! [propagation] codec.
//!
//! The creation and inheritance rules live on [`SpanContext`] itself:
//! [`SpanContext::root`] mints a fresh identity (trace id, span id, the
//! sampling decision) and [`SpanContext::child`] derives a descendant that
//! shares the trace id, records its parent's span id, inherits the sampling
//! decision verbatim and receives a deep copy of the baggage.
//!
//! [propagation]: crate::propagation
use thiserror::Error;

mod event;
mod span_context;

pub use crate::trace_context::{SpanId, TraceFlags, TraceId};
pub use event::Event;
pub use span_context::SpanContext;

use crate::propagation::Format;

/// Errors returned by the trace API.
#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum TraceError {
    /// A baggage key was rejected by the `[a-z0-9][-a-z0-9]*` pattern.
    ///
    /// Recoverable; the existing baggage is untouched.
    #[error("invalid baggage key {0:?}, keys must match [a-z0-9][-a-z0-9]*")]
    InvalidBaggageKey(String),

    /// A binary carrier payload could not be decoded.
    ///
    /// Recoverable; the caller is expected to start a new root span.
    #[error("malformed binary carrier: {0}")]
    MalformedCarrier(&'static str),

    /// A format token was used with a carrier of a different kind.
    ///
    /// This is a programming error at the call site, surfaced immediately.
    #[error("unsupported format: {requested:?} requested for a {supplied:?} carrier")]
    UnsupportedFormat {
        /// The format token passed by the caller.
        requested: Format,
        /// The kind of carrier that was actually supplied.
        supplied: Format,
    },

    /// A mutating operation was attempted on a finished span.
    #[error("span already finished, {0} is not allowed")]
    UseAfterFinish(&'static str),

    /// Spans must be started with a non-empty operation name.
    #[error("operation name must not be empty")]
    EmptyOperationName,
}

/// Describe the result of operations in the trace API.
pub type TraceResult<T> = Result<T, TraceError>;
