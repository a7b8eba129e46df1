//! Span identity, baggage and context-propagation API for distributed
//! tracing.
//!
//! A trace is the set of spans that share one trace id and together describe
//! a single logical operation as it crosses process and network boundaries.
//! This crate defines the portable part of that model:
//!
//! - **[`trace`]**: the identity types ([`TraceId`], [`SpanId`],
//!   [`trace::SpanContext`]) and the rules by which a root context is
//!   created and a child context inherits from its parent.
//! - **[`baggage`]**: the key/value metadata that travels with a trace,
//!   in-process and across the wire.
//! - **[`propagation`]**: the carrier seam, how a [`trace::SpanContext`]
//!   is written to and read from a string-keyed mapping (such as HTTP
//!   headers) or a byte buffer.
//!
//! This crate contains no span construction, sampling or recording logic;
//! those live in the `tracewire_sdk` crate, which implements the seams
//! defined here.
//!
//! # Examples
//!
//! ```
//! use tracewire::trace::SpanContext;
//! use tracewire::{SpanId, TraceId};
//!
//! let mut root = SpanContext::root(TraceId::from(1), SpanId::from(2), true);
//! root.set_baggage_item("tenant", "acme")?;
//!
//! // Children share the trace id and a deep copy of the baggage.
//! let child = root.child(SpanId::from(3));
//! assert_eq!(child.trace_id(), root.trace_id());
//! assert_eq!(child.parent_span_id(), Some(root.span_id()));
//! assert_eq!(child.get_baggage_item("TENANT"), Some("acme"));
//! # Ok::<(), tracewire::trace::TraceError>(())
//! ```
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]

pub mod baggage;
mod common;
pub mod propagation;
pub mod trace;
mod trace_context;

pub use common::{Key, KeyValue, Value};
pub use trace_context::{SpanId, TraceFlags, TraceId};
