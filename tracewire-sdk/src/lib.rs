//! Implements the `tracewire` distributed tracing API: span creation,
//! sampling, the two wire codecs and the recorder handoff.
//!
//! The [`trace::Tracer`] is the entry point. It is built from an explicit
//! [`trace::Config`] (there is no process-wide default) and is cheap to
//! clone, so instrumentation call sites can share one by value or by
//! reference:
//!
//! ```
//! use std::collections::HashMap;
//! use tracewire::propagation::{Carrier, Format};
//! use tracewire_sdk::trace::{Config, InMemoryRecorder, Sampler, SpanOptions, Tracer};
//!
//! let recorder = InMemoryRecorder::new();
//! let tracer = Tracer::with_config(
//!     Config::default()
//!         .with_sampler(Sampler::AlwaysOn)
//!         .with_recorder(recorder.clone()),
//! );
//!
//! // Start a root span and attach some trace-wide baggage.
//! let mut span = tracer.start_span("handle-request", SpanOptions::default())?;
//! span.set_baggage_item("tenant", "acme")?;
//!
//! // Hand the span's identity to the next hop as HTTP-style headers.
//! let mut headers: HashMap<String, String> = HashMap::new();
//! tracer.inject(span.context(), Format::TextMap, Carrier::TextMap(&mut headers))?;
//!
//! span.finish()?;
//! assert_eq!(recorder.get_finished_spans().unwrap().len(), 1);
//! # Ok::<(), tracewire::trace::TraceError>(())
//! ```
//!
//! On the receiving side, [`trace::Tracer::extract`] turns the carrier back
//! into a span that continues the trace, or starts a fresh root when the
//! carrier holds no usable context.
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]

pub mod propagation;
pub mod trace;
