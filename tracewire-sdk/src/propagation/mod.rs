//! The two wire codecs.
//!
//! [`TextMapPropagator`] carries a span context as delimited strings in a
//! string-keyed mapping; [`BinaryPropagator`] uses a compact fixed byte
//! layout. Both reproduce the trace id, the sampled flag and the full
//! baggage set on a round trip, with the encoded span id becoming the
//! parent of the next span started from the extracted context.
mod binary;
mod text_map;

pub use binary::BinaryPropagator;
pub use text_map::TextMapPropagator;
