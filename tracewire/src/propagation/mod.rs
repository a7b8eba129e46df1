//! The propagation seam.
//!
//! Propagation is how a [`SpanContext`] crosses a process boundary: it is
//! written into a **carrier** on the outgoing side and recovered from the
//! carrier on the incoming side. Two carrier kinds exist, selected by a
//! [`Format`] token:
//!
//! - [`Format::TextMap`]: a string-keyed mapping such as an HTTP header
//!   collection, accessed through the [`Injector`] and [`Extractor`]
//!   traits. Writes are additive and reads are order-independent.
//! - [`Format::Binary`]: a [`BinaryCarrier`] exposing one byte-buffer
//!   field, replaced wholesale on inject and read wholesale on extract.
//!
//! Codec implementations live behind the [`TextMapFormat`] and
//! [`BinaryFormat`] traits; the concrete codecs ship with the
//! `tracewire_sdk` crate.
//!
//! [`SpanContext`]: crate::trace::SpanContext
use std::collections::HashMap;
use std::fmt;

pub mod binary_format;
pub mod text_map_format;

pub use binary_format::BinaryFormat;
pub use text_map_format::{FieldIter, TextMapFormat};

/// Injector provides an interface for adding entries to an underlying
/// string map such as a `HashMap` or a set of HTTP headers.
pub trait Injector {
    /// Add a key and value to the underlying data.
    fn set(&mut self, key: &str, value: String);
}

/// Extractor provides an interface for reading entries from an underlying
/// string map such as a `HashMap` or a set of HTTP headers.
pub trait Extractor {
    /// Get a value for a key from the underlying data.
    fn get(&self, key: &str) -> Option<&str>;

    /// Collect all the keys from the underlying data.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the HashMap.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the HashMap.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Collect all the keys from the HashMap.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(String::as_str).collect::<Vec<_>>()
    }
}

/// A text-map carrier: any type that supports both injection and
/// extraction.
///
/// Implemented automatically for everything that is `Injector + Extractor`,
/// including `HashMap<String, String>`.
pub trait TextMapCarrier: Injector + Extractor {}

impl<T: Injector + Extractor> TextMapCarrier for T {}

/// The tokens that select a propagation codec.
///
/// Dispatch is by identity equality only; the tokens carry no other
/// meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Format {
    /// The human-readable string-map encoding.
    TextMap,
    /// The compact fixed-layout byte encoding.
    Binary,
}

/// A carrier for the binary propagation format.
///
/// Exposes a single byte-buffer field which is replaced wholesale on inject
/// and read wholesale on extract.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryCarrier {
    /// The wire bytes of one encoded span context.
    pub payload: Vec<u8>,
}

impl BinaryCarrier {
    /// Create a carrier holding the given payload.
    pub fn new(payload: Vec<u8>) -> Self {
        BinaryCarrier { payload }
    }
}

/// A mutable view of the transport medium a span context travels through.
///
/// The variant is the carrier's kind; a [`Format`] token that does not
/// select the supplied variant is rejected by the tracer with
/// `UnsupportedFormat`.
pub enum Carrier<'a> {
    /// A string-keyed mapping, e.g. a set of HTTP headers.
    TextMap(&'a mut dyn TextMapCarrier),
    /// A byte-buffer object.
    Binary(&'a mut BinaryCarrier),
}

impl Carrier<'_> {
    /// The format that matches this carrier's kind.
    pub fn format(&self) -> Format {
        match self {
            Carrier::TextMap(_) => Format::TextMap,
            Carrier::Binary(_) => Format::Binary,
        }
    }
}

impl fmt::Debug for Carrier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Carrier::TextMap(_) => f.write_str("Carrier::TextMap"),
            Carrier::Binary(carrier) => f
                .debug_struct("Carrier::Binary")
                .field("payload_len", &carrier.payload.len())
                .finish(),
        }
    }
}
