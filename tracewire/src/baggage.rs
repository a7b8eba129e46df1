//! Primitives for sending name/value data across system boundaries.
//!
//! Baggage is the set of key/value pairs a trace carries with it: every
//! descendant span receives a copy at creation time, in-process and across
//! the wire. Keys are case-insensitive and restricted to
//! `[a-z0-9][-a-z0-9]*` so they can double as carrier entry names without
//! escaping.
use crate::trace::{TraceError, TraceResult};
use std::collections::{hash_map, HashMap};

/// A set of name/value pairs propagated with a trace.
///
/// Lookups are case-insensitive; keys are stored lowercased. Cloning a
/// `Baggage` yields a deep copy, which is what isolates a child span's
/// baggage from its parent's.
///
/// # Examples
///
/// ```
/// use tracewire::baggage::Baggage;
///
/// let mut baggage = Baggage::new();
/// baggage.insert("user-id", "42")?;
///
/// assert_eq!(baggage.get("USER-ID"), Some("42"));
/// assert_eq!(baggage.get("missing"), None);
/// # Ok::<(), tracewire::trace::TraceError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Baggage {
    inner: HashMap<String, String>,
}

impl Baggage {
    /// Creates an empty `Baggage`.
    pub fn new() -> Self {
        Baggage {
            inner: HashMap::default(),
        }
    }

    /// Returns the value associated with the given key, ignoring case.
    ///
    /// Unknown keys are an ordinary absence, never an error.
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.inner
            .get(&key.as_ref().to_lowercase())
            .map(String::as_str)
    }

    /// Inserts a name/value pair into the baggage.
    ///
    /// The key is lowercased before validation and storage. If the
    /// lowercased key does not match `[a-z0-9][-a-z0-9]*` this fails with
    /// [`TraceError::InvalidBaggageKey`] and the existing entries are left
    /// untouched. On success the previous value for the key is returned.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> TraceResult<Option<String>>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let key = key.into().to_lowercase();
        if !Baggage::valid_key(key.as_str()) {
            return Err(TraceError::InvalidBaggageKey(key));
        }

        Ok(self.inner.insert(key, value.into()))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the baggage contains no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Gets an iterator over the baggage items, in arbitrary order.
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }

    /// Validates a (lowercased) baggage key against `[a-z0-9][-a-z0-9]*`.
    fn valid_key(key: &str) -> bool {
        let bytes = key.as_bytes();
        let first_valid = match bytes.first() {
            Some(&b) => b.is_ascii_lowercase() || b.is_ascii_digit(),
            None => false,
        };

        first_valid
            && bytes[1..]
                .iter()
                .all(|&b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    }
}

/// An iterator over the entries of a [`Baggage`].
#[derive(Debug)]
pub struct Iter<'a>(hash_map::Iter<'a, String, String>);

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a String, &'a String);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

impl<'a> IntoIterator for &'a Baggage {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Iter(self.inner.iter())
    }
}
