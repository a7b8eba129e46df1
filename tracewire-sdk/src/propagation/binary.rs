//! # Binary propagator
use bytes::{Buf, BufMut};
use tracewire::baggage::Baggage;
use tracewire::propagation::BinaryFormat;
use tracewire::trace::{SpanContext, TraceError, TraceResult};
use tracewire::{SpanId, TraceFlags, TraceId};

/// Length of the fixed identity section: two ids, the parent marker, the
/// (possibly zero-filled) parent id and the sampled byte.
const IDENTITY_LEN: usize = 8 + 8 + 1 + 8 + 1;

/// Serializes span contexts into a fixed byte layout:
///
/// ```text
/// trace id    8 bytes, big-endian
/// span id     8 bytes, big-endian
/// parent?     1 byte, 0 or 1
/// parent id   8 bytes, big-endian, zero-filled when absent
/// sampled     1 byte
/// baggage     varint item count, then per item:
///             varint key length, key bytes (UTF-8),
///             varint value length, value bytes (UTF-8)
/// ```
///
/// Varints are unsigned LEB128. Decoding checks the remaining buffer
/// before every read, so truncated or adversarial input fails with
/// `MalformedCarrier` instead of reading out of bounds; bytes past a
/// complete payload are ignored.
#[derive(Clone, Debug, Default)]
pub struct BinaryPropagator {
    _private: (),
}

impl BinaryPropagator {
    /// Create a new binary propagator.
    pub fn new() -> Self {
        BinaryPropagator { _private: () }
    }
}

impl BinaryFormat for BinaryPropagator {
    fn to_bytes(&self, context: &SpanContext) -> Vec<u8> {
        let mut buf = Vec::with_capacity(IDENTITY_LEN + 1);
        buf.put_slice(&context.trace_id().to_bytes());
        buf.put_slice(&context.span_id().to_bytes());
        match context.parent_span_id() {
            Some(parent) => {
                buf.put_u8(1);
                buf.put_slice(&parent.to_bytes());
            }
            None => {
                buf.put_u8(0);
                buf.put_slice(&[0u8; 8]);
            }
        }
        buf.put_u8(u8::from(context.is_sampled()));

        put_uvarint(&mut buf, context.baggage().len() as u64);
        for (key, value) in context.baggage() {
            put_uvarint(&mut buf, key.len() as u64);
            buf.put_slice(key.as_bytes());
            put_uvarint(&mut buf, value.len() as u64);
            buf.put_slice(value.as_bytes());
        }
        buf
    }

    fn from_bytes(&self, bytes: &[u8]) -> TraceResult<SpanContext> {
        let mut buf = bytes;

        let trace_id = TraceId::from_bytes(read_id(&mut buf)?);
        let span_id = SpanId::from_bytes(read_id(&mut buf)?);
        if trace_id == TraceId::INVALID || span_id == SpanId::INVALID {
            return Err(TraceError::MalformedCarrier("zero trace or span id"));
        }

        let parent_marker = read_u8(&mut buf)?;
        let parent_id = SpanId::from_bytes(read_id(&mut buf)?);
        let parent_span_id = match parent_marker {
            0 => None,
            1 if parent_id == SpanId::INVALID => {
                return Err(TraceError::MalformedCarrier("zero parent id"));
            }
            1 => Some(parent_id),
            _ => return Err(TraceError::MalformedCarrier("invalid parent marker")),
        };

        let sampled = read_u8(&mut buf)? & 0x01 == 0x01;

        let item_count = read_uvarint(&mut buf)?;
        let mut baggage = Baggage::new();
        for _ in 0..item_count {
            let key = read_string(&mut buf)?;
            let value = read_string(&mut buf)?;
            baggage
                .insert(key, value)
                .map_err(|_| TraceError::MalformedCarrier("invalid baggage key"))?;
        }

        Ok(SpanContext::new(
            trace_id,
            span_id,
            parent_span_id,
            TraceFlags::default().with_sampled(sampled),
            baggage,
        ))
    }
}

fn put_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

fn read_u8(buf: &mut &[u8]) -> TraceResult<u8> {
    if !buf.has_remaining() {
        return Err(TraceError::MalformedCarrier("unexpected end of buffer"));
    }
    Ok(buf.get_u8())
}

fn read_id(buf: &mut &[u8]) -> TraceResult<[u8; 8]> {
    if buf.remaining() < 8 {
        return Err(TraceError::MalformedCarrier("truncated id field"));
    }
    let mut id = [0u8; 8];
    buf.copy_to_slice(&mut id);
    Ok(id)
}

fn read_uvarint(buf: &mut &[u8]) -> TraceResult<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        if shift > 63 {
            return Err(TraceError::MalformedCarrier("varint overflows 64 bits"));
        }
        let byte = match read_u8(buf) {
            Ok(byte) => byte,
            Err(_) => return Err(TraceError::MalformedCarrier("truncated varint")),
        };
        if shift == 63 && (byte & 0x7f) > 1 {
            return Err(TraceError::MalformedCarrier("varint overflows 64 bits"));
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

fn read_string(buf: &mut &[u8]) -> TraceResult<String> {
    let len = read_uvarint(buf)?;
    let len = usize::try_from(len)
        .map_err(|_| TraceError::MalformedCarrier("declared length overflows usize"))?;
    if buf.remaining() < len {
        return Err(TraceError::MalformedCarrier(
            "declared length runs past end of buffer",
        ));
    }
    let (head, rest) = buf.split_at(len);
    *buf = rest;
    std::str::from_utf8(head)
        .map(str::to_owned)
        .map_err(|_| TraceError::MalformedCarrier("baggage entry is not valid utf-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE_ID: u64 = 0x4bf9_2f35_77b3_4da6;
    const SPAN_ID: u64 = 0x00f0_67aa_0ba9_02b7;
    const PARENT_ID: u64 = 0x53ce_929d_0e0e_4736;

    fn context(
        parent: Option<u64>,
        sampled: bool,
        baggage_items: &[(&str, &str)],
    ) -> SpanContext {
        let mut baggage = Baggage::new();
        for (key, value) in baggage_items {
            baggage.insert(*key, *value).unwrap();
        }
        SpanContext::new(
            TraceId::from(TRACE_ID),
            SpanId::from(SPAN_ID),
            parent.map(SpanId::from),
            TraceFlags::default().with_sampled(sampled),
            baggage,
        )
    }

    #[rustfmt::skip]
    fn to_bytes_data() -> Vec<(SpanContext, Vec<u8>)> {
        vec![
            // Root context, sampled, no baggage
            (context(None, true, &[]), vec![
                0x4b, 0xf9, 0x2f, 0x35, 0x77, 0xb3, 0x4d, 0xa6,
                0x00, 0xf0, 0x67, 0xaa, 0x0b, 0xa9, 0x02, 0xb7,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x01,
                0x00,
            ]),
            // Child context, not sampled
            (context(Some(PARENT_ID), false, &[]), vec![
                0x4b, 0xf9, 0x2f, 0x35, 0x77, 0xb3, 0x4d, 0xa6,
                0x00, 0xf0, 0x67, 0xaa, 0x0b, 0xa9, 0x02, 0xb7,
                0x01, 0x53, 0xce, 0x92, 0x9d, 0x0e, 0x0e, 0x47, 0x36,
                0x00,
                0x00,
            ]),
            // Root context with one baggage item
            (context(None, true, &[("k", "v")]), vec![
                0x4b, 0xf9, 0x2f, 0x35, 0x77, 0xb3, 0x4d, 0xa6,
                0x00, 0xf0, 0x67, 0xaa, 0x0b, 0xa9, 0x02, 0xb7,
                0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x01,
                0x01, 0x01, 0x6b, 0x01, 0x76,
            ]),
        ]
    }

    #[test]
    fn to_bytes_layout() {
        let propagator = BinaryPropagator::new();
        for (context, expected) in to_bytes_data() {
            assert_eq!(propagator.to_bytes(&context), expected);
        }
    }

    #[test]
    fn from_bytes_layout() {
        let propagator = BinaryPropagator::new();
        for (expected, bytes) in to_bytes_data() {
            assert_eq!(propagator.from_bytes(&bytes).unwrap(), expected);
        }
    }

    #[test]
    fn round_trip_with_baggage_and_boundary_ids() {
        let propagator = BinaryPropagator::new();
        for trace_id in [1u64, 0xffff_ffff_ffff_fffe] {
            let mut baggage = Baggage::new();
            baggage.insert("user-id", "42").unwrap();
            baggage.insert("region", "eu-west-1").unwrap();
            let original = SpanContext::new(
                TraceId::from(trace_id),
                SpanId::from(SPAN_ID),
                Some(SpanId::from(PARENT_ID)),
                TraceFlags::SAMPLED,
                baggage,
            );

            let extracted = propagator.from_bytes(&propagator.to_bytes(&original)).unwrap();
            assert_eq!(extracted, original);
        }
    }

    #[test]
    fn every_strict_prefix_is_malformed() {
        let propagator = BinaryPropagator::new();
        let full = propagator.to_bytes(&context(Some(PARENT_ID), true, &[("user-id", "42")]));

        for len in 0..full.len() {
            let result = propagator.from_bytes(&full[..len]);
            assert!(
                matches!(result, Err(TraceError::MalformedCarrier(_))),
                "prefix of length {len} unexpectedly decoded: {result:?}"
            );
        }
    }

    #[test]
    fn empty_buffer_is_malformed() {
        let propagator = BinaryPropagator::new();
        assert_eq!(
            propagator.from_bytes(&[]),
            Err(TraceError::MalformedCarrier("truncated id field"))
        );
    }

    #[test]
    fn declared_length_past_buffer_end_is_malformed() {
        let propagator = BinaryPropagator::new();
        let mut bytes = propagator.to_bytes(&context(None, true, &[]));
        // One item whose key claims 200 bytes the buffer does not have.
        *bytes.last_mut().unwrap() = 0x01;
        bytes.extend_from_slice(&[200, 1, b'a', b'b', b'c']);

        assert_eq!(
            propagator.from_bytes(&bytes),
            Err(TraceError::MalformedCarrier(
                "declared length runs past end of buffer"
            ))
        );
    }

    #[test]
    fn zero_ids_are_malformed() {
        let propagator = BinaryPropagator::new();

        let mut zero_trace_id = propagator.to_bytes(&context(None, true, &[]));
        zero_trace_id[..8].fill(0);
        assert_eq!(
            propagator.from_bytes(&zero_trace_id),
            Err(TraceError::MalformedCarrier("zero trace or span id"))
        );

        let mut zero_span_id = propagator.to_bytes(&context(None, true, &[]));
        zero_span_id[8..16].fill(0);
        assert_eq!(
            propagator.from_bytes(&zero_span_id),
            Err(TraceError::MalformedCarrier("zero trace or span id"))
        );
    }

    #[test]
    fn bad_parent_marker_is_malformed() {
        let propagator = BinaryPropagator::new();

        let mut bytes = propagator.to_bytes(&context(Some(PARENT_ID), true, &[]));
        bytes[16] = 0x02;
        assert_eq!(
            propagator.from_bytes(&bytes),
            Err(TraceError::MalformedCarrier("invalid parent marker"))
        );

        // Marker claims a parent but the id field is all zero.
        let mut bytes = propagator.to_bytes(&context(Some(PARENT_ID), true, &[]));
        bytes[17..25].fill(0);
        assert_eq!(
            propagator.from_bytes(&bytes),
            Err(TraceError::MalformedCarrier("zero parent id"))
        );
    }

    #[test]
    fn overlong_varint_is_malformed() {
        let propagator = BinaryPropagator::new();
        let mut bytes = propagator.to_bytes(&context(None, true, &[]));
        bytes.pop();
        // 10 continuation bytes put the varint past 64 bits.
        bytes.extend_from_slice(&[0xff; 10]);

        assert_eq!(
            propagator.from_bytes(&bytes),
            Err(TraceError::MalformedCarrier("varint overflows 64 bits"))
        );
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let propagator = BinaryPropagator::new();
        let mut bytes = propagator.to_bytes(&context(None, true, &[]));
        *bytes.last_mut().unwrap() = 0x01;
        bytes.extend_from_slice(&[0x02, 0xc3, 0x28, 0x01, b'v']);

        assert_eq!(
            propagator.from_bytes(&bytes),
            Err(TraceError::MalformedCarrier("baggage entry is not valid utf-8"))
        );
    }

    #[test]
    fn invalid_baggage_key_is_malformed() {
        let propagator = BinaryPropagator::new();
        let mut bytes = propagator.to_bytes(&context(None, true, &[]));
        *bytes.last_mut().unwrap() = 0x01;
        bytes.extend_from_slice(&[0x03, b'a', b'_', b'b', 0x01, b'v']);

        assert_eq!(
            propagator.from_bytes(&bytes),
            Err(TraceError::MalformedCarrier("invalid baggage key"))
        );
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let propagator = BinaryPropagator::new();
        let original = context(Some(PARENT_ID), true, &[("k", "v")]);

        let mut bytes = propagator.to_bytes(&original);
        bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);

        assert_eq!(propagator.from_bytes(&bytes).unwrap(), original);
    }

    #[test]
    fn varint_encoding_spans_multiple_bytes() {
        let mut buf = Vec::new();
        put_uvarint(&mut buf, 300);
        assert_eq!(buf, vec![0xac, 0x02]);

        let mut slice = buf.as_slice();
        assert_eq!(read_uvarint(&mut slice).unwrap(), 300);
        assert!(slice.is_empty());
    }
}
