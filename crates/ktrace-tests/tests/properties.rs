//! Structural properties that must hold for every negotiated width:
//! descriptor sizing, the not-ready contract, and trace log cursors.

use std::sync::Arc;

use ktrace_decoder::{ByteSource, DecodeError, ProtocolDescriptor, SliceSource, StreamDecoder};
use ktrace_encoder::TraceEncoder;
use ktrace_ingest::TraceLog;
use ktrace_types::{FieldValue, Record, TraceTag};
use ktrace_wire::EventWidth;

fn idle(time: u64) -> Record {
    Record::new(TraceTag::MarkIdle, vec![("time", FieldValue::Uint(time))])
}

// ── Descriptor ────────────────────────────────────────────────────────────────

#[test]
fn threshold_covers_every_fixed_size() {
    for width in EventWidth::ALL {
        let descriptor = ProtocolDescriptor::for_width(width);
        let largest = TraceTag::ALL
            .iter()
            .map(|&tag| descriptor.fixed_size(tag))
            .max()
            .unwrap();
        assert_eq!(descriptor.decode_threshold(), largest, "width {}", width.bytes());
    }
}

#[test]
fn only_supported_widths_resolve() {
    for byte in 0..=u8::MAX {
        let resolved = ProtocolDescriptor::resolve(byte);
        match byte {
            1 | 2 | 4 | 8 => {
                assert_eq!(resolved.unwrap().event_width().bytes(), usize::from(byte));
            }
            _ => assert!(matches!(resolved, Err(DecodeError::Negotiation(_)))),
        }
    }
}

#[test]
fn layouts_follow_catalogue_order() {
    let descriptor = ProtocolDescriptor::for_width(EventWidth::Four);
    let tags: Vec<_> = descriptor.layouts().iter().map(|l| l.tag).collect();
    assert_eq!(tags, TraceTag::ALL);
}

// ── Not-ready consumes nothing ────────────────────────────────────────────────

#[test]
fn every_prefix_short_of_a_frame_is_not_ready() {
    for width in EventWidth::ALL {
        let bytes = TraceEncoder::new(width).mark_wake(77).encode().unwrap();
        for cut in 1..bytes.len() {
            let mut decoder = StreamDecoder::negotiate(SliceSource::new(&bytes[..cut])).unwrap();
            assert!(decoder.try_next().unwrap().is_none());
            assert_eq!(decoder.source_mut().position(), 1, "cut {cut}");

            decoder.source_mut().extend(&bytes[cut..]);
            assert_eq!(decoder.try_next().unwrap().unwrap().time(), Some(77));
        }
    }
}

#[test]
fn repeated_not_ready_attempts_are_harmless() {
    let bytes = TraceEncoder::new(EventWidth::Eight)
        .mark_idle(3)
        .encode()
        .unwrap();
    let mut decoder = StreamDecoder::negotiate(SliceSource::new(&bytes[..10])).unwrap();
    for _ in 0..5 {
        assert!(decoder.try_next().unwrap().is_none());
    }
    assert_eq!(decoder.source_mut().available().unwrap(), 9);
}

// ── Trace log cursor ──────────────────────────────────────────────────────────

#[test]
fn slice_since_is_idempotent() {
    let log = TraceLog::new();
    for t in 0..5 {
        log.append(idle(t));
    }
    let (first, cursor) = log.slice_since(2);
    assert_eq!(first.len(), 3);
    assert_eq!(cursor, log.len());

    let (second, again) = log.slice_since(2);
    assert!(second.is_empty());
    assert_eq!(again, 5);

    log.append(idle(5));
    let (fresh, cursor) = log.slice_since(2);
    assert_eq!(fresh, [idle(5)]);
    assert_eq!(cursor, 6);

    log.reset_cursor();
    let (replayed, cursor) = log.slice_since(0);
    assert_eq!(replayed.len(), 6);
    assert_eq!(cursor, 6);
}

#[test]
fn cursor_past_end_is_clamped() {
    let log = TraceLog::new();
    log.append(idle(0));
    let (records, cursor) = log.slice_since(40);
    assert!(records.is_empty());
    assert_eq!(cursor, 1);
}

#[test]
fn take_new_delivers_each_record_once() {
    let log = Arc::new(TraceLog::new());
    log.append(idle(0));
    log.append(idle(1));
    assert_eq!(log.take_new().len(), 2);
    assert!(log.take_new().is_empty());

    log.append(idle(2));
    assert_eq!(log.take_new(), [idle(2)]);
    assert_eq!(log.cursor(), 3);

    log.reset_cursor();
    assert_eq!(log.take_new().len(), 3);
    assert_eq!(log.len(), 3);
}
