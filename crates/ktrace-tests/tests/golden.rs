//! Conformance tests against committed golden captures.
//!
//! Each fixture under `tests/golden/` is a hex dump of a trace stream as the
//! firmware emits it (see `src/bin/generate_golden.rs`). The tests check
//! that the encoder still produces those exact bytes and that decoding
//! them yields the listing and JSON captured in the inline snapshots.
//!
//! A snapshot diff means the wire format or the record rendering changed.
//! Accept deliberate changes with `cargo insta review`.

use std::path::Path;

use insta::assert_snapshot;
use ktrace_decoder::{SliceSource, StreamDecoder};
use ktrace_encoder::TraceEncoder;
use ktrace_types::Record;
use ktrace_wire::EventWidth;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Read `tests/golden/<fixture>.hex` into bytes. Whitespace is ignored.
fn golden(fixture: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/golden")
        .join(format!("{fixture}.hex"));
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read golden fixture {}: {e}", path.display()));
    let digits: String = text.split_whitespace().collect();
    hex::decode(digits).unwrap_or_else(|e| panic!("bad hex in {}: {e}", path.display()))
}

fn decode(bytes: Vec<u8>) -> Vec<Record> {
    let mut decoder = StreamDecoder::negotiate(SliceSource::closed(bytes)).unwrap();
    let records = decoder.records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(decoder.source_mut().remaining(), 0);
    records
}

fn listing(records: &[Record]) -> String {
    records
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn json_lines(records: &[Record]) -> String {
    records
        .iter()
        .map(|r| serde_json::to_string(r).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── boot_w2 ───────────────────────────────────────────────────────────────────

#[test]
fn boot_w2_matches_encoder() {
    let mut enc = TraceEncoder::new(EventWidth::Two);
    enc.mark_init(0, 512)
        .def_task("blink", 1)
        .def_event("button", 7)
        .def_alloc("pool", 128)
        .mark_start(4, 1)
        .mark_event(10, 7)
        .debug_message("boot ok")
        .mark_stop(12, 1)
        .mark_idle(20)
        .mark_wake(30)
        .mark_halt(90);
    assert_eq!(hex::encode(enc.encode().unwrap()), hex::encode(golden("boot_w2")));
}

#[test]
fn boot_w2_listing() {
    assert_snapshot!(listing(&decode(golden("boot_w2"))), @r#"
    Mark_Init time=0 heap=512
    Def_Task handle="blink" instance=1
    Def_Event handle="button" event=7
    Def_Alloc handle="pool" bytes=128
    Mark_Start time=4 instance=1
    Mark_Event time=10 event=7
    Debug_Message message="boot ok"
    Mark_Stop time=12 instance=1
    Mark_Idle time=20
    Mark_Wake time=30
    Mark_Halt time=90
    "#);
}

#[test]
fn boot_w2_first_frame_bytes() {
    let bytes = golden("boot_w2");
    assert_eq!(bytes[0], 2);
    // Mark_Init: tag 3, time 0, heap 512, no padding at this width
    assert_eq!(hex::encode(&bytes[1..13]), "030000000000000000000002");
}

// ── events_w8 ─────────────────────────────────────────────────────────────────

#[test]
fn events_w8_json() {
    assert_snapshot!(json_lines(&decode(golden("events_w8"))), @r#"
    {"name":"Def_Event","tag":1,"handle":"tick","event":72623859790382856}
    {"name":"Mark_Event","tag":7,"time":1234605616436508552,"event":72623859790382856}
    {"name":"Error_Duplicate_Event","tag":18,"event":18446744073709551615}
    {"name":"Error_Missed","tag":19,"instance":2}
    {"name":"Mark_Halt","tag":4,"time":1}
    "#);
}

#[test]
fn events_w8_frames_are_eighteen_bytes() {
    let bytes = golden("events_w8");
    // negotiation + Def_Event frame + "tick\0" + four plain frames
    assert_eq!(bytes.len(), 1 + 18 + 5 + 4 * 18);
}

// ── errors_w1 ─────────────────────────────────────────────────────────────────

#[test]
fn errors_w1_listing() {
    assert_snapshot!(listing(&decode(golden("errors_w1"))), @r"
    Error_Max_Event
    Error_Undefined_Event event=200
    Error_Max_Alloc
    Error_Max_Pool
    Error_Null_Pool
    Error_Max_Task
    Error_Null_Task
    Error_Invalid_Task instance=4
    Error_Duplicate_Event event=5
    Error_Missed instance=6
    Mark_Halt time=7
    ");
}

#[test]
fn truncated_capture_stops_at_last_whole_record() {
    let mut bytes = golden("errors_w1");
    bytes.truncate(bytes.len() - 5);
    let mut decoder = StreamDecoder::negotiate(SliceSource::closed(bytes)).unwrap();
    let records = decoder.records().collect::<Result<Vec<_>, _>>().unwrap();
    assert_eq!(records.len(), 10);
    assert_eq!(decoder.source_mut().remaining(), 7);
}
