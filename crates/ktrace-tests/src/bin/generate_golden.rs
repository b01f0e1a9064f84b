//! Golden fixture generator for the ktrace conformance tests.
//!
//! Writes every fixture under `tests/golden/` as hex text: the negotiation
//! byte on the first line, then one record per line (frame followed by any
//! text tail). Run it after a deliberate wire-format change and commit the
//! result.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin generate_golden -p ktrace-tests
//! ```
//!
//! # Generated fixtures
//!
//! | File           | Contents                                             |
//! |----------------|------------------------------------------------------|
//! | boot_w2.hex    | 2-byte events: init, definitions, marks, debug, halt |
//! | events_w8.hex  | 8-byte events at full range                          |
//! | errors_w1.hex  | 1-byte events: every error tag, then halt            |

#![allow(clippy::pedantic)]

use std::fmt::Write as _;
use std::path::Path;

use ktrace_encoder::TraceEncoder;
use ktrace_types::TraceTag;
use ktrace_wire::EventWidth;

fn main() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let golden_dir = manifest_dir.join("tests/golden");
    std::fs::create_dir_all(&golden_dir).expect("failed to create golden dir");

    write_fixture(&golden_dir, "boot_w2", &boot_w2());
    write_fixture(&golden_dir, "events_w8", &events_w8());
    write_fixture(&golden_dir, "errors_w1", &errors_w1());

    println!("All golden fixtures written to {}", golden_dir.display());
}

fn boot_w2() -> TraceEncoder {
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
    enc
}

fn events_w8() -> TraceEncoder {
    let mut enc = TraceEncoder::new(EventWidth::Eight);
    enc.def_event("tick", 0x0102_0304_0506_0708)
        .mark_event(0x1122_3344_5566_7788, 0x0102_0304_0506_0708)
        .error_event(TraceTag::ErrorDuplicateEvent, u64::MAX)
        .error_instance(TraceTag::ErrorMissed, 2)
        .mark_halt(1);
    enc
}

fn errors_w1() -> TraceEncoder {
    let mut enc = TraceEncoder::new(EventWidth::One);
    enc.error(TraceTag::ErrorMaxEvent)
        .error_event(TraceTag::ErrorUndefinedEvent, 200)
        .error(TraceTag::ErrorMaxAlloc)
        .error(TraceTag::ErrorMaxPool)
        .error(TraceTag::ErrorNullPool)
        .error(TraceTag::ErrorMaxTask)
        .error(TraceTag::ErrorNullTask)
        .error_instance(TraceTag::ErrorInvalidTask, 4)
        .error_event(TraceTag::ErrorDuplicateEvent, 5)
        .error_instance(TraceTag::ErrorMissed, 6)
        .mark_halt(7);
    enc
}

/// One line per record, so fixture diffs point at the record that moved.
fn write_fixture(dir: &Path, name: &str, enc: &TraceEncoder) {
    let mut text = String::new();
    let _ = writeln!(text, "{}", hex::encode([enc.width().negotiation_byte()]));

    let records = ktrace_decoder::StreamDecoder::negotiate(ktrace_decoder::SliceSource::new(
        enc.encode().expect("fixture encodes"),
    ))
    .expect("fixture negotiates")
    .records()
    .map(|r| r.expect("fixture decodes"))
    .collect::<Vec<_>>();

    for record in records {
        let mut single = TraceEncoder::new(enc.width());
        single.record(record);
        let frame = single.encode_frames().expect("fixture re-encodes");
        let _ = writeln!(text, "{}", hex::encode(frame));
    }

    let path = dir.join(format!("{name}.hex"));
    std::fs::write(&path, text).expect("failed to write fixture");
    println!("  wrote {}", path.display());
}
