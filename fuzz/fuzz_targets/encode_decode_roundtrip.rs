#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ktrace_decoder::{SliceSource, StreamDecoder};
use ktrace_encoder::TraceEncoder;
use ktrace_types::TraceTag;
use ktrace_wire::EventWidth;

#[derive(Debug, Arbitrary)]
enum FuzzRecord {
    DefTask { handle: String, instance: u8 },
    DefEvent { handle: String, event: u64 },
    DefAlloc { handle: String, bytes: u16 },
    MarkInit { time: u64, heap: u16 },
    MarkStart { time: u64, instance: u8 },
    MarkEvent { time: u64, event: u64 },
    MarkIdle { time: u64 },
    ErrorPlain { tag_id: u8 },
    ErrorEvent { duplicate: bool, event: u64 },
    ErrorInstance { missed: bool, instance: u8 },
    Debug { message: String },
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    width_id: u8,
    records: Vec<FuzzRecord>,
}

fn plain_error(id: u8) -> TraceTag {
    match id % 6 {
        0 => TraceTag::ErrorMaxEvent,
        1 => TraceTag::ErrorMaxAlloc,
        2 => TraceTag::ErrorMaxPool,
        3 => TraceTag::ErrorNullPool,
        4 => TraceTag::ErrorMaxTask,
        _ => TraceTag::ErrorNullTask,
    }
}

// Fuzz target: anything the encoder accepts must decode to the same records.
fuzz_target!(|input: FuzzInput| {
    let width = EventWidth::ALL[usize::from(input.width_id) % 4];
    let mut enc = TraceEncoder::new(width);
    for record in &input.records {
        match record {
            FuzzRecord::DefTask { handle, instance } => enc.def_task(handle, *instance),
            FuzzRecord::DefEvent { handle, event } => enc.def_event(handle, *event),
            FuzzRecord::DefAlloc { handle, bytes } => enc.def_alloc(handle, *bytes),
            FuzzRecord::MarkInit { time, heap } => enc.mark_init(*time, *heap),
            FuzzRecord::MarkStart { time, instance } => enc.mark_start(*time, *instance),
            FuzzRecord::MarkEvent { time, event } => enc.mark_event(*time, *event),
            FuzzRecord::MarkIdle { time } => enc.mark_idle(*time),
            FuzzRecord::ErrorPlain { tag_id } => enc.error(plain_error(*tag_id)),
            FuzzRecord::ErrorEvent { duplicate, event } => {
                let tag = if *duplicate {
                    TraceTag::ErrorDuplicateEvent
                } else {
                    TraceTag::ErrorUndefinedEvent
                };
                enc.error_event(tag, *event)
            }
            FuzzRecord::ErrorInstance { missed, instance } => {
                let tag = if *missed {
                    TraceTag::ErrorMissed
                } else {
                    TraceTag::ErrorInvalidTask
                };
                enc.error_instance(tag, *instance)
            }
            FuzzRecord::Debug { message } => enc.debug_message(message),
        };
    }

    // Out-of-range events and NUL/non-ASCII text are rejected up front.
    let Ok(bytes) = enc.encode() else {
        return;
    };

    let mut decoder = StreamDecoder::negotiate(SliceSource::closed(bytes)).expect("negotiates");
    let decoded = decoder
        .records()
        .collect::<Result<Vec<_>, _>>()
        .expect("encoded stream decodes");
    assert_eq!(decoded.len(), input.records.len());
    assert_eq!(decoder.source_mut().remaining(), 0);
});
