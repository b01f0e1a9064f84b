use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ktrace_decoder::{ProtocolDescriptor, SliceSource, StreamDecoder};
use ktrace_encoder::TraceEncoder;
use ktrace_ingest::{IngestConfig, Ingestor, TraceLog};
use ktrace_types::TraceTag;
use ktrace_wire::EventWidth;

/// A realistic mix: mostly scheduler marks with the odd definition and
/// debug message, ending in `Mark_Halt`.
fn session(width: EventWidth, records: u64) -> Vec<u8> {
    let mut enc = TraceEncoder::new(width);
    enc.mark_init(0, 2048).def_task("blink", 1).def_event("button", 3);
    for t in 0..records {
        match t % 8 {
            0 => enc.mark_start(t, 1),
            1 => enc.mark_event(t, 3),
            2 => enc.debug_message("heartbeat\n"),
            3 => enc.mark_stop(t, 1),
            4 | 5 => enc.mark_idle(t),
            _ => enc.mark_wake(t),
        };
    }
    enc.mark_halt(records);
    enc.encode().unwrap()
}

fn decode_count(bytes: &[u8]) -> usize {
    let mut decoder = StreamDecoder::negotiate(SliceSource::new(bytes)).unwrap();
    decoder.records().map(Result::unwrap).count()
}

fn bench_resolve(c: &mut Criterion) {
    c.bench_function("resolve_descriptor", |b| {
        b.iter(|| ProtocolDescriptor::resolve(std::hint::black_box(4)).unwrap());
    });
}

fn bench_decode_widths(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_session");
    for width in EventWidth::ALL {
        let bytes = session(width, 1_000);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        let id = BenchmarkId::from_parameter(width.bytes());
        group.bench_with_input(id, &bytes, |b, bytes| {
            b.iter(|| decode_count(bytes));
        });
    }
    group.finish();
}

fn bench_text_records(c: &mut Criterion) {
    let message = "x".repeat(200);
    let mut enc = TraceEncoder::new(EventWidth::Two);
    for _ in 0..100 {
        enc.debug_message(&message);
    }
    let bytes = enc.encode().unwrap();

    c.bench_function("decode_debug_text", |b| {
        b.iter(|| decode_count(&bytes));
    });
}

fn bench_ingest(c: &mut Criterion) {
    let bytes = session(EventWidth::Four, 1_000);
    let config = IngestConfig::default()
        .with_max_records(usize::MAX - 1)
        .with_poll_interval(Duration::ZERO);

    c.bench_function("ingest_session", |b| {
        b.iter(|| {
            let log = Arc::new(TraceLog::new());
            Ingestor::new(config.clone(), Arc::clone(&log), |_: &str| {})
                .run(SliceSource::new(bytes.as_slice()))
                .unwrap();
            let last = log.snapshot().last().map(|r| r.tag());
            assert_eq!(last, Some(TraceTag::MarkHalt));
        });
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_decode_widths,
    bench_text_records,
    bench_ingest
);
criterion_main!(benches);
