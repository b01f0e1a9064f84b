#![no_main]

use libfuzzer_sys::fuzz_target;
use ktrace_decoder::{SliceSource, StreamDecoder};

// Fuzz target: whole-stream decoding from arbitrary bytes.
//
// Catches bugs in:
// - Frame offsets past the end of a short frame
// - Tag range checks
// - Text tails that never terminate on a closed source
// - Decoding after a fatal error
fuzz_target!(|data: &[u8]| {
    let Ok(mut decoder) = StreamDecoder::negotiate(SliceSource::closed(data)) else {
        return;
    };
    let threshold = decoder.descriptor().decode_threshold();
    let mut failed = false;
    for record in decoder.records() {
        if record.is_err() {
            failed = true;
        }
    }
    if failed {
        assert!(decoder.try_next().is_err());
    } else {
        assert!(decoder.source_mut().remaining() < threshold);
    }
});
