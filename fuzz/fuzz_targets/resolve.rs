#![no_main]

use libfuzzer_sys::fuzz_target;
use ktrace_decoder::ProtocolDescriptor;
use ktrace_types::TraceTag;

// Fuzz target: descriptor resolution from the negotiation byte.
//
// Every accepted byte must give a threshold that covers each tag's fixed
// portion, with field offsets inside it.
fuzz_target!(|data: &[u8]| {
    let Some(&byte) = data.first() else {
        return;
    };
    let Ok(descriptor) = ProtocolDescriptor::resolve(byte) else {
        return;
    };
    let threshold = descriptor.decode_threshold();
    for &tag in TraceTag::ALL {
        let layout = descriptor.layout(tag);
        assert!(layout.fixed_size <= threshold);
        for field in &layout.fields {
            assert!(field.offset + field.scalar.size() <= layout.fixed_size);
        }
    }
});
