/// Implementation of `ktrace inspect`.
///
/// Decodes a finished capture in one pass and prints a listing to stdout.
///
/// # Output format
///
/// ```text
/// Stream: 2-byte events, 12-byte frames
/// #0     Mark_Init time=0 heap=512
/// #1     Def_Task handle="blink" instance=1
/// #2     Mark_Start time=4 instance=1
/// #3     Mark_Halt time=90
/// ---
/// Def_Task               1
/// Mark_Init              1
/// Mark_Start             1
/// Mark_Halt              1
/// 4 records
/// ```
///
/// A capture that stops partway through a frame is listed up to the last
/// whole record, followed by a note on the trailing bytes.
use std::fs;

use anyhow::{Context, Result};
use ktrace_decoder::{SliceSource, StreamDecoder};
use ktrace_types::TraceTag;

use crate::InspectArgs;

/// Run the `ktrace inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read, its first byte is not a
/// supported event width, or a record inside it is malformed. Records
/// before the bad one are still listed.
pub fn run(args: &InspectArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let mut decoder = StreamDecoder::negotiate(SliceSource::closed(bytes))
        .with_context(|| format!("failed to negotiate {}", args.file.display()))?;

    let descriptor = decoder.descriptor();
    println!(
        "Stream: {}-byte events, {}-byte frames",
        descriptor.event_width().bytes(),
        descriptor.decode_threshold()
    );

    let mut totals = vec![0usize; TraceTag::ALL.len()];
    let mut count = 0usize;
    for (idx, record) in decoder.records().enumerate() {
        let record = record.with_context(|| format!("failed to decode record #{idx}"))?;
        println!("#{idx:<5} {record}");
        totals[usize::from(record.tag().wire_value())] += 1;
        count += 1;
    }

    println!("---");
    for (tag, total) in TraceTag::ALL.iter().zip(&totals) {
        if *total > 0 {
            println!("{:<22} {total}", tag.name());
        }
    }
    println!("{count} record{}", if count == 1 { "" } else { "s" });

    let trailing = decoder.source_mut().remaining();
    if trailing > 0 {
        let plural = if trailing == 1 { "" } else { "s" };
        println!("{trailing} trailing byte{plural} (incomplete frame)");
    }

    Ok(())
}
