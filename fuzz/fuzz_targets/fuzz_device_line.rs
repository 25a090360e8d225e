//! Fuzz target: `LineBuffer::feed` + `protocol::parse`
//!
//! Drives arbitrary byte sequences through the framer in two chunks and
//! parses every line it yields.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - No yielded line is longer than the buffer capacity
//! - Accepted volume samples stay within 0.0..=1.0
//!
//! cargo fuzz run fuzz_device_line

#![no_main]

use exhibit::protocol::{parse, DeviceEvent, Framed, LineBuffer, MAX_LINE_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut lines: LineBuffer = LineBuffer::new();

    // Split the input so partial-line joins get exercised too.
    let (head, tail) = data.split_at(data.len() / 2);
    lines.feed(head);
    lines.feed(tail);
    assert!(lines.pending_len() <= MAX_LINE_LEN);

    while let Some(framed) = lines.next_line() {
        let Framed::Line(line) = framed else { continue };
        // The lossy decode may widen invalid bytes to U+FFFD.
        assert!(line.chars().count() <= MAX_LINE_LEN, "line exceeds buffer");
        if let Ok(DeviceEvent::Volume(ev)) = parse(&line) {
            for level in ev.volumes.levels() {
                assert!((0.0..=1.0).contains(level), "level out of range");
            }
        }
    }

    lines.reset();
    assert_eq!(lines.pending_len(), 0);
});
