// tests/line_buffer_props.rs

use multirun::output::LineBuffer;
use proptest::prelude::*;

/// Split `data` at the given cut points.
fn chunks(data: &[u8], mut cuts: Vec<usize>) -> Vec<&[u8]> {
    cuts.retain(|c| *c <= data.len());
    cuts.sort_unstable();
    cuts.dedup();

    let mut out = Vec::new();
    let mut start = 0;
    for cut in cuts {
        out.push(&data[start..cut]);
        start = cut;
    }
    out.push(&data[start..]);
    out
}

proptest! {
    #[test]
    fn chunking_never_changes_lines(
        data in proptest::collection::vec(prop_oneof![Just(b'\n'), Just(b'\r'), any::<u8>()], 0..256),
        cuts in proptest::collection::vec(0usize..256, 0..16),
    ) {
        let mut buf = LineBuffer::new();
        let mut lines = Vec::new();
        for chunk in chunks(&data, cuts) {
            lines.extend(buf.push(chunk));
        }
        let tail = buf.finish();

        for line in &lines {
            prop_assert!(!line.contains(&b'\n'));
        }

        // Re-joining the lines restores the input exactly.
        let mut rebuilt = Vec::new();
        for line in &lines {
            rebuilt.extend_from_slice(line);
            rebuilt.push(b'\n');
        }
        if let Some(tail) = &tail {
            prop_assert!(!tail.is_empty());
            rebuilt.extend_from_slice(tail);
        }
        prop_assert_eq!(&rebuilt, &data);

        let newline_count = data.iter().filter(|b| **b == b'\n').count();
        prop_assert_eq!(lines.len(), newline_count);
    }
}
