/// Safety window: the largest slice examined per step. Bytes beyond it are
/// carried into the next step so a single huge chunk cannot make one call
/// scan unbounded data.
const WINDOW: usize = 4096;

/// Result of one [`LineTruncator::write`] step.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TruncateStep {
    /// Bytes to forward to the rendering target.
    pub out: Vec<u8>,
    /// More carried input remains; call `write(&[])` again to drain it.
    pub more: bool,
}

/// Streaming line-bounded filter.
///
/// Emits a byte-identical prefix of its input up to and including the
/// `limit`-th newline, then emits nothing while still consuming all further
/// input. One instance per stage run per rendering target; the only state
/// carried between calls is the emitted-line count and the overflow carry.
#[derive(Debug)]
pub struct LineTruncator {
    limit: usize,
    lines: usize,
    carry: Vec<u8>,
}

impl LineTruncator {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            lines: 0,
            carry: Vec::new(),
        }
    }

    /// The limit has been reached; every further write is swallowed.
    pub fn is_exhausted(&self) -> bool {
        self.lines >= self.limit
    }

    /// Feed one chunk. Input is always fully consumed: either emitted,
    /// carried for the next step, or (past the limit) discarded.
    pub fn write(&mut self, input: &[u8]) -> TruncateStep {
        if self.is_exhausted() {
            self.carry.clear();
            return TruncateStep::default();
        }

        let mut work = std::mem::take(&mut self.carry);
        work.extend_from_slice(input);

        let mut more = false;
        if work.len() > WINDOW {
            self.carry = work.split_off(WINDOW);
            more = true;
        }

        let mut start = 0;
        while let Some(pos) = work[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos + 1;
            self.lines += 1;
            if self.is_exhausted() {
                // Truncate at and including the limit-th newline; nothing
                // past it is ever emitted, so drop the carry as well.
                work.truncate(end);
                self.carry.clear();
                return TruncateStep {
                    out: work,
                    more: false,
                };
            }
            start = end;
        }

        TruncateStep { out: work, more }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Feed `chunks` through a fresh truncator, draining the carry after
    /// each chunk, and return everything emitted.
    fn run(limit: usize, chunks: &[&[u8]]) -> Vec<u8> {
        let mut truncator = LineTruncator::new(limit);
        let mut emitted = Vec::new();
        for chunk in chunks {
            let mut step = truncator.write(chunk);
            loop {
                emitted.extend_from_slice(&step.out);
                if !step.more {
                    break;
                }
                step = truncator.write(&[]);
            }
        }
        emitted
    }

    #[test]
    fn test_truncates_after_limit_lines() {
        assert_eq!(run(3, &[b"a\nb\nc\nd\n"]), b"a\nb\nc\n");
    }

    #[test]
    fn test_limit_one() {
        assert_eq!(run(1, &[b"x\ny\n"]), b"x\n");
    }

    #[test]
    fn test_exhausted_instance_emits_nothing() {
        let mut truncator = LineTruncator::new(5);
        for _ in 0..5 {
            truncator.write(b"line\n");
        }
        assert!(truncator.is_exhausted());
        let step = truncator.write(b"z\n");
        assert!(step.out.is_empty());
        assert!(!step.more);
    }

    #[test]
    fn test_passes_through_below_limit() {
        assert_eq!(run(10, &[b"a\nb\n"]), b"a\nb\n");
    }

    #[test]
    fn test_partial_line_passes_through() {
        assert_eq!(run(10, &[b"no newline yet"]), b"no newline yet");
    }

    #[test]
    fn test_newline_straddles_chunk_boundary() {
        assert_eq!(run(2, &[b"a", b"\nb", b"\nc\n"]), b"a\nb\n");
    }

    #[test]
    fn test_limit_zero_swallows_everything() {
        assert_eq!(run(0, &[b"a\nb\n"]), b"");
    }

    #[test]
    fn test_large_chunk_is_carried_across_steps() {
        // 10000 bytes of 'x', then the newline: the window forces three
        // steps, every byte must still come through in order.
        let mut input = vec![b'x'; 10_000];
        input.push(b'\n');
        let emitted = run(5, &[&input]);
        assert_eq!(emitted, input);
    }

    #[test]
    fn test_emitted_newlines_never_exceed_limit() {
        let input = b"1\n2\n3\n4\n5\n6\n7\n8\n".repeat(100);
        for limit in [1, 3, 7] {
            let emitted = run(limit, &[&input]);
            let newlines = emitted.iter().filter(|&&b| b == b'\n').count();
            assert_eq!(newlines, limit);
            // Byte-identical prefix of the input.
            assert_eq!(&input[..emitted.len()], &emitted[..]);
            assert_eq!(emitted.last(), Some(&b'\n'));
        }
    }

    #[test]
    fn test_newline_exactly_at_window_boundary() {
        // Newline as byte 4096 (index 4095): the limit-th newline sits on
        // the window edge and must be included exactly once.
        let mut input = vec![b'x'; WINDOW - 1];
        input.push(b'\n');
        input.extend_from_slice(b"after\n");
        let emitted = run(1, &[&input]);
        assert_eq!(emitted, &input[..WINDOW]);
    }

    #[test]
    fn test_newline_just_past_window_boundary() {
        // Newline at index 4096 lands at the start of the carry; it must
        // be counted on the drain step, not dropped.
        let mut input = vec![b'x'; WINDOW];
        input.push(b'\n');
        input.extend_from_slice(b"after\n");
        let emitted = run(1, &[&input]);
        assert_eq!(emitted, &input[..=WINDOW]);
    }

    #[test]
    fn test_reaching_limit_discards_carry() {
        // First 4096 bytes contain the limit-th newline; the carried
        // remainder must be dropped, and later writes stay silent.
        let mut input = b"a\n".to_vec();
        input.extend_from_slice(&vec![b'x'; 2 * WINDOW]);
        let mut truncator = LineTruncator::new(1);
        let step = truncator.write(&input);
        assert_eq!(step.out, b"a\n");
        assert!(!step.more);
        assert!(truncator.write(b"more\n").out.is_empty());
    }

    #[test]
    fn test_chunked_input_matches_single_write() {
        let input = b"alpha\nbeta\ngamma\ndelta\nepsilon\n";
        let whole = run(3, &[input]);
        let byte_at_a_time: Vec<&[u8]> = input.chunks(1).collect();
        assert_eq!(run(3, &byte_at_a_time), whole);
    }
}
