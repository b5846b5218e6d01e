//! Houses the `Dispatcher`, which processes a soaked-up batch of lines in
//! parallel without changing the order they come out in.
//!
//! The batch is cut into contiguous chunks, one per worker. Each worker
//! claims its chunk's lines, by position, in the shared `SeenSet`, keeping the
//! lines whose claims succeeded in a buffer of its own. Only after every
//! worker is done are the buffers forwarded to the sink, first chunk first,
//! dropping any line whose claim a worker on an earlier chunk took away. So
//! (1)  the `SeenSet` alone decides which occurrence of a line is the first,
//!      however the workers happen to interleave, and
//! (2)  the forwarding pass alone decides the order, which is the input order
//!      because chunk *k* holds only lines that come after chunk *k-1*'s.
//!
//! Together these give exactly what a single streaming pass would give.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::thread;

use crate::process::Processor;
use crate::sink::Emit;

/// The `Dispatcher` knows how many workers it may use.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    max_workers: NonZeroUsize,
}

impl Default for Dispatcher {
    /// One worker per available CPU
    fn default() -> Self {
        let max_workers = thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        Dispatcher { max_workers }
    }
}

/// A worker's output: the position and contents of each line it claimed
type Claimed<'data> = Vec<(usize, &'data [u8])>;

impl Dispatcher {
    /// A `Dispatcher` using at most `max_workers` workers
    #[must_use]
    pub fn with_max_workers(max_workers: NonZeroUsize) -> Self {
        Dispatcher { max_workers }
    }

    /// The number of workers for `line_count` lines: no more than allowed,
    /// no more than there are lines, and at least one.
    #[must_use]
    pub fn workers_for(&self, line_count: usize) -> usize {
        self.max_workers.get().min(line_count).max(1)
    }

    /// Runs each of `lines` through `processor` in parallel, then forwards the
    /// survivors to `sink` in their original order. Returns the number of
    /// lines forwarded.
    ///
    /// Workers don't do I/O and can't fail. If one panics, `rayon` re-raises
    /// the panic here once the others have finished, before anything has been
    /// forwarded.
    pub fn run<'data>(
        &self,
        lines: &[&'data [u8]],
        processor: Processor<'_>,
        sink: &mut impl Emit<'data>,
    ) -> Result<usize> {
        if lines.is_empty() {
            return Ok(0);
        }
        let workers = self.workers_for(lines.len());
        let chunks = chunk_ranges(lines.len(), workers);
        tracing::debug!(lines = lines.len(), workers, "dispatching soaked input");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|n| format!("xtee-worker-{n}"))
            .build()
            .context("Can't start worker threads")?;

        let buffers: Vec<Claimed<'data>> = pool.install(|| {
            chunks
                .into_par_iter()
                .map(|range| {
                    let start = range.start;
                    let mut claimed = Vec::with_capacity(range.len());
                    for (offset, &line) in lines[range].iter().enumerate() {
                        let index = start + offset;
                        if processor.claim(index, line) {
                            claimed.push((index, line));
                        }
                    }
                    claimed
                })
                .collect()
        });

        let mut forwarded = 0;
        for (index, line) in buffers.into_iter().flatten() {
            if processor.keeps(index, line) {
                sink.emit(line)?;
                forwarded += 1;
            }
        }
        Ok(forwarded)
    }
}

/// Cuts `0..len` into `parts` contiguous ranges whose lengths differ by at
/// most one, longer ranges first. `parts` must be nonzero.
pub(crate) fn chunk_ranges(len: usize, parts: usize) -> Vec<Range<usize>> {
    let (base, extra) = (len / parts, len % parts);
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for n in 0..parts {
        let end = start + base + usize::from(n < extra);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;
    use crate::set::SeenSet;
    use crate::sink::Sink;
    use itertools::Itertools;

    fn workers(n: usize) -> Dispatcher {
        Dispatcher::with_max_workers(NonZeroUsize::new(n).unwrap())
    }

    fn dispatched(dispatcher: Dispatcher, lines: &[&[u8]], unique: bool) -> Vec<u8> {
        let seen = SeenSet::default();
        let processor = Processor::new(unique.then_some(&seen));
        let mut sink = Sink::<Vec<u8>, Vec<u8>>::new().with_file("test", Vec::new());
        let forwarded = dispatcher.run(lines, processor, &mut sink).unwrap();
        assert_eq!(forwarded, sink.emitted());
        sink.close().unwrap().1.unwrap()
    }

    // What a single sequential pass would write
    fn streamed(lines: &[&[u8]], unique: bool) -> Vec<u8> {
        let keep: Vec<&[u8]> =
            if unique { lines.iter().copied().unique().collect() } else { lines.to_vec() };
        keep.iter().flat_map(|line| line.iter().chain(b"\n")).copied().collect()
    }

    fn numbered(count: usize, modulus: usize) -> String {
        (0..count).map(|n| format!("line {}", (n * 7) % modulus)).join("\n")
    }

    #[test]
    fn chunk_ranges_cover_everything_once_in_order() {
        for len in 0..40 {
            for parts in 1..=len.max(1) {
                let ranges = chunk_ranges(len, parts);
                assert_eq!(ranges.len(), parts);
                assert_eq!(ranges.iter().cloned().flatten().collect_vec(), (0..len).collect_vec());
                let sizes = ranges.iter().map(|r| r.len()).collect_vec();
                assert!(sizes.windows(2).all(|w| w[0] >= w[1] && w[0] - w[1] <= 1), "{sizes:?}");
            }
        }
    }

    #[test]
    fn workers_are_limited_by_lines_and_at_least_one() {
        assert_eq!(workers(4).workers_for(0), 1);
        assert_eq!(workers(4).workers_for(2), 2);
        assert_eq!(workers(4).workers_for(100), 4);
        assert_eq!(Dispatcher::default().workers_for(1), 1);
    }

    #[test]
    fn nothing_in_nothing_out() {
        assert_eq!(dispatched(workers(3), &[], true), b"");
        assert_eq!(dispatched(workers(3), &[], false), b"");
    }

    #[test]
    fn repeats_come_out_in_first_occurrence_order_for_any_worker_count() {
        let lines: &[&[u8]] = &[b"a", b"b", b"a", b"c", b"b"];
        for k in 1..=lines.len() {
            assert_eq!(dispatched(workers(k), lines, true), b"a\nb\nc\n", "with {k} workers");
        }
    }

    #[test]
    fn soaked_output_matches_streamed_output_for_any_worker_count() {
        let text = numbered(60, 13);
        let lines = text.lines().map(str::as_bytes).collect_vec();
        for unique in [false, true] {
            let expected = streamed(&lines, unique);
            for k in 1..=lines.len() {
                let got = dispatched(workers(k), &lines, unique);
                assert_eq!(got, expected, "with {k} workers, unique={unique}");
            }
        }
    }

    #[test]
    fn soaked_output_is_stable_across_repeated_runs() {
        let text = numbered(2000, 97);
        let lines = text.lines().map(str::as_bytes).collect_vec();
        let expected = streamed(&lines, true);
        for _ in 0..20 {
            assert_eq!(dispatched(workers(8), &lines, true), expected);
        }
    }

    #[test]
    fn seeded_lines_never_come_out() {
        let seen = SeenSet::default();
        assert!(seen.test_and_mark(b"y"));
        let lines: &[&[u8]] = &[b"y", b"z", b"y", b"x"];
        let mut out: Vec<&[u8]> = Vec::new();
        let forwarded = workers(4).run(lines, Processor::new(Some(&seen)), &mut out).unwrap();
        assert_eq!(forwarded, 2);
        assert_eq!(out, [&b"z"[..], b"x"]);
    }

    struct FailsOn(&'static [u8], Vec<Vec<u8>>);
    impl<'data> Emit<'data> for FailsOn {
        fn emit(&mut self, line: &'data [u8]) -> Result<()> {
            if line == self.0 {
                anyhow::bail!("can't write {:?}", bstr::BStr::new(line));
            }
            self.1.push(line.to_vec());
            Ok(())
        }
    }

    #[test]
    fn sink_errors_stop_forwarding() {
        let lines: &[&[u8]] = &[b"a", b"b", b"c", b"d"];
        let mut sink = FailsOn(b"c", Vec::new());
        let err = workers(2).run(lines, Processor::new(None), &mut sink).unwrap_err();
        assert_eq!(err.to_string(), "can't write \"c\"");
        assert_eq!(sink.1, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}
