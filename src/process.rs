//! Houses the `Processor`, which decides line by line what gets written.
use anyhow::Result;

use crate::set::SeenSet;
use crate::sink::Emit;

/// A `Processor` has no state of its own. With a `SeenSet` it passes along
/// only lines the set hasn't seen; without one it passes along everything.
/// It's `Copy` and `Sync`, so every parallel worker can have one.
#[derive(Clone, Copy)]
pub struct Processor<'set> {
    seen: Option<&'set SeenSet>,
}

impl<'set> Processor<'set> {
    /// A `Processor` that drops lines already in `seen`, or that keeps every
    /// line if `seen` is `None`.
    #[must_use]
    pub fn new(seen: Option<&'set SeenSet>) -> Self {
        Processor { seen }
    }

    /// Sends `line` to `out` unless it's a repeat. Returns whether it was sent.
    pub fn process<'data>(&self, line: &'data [u8], out: &mut impl Emit<'data>) -> Result<bool> {
        if let Some(seen) = self.seen {
            if !seen.test_and_mark(line) {
                return Ok(false);
            }
        }
        out.emit(line)?;
        Ok(true)
    }

    /// The parallel half of `process`, for `line` at position `index` of a
    /// batch: `false` means the line is certainly a repeat, `true` that it
    /// may not be. Call `keeps` once every position has been claimed.
    pub fn claim(&self, index: usize, line: &[u8]) -> bool {
        match self.seen {
            Some(seen) => seen.claim(line, index),
            None => true,
        }
    }

    /// After a batch has been claimed: should `line`, at `index`, be sent?
    pub fn keeps(&self, index: usize, line: &[u8]) -> bool {
        match self.seen {
            Some(seen) => seen.is_claimed_by(line, index),
            None => true,
        }
    }
}
