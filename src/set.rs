//! Provides the `SeenSet` structure: the set of lines already written (or
//! already present in the destination file), shared by every worker.
use anyhow::{Context, Result};
use fxhash::FxHashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::input::{decode_if_utf16, lines_of};

/// Who a line in a `SeenSet` belongs to. `Before` sorts ahead of every
/// `At`, so a line seeded from the destination file, or marked while
/// streaming, can never be claimed by a position in a soaked batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Claim {
    Before,
    At(usize),
}

/// A `SeenSet` is a set of lines behind a lock.
/// * Lines get in only through `test_and_mark` and `claim`, each of which
///   tests for membership and inserts in a single step. There's no separate
///   `contains`: two workers checking the same line and then inserting it
///   would both think it was new.
/// * Each line remembers the earliest position that claimed it. That lets
///   parallel workers over a soaked batch agree, once they're all done, on
///   which occurrence of a repeated line is the first.
/// * Members are owned copies of the lines, so a `SeenSet` can outlive the
///   buffer the lines came from.
#[derive(Default)]
pub struct SeenSet {
    lines: Mutex<FxHashMap<Box<[u8]>, Claim>>,
}

impl SeenSet {
    /// Returns `true` if `line` wasn't already in the set, and adds it.
    /// Returns `false`, changing nothing, if it was.
    pub fn test_and_mark(&self, line: &[u8]) -> bool {
        let mut lines = self.locked();
        if lines.contains_key(line) {
            return false;
        }
        lines.insert(Box::from(line), Claim::Before);
        true
    }

    /// Claims `line` for position `index` of a batch. Returns `true` if, as
    /// of now, `index` is the earliest position to have claimed it (taking
    /// the claim away from any later position), and `false` if the line was
    /// already marked or claimed by an earlier position.
    ///
    /// A `true` is provisional while other workers are still claiming; see
    /// `is_claimed_by` for the final answer.
    pub fn claim(&self, line: &[u8], index: usize) -> bool {
        let mut lines = self.locked();
        let mine = Claim::At(index);
        match lines.get_mut(line) {
            Some(owner) if *owner <= mine => false,
            Some(owner) => {
                *owner = mine;
                true
            }
            None => {
                lines.insert(Box::from(line), mine);
                true
            }
        }
    }

    /// Does position `index` hold the claim on `line`? Only meaningful once
    /// every `claim` for the batch has returned.
    #[must_use]
    pub fn is_claimed_by(&self, line: &[u8], index: usize) -> bool {
        self.locked().get(line) == Some(&Claim::At(index))
    }

    /// Returns a `SeenSet` holding each line of `path`. A missing file is
    /// the same as an empty one; any other problem reading it is an error.
    pub fn seeded_from(path: &Path) -> Result<SeenSet> {
        let contents = match fs::read(path) {
            Ok(contents) => decode_if_utf16(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(SeenSet::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Can't read file: {}", path.display()))
            }
        };
        let mut set = FxHashMap::default();
        for line in lines_of(&contents) {
            set.entry(Box::<[u8]>::from(line)).or_insert(Claim::Before);
        }
        Ok(SeenSet { lines: Mutex::new(set) })
    }

    /// The number of distinct lines seen so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.locked().len()
    }

    /// Is the set empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn into_lines(self) -> Vec<Box<[u8]>> {
        self.lines.into_inner().unwrap_or_else(PoisonError::into_inner).into_keys().collect()
    }

    // A panic while holding the lock can't leave the map half-updated, so a
    // poisoned lock is still usable.
    fn locked(&self) -> MutexGuard<'_, FxHashMap<Box<[u8]>, Claim>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
