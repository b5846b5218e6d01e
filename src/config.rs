//! The `Config` value the engine runs with. It's built once, by the command
//! line parser or by a caller using the library, and never changed afterward.
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// What to do with the lines of standard input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Read all of standard input before writing anything
    pub soak: bool,
    /// Append to the destination file rather than truncating it. With
    /// `unique`, lines already in the file count as seen.
    pub append: bool,
    /// Write each distinct line only once
    pub unique: bool,
    /// Don't touch the destination file, just show what would be written
    pub preview: bool,
    /// Don't echo lines to standard output
    pub quiet: bool,
    /// The destination file. Optional only when `preview` is set.
    pub destination: Option<PathBuf>,
}

impl Config {
    /// Returns `self` if it makes sense, and an error if it doesn't.
    pub fn validated(self) -> Result<Self> {
        if self.destination.is_none() && !self.preview {
            bail!("file expected!");
        }
        Ok(self)
    }

    /// The destination file, if we're going to write to it
    #[must_use]
    pub fn file_to_write(&self) -> Option<&Path> {
        if self.preview {
            None
        } else {
            self.destination.as_deref()
        }
    }

    /// The file whose lines count as already seen, if there is one
    #[must_use]
    pub fn file_to_seed_from(&self) -> Option<&Path> {
        if self.unique && self.append {
            self.destination.as_deref()
        } else {
            None
        }
    }
}
