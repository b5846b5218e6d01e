//! The `run` function is the kernel of the application: it reads lines from
//! its input and writes them to the console and to a destination file. The
//! `args` module parses the command line, `input` and `sink` hide I/O details,
//! `set` remembers which lines have been written, and `dispatch` processes a
//! soaked-up batch of lines in parallel.
//!
//! Current Limitations:
//! * A "line" is zero or more non-newline bytes followed by a newline. UTF-16
//!   input (and a UTF-16 destination file) is recognized by its Byte Order
//!   Mark and translated to UTF-8, but output is always UTF-8 with `\n` line
//!   terminators.

#![cfg_attr(debug_assertions, allow(dead_code, unused_imports))]
#![deny(unused_must_use)]
#![deny(clippy::all)]
#![allow(clippy::needless_return)]
#![deny(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![deny(missing_docs)]

use anyhow::Result;
use std::io::{Read, Write};

pub mod args;
pub mod config;
pub mod dispatch;
pub mod help;
pub mod input;
pub mod logging;
pub mod process;
pub mod set;
pub mod sink;
pub mod styles;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::input::{lines_of, Input};
use crate::process::Processor;
use crate::set::SeenSet;
use crate::sink::{open_destination, Emit, Sink};

/// What a run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Lines read from the input
    pub read: usize,
    /// Lines written (to whichever of the console and the file are enabled)
    pub written: usize,
}

/// Copies the lines of `input` as `config` directs: to `console` unless
/// `config.quiet`, and to the destination file unless `config.preview`, with
/// repeats dropped if `config.unique`. With `config.soak`, all of `input` is
/// read before anything is written, and the lines are processed in parallel,
/// one worker per CPU.
pub fn run(config: &Config, input: impl Read, console: impl Write) -> Result<Summary> {
    run_with(config, Dispatcher::default(), input, console)
}

/// Like `run`, but soaked input is processed by `dispatcher`.
pub fn run_with(
    config: &Config,
    dispatcher: Dispatcher,
    input: impl Read,
    console: impl Write,
) -> Result<Summary> {
    let seen = if config.unique { Some(seen_set(config)?) } else { None };

    let mut sink = Sink::new();
    if !config.quiet {
        sink = sink.with_console(console);
    }
    if let Some(path) = config.file_to_write() {
        let file = open_destination(path, config.append)?;
        sink = sink.with_file(path.display().to_string(), file);
    } else if let Some(path) = &config.destination {
        tracing::info!(file = %path.display(), "preview only, file left unchanged");
    }

    let processor = Processor::new(seen.as_ref());
    let input = Input::new("standard input", input);
    let outcome = if config.soak {
        soak(input, dispatcher, processor, &mut sink)
    } else {
        input.for_each_line(|line| processor.process(line, &mut sink).map(|_| ()))
    };

    // Whatever happened, flush what was written. An error from processing
    // is more interesting than one from flushing, so it's reported first.
    let written = sink.emitted();
    let closed = sink.close();
    let read = outcome?;
    closed?;

    tracing::debug!(read, written, "done");
    Ok(Summary { read, written })
}

fn seen_set(config: &Config) -> Result<SeenSet> {
    match config.file_to_seed_from() {
        None => Ok(SeenSet::default()),
        Some(path) => {
            let seen = SeenSet::seeded_from(path)?;
            tracing::debug!(lines = seen.len(), file = %path.display(), "seeded from destination");
            Ok(seen)
        }
    }
}

fn soak<R: Read>(
    input: Input<R>,
    dispatcher: Dispatcher,
    processor: Processor<'_>,
    sink: &mut impl for<'data> Emit<'data>,
) -> Result<usize> {
    let contents = input.soak()?;
    let lines = lines_of(&contents);
    dispatcher.run(&lines, processor, sink)?;
    Ok(lines.len())
}
