//! Line-level input: splitting byte buffers into lines, and the two ways of
//! pulling lines out of standard input (one at a time, or all at once).
//!
//! A "line" is zero or more bytes up to a `\n`, with a single trailing `\r`
//! removed. A last line with no terminator still counts, but a terminator at
//! the very end doesn't add an empty line.
use anyhow::{Context, Result};
use bstr::io::BufReadExt;
use encoding_rs_io::DecodeReaderBytesBuilder;
use memchr::memchr;
use std::io::{BufReader, Read};

/// Returns the lines of `slice`, each borrowed from `slice`.
pub fn lines_of(mut slice: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    while let Some(end) = memchr(b'\n', slice) {
        let (mut line, rest) = slice.split_at(end);
        slice = &rest[1..];
        if let Some(&maybe_cr) = line.last() {
            if maybe_cr == b'\r' {
                line = &line[..line.len() - 1];
            }
        }
        lines.push(line);
    }
    if !slice.is_empty() {
        lines.push(slice);
    }
    lines
}

/// Decode UTF-16 to UTF-8 if we see a UTF-16 Byte Order Mark at the beginning of `candidate`,
/// and drop a UTF-8 Byte Order Mark if there is one. Otherwise return `candidate` unchanged.
pub(crate) fn decode_if_utf16(candidate: Vec<u8>) -> Vec<u8> {
    // Note: `decode_without_bom_handling` will change malformed sequences to the
    // Unicode REPLACEMENT CHARACTER.
    if let Some((enc, bom_len)) = encoding_rs::Encoding::for_bom(&candidate) {
        if [encoding_rs::UTF_16LE, encoding_rs::UTF_16BE].contains(&enc) {
            let (translated, _had_malformed_sequences) =
                enc.decode_without_bom_handling(&candidate[bom_len..]);
            return translated.into_owned().into_bytes();
        }
        if enc == encoding_rs::UTF_8 {
            return candidate[bom_len..].to_vec();
        }
    }
    return candidate;
}

/// `Input` is the standard input stream (or anything else that implements
/// `Read`), read either way with UTF-16 translated to UTF-8 and any Byte Order
/// Mark stripped.
pub struct Input<R: Read> {
    name: String,
    source: R,
}

impl<R: Read> Input<R> {
    /// `name` is used only in error messages
    pub fn new(name: impl Into<String>, source: R) -> Self {
        Input { name: name.into(), source }
    }

    /// Streaming mode: calls `for_each_line` on each line as soon as it's been
    /// read. Stops at the first error, whether from reading or from
    /// `for_each_line`. Returns the number of lines read.
    pub fn for_each_line<F>(self, mut for_each_line: F) -> Result<usize>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let Input { name, source } = self;
        // Like any `DecodeReaderBytes` wrapped in a `BufReader`, this
        // double-buffers, but the second buffer is what `for_byte_line` needs.
        let mut reader = BufReader::new(
            DecodeReaderBytesBuilder::new()
                .bom_sniffing(true) // Look at the BOM to detect UTF-16 input and convert to UTF-8
                .strip_bom(true) // Remove the BOM before sending data to us
                .utf8_passthru(true) // Don't enforce UTF-8 (BOM or no BOM)
                .build(source),
        );
        let mut count = 0_usize;
        let mut failure = None;
        reader
            .for_byte_line(|line| {
                count += 1;
                match for_each_line(line) {
                    Ok(()) => Ok(true),
                    Err(e) => {
                        failure = Some(e);
                        Ok(false)
                    }
                }
            })
            .with_context(|| format!("Error reading {name}"))?;
        match failure {
            Some(e) => Err(e),
            None => Ok(count),
        }
    }

    /// Buffered ("soak") mode: reads the whole stream, then decodes it all at
    /// once. Use `lines_of` to split the result.
    pub fn soak(self) -> Result<Vec<u8>> {
        let Input { name, mut source } = self;
        let mut contents = Vec::new();
        source.read_to_end(&mut contents).with_context(|| format!("Error reading {name}"))?;
        Ok(decode_if_utf16(contents))
    }
}
