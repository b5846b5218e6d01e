//! Where lines end up: the console, the destination file, both, or neither.
use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, IntoInnerError, Write};
use std::path::Path;

/// Anything that accepts lines, in order. `'data` is the lifetime of the
/// lines: a `Sink` copies them out immediately, so it accepts lines of any
/// lifetime, but a `Vec<&'data [u8]>` just keeps the reference.
pub trait Emit<'data> {
    /// Accepts `line`, which has no line terminator
    fn emit(&mut self, line: &'data [u8]) -> Result<()>;
}

/// Collecting lines in memory can't fail.
impl<'data> Emit<'data> for Vec<&'data [u8]> {
    fn emit(&mut self, line: &'data [u8]) -> Result<()> {
        self.push(line);
        Ok(())
    }
}

/// Opens `path` for writing, creating it and any missing parent directories.
/// If `append` is false, existing content is discarded.
pub fn open_destination(path: &Path, append: bool) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Can't create directory: {}", parent.display()))?;
    }
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path).with_context(|| format!("Can't open file: {}", path.display()))
}

/// The file half of a `Sink`: a buffered writer, and the file's name for
/// error messages.
struct FileChannel<F: Write> {
    path_display: String,
    writer: BufWriter<F>,
}

/// A `Sink` writes each line it's given, plus a `\n`, to the console (unless
/// it's been told to be quiet) and to a file (unless it's previewing). It
/// writes lines in the order it gets them and doesn't reorder anything.
///
/// * The console is written directly; callers wanting buffering can hand in a
///   buffered writer.
/// * The file is buffered, and flushed when its buffer fills and when the
///   `Sink` is closed.
pub struct Sink<C: Write, F: Write> {
    console: Option<C>,
    file: Option<FileChannel<F>>,
    emitted: usize,
}

impl<C: Write, F: Write> Sink<C, F> {
    /// A `Sink` with no channels at all, which just counts lines
    #[must_use]
    pub fn new() -> Self {
        Sink { console: None, file: None, emitted: 0 }
    }

    /// Echo lines to `console`
    #[must_use]
    pub fn with_console(mut self, console: C) -> Self {
        self.console = Some(console);
        self
    }

    /// Write lines to `file`; `path_display` names it in error messages
    #[must_use]
    pub fn with_file(mut self, path_display: impl Into<String>, file: F) -> Self {
        let writer = BufWriter::new(file);
        self.file = Some(FileChannel { path_display: path_display.into(), writer });
        self
    }

    /// The number of lines emitted so far
    #[must_use]
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Flushes both channels and gives them back. Dropping the returned file
    /// closes it.
    pub fn close(self) -> Result<(Option<C>, Option<F>)> {
        let Sink { console, file, .. } = self;
        let console = match console {
            Some(mut console) => {
                console.flush().context("Error writing to standard output")?;
                Some(console)
            }
            None => None,
        };
        let file = match file {
            Some(FileChannel { path_display, writer }) => Some(
                writer
                    .into_inner()
                    .map_err(IntoInnerError::into_error)
                    .with_context(|| format!("Error writing to file: {path_display}"))?,
            ),
            None => None,
        };
        Ok((console, file))
    }
}

impl<C: Write, F: Write> Default for Sink<C, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'data, C: Write, F: Write> Emit<'data> for Sink<C, F> {
    fn emit(&mut self, line: &'data [u8]) -> Result<()> {
        if let Some(console) = &mut self.console {
            write_line(console, line).context("Error writing to standard output")?;
        }
        if let Some(FileChannel { path_display, writer }) = &mut self.file {
            write_line(writer, line)
                .with_context(|| format!("Error writing to file: {path_display}"))?;
        }
        self.emitted += 1;
        Ok(())
    }
}

fn write_line(out: &mut impl Write, line: &[u8]) -> io::Result<()> {
    out.write_all(line)?;
    out.write_all(b"\n")
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;
    use assert_fs::{prelude::*, TempDir};

    type MemorySink = Sink<Vec<u8>, Vec<u8>>;

    fn emit_all(sink: &mut MemorySink, lines: &[&[u8]]) {
        for line in lines {
            sink.emit(line).unwrap();
        }
    }

    #[test]
    fn both_channels_see_every_line_in_order() {
        let mut sink = MemorySink::new().with_console(Vec::new()).with_file("test", Vec::new());
        emit_all(&mut sink, &[b"b", b"a", b"", b"b"]);
        assert_eq!(sink.emitted(), 4);
        let (console, file) = sink.close().unwrap();
        assert_eq!(console.unwrap(), b"b\na\n\nb\n");
        assert_eq!(file.unwrap(), b"b\na\n\nb\n");
    }

    #[test]
    fn channels_are_independent() {
        let mut quiet = MemorySink::new().with_file("test", Vec::new());
        emit_all(&mut quiet, &[b"x"]);
        assert_eq!(quiet.close().unwrap(), (None, Some(b"x\n".to_vec())));

        let mut preview = MemorySink::new().with_console(Vec::new());
        emit_all(&mut preview, &[b"x"]);
        assert_eq!(preview.close().unwrap(), (Some(b"x\n".to_vec()), None));

        let mut neither = MemorySink::new();
        emit_all(&mut neither, &[b"x", b"y"]);
        assert_eq!(neither.emitted(), 2);
        assert_eq!(neither.close().unwrap(), (None, None));
    }

    struct Full;
    impl Write for Full {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn a_failed_flush_names_the_file() {
        let mut sink = Sink::<Vec<u8>, Full>::new().with_file("out.txt", Full);
        sink.emit(b"fits in the buffer").unwrap();
        let err = sink.close().err().unwrap();
        assert_eq!(err.to_string(), "Error writing to file: out.txt");
    }

    #[test]
    fn a_failed_console_write_is_an_error() {
        let mut sink = Sink::<Full, Vec<u8>>::new().with_console(Full);
        let err = sink.emit(b"x").unwrap_err();
        assert_eq!(err.to_string(), "Error writing to standard output");
    }

    #[test]
    fn open_destination_creates_missing_directories() {
        let temp = TempDir::new().unwrap();
        let path = temp.child("a/b/out.txt");
        let mut file = open_destination(path.path(), false).unwrap();
        file.write_all(b"x\n").unwrap();
        drop(file);
        path.assert("x\n");
    }

    #[test]
    fn open_destination_truncates_or_appends() {
        let temp = TempDir::new().unwrap();
        let path = temp.child("out.txt");
        path.write_str("old\n").unwrap();

        let mut file = open_destination(path.path(), true).unwrap();
        file.write_all(b"new\n").unwrap();
        drop(file);
        path.assert("old\nnew\n");

        let mut file = open_destination(path.path(), false).unwrap();
        file.write_all(b"newer\n").unwrap();
        drop(file);
        path.assert("newer\n");
    }

    #[test]
    fn open_destination_fails_when_the_parent_is_a_file() {
        let temp = TempDir::new().unwrap();
        temp.child("plain").write_str("").unwrap();
        let err = open_destination(temp.child("plain/out.txt").path(), false).unwrap_err();
        assert!(err.to_string().starts_with("Can't create directory: "));
    }
}
