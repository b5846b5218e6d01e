//! The help text, the version line, and the banner printed at startup.
use crate::styles::{app_name, as_item, as_title, as_version, ColorChoice, StyledStr};
use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::io::Write;
use terminal_size::{terminal_size, Height, Width};
use textwrap::{self, wrap};

enum HelpItem<'a> {
    Usage(&'a str),
    Paragraph(&'a str),
    Section(Section<'a>),
}
struct Section<'a> {
    title: &'a str,
    entries: Vec<Entry<'a>>,
}
struct Entry<'a> {
    item: StyledStr<'a>,
    caption: &'a str,
}

const NAME: &str = "xtee";
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// The name and version, e.g. `xtee 0.3.0`
#[must_use]
pub fn version() -> String {
    format!("{NAME} {VERSION}")
}

/// Prints the help text to standard output
pub fn print(color_choice: ColorChoice) -> Result<()> {
    let mut stdout = anstream::AutoStream::new(std::io::stdout().lock(), color_choice.for_anstream());
    match fallible_print(&mut stdout) {
        Err(e) => bail!("failed printing to stdout: {e}"),
        Ok(()) => Ok(()),
    }
}

const BANNER: &str = r"      _
__  _| |_ ___  ___
\ \/ / __/ _ \/ _ \
 >  <| ||  __/  __/
/_/\_\\__\___|\___|";
const BANNER_INDENT: &str = "             ";

/// Prints the banner to standard error
pub fn print_banner(color_choice: ColorChoice) -> Result<()> {
    let mut stderr = anstream::AutoStream::new(std::io::stderr().lock(), color_choice.for_anstream());
    match fallible_print_banner(&mut stderr) {
        Err(e) => bail!("failed printing to stderr: {e}"),
        Ok(()) => Ok(()),
    }
}

fn fallible_print_banner(stderr: &mut dyn Write) -> std::io::Result<()> {
    let version = format!("v{VERSION}");
    writeln!(stderr)?;
    for line in BANNER.lines() {
        writeln!(stderr, "{}", app_name(line))?;
    }
    writeln!(stderr, "{BANNER_INDENT}{}", as_version(&version))?;
    writeln!(stderr)
}

fn fallible_print(stdout: &mut dyn Write) -> std::io::Result<()> {
    let help = parse(include_str!("help.txt"));
    writeln!(stdout, "{} {}", app_name(NAME), VERSION)?;
    for help_item in help {
        match help_item {
            HelpItem::Paragraph(text) => {
                for line in wrap(text, &C.wrap_options) {
                    writeln!(stdout, "{line}")?;
                }
            }
            HelpItem::Usage(args) => {
                writeln!(stdout, "{}{}{}", as_title("Usage: "), app_name(NAME), args)?;
            }
            HelpItem::Section(s) => {
                writeln!(stdout, "{}", as_title(s.title))?;
                s.print_entries(stdout)?;
            }
        };
    }
    Ok(())
}

fn parse(text: &str) -> Vec<HelpItem> {
    const USAGE: &str = "Usage: ";
    let mut help = Vec::new();
    let mut lines = text.lines().fuse();
    while let Some(line) = lines.next() {
        if let Some(rest) = line.strip_prefix(USAGE) {
            let (_, args) = rest.split_at(rest.find(' ').unwrap_or(rest.len()));
            help.push(HelpItem::Usage(args));
        } else if line.ends_with(':') {
            let title = line;
            let mut entries = Vec::new();
            let result = loop {
                let Some(entry) = lines.next() else { break None };
                let entry = entry.trim_end();
                if entry.is_empty() {
                    break Some(HelpItem::Paragraph(""));
                }
                let Some(sp_sp) = entry.rfind("  ") else { panic!("No double space in {entry}") };
                let (item, caption) = entry.split_at(sp_sp + 2);
                entries.push(Entry { item: as_item(item), caption });
            };
            help.push(HelpItem::Section(Section { title, entries }));
            if let Some(part) = result {
                help.push(part);
            }
        } else {
            help.push(HelpItem::Paragraph(line));
        }
    }
    help
}

impl<'a> Section<'a> {
    fn print_entries(self, stdout: &mut dyn Write) -> std::io::Result<()> {
        if self.entries.iter().all(Entry::fits_in_line) {
            for entry in &self.entries {
                writeln!(stdout, "{}{}", entry.item, entry.caption)?;
            }
            return Ok(());
        }
        // Either wrap each caption beside its item, or put every caption on
        // the lines below its item, whichever takes fewer lines.
        let same_line_help = self.same_line_help_lines();
        let next_line_help = self.next_line_help_lines();
        let help = if badness(&same_line_help) <= badness(&next_line_help) {
            &same_line_help
        } else {
            &next_line_help
        };
        for line in help.iter().flatten() {
            writeln!(stdout, "{line}")?;
        }
        Ok(())
    }
    fn next_line_help_indent(&self) -> &'a str {
        let max_indent =
            self.entries.iter().map(|e| e.item.indented_by()).fold(0, std::cmp::Ord::max);
        let indent_len = (max_indent + 4).min(BLANKS.len());
        &BLANKS[..indent_len]
    }
    fn next_line_help_lines(&self) -> Vec<Vec<Cow<'a, str>>> {
        let mut result = Vec::new();
        let indent = self.next_line_help_indent();
        for entry in &self.entries {
            result.push(vec![Cow::from(entry.item.to_string())]);
            result.push(entry.next_line_caption(indent));
        }
        result
    }
    fn same_line_help_lines(&self) -> Vec<Vec<Cow<'a, str>>> {
        self.entries.iter().map(Entry::same_line_help).collect()
    }
}

fn badness<T>(vv: &[Vec<T>]) -> usize {
    vv.iter().fold(0, |total, v| {
        let m = v.len().saturating_sub(2);
        total + v.len() + m * 2
    })
}

const BLANKS: &str = "                                                        ";
impl<'a> Entry<'a> {
    fn fits_in_line(&self) -> bool {
        self.item.len() + self.caption.len() <= C.line_width
    }
    fn next_line_caption(&self, indent: &'a str) -> Vec<Cow<'a, str>> {
        wrap(self.caption, C.wrap_options.clone().initial_indent(indent).subsequent_indent(indent))
    }
    fn same_line_help(&self) -> Vec<Cow<'a, str>> {
        let first = &self.item.to_string();
        let rest = &BLANKS[..(self.item.len() + 4).min(BLANKS.len())];
        let options = C.wrap_options.clone().initial_indent(first).subsequent_indent(rest);
        wrap(self.caption, options)
    }
}

struct Constants<'a> {
    line_width: usize,
    wrap_options: textwrap::Options<'a>,
}
static C: Lazy<Constants> = Lazy::new(|| {
    fn from_env() -> Option<usize> {
        std::env::var_os("COLUMNS")?.to_str()?.parse::<usize>().ok()
    }
    let line_width = if let Some((Width(width), Height(_))) = terminal_size() {
        width as usize
    } else {
        from_env().unwrap_or(100)
    };
    let wrap_options = textwrap::Options::new(line_width);

    Constants { line_width, wrap_options }
});
