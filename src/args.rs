//! Code to parse the command line using `clap`, and definitions of the parsed
//! result

use anyhow::Result;
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Config;
use crate::logging::Verbosity;
use crate::styles::ColorChoice;

/// Returns the parsed command line, exiting with a usage message if it can't
/// be parsed. The `Config` of a `Request::Run` still needs `validated`.
pub fn parsed() -> Result<Args> {
    CliArgs::parse().resolved()
}

/// Like `parsed`, but takes the arguments (including the program name) from
/// `args` and returns parse errors instead of exiting.
pub fn parsed_from<I, T>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    CliArgs::try_parse_from(args)?.resolved()
}

/// The parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// What we've been asked to do
    pub request: Request,
    /// `--silent`, `--verbose`, or neither
    pub verbosity: Verbosity,
    /// `--monochrome` or not
    pub color: ColorChoice,
}

/// What we've been asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Print the help text
    Help,
    /// Print the version
    Version,
    /// Copy standard input as `Config` says, once it's been validated
    Run(Config),
}

#[derive(Debug, Parser)]
#[command(name = "xtee", disable_help_flag = true, disable_version_flag = true)]
/// `CliArgs` is the raw command line; `Args` is what we make of it.
struct CliArgs {
    /// Read all of standard input before writing anything
    #[arg(long)]
    soak: bool,
    /// Append to the file instead of replacing its contents
    #[arg(long)]
    append: bool,
    /// Write each distinct line only once
    #[arg(long)]
    unique: bool,
    /// Show what would be written, but leave the file alone
    #[arg(long)]
    preview: bool,
    /// Don't echo lines to standard output
    #[arg(short, long)]
    quiet: bool,
    /// Don't use color
    #[arg(short, long)]
    monochrome: bool,
    /// Don't print the banner or log messages
    #[arg(short, long)]
    silent: bool,
    /// Print debugging messages
    #[arg(short, long)]
    verbose: bool,
    /// Print help
    #[arg(short, long)]
    help: bool,
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,
    /// The file to copy lines to
    #[arg(value_name = "FILE")]
    destination: Option<PathBuf>,
}

impl CliArgs {
    fn resolved(self) -> Result<Args> {
        // `--verbose` wins over `--silent`
        let verbosity = if self.verbose {
            Verbosity::Verbose
        } else if self.silent {
            Verbosity::Silent
        } else {
            Verbosity::Normal
        };
        let color = if self.monochrome { ColorChoice::Never } else { ColorChoice::Auto };
        let request = if self.help {
            Request::Help
        } else if self.version {
            Request::Version
        } else {
            let config = Config {
                soak: self.soak,
                append: self.append,
                unique: self.unique,
                preview: self.preview,
                quiet: self.quiet,
                destination: self.destination,
            };
            Request::Run(config)
        };
        Ok(Args { request, verbosity, color })
    }
}
