use anyhow::{bail, Result};
use is_terminal::IsTerminal;
use std::io;
use xtee::args::Request;
use xtee::logging::Verbosity;
use xtee::{help, logging};

fn main() -> Result<()> {
    let args = xtee::args::parsed()?;

    let config = match args.request {
        Request::Help => return help::print(args.color),
        Request::Version => {
            println!("{}", help::version());
            return Ok(());
        }
        Request::Run(config) => config,
    };

    logging::init(args.verbosity, args.color)?;
    if args.verbosity != Verbosity::Silent {
        help::print_banner(args.color)?;
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("stdin stream expected!");
    }
    let config = config.validated()?;
    xtee::run(&config, stdin.lock(), io::stdout().lock())?;
    Ok(())
}
