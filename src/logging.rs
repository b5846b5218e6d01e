//! Diagnostics go to standard error through `tracing`, leaving standard
//! output to the lines being copied.
use anyhow::{anyhow, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::styles::ColorChoice;

/// How much to say on standard error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No banner, no log messages (`--silent`)
    Silent,
    /// The banner, and informational messages
    #[default]
    Normal,
    /// Everything, including debugging messages (`--verbose`)
    Verbose,
}

impl Verbosity {
    /// The most detailed level logged, unless `RUST_LOG` says otherwise
    #[must_use]
    pub fn level(self) -> LevelFilter {
        match self {
            Verbosity::Silent => LevelFilter::OFF,
            Verbosity::Normal => LevelFilter::INFO,
            Verbosity::Verbose => LevelFilter::DEBUG,
        }
    }
}

/// Installs the global subscriber. Call it once, before anything logs.
pub fn init(verbosity: Verbosity, color: ColorChoice) -> Result<()> {
    let filter = EnvFilter::builder().with_default_directive(verbosity.level().into()).from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(color.for_stderr())
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("Can't set up logging: {e}"))
}

#[allow(clippy::pedantic)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn louder_verbosities_log_more() {
        assert!(Verbosity::Silent.level() < Verbosity::Normal.level());
        assert!(Verbosity::Normal.level() < Verbosity::Verbose.level());
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }
}
