//! Command-line arguments of the simulator binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tilesim::logging::LogFormat;

/// tilesim - replay a head-motion trace through a tiled streaming session.
#[derive(Debug, Parser)]
#[command(name = "tilesim", version, about = "Tiled 360° video streaming simulator")]
pub struct Cli {
    /// Run configuration (JSON)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Increase verbosity (can be repeated: -v, -vv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Emit structured JSON logs
    #[arg(long = "json")]
    pub json: bool,

    /// Log to file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// 1=warn, 2=info, 3=debug, 4+=trace
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            1
        } else {
            2u8.saturating_add(self.verbose)
        }
    }

    pub fn log_format(&self) -> LogFormat {
        if self.json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}
