//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use profgen::profile::{DEFAULT_JITTER, DEFAULT_PROFILE_NAME, DEFAULT_SLEEPTIME, MAX_JITTER};
use profgen::{BlockKind, InputFormat, ProfileOptions, Selection};

/// Convert captured HTTP traffic into malleable C2 profile blocks.
///
/// Reads an HTTP Archive (HAR) export or a raw HTTP request, optionally followed by its
/// response, and writes the requested profile block.
#[derive(Parser, Debug)]
#[command(name = "profgen", author, version, about, long_about)]
pub struct Args {
    /// Capture file to convert, `-` reads standard input
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Write the profile to this file instead of standard output
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Profile name
    #[arg(short, long, value_name = "NAME", default_value = DEFAULT_PROFILE_NAME)]
    pub name: String,

    /// Input format, detected when omitted
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Block to generate
    #[arg(long, value_enum, default_value_t = BlockArg::Full)]
    pub block: BlockArg,

    /// Beacon sleep time in milliseconds (full profile only)
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_SLEEPTIME)]
    pub sleeptime: u64,

    /// Sleep jitter in percent (full profile only)
    #[arg(
        long,
        value_name = "PCT",
        default_value_t = DEFAULT_JITTER,
        value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_JITTER))
    )]
    pub jitter: u8,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn profile_options(&self) -> ProfileOptions {
        ProfileOptions { name: self.name.clone(), sleeptime: self.sleeptime, jitter: self.jitter }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// HTTP Archive JSON
    Har,
    /// Raw HTTP request text
    Raw,
}

impl From<FormatArg> for InputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Har => InputFormat::Har,
            FormatArg::Raw => InputFormat::Raw,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockArg {
    HttpGet,
    HttpPost,
    HttpStager,
    HttpConfig,
    /// Every block plus the global options
    Full,
}

impl From<BlockArg> for Selection {
    fn from(block: BlockArg) -> Self {
        match block {
            BlockArg::HttpGet => Selection::One(BlockKind::HttpGet),
            BlockArg::HttpPost => Selection::One(BlockKind::HttpPost),
            BlockArg::HttpStager => Selection::One(BlockKind::HttpStager),
            BlockArg::HttpConfig => Selection::One(BlockKind::HttpConfig),
            BlockArg::Full => Selection::Full,
        }
    }
}
