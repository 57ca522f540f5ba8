//! `profgen` command line.
//!
//! Reads one capture, converts it and writes the profile. Exits non-zero only when the
//! input cannot be parsed at all or an I/O operation fails; skipped entries and blocks are
//! reported as warnings on stderr.

mod args;
mod logging;

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use profgen::{ProfileBuilder, parse_input};
use tracing::{error, info};

use args::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let input = read_input(&args.input)?;

    let transactions = parse_input(&input, args.format.map(Into::into))
        .with_context(|| format!("cannot parse {}", args.input.display()))?;
    info!(transactions = transactions.len(), "parsed capture");

    let options = args.profile_options();
    let profile = ProfileBuilder::new(&transactions, &options).render(args.block.into());

    write_output(args.output.as_deref(), &profile)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf).context("cannot read standard input")?;
        return Ok(buf);
    }
    fs::read(path).with_context(|| format!("cannot read {}", path.display()))
}

fn write_output(path: Option<&Path>, profile: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, profile).with_context(|| format!("cannot write {}", path.display()))?;
            info!(path = %path.display(), "profile written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(profile.as_bytes()).context("cannot write standard output")?;
            stdout.flush().context("cannot write standard output")?;
        }
    }
    Ok(())
}
