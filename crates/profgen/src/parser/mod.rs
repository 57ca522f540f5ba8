//! Input parsers turning captured traffic into [`Transaction`]s.
//!
//! Two formats are understood:
//!
//! - [`HarParser`]: an HTTP Archive (HAR 1.2) JSON document, one transaction per entry
//! - [`RawParser`]: raw HTTP request text as copied out of an intercepting proxy,
//!   optionally followed by the response, producing exactly one transaction
//!
//! # Format detection
//!
//! When the caller does not name a format, [`parse_input`] tries every registered parser
//! in a fixed priority order and keeps the first success. The archive parser goes first
//! since its top-level JSON structure is unambiguous; the raw parser is the permissive
//! fallback, so when everything fails its error is the one reported.

use std::fmt;

use tracing::debug;

use crate::{FormatError, Transaction};

mod har;
mod raw;

pub use har::HarParser;
pub use raw::RawParser;

/// Parses one input document into an ordered list of transactions.
pub trait InputParser {
    /// The format this parser understands.
    fn format(&self) -> InputFormat;

    /// # Errors
    ///
    /// Returns [`FormatError`] when the input cannot be read as this format at all.
    fn parse(&self, input: &[u8]) -> Result<Vec<Transaction>, FormatError>;
}

/// Input formats selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    Har,
    Raw,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Har => "har",
            InputFormat::Raw => "raw",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsers tried by format detection, in priority order.
static DETECTION_ORDER: [&(dyn InputParser + Sync); 2] = [&HarParser, &RawParser];

/// Returns the parser registered for `format`.
fn parser_for(format: InputFormat) -> &'static (dyn InputParser + Sync) {
    match format {
        InputFormat::Har => &HarParser,
        InputFormat::Raw => &RawParser,
    }
}

/// Parses `input` with the parser for `format`, or detects the format when it is `None`.
///
/// # Errors
///
/// Returns [`FormatError`] when the input cannot be parsed. During detection this is the
/// error of the last parser tried.
pub fn parse_input(input: &[u8], format: Option<InputFormat>) -> Result<Vec<Transaction>, FormatError> {
    match format {
        Some(format) => parser_for(format).parse(input),
        None => detect(input),
    }
}

fn detect(input: &[u8]) -> Result<Vec<Transaction>, FormatError> {
    let mut last_error = None;

    for parser in DETECTION_ORDER {
        match parser.parse(input) {
            Ok(transactions) => {
                debug!(format = %parser.format(), transactions = transactions.len(), "detected input format");
                return Ok(transactions);
            }
            Err(e) => {
                debug!(format = %parser.format(), cause = %e, "input rejected");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(FormatError::Empty))
}
