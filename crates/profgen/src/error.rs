use thiserror::Error;

use crate::profile::BlockKind;

/// The input cannot be read under the selected (or detected) format at all.
///
/// This is the only error that aborts a run.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("input is empty")]
    Empty,

    #[error("invalid archive json: {reason}")]
    InvalidJson { reason: String },

    #[error("archive has no log entries: {reason}")]
    MissingLog { reason: String },

    #[error("invalid request line {line:?}: {reason}")]
    InvalidRequestLine { line: String, reason: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },
}

impl FormatError {
    pub fn invalid_json<S: ToString>(str: S) -> Self {
        Self::InvalidJson { reason: str.to_string() }
    }

    pub fn missing_log<S: ToString>(str: S) -> Self {
        Self::MissingLog { reason: str.to_string() }
    }

    pub fn invalid_request_line<L: ToString, S: ToString>(line: L, str: S) -> Self {
        Self::InvalidRequestLine { line: line.to_string(), reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }
}

/// One archive entry could not be turned into a transaction; the entry is skipped.
#[derive(Error, Debug)]
#[error("entry {index}: {reason}")]
pub struct EntryError {
    pub index: usize,
    pub reason: String,
}

impl EntryError {
    pub fn new<S: ToString>(index: usize, str: S) -> Self {
        Self { index, reason: str.to_string() }
    }
}

/// A single block could not be generated; the rest of the profile is unaffected.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("no transaction available for {kind}")]
    NoTransactions { kind: BlockKind },
}

/// A profile string literal holds a malformed escape sequence.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid escape sequence at offset {offset}")]
pub struct UnescapeError {
    pub offset: usize,
}
