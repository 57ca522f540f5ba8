//! Turns captured HTTP traffic into malleable C2 profile blocks.
//!
//! The crate is a single-pass transducer:
//!
//! ```text
//! raw bytes -> InputParser -> Vec<Transaction> -> BlockGenerator(s) -> profile text
//! ```
//!
//! # Input
//!
//! Two capture formats are understood, see [`parser`]:
//!
//! - HTTP Archive (HAR 1.2) JSON, one [`Transaction`] per entry
//! - raw HTTP text as copied from an intercepting proxy, one [`Transaction`]
//!
//! # Output
//!
//! [`ProfileBuilder`] renders the `http-get`, `http-post`, `http-stager` and
//! `http-config` blocks, alone or as a full profile with global options.
//!
//! # Errors
//!
//! Only [`FormatError`] is fatal. A malformed archive entry ([`EntryError`]) is skipped and
//! a block that cannot be generated ([`GenerateError`]) is replaced by a comment; both
//! are reported through `tracing` warnings.
//!
//! # Example
//!
//! ```
//! use profgen::{BlockKind, InputFormat, ProfileBuilder, ProfileOptions, Selection, parse_input};
//!
//! let raw = b"GET /login?user=a HTTP/1.1\r\nHost: example.com\r\nUser-Agent: X\r\n\r\n";
//! let transactions = parse_input(raw, Some(InputFormat::Raw))?;
//!
//! let options = ProfileOptions::default();
//! let profile = ProfileBuilder::new(&transactions, &options).render(Selection::One(BlockKind::HttpGet));
//!
//! assert!(profile.contains(r#"set uri "/login?user=a";"#));
//! assert!(profile.contains(r#"header "User-Agent" "X";"#));
//! # Ok::<(), profgen::FormatError>(())
//! ```

mod error;
pub mod parser;
pub mod profile;
mod transaction;
mod utils;

pub use error::{EntryError, FormatError, GenerateError, UnescapeError};
pub use parser::{InputFormat, parse_input};
pub use profile::{BlockKind, ProfileBuilder, ProfileOptions, Selection};
pub use transaction::{Transaction, TransactionBuilder};

pub(crate) use utils::ensure;
