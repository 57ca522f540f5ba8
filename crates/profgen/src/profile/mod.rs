//! Block generators projecting transactions into malleable profile text.
//!
//! Every block kind has one [`BlockGenerator`]. The `http-get`, `http-post` and
//! `http-stager` generators share one implementation driven by static block shapes;
//! `http-config` aggregates over all transactions instead of picking one.
//!
//! [`ProfileBuilder`] renders either a single block or the full profile. A generator that
//! fails does not abort the run: its block is replaced by a `# <kind> skipped: <reason>`
//! comment and a warning is logged.

use std::fmt;

use tracing::{debug, warn};

use crate::{GenerateError, Transaction};

mod aggregate;
mod config_block;
mod escape;
mod rules;
mod transaction_block;
mod writer;

pub use aggregate::TrafficSummary;
pub use config_block::ConfigBlock;
pub use escape::{escape, escape_bytes, unescape};
pub use transaction_block::TransactionBlock;
pub use writer::BlockWriter;

pub const DEFAULT_PROFILE_NAME: &str = "Generated Profile";
pub const DEFAULT_SLEEPTIME: u64 = 60_000;
pub const DEFAULT_JITTER: u8 = 20;
pub const MAX_JITTER: u8 = 99;

/// The named sections a profile can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    HttpGet,
    HttpPost,
    HttpStager,
    HttpConfig,
}

impl BlockKind {
    /// All kinds in the order the full profile emits them.
    pub const ALL: [BlockKind; 4] =
        [BlockKind::HttpGet, BlockKind::HttpPost, BlockKind::HttpStager, BlockKind::HttpConfig];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::HttpGet => "http-get",
            BlockKind::HttpPost => "http-post",
            BlockKind::HttpStager => "http-stager",
            BlockKind::HttpConfig => "http-config",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to render: one block, or every block with the global options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    One(BlockKind),
    #[default]
    Full,
}

/// Settings that do not come from the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOptions {
    /// Heading comment and `sample_name` of the profile.
    pub name: String,
    /// Beacon sleep time in milliseconds.
    pub sleeptime: u64,
    /// Sleep jitter in percent, `0..=99`.
    pub jitter: u8,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self { name: DEFAULT_PROFILE_NAME.to_owned(), sleeptime: DEFAULT_SLEEPTIME, jitter: DEFAULT_JITTER }
    }
}

/// Writes one block kind from a sequence of transactions.
pub trait BlockGenerator {
    fn kind(&self) -> BlockKind;

    /// Writes the complete block, or nothing when an error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError`] when the transactions cannot populate this block.
    fn generate(&self, transactions: &[Transaction], writer: &mut BlockWriter) -> Result<(), GenerateError>;
}

/// Generators in full-profile order.
static GENERATORS: [&(dyn BlockGenerator + Sync); 4] = [
    &transaction_block::HTTP_GET,
    &transaction_block::HTTP_POST,
    &transaction_block::HTTP_STAGER,
    &ConfigBlock,
];

/// Returns the generator registered for `kind`.
pub fn generator_for(kind: BlockKind) -> &'static (dyn BlockGenerator + Sync) {
    match kind {
        BlockKind::HttpGet => &transaction_block::HTTP_GET,
        BlockKind::HttpPost => &transaction_block::HTTP_POST,
        BlockKind::HttpStager => &transaction_block::HTTP_STAGER,
        BlockKind::HttpConfig => &ConfigBlock,
    }
}

/// Assembles profile text from parsed transactions.
#[derive(Debug)]
pub struct ProfileBuilder<'a> {
    transactions: &'a [Transaction],
    options: &'a ProfileOptions,
}

impl<'a> ProfileBuilder<'a> {
    pub fn new(transactions: &'a [Transaction], options: &'a ProfileOptions) -> Self {
        Self { transactions, options }
    }

    /// Renders the selection; failed blocks degrade to a skip comment.
    pub fn render(&self, selection: Selection) -> String {
        let mut writer = BlockWriter::new();

        match selection {
            Selection::One(kind) => {
                writer.comment(&self.options.name);
                self.write_block(generator_for(kind), &mut writer);
            }
            Selection::Full => {
                self.write_globals(&mut writer);
                for generator in GENERATORS {
                    writer.blank_line();
                    self.write_block(generator, &mut writer);
                }
            }
        }

        debug!(selection = ?selection, transactions = self.transactions.len(), "rendered profile");
        writer.finish()
    }

    fn write_block(&self, generator: &(dyn BlockGenerator + Sync), writer: &mut BlockWriter) {
        let mut block = BlockWriter::new();
        match generator.generate(self.transactions, &mut block) {
            Ok(()) => writer.append(block),
            Err(e) => {
                warn!(kind = %generator.kind(), cause = %e, "block skipped");
                writer.comment(&format!("{} skipped: {e}", generator.kind()));
            }
        }
    }

    fn write_globals(&self, writer: &mut BlockWriter) {
        let summary = TrafficSummary::collect(self.transactions);
        let options = self.options;

        writer.comment("");
        writer.comment(&options.name);
        writer.comment("Generated from captured HTTP traffic");
        writer.comment("");
        writer.blank_line();
        writer.set("sample_name", &options.name);
        writer.set("sleeptime", &options.sleeptime.to_string());
        writer.set("jitter", &options.jitter.min(MAX_JITTER).to_string());
        writer.set("useragent", summary.user_agent.unwrap_or(rules::DEFAULT_USER_AGENT));
    }
}
