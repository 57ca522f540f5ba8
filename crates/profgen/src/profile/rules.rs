//! Static mapping tables shared by the block generators.
//!
//! Each transaction-derived block is described by a [`BlockShape`]: which transaction it
//! is projected from, how its URI is set and which transforms wrap the session data. The
//! generator walks the shape, so adding a block kind means adding a row here.

use http::Method;

use crate::Transaction;
use crate::profile::BlockKind;

/// Request and response headers managed by the transport, never copied into a block.
static TRANSPORT_HEADERS: [&str; 8] = [
    "content-length",
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

/// Query parameter names tried in order for the session metadata and id.
pub(crate) static PARAMETER_CANDIDATES: [&str; 8] = ["id", "sid", "session", "token", "q", "search", "query", "data"];

/// Response header order used when the capture holds no response headers.
pub(crate) static DEFAULT_HEADER_ORDER: [&str; 6] =
    ["Date", "Server", "Content-Length", "Keep-Alive", "Connection", "Content-Type"];

pub(crate) const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub(crate) const DEFAULT_SERVER: &str = "nginx/1.18.0";
pub(crate) const BLOCKED_USER_AGENTS: &str = "curl*,lynx*,wget*";

/// Response headers that fingerprint the real server stack, removed by `http-config`.
pub(crate) static FINGERPRINT_HEADERS: [&str; 3] = ["Server", "X-Powered-By", "X-AspNet-Version"];

/// Returns true for headers that must not appear in a generated block.
pub(crate) fn is_transport_header(name: &str) -> bool {
    name.starts_with(':') || TRANSPORT_HEADERS.iter().any(|denied| name.eq_ignore_ascii_case(denied))
}

/// Which transaction a block is projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SourceRule {
    /// First GET, else the first transaction.
    FirstGet,
    /// First transaction carrying a body, else the first POST, else the first transaction.
    FirstWithBody,
}

impl SourceRule {
    pub(crate) fn select(self, transactions: &[Transaction]) -> Option<&Transaction> {
        let found = match self {
            SourceRule::FirstGet => transactions.iter().find(|tx| tx.method() == Method::GET),
            SourceRule::FirstWithBody => transactions
                .iter()
                .find(|tx| tx.body().is_some())
                .or_else(|| transactions.iter().find(|tx| tx.method() == Method::POST)),
        };
        found.or_else(|| transactions.first())
    }
}

/// How the request URI is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UriRule {
    /// `set uri`
    Single,
    /// `set uri_x86` and `set uri_x64`
    PerArch,
}

/// A transform section wrapping session data, e.g. `metadata { base64url; parameter "id"; }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DataSection {
    pub(crate) name: &'static str,
    pub(crate) encoding: &'static str,
}

/// Layout of one transaction-derived block.
#[derive(Debug)]
pub(crate) struct BlockShape {
    pub(crate) kind: BlockKind,
    pub(crate) source: SourceRule,
    pub(crate) uri: UriRule,
    pub(crate) verb: Option<&'static str>,
    /// Section carrying the session id or metadata in a query parameter.
    pub(crate) client_data: Option<DataSection>,
    /// Encoding of the client `output` section; the request body is prepended to it.
    pub(crate) client_output: Option<&'static str>,
    /// Encoding of the server `output` section.
    pub(crate) server_output: Option<&'static str>,
    /// Whether the response body is prepended to the server output.
    pub(crate) server_prepend: bool,
}

pub(crate) static HTTP_GET_SHAPE: BlockShape = BlockShape {
    kind: BlockKind::HttpGet,
    source: SourceRule::FirstGet,
    uri: UriRule::Single,
    verb: None,
    client_data: Some(DataSection { name: "metadata", encoding: "base64url" }),
    client_output: None,
    server_output: Some("base64"),
    server_prepend: false,
};

pub(crate) static HTTP_POST_SHAPE: BlockShape = BlockShape {
    kind: BlockKind::HttpPost,
    source: SourceRule::FirstWithBody,
    uri: UriRule::Single,
    verb: Some("POST"),
    client_data: Some(DataSection { name: "id", encoding: "base64url" }),
    client_output: Some("base64url"),
    server_output: Some("base64"),
    server_prepend: true,
};

pub(crate) static HTTP_STAGER_SHAPE: BlockShape = BlockShape {
    kind: BlockKind::HttpStager,
    source: SourceRule::FirstGet,
    uri: UriRule::PerArch,
    verb: None,
    client_data: None,
    client_output: None,
    server_output: None,
    server_prepend: false,
};

/// Picks the first candidate parameter name the request does not already use.
pub(crate) fn parameter_name(transaction: &Transaction) -> String {
    let taken = transaction.query_keys();
    let is_free = |name: &str| !taken.iter().any(|key| key.eq_ignore_ascii_case(name));

    if let Some(name) = PARAMETER_CANDIDATES.iter().find(|name| is_free(name)) {
        return (*name).to_owned();
    }
    (1..)
        .map(|n| format!("{}{n}", PARAMETER_CANDIDATES[0]))
        .find(|name| is_free(name))
        .unwrap_or_default()
}

/// Content types whose bodies read as text; anything else is rendered byte-escaped.
pub(crate) fn is_textual(content_type: &str) -> bool {
    let Ok(mime) = content_type.parse::<mime::Mime>() else {
        return false;
    };

    mime.type_() == mime::TEXT
        || [mime::JSON, mime::XML, mime::JAVASCRIPT, mime::WWW_FORM_URLENCODED].contains(&mime.subtype())
        || mime.suffix().is_some_and(|suffix| suffix == mime::JSON || suffix == mime::XML)
}
