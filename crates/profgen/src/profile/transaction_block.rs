//! The `http-get`, `http-post` and `http-stager` blocks.
//!
//! These blocks are projections of a single transaction. Which transaction, and which
//! sections wrap the session data, comes from the block's [`BlockShape`].

use tracing::{debug, trace, warn};

use crate::profile::rules::{self, BlockShape, UriRule};
use crate::profile::{BlockGenerator, BlockKind, BlockWriter};
use crate::{GenerateError, Transaction};

/// Generator for a block projected from one transaction.
#[derive(Debug)]
pub struct TransactionBlock {
    shape: &'static BlockShape,
}

pub(crate) static HTTP_GET: TransactionBlock = TransactionBlock { shape: &rules::HTTP_GET_SHAPE };
pub(crate) static HTTP_POST: TransactionBlock = TransactionBlock { shape: &rules::HTTP_POST_SHAPE };
pub(crate) static HTTP_STAGER: TransactionBlock = TransactionBlock { shape: &rules::HTTP_STAGER_SHAPE };

impl BlockGenerator for TransactionBlock {
    fn kind(&self) -> BlockKind {
        self.shape.kind
    }

    fn generate(&self, transactions: &[Transaction], writer: &mut BlockWriter) -> Result<(), GenerateError> {
        let shape = self.shape;
        let source = shape.source.select(transactions).ok_or(GenerateError::NoTransactions { kind: shape.kind })?;
        debug!(kind = %shape.kind, method = %source.method(), path = source.path(), "projecting transaction");

        writer.open(shape.kind.as_str());
        match shape.uri {
            UriRule::Single => writer.set("uri", source.path()),
            UriRule::PerArch => {
                writer.set("uri_x86", source.path());
                writer.set("uri_x64", &x64_uri(source, transactions));
            }
        }
        if let Some(verb) = shape.verb {
            writer.set("verb", verb);
        }

        writer.blank_line();
        writer.open("client");
        write_request_headers(source, writer);
        if let Some(section) = shape.client_data {
            writer.blank_line();
            writer.open(section.name);
            writer.statement(section.encoding);
            writer.statement_with("parameter", &rules::parameter_name(source));
            writer.close();
        }
        if let Some(encoding) = shape.client_output {
            writer.blank_line();
            let payload = source.body().map(|body| (body.as_ref(), source.header("Content-Type")));
            write_output(writer, Some(encoding), payload);
        }
        writer.close();

        writer.blank_line();
        writer.open("server");
        write_headers(source.response_headers(), writer);
        writer.blank_line();
        let payload = source
            .response_body()
            .filter(|_| shape.server_prepend)
            .map(|body| (body.as_ref(), source.response_header("Content-Type")));
        write_output(writer, shape.server_output, payload);
        writer.close();

        writer.close();
        Ok(())
    }
}

/// Writes the `Host` directive when needed, then every request header that survives the
/// denylist.
fn write_request_headers(source: &Transaction, writer: &mut BlockWriter) {
    let host = source.host();
    if !host.is_empty() && !source.has_header_value(http::header::HOST.as_str(), host) {
        writer.header("Host", host);
    }
    write_headers(source.headers(), writer);
}

fn write_headers(headers: &[(String, String)], writer: &mut BlockWriter) {
    for (name, value) in headers {
        if rules::is_transport_header(name) {
            trace!(name = name.as_str(), "skipping transport header");
            continue;
        }
        writer.header(name, value);
    }
}

/// `output { [encoding;] [prepend "<payload>";] print; }`
fn write_output(writer: &mut BlockWriter, encoding: Option<&str>, payload: Option<(&[u8], Option<&str>)>) {
    writer.open("output");
    if let Some(encoding) = encoding {
        writer.statement(encoding);
    }
    if let Some((body, content_type)) = payload {
        if !content_type.is_none_or(rules::is_textual) {
            warn!(content_type, len = body.len(), "body is not text, writing it byte-escaped");
        }
        writer.statement_with_bytes("prepend", body);
    }
    writer.statement("print");
    writer.close();
}

/// The x64 stager URI: the next distinct path in the capture, else the x86 path with `64`
/// inserted before the query string.
fn x64_uri(source: &Transaction, transactions: &[Transaction]) -> String {
    if let Some(other) = transactions.iter().map(Transaction::path).find(|path| *path != source.path()) {
        return other.to_owned();
    }

    let path = source.path_without_query();
    let query = &source.path()[path.len()..];
    format!("{path}64{query}")
}
