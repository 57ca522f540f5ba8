//! Raw HTTP text parser.
//!
//! Accepts a request exactly as an intercepting proxy shows it: request line, headers, a
//! blank line and an optional body, optionally followed by the response to that request.
//!
//! # Implementation Details
//!
//! The request head is decoded with `httparse`, which already accepts both CRLF and bare LF
//! line endings. A few adjustments make copied text parse the way a reader expects:
//!
//! 1. leading blank lines are dropped
//! 2. a head that is not terminated by a blank line is completed
//! 3. the `HTTP/2` version shown by proxies for h2 traffic is read as HTTP/1.1
//!
//! Header lines `httparse` rejects, such as a name containing a space, are kept by splitting
//! them on the first colon, and a warning names each one.
//!
//! Everything after the head is the body. When the request declares a `Content-Length` and
//! a response status line follows the declared length, the body is cut there. Otherwise the
//! body runs up to the first line that is a well-formed status line (`HTTP/x.y SP 3DIGIT`),
//! and any text from there on is decoded as the response.

use std::borrow::Cow;

use http::{Method, StatusCode};
use httparse::{Error, ParserConfig, Status};
use tracing::{debug, trace, warn};

use crate::parser::{InputFormat, InputParser};
use crate::{FormatError, Transaction, ensure};

/// Maximum number of headers accepted in one request or response head
const MAX_HEADER_NUM: usize = 128;

/// Appended to a head that ends before its terminating blank line
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Parser for raw HTTP text, producing exactly one transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawParser;

impl InputParser for RawParser {
    fn format(&self) -> InputFormat {
        InputFormat::Raw
    }

    fn parse(&self, input: &[u8]) -> Result<Vec<Transaction>, FormatError> {
        parse_raw(input).map(|transaction| vec![transaction])
    }
}

/// Parses raw HTTP text into a single transaction.
///
/// # Errors
///
/// Returns [`FormatError::InvalidRequestLine`] when the first line is not
/// `METHOD SP request-target SP HTTP-version`, [`FormatError::InvalidHeader`] when the head
/// holds more than the supported number of headers, and [`FormatError::Empty`] for blank
/// input.
pub fn parse_raw(input: &[u8]) -> Result<Transaction, FormatError> {
    let input = skip_blank_lines(input);
    ensure!(!input.is_empty(), FormatError::Empty);

    let buf = downgrade_http2(input);
    let request_line = String::from_utf8_lossy(first_line(&buf)).into_owned();

    let (head, rest) = decode_request(&buf, &request_line)?;
    let (body, response) = split_body(head.content_length(), rest);

    let method = Method::from_bytes(head.method.as_bytes())
        .map_err(|e| FormatError::invalid_request_line(&request_line, e))?;
    let mut builder = Transaction::builder(method, head.path).headers(head.headers).body(body.to_vec());

    if let Some(raw) = response {
        match decode_response(raw) {
            Ok(response) => {
                debug!(status = ?response.status, headers = response.headers.len(), "parsed raw response");
                builder = builder
                    .status(response.status)
                    .response_headers(response.headers)
                    .response_body(response.body);
            }
            Err(e) => warn!(cause = %e, "dropping unparsable response"),
        }
    }

    let transaction = builder.build();
    debug!(
        method = %transaction.method(),
        path = transaction.path(),
        headers = transaction.headers().len(),
        "parsed raw request"
    );
    Ok(transaction)
}

/// Owned copy of a decoded request head.
struct RequestHead {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
}

impl RequestHead {
    fn from_request(req: &httparse::Request<'_, '_>, head: &[u8], request_line: &str) -> Result<Self, FormatError> {
        let method = req.method.ok_or_else(|| FormatError::invalid_request_line(request_line, "missing method"))?;
        let path = req.path.ok_or_else(|| FormatError::invalid_request_line(request_line, "missing request-target"))?;
        let headers = restore_skipped_headers(head, collect_headers(req.headers));
        Ok(Self { method: method.to_owned(), path: path.to_owned(), headers })
    }

    fn content_length(&self) -> Option<usize> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(http::header::CONTENT_LENGTH.as_str()))
            .and_then(|(_, value)| value.trim().parse().ok())
    }
}

/// Owned copy of a decoded response.
struct ResponseHead {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

/// Decodes the request head, returning it with the bytes that follow it.
fn decode_request<'a>(buf: &'a [u8], request_line: &str) -> Result<(RequestHead, &'a [u8]), FormatError> {
    let mut config = ParserConfig::default();
    config.ignore_invalid_headers_in_requests(true);

    let map_error = |e: Error| match e {
        Error::TooManyHeaders => FormatError::invalid_header(format!("more than {MAX_HEADER_NUM} headers")),
        Error::HeaderName | Error::HeaderValue => FormatError::invalid_header(e),
        Error::Token | Error::Version | Error::NewLine | Error::Status => {
            FormatError::invalid_request_line(request_line, e)
        }
    };

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);
    if let Status::Complete(offset) = config.parse_request(&mut req, buf).map_err(map_error)? {
        return Ok((RequestHead::from_request(&req, &buf[..offset], request_line)?, &buf[offset..]));
    }

    trace!("request head is not terminated, completing it");
    let completed = [buf, HEAD_TERMINATOR].concat();
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);
    match config.parse_request(&mut req, &completed).map_err(map_error)? {
        Status::Complete(_) => Ok((RequestHead::from_request(&req, buf, request_line)?, &buf[buf.len()..])),
        Status::Partial => Err(FormatError::invalid_request_line(request_line, "incomplete request head")),
    }
}

fn decode_response(raw: &[u8]) -> Result<ResponseHead, Error> {
    let buf = downgrade_http2(raw);
    let mut config = ParserConfig::default();
    config.allow_spaces_after_header_name_in_responses(true).allow_obsolete_multiline_headers_in_responses(true);

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut res = httparse::Response::new(&mut headers);
    if let Status::Complete(offset) = config.parse_response(&mut res, &buf)? {
        return Ok(ResponseHead {
            status: status_of(&res),
            headers: collect_headers(res.headers),
            body: buf[offset..].to_vec(),
        });
    }

    let completed = [buf.as_ref(), HEAD_TERMINATOR].concat();
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut res = httparse::Response::new(&mut headers);
    match config.parse_response(&mut res, &completed)? {
        Status::Complete(_) => {
            Ok(ResponseHead { status: status_of(&res), headers: collect_headers(res.headers), body: Vec::new() })
        }
        Status::Partial => Err(Error::Status),
    }
}

fn status_of(res: &httparse::Response<'_, '_>) -> Option<StatusCode> {
    res.code.and_then(|code| StatusCode::from_u16(code).ok())
}

fn collect_headers(headers: &[httparse::Header<'_>]) -> Vec<(String, String)> {
    headers
        .iter()
        .filter(|header| !header.name.is_empty())
        .map(|header| (header.name.to_owned(), String::from_utf8_lossy(header.value).into_owned()))
        .collect()
}

/// Puts back the header lines `httparse` skipped as invalid, split on the first colon.
///
/// `parsed` holds the accepted headers in head order, so walking the head lines against it
/// finds every skipped line.
fn restore_skipped_headers(head: &[u8], parsed: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut parsed = parsed.into_iter().peekable();
    let mut headers = Vec::with_capacity(parsed.len());

    let lines = head.split(|byte| *byte == b'\n').map(|line| line.strip_suffix(b"\r").unwrap_or(line));
    for line in lines.skip(1).take_while(|line| !line.is_empty()) {
        let text = String::from_utf8_lossy(line);
        let Some((name, value)) = text.split_once(':') else {
            warn!(line = %text, "dropping header line without a colon");
            continue;
        };
        let (name, value) = (name.trim(), value.trim());

        let accepted = parsed.peek().is_some_and(|(parsed_name, parsed_value)| {
            parsed_name == name && parsed_value.trim() == value
        });
        if accepted {
            headers.extend(parsed.next());
        } else {
            warn!(line = %text, "keeping header line with an invalid name");
            headers.push((name.to_owned(), value.to_owned()));
        }
    }

    headers.extend(parsed);
    headers
}

/// Separates the request body from a response that may follow it.
fn split_body(content_length: Option<usize>, rest: &[u8]) -> (&[u8], Option<&[u8]>) {
    if let Some(length) = content_length {
        if length > rest.len() {
            trace!(content_length = length, available = rest.len(), "body shorter than declared");
            return (rest, None);
        }

        let (body, tail) = rest.split_at(length);
        let tail = skip_blank_lines(tail);
        if tail.is_empty() {
            return (body, None);
        }
        if is_status_line(tail) {
            return (body, Some(tail));
        }
        warn!(content_length = length, available = rest.len(), "body longer than declared, keeping all of it");
    }

    match find_status_line(rest) {
        Some(start) => (trim_trailing_newlines(&rest[..start]), Some(&rest[start..])),
        None => (rest, None),
    }
}

/// Returns true when `line` starts with `HTTP/x.y SP 3DIGIT` followed by a space or the line
/// end. `HTTP/2` is accepted as a version too.
fn is_status_line(line: &[u8]) -> bool {
    let Some(rest) = line.strip_prefix(b"HTTP/") else {
        return false;
    };
    let (version, code) = rest.split_at(rest.iter().position(|byte| *byte == b' ').unwrap_or(rest.len()));

    let version_ok = match version {
        [major, b'.', minor] => major.is_ascii_digit() && minor.is_ascii_digit(),
        [b'2'] => true,
        _ => false,
    };
    let code = code.strip_prefix(b" ").unwrap_or_default();
    version_ok
        && code.len() >= 3
        && code[..3].iter().all(u8::is_ascii_digit)
        && code.get(3).is_none_or(|byte| matches!(*byte, b' ' | b'\r' | b'\n'))
}

/// Finds the offset of the first line that is a response status line.
fn find_status_line(buf: &[u8]) -> Option<usize> {
    if is_status_line(buf) {
        return Some(0);
    }
    buf.iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'\n')
        .map(|(index, _)| index + 1)
        .find(|start| is_status_line(&buf[*start..]))
}

fn first_line(buf: &[u8]) -> &[u8] {
    let line = buf.split(|byte| *byte == b'\n').next().unwrap_or_default();
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn skip_blank_lines(mut buf: &[u8]) -> &[u8] {
    while let Some(end) = buf.iter().position(|byte| *byte == b'\n') {
        if !buf[..end].trim_ascii().is_empty() {
            return buf;
        }
        buf = &buf[end + 1..];
    }
    if buf.trim_ascii().is_empty() { &buf[buf.len()..] } else { buf }
}

fn trim_trailing_newlines(mut buf: &[u8]) -> &[u8] {
    while let Some(rest) = buf.strip_suffix(b"\n") {
        buf = rest.strip_suffix(b"\r").unwrap_or(rest);
    }
    buf
}

/// Rewrites an `HTTP/2` version on the first line as `HTTP/1.1`.
///
/// Proxies display h2 traffic with an HTTP/1-style head whose version is `HTTP/2`, which
/// `httparse` refuses. Both a trailing version (request line) and a leading version
/// (status line) are handled.
fn downgrade_http2(buf: &[u8]) -> Cow<'_, [u8]> {
    let line = first_line(buf);

    for version in [&b"HTTP/2.0"[..], &b"HTTP/2"[..]] {
        if let Some(prefix) = line.strip_suffix(version) {
            if prefix.ends_with(b" ") {
                return Cow::Owned([prefix, b"HTTP/1.1", &buf[line.len()..]].concat());
            }
        }
        if let Some(suffix) = buf.strip_prefix(version) {
            if suffix.starts_with(b" ") {
                return Cow::Owned([&b"HTTP/1.1"[..], suffix].concat());
            }
        }
    }
    Cow::Borrowed(buf)
}
