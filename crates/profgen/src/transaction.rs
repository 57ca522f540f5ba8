//! Normalized representation of one captured HTTP exchange.
//!
//! A [`Transaction`] is what every input parser produces and what every block generator
//! consumes. It is built once through [`TransactionBuilder`] and is read-only afterwards.
//!
//! Headers are kept as an ordered list of `(name, value)` pairs instead of an
//! `http::HeaderMap`: the generated profile must reproduce the captured header order and
//! the original name casing, and duplicates have to survive untouched.

use bytes::Bytes;
use http::{Method, StatusCode};

/// One HTTP request, optionally paired with the response that answered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    method: Method,
    path: String,
    host: String,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    response: Option<ResponsePart>,
}

/// Response half of a transaction, only present when the capture recorded one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ResponsePart {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
}

impl Transaction {
    /// Starts building a transaction for the given method and request-target.
    pub fn builder<S: Into<String>>(method: Method, path: S) -> TransactionBuilder {
        TransactionBuilder::new(method, path)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request-target as captured, query string included.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request-target without its query string.
    pub fn path_without_query(&self) -> &str {
        match self.path.split_once('?') {
            Some((path, _)) => path,
            None => &self.path,
        }
    }

    /// Host the request was sent to, empty when the capture did not say.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the first value of the named request header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns true when a header with this name (case-insensitive) carries exactly `value`.
    pub fn has_header_value(&self, name: &str, value: &str) -> bool {
        self.headers.iter().any(|(n, v)| n.eq_ignore_ascii_case(name) && v == value)
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Parameter names of the query string, in the order they appear.
    pub fn query_keys(&self) -> Vec<&str> {
        let Some((_, query)) = self.path.split_once('?') else {
            return Vec::new();
        };

        query
            .split('&')
            .map(|pair| pair.split_once('=').map_or(pair, |(key, _)| key))
            .filter(|key| !key.is_empty())
            .collect()
    }

    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.response.as_ref().and_then(|response| response.status)
    }

    /// Response headers, empty when no response was captured.
    pub fn response_headers(&self) -> &[(String, String)] {
        match &self.response {
            Some(response) => &response.headers,
            None => &[],
        }
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        find_header(self.response_headers(), name)
    }

    pub fn response_body(&self) -> Option<&Bytes> {
        self.response.as_ref().and_then(|response| response.body.as_ref())
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
}

/// Builder for [`Transaction`].
///
/// When no host is set explicitly, [`build`](TransactionBuilder::build) takes it from the
/// `Host` request header, falling back to the HTTP/2 `:authority` pseudo-header.
#[derive(Debug)]
pub struct TransactionBuilder {
    method: Method,
    path: String,
    host: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    response: Option<ResponsePart>,
}

impl TransactionBuilder {
    fn new<S: Into<String>>(method: Method, path: S) -> Self {
        Self { method, path: path.into(), host: None, headers: Vec::new(), body: None, response: None }
    }

    #[must_use]
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn header<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn headers<I: IntoIterator<Item = (String, String)>>(mut self, headers: I) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets the request body; an empty body is recorded as absent.
    #[must_use]
    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        let body = body.into();
        self.body = if body.is_empty() { None } else { Some(body) };
        self
    }

    #[must_use]
    pub fn status(mut self, status: Option<StatusCode>) -> Self {
        self.response.get_or_insert_with(ResponsePart::default).status = status;
        self
    }

    #[must_use]
    pub fn response_headers<I: IntoIterator<Item = (String, String)>>(mut self, headers: I) -> Self {
        self.response.get_or_insert_with(ResponsePart::default).headers.extend(headers);
        self
    }

    #[must_use]
    pub fn response_body<B: Into<Bytes>>(mut self, body: B) -> Self {
        let body = body.into();
        self.response.get_or_insert_with(ResponsePart::default).body = if body.is_empty() { None } else { Some(body) };
        self
    }

    pub fn build(self) -> Transaction {
        let host = match self.host {
            Some(host) if !host.is_empty() => host,
            _ => find_header(&self.headers, http::header::HOST.as_str())
                .or_else(|| find_header(&self.headers, ":authority"))
                .unwrap_or_default()
                .to_owned(),
        };

        Transaction {
            method: self.method,
            path: self.path,
            host,
            headers: self.headers,
            body: self.body,
            response: self.response,
        }
    }
}
