//! HTTP Archive (HAR 1.2) parser.
//!
//! Only the fields the profile generators need are deserialized; everything else in an
//! entry (timings, cache, cookies, ...) is ignored. The top-level structure must be an
//! object with `log.entries` as an array, otherwise the whole input is rejected. Entries
//! are then converted one by one, and an entry that does not hold a usable request is
//! skipped with a warning instead of failing the run.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use http::{Method, StatusCode, Uri};
use serde::Deserialize;
use serde_json::Value;
use serde_json::error::Category;
use tracing::{debug, warn};

use crate::parser::{InputFormat, InputParser};
use crate::{EntryError, FormatError, Transaction};

/// Parser for HAR documents, producing one transaction per archive entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct HarParser;

#[derive(Deserialize)]
struct Archive {
    log: Log,
}

#[derive(Deserialize)]
struct Log {
    entries: Vec<Value>,
}

#[derive(Deserialize)]
struct Entry {
    request: Request,
    #[serde(default)]
    response: Option<Response>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Request {
    method: String,
    url: String,
    #[serde(default)]
    headers: Vec<NameValue>,
    #[serde(default)]
    post_data: Option<PostData>,
}

#[derive(Deserialize)]
struct NameValue {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct PostData {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    params: Vec<Param>,
}

#[derive(Deserialize)]
struct Param {
    name: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    headers: Vec<NameValue>,
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

impl InputParser for HarParser {
    fn format(&self) -> InputFormat {
        InputFormat::Har
    }

    fn parse(&self, input: &[u8]) -> Result<Vec<Transaction>, FormatError> {
        let archive: Archive = serde_json::from_slice(input).map_err(|e| match e.classify() {
            Category::Data => FormatError::missing_log(e),
            Category::Io | Category::Syntax | Category::Eof => FormatError::invalid_json(e),
        })?;

        let total = archive.log.entries.len();
        let mut transactions = Vec::with_capacity(total);

        for (index, value) in archive.log.entries.into_iter().enumerate() {
            match parse_entry(index, value) {
                Ok(transaction) => transactions.push(transaction),
                Err(e) => warn!(entry = e.index, cause = %e.reason, "skipping malformed archive entry"),
            }
        }

        debug!(entries = total, transactions = transactions.len(), "parsed archive");
        Ok(transactions)
    }
}

fn parse_entry(index: usize, value: Value) -> Result<Transaction, EntryError> {
    let entry: Entry = serde_json::from_value(value).map_err(|e| EntryError::new(index, e))?;
    let request = entry.request;

    let method = Method::from_bytes(request.method.as_bytes())
        .map_err(|e| EntryError::new(index, format!("method {:?}: {e}", request.method)))?;

    let (url_host, path) =
        split_url(&request.url).ok_or_else(|| EntryError::new(index, format!("unusable url {:?}", request.url)))?;

    let mut builder = Transaction::builder(method, path)
        .headers(request.headers.into_iter().map(|h| (h.name, h.value)));

    if let Some(host) = url_host {
        builder = builder.host(host);
    }

    if let Some(body) = request.post_data.and_then(PostData::into_body) {
        builder = builder.body(body);
    }

    if let Some(response) = entry.response {
        let status = u16::try_from(response.status).ok().and_then(|code| StatusCode::from_u16(code).ok());
        builder = builder.status(status).response_headers(response.headers.into_iter().map(|h| (h.name, h.value)));

        if let Some(body) = response.content.and_then(|content| content.into_body(index)) {
            builder = builder.response_body(body);
        }
    }

    Ok(builder.build())
}

impl PostData {
    /// Form posts may be recorded as `params` only; they are joined back into a body.
    fn into_body(self) -> Option<String> {
        match self.text {
            Some(text) if !text.is_empty() => Some(text),
            _ if !self.params.is_empty() => Some(
                self.params
                    .into_iter()
                    .map(|param| match param.value {
                        Some(value) => format!("{}={value}", param.name),
                        None => param.name,
                    })
                    .collect::<Vec<_>>()
                    .join("&"),
            ),
            _ => None,
        }
    }
}

impl Content {
    fn into_body(self, index: usize) -> Option<Vec<u8>> {
        let text = self.text?;
        match self.encoding.as_deref() {
            Some(encoding) if encoding.eq_ignore_ascii_case("base64") => match STANDARD.decode(text.trim()) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(entry = index, cause = %e, "response body is not valid base64, keeping it verbatim");
                    Some(text.into_bytes())
                }
            },
            _ => Some(text.into_bytes()),
        }
    }
}

/// Splits an archive URL into its host (with any non-default port) and request-target.
///
/// Relative URLs yield no host; the `Host` header fills it in later. URLs the `http` crate
/// refuses (non-ASCII paths, for instance) are split by hand.
fn split_url(url: &str) -> Option<(Option<String>, String)> {
    match url.parse::<Uri>() {
        Ok(uri) => {
            let path = uri.path_and_query().map_or("/", |pq| pq.as_str());
            let path = if path.is_empty() { "/" } else { path };
            let host = uri.authority().map(|authority| match authority.port_u16() {
                Some(port) if !is_default_port(uri.scheme_str(), port) => format!("{}:{port}", authority.host()),
                _ => authority.host().to_owned(),
            });
            Some((host, path.to_owned()))
        }
        Err(e) => {
            debug!(url, cause = %e, "falling back to manual url split");
            split_url_by_hand(url)
        }
    }
}

fn split_url_by_hand(url: &str) -> Option<(Option<String>, String)> {
    let url = url.split('#').next().unwrap_or_default();

    let Some((_, rest)) = url.split_once("://") else {
        return url.starts_with('/').then(|| (None, url.to_owned()));
    };

    let split = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, path) = rest.split_at(split);
    let host = authority.rsplit('@').next().unwrap_or_default();
    if host.is_empty() {
        return None;
    }

    let path = match path {
        "" => "/".to_owned(),
        p if p.starts_with('?') => format!("/{p}"),
        p => p.to_owned(),
    };
    Some((Some(host.to_owned()), path))
}

fn is_default_port(scheme: Option<&str>, port: u16) -> bool {
    matches!((scheme, port), (Some("http"), 80) | (Some("https"), 443))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn parse(input: &str) -> Result<Vec<Transaction>, FormatError> {
        HarParser.parse(input.as_bytes())
    }

    #[test]
    fn entries_in_archive_order() {
        let input = indoc! {r#"
        {
          "log": {
            "version": "1.2",
            "creator": {"name": "Charles Proxy", "version": "4.6"},
            "entries": [
              {
                "startedDateTime": "2024-01-01T00:00:00.000Z",
                "request": {
                  "method": "GET",
                  "url": "https://www.example.com/index.html?lang=en",
                  "httpVersion": "HTTP/1.1",
                  "headers": [
                    {"name": "Host", "value": "www.example.com"},
                    {"name": "User-Agent", "value": "Mozilla/5.0"},
                    {"name": "Accept", "value": "*/*"}
                  ],
                  "queryString": [{"name": "lang", "value": "en"}]
                },
                "response": {
                  "status": 200,
                  "statusText": "OK",
                  "headers": [{"name": "Server", "value": "nginx"}],
                  "content": {"size": 5, "mimeType": "text/html", "text": "hello"}
                }
              },
              {
                "request": {
                  "method": "POST",
                  "url": "https://www.example.com:8443/api/submit",
                  "headers": [{"name": "Content-Type", "value": "application/json"}],
                  "postData": {"mimeType": "application/json", "text": "{\"a\":1}"}
                }
              },
              {
                "request": {"method": "GET", "url": "http://www.example.com:80/third", "headers": []}
              }
            ]
          }
        }
        "#};

        let transactions = parse(input).unwrap();
        assert_eq!(transactions.len(), 3);

        let first = &transactions[0];
        assert_eq!(first.method(), &Method::GET);
        assert_eq!(first.path(), "/index.html?lang=en");
        assert_eq!(first.host(), "www.example.com");
        assert_eq!(first.headers().len(), 3);
        assert_eq!(first.headers()[1], ("User-Agent".to_owned(), "Mozilla/5.0".to_owned()));
        assert_eq!(first.status_code(), Some(StatusCode::OK));
        assert_eq!(first.response_header("server"), Some("nginx"));
        assert_eq!(first.response_body().map(|b| &b[..]), Some(&b"hello"[..]));

        let second = &transactions[1];
        assert_eq!(second.method(), &Method::POST);
        assert_eq!(second.path(), "/api/submit");
        assert_eq!(second.host(), "www.example.com:8443");
        assert_eq!(second.body().map(|b| &b[..]), Some(&br#"{"a":1}"#[..]));
        assert!(!second.has_response());

        let third = &transactions[2];
        assert_eq!(third.host(), "www.example.com");
        assert_eq!(third.path(), "/third");
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let input = indoc! {r#"
        {"log": {"entries": [
            {"request": {"method": "GET", "url": "https://a.example/ok"}},
            {"response": {"status": 200}},
            {"request": {"method": "G E T", "url": "https://a.example/bad-method"}},
            {"request": {"method": "GET", "url": "not a url"}},
            "garbage",
            {"request": {"method": "GET", "url": "https://a.example/also-ok"}}
        ]}}
        "#};

        let transactions = parse(input).unwrap();
        let paths: Vec<&str> = transactions.iter().map(Transaction::path).collect();
        assert_eq!(paths, ["/ok", "/also-ok"]);
    }

    #[test]
    fn empty_archive_is_not_an_error() {
        let transactions = parse(r#"{"log": {"version": "1.2", "entries": []}}"#).unwrap();
        assert!(transactions.is_empty());
    }

    #[test]
    fn rejects_non_archives() {
        assert!(matches!(parse("GET / HTTP/1.1\r\n\r\n"), Err(FormatError::InvalidJson { .. })));
        assert!(matches!(parse(r#"{"log": {"version": "1.2""#), Err(FormatError::InvalidJson { .. })));
        assert!(matches!(parse(r#"{"log": {"version": "1.2"}}"#), Err(FormatError::MissingLog { .. })));
        assert!(matches!(parse(r#"{"entries": []}"#), Err(FormatError::MissingLog { .. })));
        assert!(matches!(parse(r#"{"log": {"entries": {}}}"#), Err(FormatError::MissingLog { .. })));
        assert!(matches!(parse("[1, 2, 3]"), Err(FormatError::MissingLog { .. })));
    }

    #[test]
    fn missing_status_and_base64_content() {
        let input = indoc! {r#"
        {"log": {"entries": [
            {
                "request": {"method": "GET", "url": "https://a.example/img"},
                "response": {"status": 0, "headers": [], "content": {"text": "aGVsbG8=", "encoding": "base64"}}
            },
            {
                "request": {"method": "GET", "url": "https://a.example/broken"},
                "response": {"status": 404, "content": {"text": "%%%", "encoding": "base64"}}
            }
        ]}}
        "#};

        let transactions = parse(input).unwrap();
        assert_eq!(transactions[0].status_code(), None);
        assert_eq!(transactions[0].response_body().map(|b| &b[..]), Some(&b"hello"[..]));
        assert_eq!(transactions[1].status_code(), Some(StatusCode::NOT_FOUND));
        assert_eq!(transactions[1].response_body().map(|b| &b[..]), Some(&b"%%%"[..]));
    }

    #[test]
    fn form_params_become_body() {
        let input = indoc! {r#"
        {"log": {"entries": [
            {
                "request": {
                    "method": "POST",
                    "url": "https://a.example/login",
                    "postData": {
                        "mimeType": "application/x-www-form-urlencoded",
                        "params": [{"name": "user", "value": "a"}, {"name": "remember"}]
                    }
                }
            }
        ]}}
        "#};

        let transactions = parse(input).unwrap();
        assert_eq!(transactions[0].body().map(|b| &b[..]), Some(&b"user=a&remember"[..]));
    }

    #[test]
    fn relative_url_takes_host_header() {
        let input = indoc! {r#"
        {"log": {"entries": [
            {"request": {"method": "GET", "url": "/relative?x=1", "headers": [{"name": ":authority", "value": "h2.example"}]}}
        ]}}
        "#};

        let transactions = parse(input).unwrap();
        assert_eq!(transactions[0].host(), "h2.example");
        assert_eq!(transactions[0].path(), "/relative?x=1");
    }

    #[test]
    fn split_urls() {
        assert_eq!(split_url("https://example.com"), Some((Some("example.com".to_owned()), "/".to_owned())));
        assert_eq!(
            split_url("https://user:pw@example.com:8443/a?b=c"),
            Some((Some("example.com:8443".to_owned()), "/a?b=c".to_owned()))
        );
        assert_eq!(
            split_url_by_hand("https://example.com/caf\u{e9}?q=1#frag"),
            Some((Some("example.com".to_owned()), "/caf\u{e9}?q=1".to_owned()))
        );
        assert_eq!(split_url_by_hand("https://example.com?q=1"), Some((Some("example.com".to_owned()), "/?q=1".to_owned())));
        assert_eq!(split_url_by_hand("not a url"), None);
    }
}
