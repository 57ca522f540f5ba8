//! Aggregate properties of a whole capture.

use http::StatusCode;
use http::header::{SERVER, USER_AGENT};

use crate::Transaction;
use crate::profile::rules;

/// What a sequence of transactions has in common, as used by `http-config` and the
/// global options of the full profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrafficSummary<'a> {
    pub transactions: usize,
    /// Most common `User-Agent`; ties go to the value seen first.
    pub user_agent: Option<&'a str>,
    /// Distinct hosts in first-seen order.
    pub hosts: Vec<&'a str>,
    /// Most common response `Server` header.
    pub server: Option<&'a str>,
    /// Distinct response status codes, ascending.
    pub status_codes: Vec<StatusCode>,
    /// Response header names of the first response that has any, without transport
    /// headers and duplicates.
    pub header_order: Vec<&'a str>,
}

impl<'a> TrafficSummary<'a> {
    pub fn collect(transactions: &'a [Transaction]) -> Self {
        let mut hosts: Vec<&str> = Vec::new();
        for host in transactions.iter().map(Transaction::host).filter(|host| !host.is_empty()) {
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }

        let mut status_codes: Vec<StatusCode> = transactions.iter().filter_map(Transaction::status_code).collect();
        status_codes.sort_unstable();
        status_codes.dedup();

        let mut header_order: Vec<&str> = Vec::new();
        let first_response = transactions.iter().map(Transaction::response_headers).find(|headers| !headers.is_empty());
        for (name, _) in first_response.unwrap_or_default() {
            if !header_order.iter().any(|seen| seen.eq_ignore_ascii_case(name)) && !is_hop_header(name) {
                header_order.push(name);
            }
        }

        Self {
            transactions: transactions.len(),
            user_agent: most_common(transactions.iter().filter_map(|tx| tx.header(USER_AGENT.as_str()))),
            hosts,
            server: most_common(transactions.iter().filter_map(|tx| tx.response_header(SERVER.as_str()))),
            status_codes,
            header_order,
        }
    }
}

/// Pseudo-headers and framing headers that cannot be ordered by the server.
fn is_hop_header(name: &str) -> bool {
    name.starts_with(':') || (rules::is_transport_header(name) && !name.eq_ignore_ascii_case("content-length"))
}

/// Returns the most frequent value, preferring the earliest on a tie.
fn most_common<'a, I: Iterator<Item = &'a str>>(values: I) -> Option<&'a str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}
