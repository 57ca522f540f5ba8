//! The `http-config` block, derived from the whole capture.

use tracing::warn;

use crate::profile::rules::{self, BLOCKED_USER_AGENTS, DEFAULT_HEADER_ORDER, DEFAULT_SERVER, FINGERPRINT_HEADERS};
use crate::profile::{BlockGenerator, BlockKind, BlockWriter, TrafficSummary};
use crate::{GenerateError, Transaction};

/// Generator for `http-config`. Never fails: an empty capture yields placeholder values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigBlock;

impl BlockGenerator for ConfigBlock {
    fn kind(&self) -> BlockKind {
        BlockKind::HttpConfig
    }

    fn generate(&self, transactions: &[Transaction], writer: &mut BlockWriter) -> Result<(), GenerateError> {
        let summary = TrafficSummary::collect(transactions);
        if summary.transactions == 0 {
            warn!("no transactions to derive http-config from, writing placeholder values");
        }

        writer.open(BlockKind::HttpConfig.as_str());
        writer.comment(&format!("user agent: {}", summary.user_agent.unwrap_or(rules::DEFAULT_USER_AGENT)));
        writer.comment(&format!("hosts: {}", join_or_none(&summary.hosts)));
        let codes: Vec<&str> = summary.status_codes.iter().map(|code| code.as_str()).collect();
        writer.comment(&format!("status codes: {}", join_or_none(&codes)));
        writer.blank_line();

        let order = if summary.header_order.is_empty() {
            DEFAULT_HEADER_ORDER.as_slice()
        } else {
            summary.header_order.as_slice()
        };
        writer.set("headers", &order.join(", "));
        writer.set("headers_remove", &FINGERPRINT_HEADERS.join(", "));
        writer.header("Server", summary.server.unwrap_or(DEFAULT_SERVER));
        writer.set("trust_x_forwarded_for", "false");
        writer.set("block_useragents", BLOCKED_USER_AGENTS);
        writer.close();
        Ok(())
    }
}

fn join_or_none(values: &[&str]) -> String {
    if values.is_empty() { "none observed".to_owned() } else { values.join(", ") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use indoc::indoc;

    fn render(transactions: &[Transaction]) -> String {
        let mut writer = BlockWriter::new();
        ConfigBlock.generate(transactions, &mut writer).unwrap();
        writer.finish()
    }

    #[test]
    fn placeholders_without_transactions() {
        assert_eq!(
            render(&[]),
            indoc! {r#"
            http-config {
                # user agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36
                # hosts: none observed
                # status codes: none observed

                set headers "Date, Server, Content-Length, Keep-Alive, Connection, Content-Type";
                set headers_remove "Server, X-Powered-By, X-AspNet-Version";
                header "Server" "nginx/1.18.0";
                set trust_x_forwarded_for "false";
                set block_useragents "curl*,lynx*,wget*";
            }
            "#}
        );
    }

    #[test]
    fn aggregates_capture() {
        let transactions = [
            Transaction::builder(Method::GET, "/")
                .host("www.example.com")
                .header("User-Agent", "Agent/1")
                .status(Some(StatusCode::MOVED_PERMANENTLY))
                .response_headers([
                    ("Server".to_owned(), "gws".to_owned()),
                    ("Location".to_owned(), "/home".to_owned()),
                ])
                .build(),
            Transaction::builder(Method::GET, "/home")
                .host("static.example.com")
                .header("User-Agent", "Agent/1")
                .status(Some(StatusCode::OK))
                .build(),
        ];

        assert_eq!(
            render(&transactions),
            indoc! {r#"
            http-config {
                # user agent: Agent/1
                # hosts: www.example.com, static.example.com
                # status codes: 200, 301

                set headers "Server, Location";
                set headers_remove "Server, X-Powered-By, X-AspNet-Version";
                header "Server" "gws";
                set trust_x_forwarded_for "false";
                set block_useragents "curl*,lynx*,wget*";
            }
            "#}
        );
    }
}
