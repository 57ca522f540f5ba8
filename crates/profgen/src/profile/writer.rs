//! Renders profile statements with consistent indentation.
//!
//! The profile grammar is line oriented: `name {` opens a section, `}` closes it,
//! statements end with `;` and comments start with `#`. Every string argument passes
//! through [`escape`](super::escape::escape) so callers hand in raw values.

use super::escape::{escape, escape_bytes};

const INDENT: &str = "    ";

/// Accumulates the text of one or more profile blocks.
#[derive(Debug, Default)]
pub struct BlockWriter {
    buf: String,
    depth: usize,
}

impl BlockWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a `name {` section.
    pub fn open(&mut self, name: &str) {
        self.line(&format!("{name} {{"));
        self.depth += 1;
    }

    /// Closes the innermost open section.
    pub fn close(&mut self) {
        debug_assert!(self.depth > 0, "close without matching open");
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    /// `set option "value";`
    pub fn set(&mut self, option: &str, value: &str) {
        self.line(&format!("set {option} \"{}\";", escape(value)));
    }

    /// `header "name" "value";`
    pub fn header(&mut self, name: &str, value: &str) {
        self.line(&format!("header \"{}\" \"{}\";", escape(name), escape(value)));
    }

    /// A bare statement such as `base64;` or `print;`.
    pub fn statement(&mut self, keyword: &str) {
        self.line(&format!("{keyword};"));
    }

    /// A statement with one string argument, e.g. `parameter "id";`.
    pub fn statement_with(&mut self, keyword: &str, argument: &str) {
        self.line(&format!("{keyword} \"{}\";", escape(argument)));
    }

    /// Like [`statement_with`](Self::statement_with) for a byte payload.
    pub fn statement_with_bytes(&mut self, keyword: &str, argument: &[u8]) {
        self.line(&format!("{keyword} \"{}\";", escape_bytes(argument)));
    }

    /// `# text`, with line breaks folded so the comment stays on one line.
    pub fn comment(&mut self, text: &str) {
        let text: String = text.chars().map(|ch| if ch.is_control() { ' ' } else { ch }).collect();
        if text.is_empty() {
            self.line("#");
        } else {
            self.line(&format!("# {text}"));
        }
    }

    /// Inserts an empty separator line, never at the start of a section or twice in a row.
    pub fn blank_line(&mut self) {
        if self.buf.is_empty() || self.buf.ends_with("{\n") || self.buf.ends_with("\n\n") {
            return;
        }
        self.buf.push('\n');
    }

    /// Appends text rendered by another writer at the current depth.
    pub fn append(&mut self, other: BlockWriter) {
        for line in other.buf.lines() {
            if line.is_empty() {
                self.buf.push('\n');
            } else {
                self.line(line);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> String {
        debug_assert_eq!(self.depth, 0, "unclosed section");
        self.buf
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn nested_sections_are_indented() {
        let mut writer = BlockWriter::new();
        writer.open("http-get");
        writer.set("uri", "/search?q=1");
        writer.blank_line();
        writer.open("client");
        writer.blank_line();
        writer.header("Accept", "*/*");
        writer.open("metadata");
        writer.statement("base64url");
        writer.statement_with("parameter", "id");
        writer.close();
        writer.close();
        writer.close();

        assert_eq!(
            writer.finish(),
            indoc! {r#"
            http-get {
                set uri "/search?q=1";

                client {
                    header "Accept" "*/*";
                    metadata {
                        base64url;
                        parameter "id";
                    }
                }
            }
            "#}
        );
    }

    #[test]
    fn arguments_are_escaped() {
        let mut writer = BlockWriter::new();
        writer.header("sec-ch-ua", r#""Chromium";v="109""#);
        writer.statement_with_bytes("prepend", b"{\"a\":1}\n\xff");

        assert_eq!(
            writer.finish(),
            indoc! {r#"
            header "sec-ch-ua" "\"Chromium\";v=\"109\"";
            prepend "{\"a\":1}\n\xff";
            "#}
        );
    }

    #[test]
    fn comments_stay_on_one_line() {
        let mut writer = BlockWriter::new();
        writer.comment("two\nlines");
        writer.comment("");
        writer.blank_line();
        writer.blank_line();
        writer.statement("print");

        assert_eq!(writer.finish(), "# two lines\n#\n\nprint;\n");
    }

    #[test]
    fn append_reindents() {
        let mut inner = BlockWriter::new();
        inner.statement("base64");
        inner.blank_line();
        inner.statement("print");

        let mut writer = BlockWriter::new();
        writer.open("output");
        writer.append(inner);
        writer.close();

        assert_eq!(writer.finish(), "output {\n    base64;\n\n    print;\n}\n");
    }
}
