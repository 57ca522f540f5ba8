//! String literal escaping for the profile grammar.
//!
//! Literals are double-quoted. Inside them a backslash, a double quote, CR, LF and TAB are
//! written as `\\`, `\"`, `\r`, `\n` and `\t`; any other control character and any byte
//! that is not valid UTF-8 becomes `\xNN`. [`unescape`] reverses this exactly.

use crate::UnescapeError;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Escapes a text value for use inside a double-quoted literal.
pub fn escape(value: &str) -> String {
    escape_bytes(value.as_bytes())
}

/// Escapes arbitrary bytes, keeping valid UTF-8 text readable.
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut escaped = String::with_capacity(bytes.len());

    for chunk in bytes.utf8_chunks() {
        for ch in chunk.valid().chars() {
            push_char(&mut escaped, ch);
        }
        for byte in chunk.invalid() {
            push_hex(&mut escaped, *byte);
        }
    }
    escaped
}

/// Decodes the contents of an escaped literal back into the original bytes.
///
/// # Errors
///
/// Returns [`UnescapeError`] with the offset of the first backslash that does not start a
/// known escape sequence.
pub fn unescape(literal: &str) -> Result<Vec<u8>, UnescapeError> {
    let bytes = literal.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while let Some(&byte) = bytes.get(index) {
        if byte != b'\\' {
            decoded.push(byte);
            index += 1;
            continue;
        }

        let (value, width) = match bytes.get(index + 1) {
            Some(b'\\') => (b'\\', 2),
            Some(b'"') => (b'"', 2),
            Some(b'r') => (b'\r', 2),
            Some(b'n') => (b'\n', 2),
            Some(b't') => (b'\t', 2),
            Some(b'x') => match (bytes.get(index + 2).and_then(hex_value), bytes.get(index + 3).and_then(hex_value)) {
                (Some(high), Some(low)) => ((high << 4) | low, 4),
                _ => return Err(UnescapeError { offset: index }),
            },
            _ => return Err(UnescapeError { offset: index }),
        };
        decoded.push(value);
        index += width;
    }

    Ok(decoded)
}

fn push_char(escaped: &mut String, ch: char) {
    match ch {
        '\\' => escaped.push_str(r"\\"),
        '"' => escaped.push_str(r#"\""#),
        '\r' => escaped.push_str(r"\r"),
        '\n' => escaped.push_str(r"\n"),
        '\t' => escaped.push_str(r"\t"),
        ch if ch.is_control() => {
            let mut buf = [0; 4];
            for byte in ch.encode_utf8(&mut buf).bytes() {
                push_hex(escaped, byte);
            }
        }
        ch => escaped.push(ch),
    }
}

fn push_hex(escaped: &mut String, byte: u8) {
    escaped.push_str(r"\x");
    escaped.push(char::from(HEX_DIGITS[usize::from(byte >> 4)]));
    escaped.push(char::from(HEX_DIGITS[usize::from(byte & 0x0f)]));
}

fn hex_value(digit: &u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape(r##""#Not_A Brand";v="99""##), r##"\"#Not_A Brand\";v=\"99\""##);
        assert_eq!(escape(r"C:\temp"), r"C:\\temp");
        assert_eq!(escape("plain value"), "plain value");
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(escape("a\r\nb\tc"), r"a\r\nb\tc");
        assert_eq!(escape("\u{0}\u{1b}[0m"), r"\x00\x1b[0m");
        assert_eq!(escape("\u{85}"), r"\xc2\x85");
        assert_eq!(escape("héllo ✓"), "héllo ✓");
    }

    #[test]
    fn escapes_invalid_utf8_bytewise() {
        assert_eq!(escape_bytes(b"ok\xff\xfe!"), r"ok\xff\xfe!");
        assert_eq!(escape_bytes(&[0x89, b'P', b'N', b'G']), r"\x89PNG");
    }

    #[test]
    fn unescape_reverses_escape() {
        let values: [&[u8]; 5] = [
            br#"he said "hi""#,
            br"back\slash\\x41",
            b"line\r\nbreak\ttab",
            b"\x00\x7f\x1b",
            b"\xff\xc3(\xe2\x82",
        ];

        for value in values {
            assert_eq!(unescape(&escape_bytes(value)).unwrap(), value, "{value:?}");
        }
    }

    #[test]
    fn unescape_rejects_unknown_sequences() {
        assert_eq!(unescape(r"ab\q"), Err(UnescapeError { offset: 2 }));
        assert_eq!(unescape(r"\x4"), Err(UnescapeError { offset: 0 }));
        assert_eq!(unescape(r"\xzz"), Err(UnescapeError { offset: 0 }));
        assert_eq!(unescape("trailing\\"), Err(UnescapeError { offset: 8 }));
        assert_eq!(unescape(r"\X41"), Err(UnescapeError { offset: 0 }));
        assert_eq!(unescape(r"\x4A\x4a").unwrap(), b"JJ");
    }
}
