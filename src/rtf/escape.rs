//! Byte-level normalization applied before tokenizing.

use memchr::{memchr, memchr2};
use std::borrow::Cow;

/// Rewrite the escaped delimiters `\\`, `\{` and `\}` as the hex escapes
/// `\'5c`, `\'7b` and `\'7d`, so the lexer never meets an escaped brace.
pub fn encode_escaped_control_chars(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + raw.len() / 16);
    let mut rest = raw;

    while let Some(at) = memchr(b'\\', rest) {
        out.extend_from_slice(&rest[..at]);
        let replacement: Option<&[u8]> = match rest.get(at + 1) {
            Some(b'\\') => Some(b"\\'5c"),
            Some(b'{') => Some(b"\\'7b"),
            Some(b'}') => Some(b"\\'7d"),
            _ => None,
        };
        match replacement {
            Some(hex) => {
                out.extend_from_slice(hex);
                rest = &rest[at + 2..];
            },
            None => {
                out.push(b'\\');
                rest = &rest[at + 1..];
            },
        }
    }
    out.extend_from_slice(rest);
    out
}

/// Fold `\r\n` and bare `\r` to `\n`.
pub fn fold_newlines(raw: &[u8]) -> Cow<'_, [u8]> {
    if memchr(b'\r', raw).is_none() {
        return Cow::Borrowed(raw);
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(at) = memchr2(b'\r', b'\n', rest) {
        out.extend_from_slice(&rest[..at]);
        out.push(b'\n');
        let skip = if rest[at] == b'\r' && rest.get(at + 1) == Some(&b'\n') {
            2
        } else {
            1
        };
        rest = &rest[at + skip..];
    }
    out.extend_from_slice(rest);
    Cow::Owned(out)
}

/// Drop trailing NUL bytes.
#[inline]
pub fn strip_trailing_nuls(raw: &[u8]) -> &[u8] {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
    &raw[..end]
}
