//! Final fold of the cleaned tree into output bytes.

use super::tree::{Group, GroupKind, Node, Token, TokenKind};
use phf::phf_map;

/// Control words that stand for a character.
static CONTROL_WORD_TEXT: phf::Map<&'static str, &'static str> = phf_map! {
    "\\par" => "\n",
    "\\line" => "\n",
    "\\tab" => "\t",
    "\\lquote" => "\u{2018}",
    "\\rquote" => "\u{2019}",
    "\\ldblquote" => "\u{201C}",
    "\\rdblquote" => "\u{201D}",
    "\\bullet" => "\u{2022}",
    "\\endash" => "\u{2013}",
    "\\emdash" => "\u{2014}",
};

/// Concatenate the visible bytes of every child of `group`.
pub fn flatten(group: &Group) -> Vec<u8> {
    let mut out = Vec::new();
    flatten_into(group, &mut out);
    out
}

fn flatten_into(group: &Group, out: &mut Vec<u8>) {
    for child in &group.children {
        match child {
            Node::Token(token) => out.extend_from_slice(token_text(token)),
            Node::Group(nested) if nested.kind == GroupKind::MHtmlTag => {},
            // HTML tag destinations fold like any group; their markers emit nothing
            Node::Group(nested) => flatten_into(nested, out),
        }
    }
}

/// Visible bytes of one leaf.
fn token_text(token: &Token) -> &[u8] {
    match token.kind {
        TokenKind::String | TokenKind::SpaceSave => &token.value,
        TokenKind::ControlWord => std::str::from_utf8(token.trimmed())
            .ok()
            .and_then(|word| CONTROL_WORD_TEXT.get(word))
            .map(|text| text.as_bytes())
            .unwrap_or_default(),
        TokenKind::ControlSymbol => match token.trimmed() {
            b"\\{" => b"{",
            b"\\}" => b"}",
            b"\\\\" => b"\\",
            _ => b"",
        },
        TokenKind::NonBreakingSpace => "\u{00A0}".as_bytes(),
        TokenKind::NonBreakingHyphen => "\u{00AD}".as_bytes(),
        TokenKind::OptionalHyphen => "\u{2027}".as_bytes(),
        TokenKind::OpenBrace
        | TokenKind::CloseBrace
        | TokenKind::StarEscape
        | TokenKind::SpaceDelete
        | TokenKind::HtmlRtf
        | TokenKind::Unicode
        | TokenKind::HexEncoded
        | TokenKind::HtmlTag
        | TokenKind::MHtmlTag
        | TokenKind::FormulaCharacter
        | TokenKind::IndexSubentry => b"",
    }
}
