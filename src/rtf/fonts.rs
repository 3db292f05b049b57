//! Font table extraction.
//!
//! Hex-escaped text is encoded in the codepage of the font in effect, so
//! the text decoder needs every font's codepage before it walks the body.

use super::error::{RtfError, RtfResult};
use super::tree::{Group, Node, Span, Token, TokenKind};
use crate::common::encoding::{charset_to_codepage, is_known_codepage};
use std::collections::HashMap;

const TARGET: &str = "rtfdecap::text_extraction";

/// The font table group is looked for among this many leading children
const FONT_TABLE_SCAN_LIMIT: usize = 20;

/// One font table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontDef {
    /// Font number N of `\fN`
    pub number: u32,
    /// Codepage from `\fcharsetN`, else from `\cpgN`
    pub codepage: Option<u32>,
    /// Where the entry came from
    pub span: Span,
}

/// Fonts keyed by number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontTable {
    fonts: HashMap<u32, FontDef>,
}

impl FontTable {
    /// Build the table from the document's `\fonttbl` group.
    pub fn from_document(document: &Group) -> RtfResult<Self> {
        let group = find_font_table(document).ok_or(RtfError::MissingFontTable)?;
        let table = Self::from_group(group);
        log::debug!(target: TARGET, "Font table: {:?}", table.fonts);
        Ok(table)
    }

    /// Parse the entries of a `\fonttbl` group. Entries are either nested
    /// `{\fN ...;}` groups or a flat `\fN ...;` list directly in the table.
    pub fn from_group(group: &Group) -> Self {
        fn flush(entry: &[&Token], fonts: &mut HashMap<u32, FontDef>) {
            if let Some(font) = parse_font_entry(entry.iter().copied()) {
                fonts.insert(font.number, font);
            }
        }

        let mut fonts = HashMap::new();
        let mut flat: Vec<&Token> = Vec::new();

        for child in &group.children {
            match child {
                Node::Group(entry) => {
                    let tokens = entry.children.iter().filter_map(Node::as_token);
                    if let Some(font) = parse_font_entry(tokens) {
                        fonts.insert(font.number, font);
                    }
                },
                Node::Token(token) => {
                    if token.numeric_value(b"\\f").is_some() && !flat.is_empty() {
                        flush(&flat, &mut fonts);
                        flat.clear();
                    }
                    flat.push(token);
                },
            }
        }
        flush(&flat, &mut fonts);

        Self { fonts }
    }

    /// Look up a font.
    #[inline]
    pub fn get(&self, number: u32) -> Option<&FontDef> {
        self.fonts.get(&number)
    }

    /// Number of fonts.
    #[inline]
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether the table has no fonts.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

/// A group among the first children of the document whose second child is
/// `\fonttbl` (the first being its opening brace).
pub fn find_font_table(document: &Group) -> Option<&Group> {
    document
        .children
        .iter()
        .take(FONT_TABLE_SCAN_LIMIT)
        .filter_map(Node::as_group)
        .find(|group| {
            group
                .children
                .get(1)
                .and_then(Node::as_token)
                .is_some_and(|token| token.is_control_word(b"\\fonttbl"))
        })
}

/// The font selected by the first `\deffN` anywhere in the tree.
pub fn default_font(root: &Group) -> Option<u32> {
    root.control_words()
        .find_map(|token| token.numeric_value(b"\\deff"))
}

fn parse_font_entry<'a>(tokens: impl Iterator<Item = &'a Token>) -> Option<FontDef> {
    let mut number = None;
    let mut charset_codepage = None;
    let mut cpg = None;
    let mut span: Option<Span> = None;

    for token in tokens {
        span = Some(match span {
            Some(span) => Span {
                end: token.span.end,
                ..span
            },
            None => token.span,
        });

        if token.kind != TokenKind::ControlWord {
            continue;
        }
        if let Some(n) = token.numeric_value(b"\\f") {
            number = Some(n);
        } else if let Some(charset) = token.numeric_value(b"\\fcharset") {
            charset_codepage = charset_to_codepage(charset);
        } else if let Some(codepage) = token.numeric_value(b"\\cpg") {
            cpg = Some(codepage);
        }
    }

    // \fcharset wins over \cpg
    let codepage = charset_codepage.or(cpg.filter(|&cp| is_known_codepage(cp)));
    Some(FontDef {
        number: number?,
        codepage,
        span: span.unwrap_or_default(),
    })
}
