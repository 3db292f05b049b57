//! Unicode and codepage text decoding.
//!
//! One top-down walk over the document rewrites every `\uN` escape and
//! every run of `\'XX` escapes into UTF-8 STRING leaves. Two pieces of
//! state follow RTF group scoping (inherited on entry, restored on exit):
//! the font stack, whose top selects the codepage for hex escapes, and the
//! `\ucN` count of fallback bytes that follow each `\uN`.

use super::error::{DecodeError, RtfResult};
use super::fonts::{FontTable, default_font};
use super::tree::{Group, GroupKind, Node, NodeId, ParseTree, Span, Token, TokenKind};
use crate::common::encoding::{Codec, CodecResolver, WindowsCodepages};
use smallvec::SmallVec;
use std::collections::{HashMap, VecDeque};

const TARGET: &str = "rtfdecap::text_extraction";

/// Fallback bytes per `\uN` when no `\ucN` is in scope
const DEFAULT_UNICODE_BYTE_COUNT: u32 = 1;

/// Fonts selected by `\fN`, innermost last.
type FontStack = SmallVec<[u32; 8]>;

/// Fallback bytes removed after each `\uN`, keyed by the `\uN` leaf.
type FallbackMap = HashMap<NodeId, Vec<u8>>;

/// Decodes escaped text in a parse tree.
#[derive(Debug, Clone)]
pub struct TextDecoder<R: CodecResolver = WindowsCodepages> {
    resolver: R,
    keep_font_definitions: bool,
    use_ascii_alternatives_on_unicode_decode_failure: bool,
    initial_unicode_byte_count: Option<u32>,
}

impl Default for TextDecoder<WindowsCodepages> {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDecoder<WindowsCodepages> {
    /// Decoder using the built-in Windows codepage table.
    pub fn new() -> Self {
        Self::with_resolver(WindowsCodepages)
    }
}

impl<R: CodecResolver> TextDecoder<R> {
    /// Decoder using `resolver` for codepage lookups.
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            keep_font_definitions: false,
            use_ascii_alternatives_on_unicode_decode_failure: false,
            initial_unicode_byte_count: None,
        }
    }

    /// Keep `\fN` leaves in the tree instead of dropping them.
    pub fn with_keep_font_definitions(mut self, keep: bool) -> Self {
        self.keep_font_definitions = keep;
        self
    }

    /// Substitute the ASCII fallback text when a `\uN` value cannot be decoded.
    pub fn with_ascii_alternatives(mut self, enabled: bool) -> Self {
        self.use_ascii_alternatives_on_unicode_decode_failure = enabled;
        self
    }

    /// Byte count in effect before any `\ucN`. Only needed for fragments
    /// that lack the header setting it.
    pub fn with_initial_unicode_byte_count(mut self, count: Option<u32>) -> Self {
        self.initial_unicode_byte_count = count;
        self
    }

    /// Decode the document of `tree` in place.
    pub fn decode_tree(&self, tree: &mut ParseTree) -> RtfResult<()> {
        let mut fonts: FontStack = default_font(tree.root()).into_iter().collect();
        let table = FontTable::from_document(tree.document()?)?;
        let byte_count = self
            .initial_unicode_byte_count
            .unwrap_or(DEFAULT_UNICODE_BYTE_COUNT);

        log::debug!(
            target: TARGET,
            "Decoding text with default font {:?} and unicode byte count {}",
            fonts.last(),
            byte_count
        );
        let document = tree.document_mut()?;
        self.decode_children(&mut document.children, &table, &mut fonts, byte_count)
    }

    /// Decode one group's children. `byte_count` is the `\ucN` value
    /// inherited from the enclosing group.
    fn decode_children(
        &self,
        children: &mut Vec<Node>,
        table: &FontTable,
        fonts: &mut FontStack,
        byte_count: u32,
    ) -> RtfResult<()> {
        let fallbacks = strip_unicode_fallbacks(children, byte_count);
        self.decode_unicode(children, &fallbacks)?;

        let fonts_on_entry = fonts.len();
        let mut byte_count = byte_count;

        for node in std::mem::take(children) {
            match node {
                Node::Token(token) if token.kind == TokenKind::ControlWord => {
                    if let Some(font) = token.numeric_value(b"\\f") {
                        fonts.push(font);
                        if !self.keep_font_definitions {
                            continue;
                        }
                    } else if let Some(count) = token.numeric_value(b"\\uc") {
                        byte_count = count;
                    }
                    children.push(Node::Token(token));
                },
                Node::Group(group) if group.kind == GroupKind::HexArray => {
                    let token = self.decode_hex_array(group, table, fonts)?;
                    children.push(Node::Token(token));
                },
                Node::Group(mut group) => {
                    self.decode_children(&mut group.children, table, fonts, byte_count)?;
                    children.push(Node::Group(group));
                },
                node => children.push(node),
            }
        }

        // Fonts selected in this group end with it
        fonts.truncate(fonts_on_entry);
        Ok(())
    }

    /// Replace every `\uN` leaf with a STRING leaf, merging surrogate pairs.
    fn decode_unicode(&self, children: &mut [Node], fallbacks: &FallbackMap) -> RtfResult<()> {
        let mut pending_high: Option<(usize, u32)> = None;

        for i in 0..children.len() {
            let Node::Token(token) = &children[i] else {
                continue;
            };
            if token.kind != TokenKind::Unicode {
                continue;
            }
            let unit = unicode_code_unit(token)?;

            if let Some((high_at, high)) = pending_high.take() {
                if is_low_surrogate(unit) {
                    let scalar = 0x10000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
                    let Some(ch) = char::from_u32(scalar) else {
                        return Err(DecodeError::InvalidScalar(scalar).into());
                    };
                    log::trace!(
                        target: TARGET,
                        "Merged surrogate pair {:#06x} {:#06x} into {:?}",
                        high,
                        unit,
                        ch
                    );
                    let mut utf8 = [0u8; 4];
                    replace_token(&mut children[high_at], TokenKind::String, ch.encode_utf8(&mut utf8).as_bytes());
                    replace_token(&mut children[i], TokenKind::String, b"");
                    continue;
                }
                self.standalone_high_surrogate(&mut children[high_at], high, Some(unit), fallbacks)?;
            }

            if is_high_surrogate(unit) {
                pending_high = Some((i, unit));
                continue;
            }

            let Node::Token(token) = &children[i] else {
                continue;
            };
            match char::from_u32(unit) {
                Some(ch) => {
                    log::trace!(target: TARGET, "Unicode {} decoded to {:?}", String::from_utf8_lossy(&token.value), ch);
                    let mut utf8 = [0u8; 4];
                    replace_token(&mut children[i], TokenKind::String, ch.encode_utf8(&mut utf8).as_bytes());
                },
                None if self.use_ascii_alternatives_on_unicode_decode_failure => {
                    log::info!(target: TARGET, "{:#06x} is not a unicode scalar value; using its ASCII fallback", unit);
                    let fallback = fallback_for(token.id, fallbacks);
                    replace_token(&mut children[i], TokenKind::String, &fallback);
                },
                None => return Err(DecodeError::InvalidScalar(unit).into()),
            }
        }

        if let Some((high_at, high)) = pending_high {
            self.standalone_high_surrogate(&mut children[high_at], high, None, fallbacks)?;
        }
        Ok(())
    }

    fn standalone_high_surrogate(
        &self,
        node: &mut Node,
        high: u32,
        next: Option<u32>,
        fallbacks: &FallbackMap,
    ) -> RtfResult<()> {
        log::info!(
            target: TARGET,
            "Standalone high-surrogate {:#06x} without a following low-surrogate (next: {:?})",
            high,
            next
        );
        if !self.use_ascii_alternatives_on_unicode_decode_failure {
            return Err(DecodeError::StandaloneSurrogate { high, next }.into());
        }
        let fallback = match node {
            Node::Token(token) => fallback_for(token.id, fallbacks),
            Node::Group(_) => Vec::new(),
        };
        replace_token(node, TokenKind::String, &fallback);
        Ok(())
    }

    /// Concatenate a HEXARRAY and decode it with the codepage of the
    /// current font.
    fn decode_hex_array(&self, group: Group, table: &FontTable, fonts: &FontStack) -> RtfResult<Token> {
        let mut bytes = SmallVec::<[u8; 64]>::new();
        let mut first: Option<(NodeId, Span)> = None;
        let mut end = 0;

        for token in group.leaves() {
            first.get_or_insert((token.id, token.span));
            end = token.span.end;
            if let Some(byte) = hex_escape_value(&token.value) {
                bytes.push(byte);
            }
        }
        let Some((id, span)) = first else {
            return Err(DecodeError::MalformedBytes {
                codepage: None,
                encoding: "hex escape",
            }
            .into());
        };

        let codepage = fonts
            .last()
            .and_then(|&font| table.get(font))
            .and_then(|font| font.codepage);
        let codec = self.codec_for(codepage)?;

        let text = codec.decode(&bytes).ok_or(DecodeError::MalformedBytes {
            codepage,
            encoding: codec.name(),
        })?;
        log::trace!(
            target: TARGET,
            "Hex bytes {:02x?} decoded with {} into {:?}",
            bytes.as_slice(),
            codec.name(),
            text
        );

        Ok(Token::new(
            id,
            TokenKind::String,
            text.as_bytes(),
            Span { end, ..span },
        ))
    }

    /// Codec for a font codepage; Windows-1252 when the font names none.
    fn codec_for(&self, codepage: Option<u32>) -> Result<Codec, DecodeError> {
        match codepage {
            None => Ok(Codec::Encoding(encoding_rs::WINDOWS_1252)),
            Some(codepage) => self
                .resolver
                .resolve(codepage)
                .ok_or(DecodeError::UnsupportedCodepage(codepage)),
        }
    }
}

/// Remove the ASCII fallback that follows each `\uN` leaf.
///
/// Each `\uN` owes `byte_count` fallback bytes (the `\ucN` in effect at
/// that point). Owed bytes are taken from the leading bytes of following
/// STRING leaves and the leading escapes of following HEXARRAY groups;
/// whitespace met while bytes are owed is dropped as a separator. Removed
/// bytes are returned keyed by the `\uN` leaf they belong to.
fn strip_unicode_fallbacks(children: &mut Vec<Node>, byte_count: u32) -> FallbackMap {
    let mut fallbacks = FallbackMap::new();
    if !children.iter().any(|node| node.is_token_kind(TokenKind::Unicode)) {
        return fallbacks;
    }

    let mut owed: VecDeque<(NodeId, u32)> = VecDeque::new();
    let mut byte_count = byte_count;

    for mut node in std::mem::take(children) {
        if let Some(&(front, _)) = owed.front() {
            match &mut node {
                Node::Token(token) if is_separator(token) => {
                    fallbacks.entry(front).or_default().extend_from_slice(&token.value);
                    continue;
                },
                Node::Token(token) if token.kind == TokenKind::String => {
                    take_fallback_bytes(&mut token.value, &mut owed, &mut fallbacks);
                    if token.value.is_empty() {
                        continue;
                    }
                },
                Node::Group(group) if group.kind == GroupKind::HexArray => {
                    let mut escapes = std::mem::take(&mut group.children).into_iter().peekable();
                    let mut first_taken = None;
                    while let Some((unicode, remaining)) = owed.front_mut() {
                        let Some(Node::Token(hex)) = escapes.next_if(|n| n.as_token().is_some()) else {
                            break;
                        };
                        fallbacks.entry(*unicode).or_default().extend_from_slice(&hex.value);
                        first_taken.get_or_insert(hex);
                        *remaining -= 1;
                        if *remaining == 0 {
                            owed.pop_front();
                        }
                    }
                    group.children = escapes.collect();
                    if group.children.is_empty()
                        && let Some(first) = first_taken
                    {
                        node = Node::Token(first.replaced(TokenKind::String, Vec::new()));
                    }
                },
                _ => {},
            }
        }

        if let Node::Token(token) = &node {
            match token.kind {
                TokenKind::ControlWord => {
                    if let Some(count) = token.numeric_value(b"\\uc") {
                        byte_count = count;
                    }
                },
                TokenKind::Unicode if byte_count > 0 => owed.push_back((token.id, byte_count)),
                _ => {},
            }
        }
        children.push(node);
    }

    fallbacks
}

/// Take owed fallback bytes from the front of a text run, leading
/// whitespace first.
fn take_fallback_bytes(value: &mut Vec<u8>, owed: &mut VecDeque<(NodeId, u32)>, fallbacks: &mut FallbackMap) {
    let mut taken = value.iter().take_while(|b| b.is_ascii_whitespace()).count();
    if let Some(&(front, _)) = owed.front() {
        fallbacks.entry(front).or_default().extend_from_slice(&value[..taken]);
    }

    while taken < value.len() {
        let Some((unicode, remaining)) = owed.front_mut() else {
            break;
        };
        fallbacks.entry(*unicode).or_default().push(value[taken]);
        taken += 1;
        *remaining -= 1;
        if *remaining == 0 {
            owed.pop_front();
        }
    }

    value.drain(..taken);
}

/// Whitespace leaves between a `\uN` and its fallback.
#[inline]
fn is_separator(token: &Token) -> bool {
    matches!(
        token.kind,
        TokenKind::SpaceSave | TokenKind::SpaceDelete | TokenKind::String
    ) && token.is_whitespace()
}

fn fallback_for(id: NodeId, fallbacks: &FallbackMap) -> Vec<u8> {
    fallbacks
        .get(&id)
        .map(|bytes| bytes.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect())
        .unwrap_or_default()
}

/// Replace a leaf in place, keeping its id and span.
fn replace_token(node: &mut Node, kind: TokenKind, value: &[u8]) {
    if let Node::Token(token) = node {
        token.kind = kind;
        token.value = value.to_vec();
    }
}

/// UTF-16 code unit of a `\uN` leaf. RTF writes values above 32767 as
/// negative numbers.
fn unicode_code_unit(token: &Token) -> Result<u32, DecodeError> {
    let invalid = || DecodeError::InvalidUnicodeEscape(String::from_utf8_lossy(&token.value).into_owned());
    let digits = token.trimmed().strip_prefix(b"\\u").ok_or_else(invalid)?;
    let value = atoi_simd::parse::<i64>(digits).map_err(|_| invalid())?;
    let unit = if value < 0 { value + 65536 } else { value };
    u32::try_from(unit).map_err(|_| invalid())
}

#[inline]
fn is_high_surrogate(unit: u32) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

#[inline]
fn is_low_surrogate(unit: u32) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Byte value of a `\'XX` escape.
fn hex_escape_value(escape: &[u8]) -> Option<u8> {
    let digits = escape.strip_prefix(b"\\'")?;
    let digits = std::str::from_utf8(digits.get(..2)?).ok()?;
    u8::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::error::RtfError;
    use crate::rtf::parser::{RtfTreeBuilder, TreeBuilder};

    const FONTS: &str = r"{\fonttbl{\f0\fswiss\fcharset0 Arial;}{\f1\fnil\fcharset136 PMingLiU;}{\f2\fnil\fcharset177 David;}{\f3\fnil\cpg437 Terminal;}{\f4\fnil Plain;}{\f5\fnil\cpg37 Host;}{\f6\fnil\cpg1361 Gulim;}}";

    fn decode_with(body: &str, decoder: &TextDecoder) -> RtfResult<String> {
        let input = format!(r"{{\rtf1\ansi\fromhtml1\deff0{}{}}}", FONTS, body);
        let mut tree = RtfTreeBuilder.build(input.as_bytes()).unwrap();
        decoder.decode_tree(&mut tree)?;
        // Only text leaves after the font table
        let document = tree.document().unwrap();
        let text: Vec<u8> = document
            .children
            .iter()
            .skip(5)
            .flat_map(|node| match node {
                Node::Token(t) if t.kind == TokenKind::String => t.value.clone(),
                Node::Group(g) => g
                    .leaves()
                    .filter(|t| t.kind == TokenKind::String)
                    .flat_map(|t| t.value.clone())
                    .collect(),
                _ => Vec::new(),
            })
            .collect();
        Ok(String::from_utf8(text).unwrap())
    }

    fn decode(body: &str) -> RtfResult<String> {
        decode_with(body, &TextDecoder::new())
    }

    #[test]
    fn test_unicode_with_fallback() {
        assert_eq!(decode(r"caf\u233?s").unwrap(), "caf\u{e9}s");
        assert_eq!(decode(r"\u8217 ?s").unwrap(), "\u{2019}s");
        assert_eq!(decode(r"\u-3913?").unwrap(), "\u{F0B7}");
    }

    #[test]
    fn test_unicode_byte_count_scope() {
        assert_eq!(decode(r"\uc2\u8220??x").unwrap(), "\u{201C}x");
        assert_eq!(decode(r"\uc0\u8220 x").unwrap(), "\u{201C}x");
        // The count set inside a group does not leak out of it
        assert_eq!(decode(r"{\uc0\u8220 a}\u8221?b").unwrap(), "\u{201C}a\u{201D}b");
        // Nested groups inherit it
        assert_eq!(decode(r"\uc2{\u8220??a}").unwrap(), "\u{201C}a");
    }

    #[test]
    fn test_hex_fallback_removed() {
        assert_eq!(decode(r"\u8217\'92s").unwrap(), "\u{2019}s");
        assert_eq!(decode(r"\uc2\u8217\'92\'93s").unwrap(), "\u{2019}s");
    }

    #[test]
    fn test_surrogate_pair() {
        assert_eq!(decode(r"\u-10179?\u-8704?").unwrap(), "\u{1F600}");
        assert_eq!(decode(r"\u55357?\u56832?").unwrap(), "\u{1F600}");
        assert_eq!(decode(r"\u-10188?\u-8692?").unwrap(), "\u{1D20C}");
    }

    #[test]
    fn test_standalone_high_surrogate() {
        assert!(matches!(
            decode(r"\u-10179?x"),
            Err(RtfError::Decode(DecodeError::StandaloneSurrogate { high: 0xD83D, next: None }))
        ));
        assert!(matches!(
            decode(r"\u-10179?\u65?"),
            Err(RtfError::Decode(DecodeError::StandaloneSurrogate { next: Some(65), .. }))
        ));

        let lenient = TextDecoder::new().with_ascii_alternatives(true);
        assert_eq!(decode_with(r"\u-10179?x", &lenient).unwrap(), "?x");
        assert_eq!(decode_with(r"\u-8704?y", &lenient).unwrap(), "?y");
        assert!(matches!(
            decode(r"\u-8704?y"),
            Err(RtfError::Decode(DecodeError::InvalidScalar(0xDE00)))
        ));
    }

    #[test]
    fn test_font_driven_hex() {
        // Big5
        assert_eq!(decode(r"{\f1\'a4\'a4\'a4\'e5}").unwrap(), "中文");
        // Hebrew
        assert_eq!(decode(r"{\f2\'f9\'ec\'e5\'ed}").unwrap(), "שלום");
        // Windows-1252 from the default font
        assert_eq!(decode(r"\'e9t\'e9").unwrap(), "été");
        // A font without a codepage also falls back to Windows-1252
        assert_eq!(decode(r"{\f4\'e9}").unwrap(), "é");
    }

    #[test]
    fn test_font_scope_restored() {
        assert_eq!(decode(r"{\f1\'a4\'a4}\'e9").unwrap(), "中é");
    }

    #[test]
    fn test_codecs_outside_encoding_rs() {
        // DOS 437
        assert_eq!(decode(r"{\f3 caf\'82}").unwrap(), "caf\u{e9}");
        // Johab
        assert_eq!(decode(r"{\f6\'d0\'65\'8b\'69}").unwrap(), "\u{D55C}\u{AE00}");
    }

    #[test]
    fn test_unsupported_codepage() {
        assert!(matches!(
            decode(r"{\f5\'c1}"),
            Err(RtfError::Decode(DecodeError::UnsupportedCodepage(37)))
        ));
    }

    #[test]
    fn test_malformed_multibyte() {
        assert!(matches!(
            decode(r"{\f1\'a4}"),
            Err(RtfError::Decode(DecodeError::MalformedBytes { codepage: Some(950), .. }))
        ));
    }

    #[test]
    fn test_font_definitions_dropped() {
        let input = format!(r"{{\rtf1\ansi\fromhtml1{}{{\f1 x}}}}", FONTS);
        let mut tree = RtfTreeBuilder.build(input.as_bytes()).unwrap();
        TextDecoder::new().decode_tree(&mut tree).unwrap();
        assert!(!tree.leaves().any(|t| t.is_control_word(b"\\f1")));

        let mut tree = RtfTreeBuilder.build(input.as_bytes()).unwrap();
        TextDecoder::new()
            .with_keep_font_definitions(true)
            .decode_tree(&mut tree)
            .unwrap();
        assert!(tree.leaves().any(|t| t.is_control_word(b"\\f1")));
    }

    #[test]
    fn test_initial_byte_count() {
        let decoder = TextDecoder::new().with_initial_unicode_byte_count(Some(0));
        assert_eq!(decode_with(r"\u8220 ?", &decoder).unwrap(), "\u{201C}?");
    }

    #[test]
    fn test_code_unit_parsing() {
        let token = |value: &[u8]| Token::new(NodeId(0), TokenKind::Unicode, value, Span::default());
        assert_eq!(unicode_code_unit(&token(b"\\u-1")).unwrap(), 0xFFFF);
        assert_eq!(unicode_code_unit(&token(b"\\u8217")).unwrap(), 8217);
        assert!(unicode_code_unit(&token(b"\\u-70000")).is_err());
    }
}
