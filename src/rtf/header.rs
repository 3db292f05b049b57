//! Document header validation.
//!
//! Before de-encapsulating, the reader checks that the document is RTF
//! (`{\rtf1`), that it declares a charset, that the optional `\ansicpgN`
//! names a real codepage, and that a FROMHTML/FROMTEXT control word sits
//! within the first ten tokens ahead of the font table.

use super::error::{RtfError, RtfResult};
use super::lexer::CharacterSet;
use super::tree::{Group, Node, Token, TokenKind};
use crate::common::encoding::is_known_codepage;
use serde::{Deserialize, Serialize};

const TARGET: &str = "rtfdecap::validation";

/// Header control words are looked for among this many leading children
const HEADER_SCAN_LIMIT: usize = 20;

/// The FROM control word must appear among this many leading children
const FROM_SCAN_LIMIT: usize = 10;

/// Kind of encapsulated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// `\fromhtml1`
    Html,
    /// `\fromtext`
    Text,
}

impl ContentType {
    /// Content type named by a FROM control word.
    pub fn from_control_word(word: &[u8]) -> Option<Self> {
        match word {
            b"\\fromhtml1" => Some(ContentType::Html),
            b"\\fromtext" => Some(ContentType::Text),
            _ => None,
        }
    }

    /// Lowercase name (`html` or `text`).
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Html => "html",
            ContentType::Text => "text",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the header validation established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Declared (or assumed) charset
    pub charset: CharacterSet,
    /// Encapsulated content type
    pub content_type: ContentType,
    /// `\ansicpgN`, if present
    pub ansi_codepage: Option<u32>,
}

/// Run every header check in order: RTF magic, charset, FROM placement,
/// `\ansicpgN`.
pub fn validate_encapsulation(document: &Group, fallback_to_default_charset: bool) -> RtfResult<Header> {
    validate_rtf_doc_header(document)?;
    let charset = validate_charset(document, fallback_to_default_charset)?;
    let content_type = validate_from_header(document)?;
    let ansi_codepage = ansi_codepage(document)?;
    Ok(Header {
        charset,
        content_type,
        ansi_codepage,
    })
}

/// Leaves among the first 20 document children, up to the first group.
pub fn header_control_words(document: &Group) -> impl Iterator<Item = &Token> {
    document
        .children
        .iter()
        .take(HEADER_SCAN_LIMIT)
        .map_while(Node::as_token)
}

/// The document must open with `{\rtf1`.
pub fn validate_rtf_doc_header(document: &Group) -> RtfResult<()> {
    match document.children.first().and_then(Node::as_token) {
        Some(token) if token.is_control_word(b"\\rtf1") => Ok(()),
        first => {
            log::debug!(
                target: TARGET,
                "First child of the document is {:?}, not \\rtf1",
                first.map(|t| String::from_utf8_lossy(&t.value).into_owned())
            );
            Err(RtfError::MalformedRtf(
                "RTF stream does not start with {\\rtf1".to_string(),
            ))
        },
    }
}

/// The charset control word from the header.
///
/// With `fallback_to_default` a missing charset is treated as `\ansi`.
/// Do not enable that for untrusted input.
pub fn validate_charset(document: &Group, fallback_to_default: bool) -> RtfResult<CharacterSet> {
    if let Some(charset) = charset(document) {
        return Ok(charset);
    }

    log::debug!(
        target: TARGET,
        "No charset control word among the header control words; the charset must precede any text or table control words"
    );
    if !fallback_to_default {
        return Err(RtfError::MalformedRtf(
            "RTF stream does not include charset control word.".to_string(),
        ));
    }

    log::warn!(
        target: TARGET,
        "Falling back to the default charset \\ansi for a stream without one; this is dangerous on possibly malicious input"
    );
    Ok(CharacterSet::Ansi)
}

/// The declared charset, if any.
pub fn charset(document: &Group) -> Option<CharacterSet> {
    header_control_words(document)
        .filter(|token| token.kind == TokenKind::ControlWord)
        .find_map(|token| CharacterSet::from_control_word(token.trimmed()))
}

/// The `\ansicpgN` codepage, if present. A present but unknown codepage is
/// malformed RTF.
pub fn ansi_codepage(document: &Group) -> RtfResult<Option<u32>> {
    let Some(token) = header_control_words(document)
        .find(|token| token.kind == TokenKind::ControlWord && token.trimmed().starts_with(b"\\ansicpg"))
    else {
        return Ok(None);
    };

    let digits = &token.trimmed()[b"\\ansicpg".len()..];
    match atoi_simd::parse::<u32>(digits) {
        Ok(codepage) if is_known_codepage(codepage) => Ok(Some(codepage)),
        _ => Err(RtfError::MalformedRtf(format!(
            "Unsupported unicode codepage number `{}` found in the header",
            String::from_utf8_lossy(token.trimmed())
        ))),
    }
}

/// Find the FROM control word and check where it sits.
pub fn validate_from_header(document: &Group) -> RtfResult<ContentType> {
    let mut scan = FromScan::default();

    for child in document.children.iter().take(FROM_SCAN_LIMIT) {
        match child {
            Node::Token(token) => scan.check(token)?,
            Node::Group(group) => {
                for token in group.control_words() {
                    scan.check(token)?;
                }
            },
        }
    }

    scan.content_type.ok_or_else(|| {
        log::debug!(
            target: TARGET,
            "FROMHTML/TEXT control word not found in the first {} RTF tokens",
            FROM_SCAN_LIMIT
        );
        RtfError::NotEncapsulatedRtf("FROMHTML/TEXT control word not found.".to_string())
    })
}

/// State of the FROM placement scan.
#[derive(Debug, Default)]
struct FromScan {
    seen_rtf1: bool,
    seen_from: bool,
    malformed: bool,
    content_type: Option<ContentType>,
}

impl FromScan {
    /// Feed one token. Fails once a FROM control word has been seen while
    /// the header is malformed.
    fn check(&mut self, token: &Token) -> RtfResult<()> {
        if token.kind != TokenKind::ControlWord {
            return Ok(());
        }

        let word = token.trimmed();
        if let Some(content_type) = ContentType::from_control_word(word) {
            if self.seen_from {
                log::debug!(target: TARGET, "Multiple FROMHTML/TEXT control words in the header");
                self.malformed = true;
            }
            if self.seen_rtf1 {
                if self.content_type.is_none() {
                    self.content_type = Some(content_type);
                }
            } else {
                log::debug!(target: TARGET, "FROMHTML/TEXT control word found before \\rtf1");
                self.malformed = true;
            }
            self.seen_from = true;
        } else if word == b"\\rtf1" {
            self.seen_rtf1 = true;
        } else if word == b"\\fonttbl" && !self.seen_from {
            log::debug!(target: TARGET, "\\fonttbl found before FROMHTML/TEXT was declared");
            self.malformed = true;
        }

        if self.seen_from && self.malformed {
            return Err(RtfError::MalformedEncapsulatedRtf(
                "RTF looks like it was supposed to be encapsulated HTML/TEXT but the headers are malformed"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::parser::{RtfTreeBuilder, TreeBuilder};

    fn validate(input: &[u8], fallback: bool) -> RtfResult<Header> {
        let tree = RtfTreeBuilder.build(input).unwrap();
        validate_encapsulation(tree.document().unwrap(), fallback)
    }

    const FONTS: &str = r"{\fonttbl{\f0\fswiss Arial;}}";

    fn doc(header: &str) -> Vec<u8> {
        format!("{{{}{} text}}", header, FONTS).into_bytes()
    }

    #[test]
    fn test_header_matrix() {
        let header = validate(&doc(r"\rtf1\ansi\fromhtml1"), false).unwrap();
        assert_eq!(header.content_type, ContentType::Html);
        assert_eq!(header.charset, CharacterSet::Ansi);

        let header = validate(&doc(r"\rtf1\mac\fromtext"), false).unwrap();
        assert_eq!(header.content_type, ContentType::Text);
        assert_eq!(header.charset, CharacterSet::Mac);

        assert!(matches!(
            validate(&doc(r"\rtf1\ansi\fromhtml1\fromhtml1"), false),
            Err(RtfError::MalformedEncapsulatedRtf(_))
        ));
        assert!(matches!(
            validate(&doc(r"\rtf1\ansi"), false),
            Err(RtfError::NotEncapsulatedRtf(_))
        ));
        assert!(matches!(
            validate(&doc(r"\fromhtml1\rtf1\ansi"), false),
            Err(RtfError::MalformedRtf(_))
        ));
    }

    #[test]
    fn test_fromhtml_variants_do_not_count() {
        for header in [r"\rtf1\ansi\fromhtml", r"\rtf1\ansi\fromhtml0", r"\rtf1\ansi\fromtext1"] {
            assert!(validate(&doc(header), false).unwrap_err().is_not_encapsulated());
        }
    }

    #[test]
    fn test_fonttbl_before_from() {
        let input = format!(r"{{\rtf1\ansi{}\fromhtml1 text}}", FONTS);
        assert!(matches!(
            validate(input.as_bytes(), false),
            Err(RtfError::MalformedEncapsulatedRtf(_))
        ));
    }

    #[test]
    fn test_from_outside_first_ten_tokens() {
        let input = format!(
            r"{{\rtf1\ansi\a\b\c\d\e\f\g\h\i\fromhtml1{}x}}",
            FONTS
        );
        assert!(validate(input.as_bytes(), false).unwrap_err().is_not_encapsulated());
    }

    #[test]
    fn test_charset_fallback() {
        assert!(matches!(
            validate(&doc(r"\rtf1\fromhtml1"), false),
            Err(RtfError::MalformedRtf(_))
        ));
        let header = validate(&doc(r"\rtf1\fromhtml1"), true).unwrap();
        assert_eq!(header.charset, CharacterSet::Ansi);
    }

    #[test]
    fn test_ansicpg() {
        let header = validate(&doc(r"\rtf1\ansi\ansicpg1252\fromhtml1"), false).unwrap();
        assert_eq!(header.ansi_codepage, Some(1252));

        assert!(matches!(
            validate(&doc(r"\rtf1\ansi\ansicpg1\fromhtml1"), false),
            Err(RtfError::MalformedRtf(_))
        ));
        assert!(matches!(
            validate(&doc(r"\rtf1\ansi\ansicpg\fromhtml1"), false),
            Err(RtfError::MalformedRtf(_))
        ));
        let header = validate(&doc(r"\rtf1\ansi\fromtext"), false).unwrap();
        assert_eq!(header.ansi_codepage, None);
    }

    #[test]
    fn test_header_words_stop_at_group() {
        let tree = RtfTreeBuilder
            .build(br"{\rtf1\fromhtml1{\fonttbl}\ansi x}")
            .unwrap();
        let document = tree.document().unwrap();
        assert_eq!(header_control_words(document).count(), 2);
        assert_eq!(charset(document), None);
    }
}
