//! Codepage tables and codec resolution.
//!
//! RTF names legacy encodings three ways: `\ansicpgN` in the header,
//! `\fcharsetN` and `\cpgN` in font table entries. This module maps all of
//! them onto a [`Codec`]: an `encoding_rs` encoding where one exists, an
//! `oem_cp` table for the DOS codepages, or one of the small in-crate
//! decoders for the rest.

use super::johab::decode_johab;
use super::macintosh::{MacCodepage, mac_codepage};
use encoding_rs::Encoding;
use oem_cp::code_table::DECODING_TABLE_CP_MAP;
use phf::{phf_map, phf_set};
use std::borrow::Cow;

/// A text decoder for one codepage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Decoded by `encoding_rs`
    Encoding(&'static Encoding),
    /// DOS/OEM single-byte codepage decoded through `oem_cp`
    Oem(u16),
    /// Macintosh single-byte codepage
    Mac(&'static MacCodepage),
    /// ISO-8859-1: every byte is the code point of the same value
    Latin1,
    /// US-ASCII: bytes above 0x7F are invalid
    Ascii,
    /// Korean Johab (codepage 1361)
    Johab,
}

impl Codec {
    /// Name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Codec::Encoding(encoding) => encoding.name(),
            Codec::Oem(_) => "DOS OEM",
            Codec::Mac(table) => table.name,
            Codec::Latin1 => "ISO-8859-1",
            Codec::Ascii => "US-ASCII",
            Codec::Johab => "Johab",
        }
    }

    /// Decode `bytes`, or `None` if they are not valid in this codepage.
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Codec::Encoding(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(Cow::into_owned),
            Codec::Oem(codepage) => DECODING_TABLE_CP_MAP.get(codepage)?.decode_string_checked(bytes),
            Codec::Mac(table) => Some(table.decode(bytes)),
            Codec::Latin1 => Some(bytes.iter().copied().map(char::from).collect()),
            Codec::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().copied().map(char::from).collect()),
            Codec::Johab => decode_johab(bytes),
        }
    }
}

/// Map a Windows codepage identifier to a codec.
///
/// `encoding_rs` is preferred; DOS codepages fall back to the `oem_cp`
/// tables. EBCDIC, UTF-7 and the Mac Hebrew and Thai codepages have no
/// codec.
///
/// # Examples
/// ```
/// use rtfdecap::common::encoding::codepage_to_codec;
///
/// let cp437 = codepage_to_codec(437).unwrap();
/// assert_eq!(cp437.decode(b"caf\x82").as_deref(), Some("caf\u{e9}"));
/// assert!(codepage_to_codec(37).is_none());
/// ```
pub fn codepage_to_codec(codepage: u32) -> Option<Codec> {
    if let Some(encoding) = codepage_to_encoding(codepage) {
        return Some(Codec::Encoding(encoding));
    }
    match codepage {
        1361 => Some(Codec::Johab),
        20127 => Some(Codec::Ascii),
        28591 => Some(Codec::Latin1),
        _ => mac_codepage(codepage)
            .map(Codec::Mac)
            .or_else(|| oem_codepage(codepage)),
    }
}

fn oem_codepage(codepage: u32) -> Option<Codec> {
    let codepage = u16::try_from(codepage).ok()?;
    DECODING_TABLE_CP_MAP
        .contains_key(&codepage)
        .then_some(Codec::Oem(codepage))
}

/// Map a Windows codepage identifier to an `encoding_rs` encoding.
///
/// Codepages `encoding_rs` could only approximate with an unrelated
/// encoding (DOS 437 as IBM866, UTF-7, the EBCDIC family) return `None`.
/// The Mac CJK codepages decode with their Windows counterparts.
///
/// # Examples
/// ```
/// use rtfdecap::common::encoding::codepage_to_encoding;
///
/// let encoding = codepage_to_encoding(950).unwrap();
/// assert_eq!(encoding.name(), "Big5");
/// assert!(codepage_to_encoding(437).is_none());
/// ```
#[inline]
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        // DOS
        866 => Some(encoding_rs::IBM866),

        // Windows
        874 => Some(encoding_rs::WINDOWS_874),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),

        // East Asian
        932 => Some(encoding_rs::SHIFT_JIS),
        936 | 20936 | 51936 => Some(encoding_rs::GBK),
        949 | 51949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        54936 => Some(encoding_rs::GB18030),
        20932 | 51932 => Some(encoding_rs::EUC_JP),
        50220..=50222 => Some(encoding_rs::ISO_2022_JP),

        // ISO 8859
        28592 => Some(encoding_rs::ISO_8859_2),
        28593 => Some(encoding_rs::ISO_8859_3),
        28594 => Some(encoding_rs::ISO_8859_4),
        28595 => Some(encoding_rs::ISO_8859_5),
        28596 => Some(encoding_rs::ISO_8859_6),
        28597 => Some(encoding_rs::ISO_8859_7),
        28598 => Some(encoding_rs::ISO_8859_8),
        38598 => Some(encoding_rs::ISO_8859_8_I),
        28603 => Some(encoding_rs::ISO_8859_13),
        28605 => Some(encoding_rs::ISO_8859_15),

        // KOI8
        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),

        // Macintosh
        10000 => Some(encoding_rs::MACINTOSH),
        10001 => Some(encoding_rs::SHIFT_JIS),
        10002 => Some(encoding_rs::BIG5),
        10003 => Some(encoding_rs::EUC_KR),
        10007 | 10017 => Some(encoding_rs::X_MAC_CYRILLIC),
        10008 => Some(encoding_rs::GBK),

        // Unicode
        1200 => Some(encoding_rs::UTF_16LE),
        1201 => Some(encoding_rs::UTF_16BE),
        65001 => Some(encoding_rs::UTF_8),

        _ => None,
    }
}

/// `\fcharsetN` to codepage. `None` values are charsets with no codepage of
/// their own (DEFAULT, SYMBOL, OEM).
static CHARSET_CODEPAGES: phf::Map<u32, Option<u32>> = phf_map! {
    0u32 => Some(1252),   // ANSI
    1u32 => None,         // DEFAULT
    2u32 => None,         // SYMBOL
    128u32 => Some(932),  // SHIFTJIS
    129u32 => Some(949),  // HANGUL
    134u32 => Some(936),  // GB2312
    136u32 => Some(950),  // CHINESEBIG5
    161u32 => Some(1253), // GREEK
    162u32 => Some(1254), // TURKISH
    177u32 => Some(1255), // HEBREW
    178u32 => Some(1256), // ARABIC
    186u32 => Some(1257), // BALTIC
    204u32 => Some(1251), // RUSSIAN
    222u32 => Some(874),  // THAI
    238u32 => Some(1250), // EE
    255u32 => None,       // OEM
};

/// Codepage selected by `\fcharsetN`, if the charset has one.
#[inline]
pub fn charset_to_codepage(charset: u32) -> Option<u32> {
    CHARSET_CODEPAGES.get(&charset).copied().flatten()
}

/// Windows code page identifiers accepted in `\ansicpgN` and `\cpgN`.
static CODEPAGE_IDENTIFIERS: phf::Set<u32> = phf_set! {
    37u32, 437u32, 500u32, 708u32, 709u32, 710u32, 720u32, 737u32, 775u32,
    850u32, 852u32, 855u32, 857u32, 858u32, 860u32, 861u32, 862u32, 863u32,
    864u32, 865u32, 866u32, 869u32, 870u32, 874u32, 875u32, 932u32, 936u32,
    949u32, 950u32, 1026u32, 1047u32, 1140u32, 1141u32, 1142u32, 1143u32,
    1144u32, 1145u32, 1146u32, 1147u32, 1148u32, 1149u32, 1200u32, 1201u32,
    1250u32, 1251u32, 1252u32, 1253u32, 1254u32, 1255u32, 1256u32, 1257u32,
    1258u32, 1361u32, 10000u32, 10001u32, 10002u32, 10003u32, 10004u32,
    10005u32, 10006u32, 10007u32, 10008u32, 10010u32, 10017u32, 10021u32,
    10029u32, 10079u32, 10081u32, 10082u32, 12000u32, 12001u32, 20000u32,
    20001u32, 20002u32, 20003u32, 20004u32, 20005u32, 20105u32, 20106u32,
    20107u32, 20108u32, 20127u32, 20261u32, 20269u32, 20273u32, 20277u32,
    20278u32, 20280u32, 20284u32, 20285u32, 20290u32, 20297u32, 20420u32,
    20423u32, 20424u32, 20833u32, 20838u32, 20866u32, 20871u32, 20880u32,
    20905u32, 20924u32, 20932u32, 20936u32, 20949u32, 21025u32, 21027u32,
    21866u32, 28591u32, 28592u32, 28593u32, 28594u32, 28595u32, 28596u32,
    28597u32, 28598u32, 28599u32, 28603u32, 28605u32, 29001u32, 38598u32,
    50220u32, 50221u32, 50222u32, 50225u32, 50227u32, 50229u32, 50930u32,
    50931u32, 50933u32, 50935u32, 50936u32, 50937u32, 50939u32, 51932u32,
    51936u32, 51949u32, 51950u32, 52936u32, 54936u32, 57002u32, 57003u32,
    57004u32, 57005u32, 57006u32, 57007u32, 57008u32, 57009u32, 57010u32,
    57011u32, 65000u32, 65001u32,
};

/// Whether `codepage` is a known Windows code page identifier.
///
/// This is a validity check on the number only; a known codepage may still
/// lack a codec (see [`codepage_to_codec`]).
#[inline]
pub fn is_known_codepage(codepage: u32) -> bool {
    CODEPAGE_IDENTIFIERS.contains(&codepage)
}

/// Codepage-to-codec lookup used by the text decoder.
///
/// Implement this to plug in a different codec backend.
pub trait CodecResolver {
    /// Codec for `codepage`, or `None` when it is unsupported.
    fn resolve(&self, codepage: u32) -> Option<Codec>;
}

/// Default resolver backed by [`codepage_to_codec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsCodepages;

impl CodecResolver for WindowsCodepages {
    #[inline]
    fn resolve(&self, codepage: u32) -> Option<Codec> {
        codepage_to_codec(codepage)
    }
}

impl<R: CodecResolver + ?Sized> CodecResolver for &R {
    #[inline]
    fn resolve(&self, codepage: u32) -> Option<Codec> {
        (**self).resolve(codepage)
    }
}
