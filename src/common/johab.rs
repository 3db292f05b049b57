//! Johab (codepage 1361) decoding.
//!
//! Hangul code points pack three 5-bit jamo fields into the 16-bit code.
//! Symbols and hanja are KS X 1001 rows in a different byte layout and are
//! decoded through the EUC-KR tables of `encoding_rs`.

/// Field value for "no jamo in this position"
const FILL: u8 = 0xFE;
/// Field value that no code point uses
const NONE: u8 = 0xFF;

/// Initial consonant field to syllable index.
static INITIAL: [u8; 32] = [
    NONE, FILL, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, NONE, NONE, NONE,
    NONE, NONE, NONE, NONE, NONE, NONE, NONE, NONE,
];

/// Vowel field to syllable index.
static MEDIAL: [u8; 32] = [
    NONE, NONE, FILL, 0, 1, 2, 3, 4, NONE, NONE, 5, 6, 7, 8, 9, 10, NONE, NONE, 11, 12, 13, 14, 15,
    16, NONE, NONE, 17, 18, 19, 20, NONE, NONE,
];

/// Final consonant field to syllable index (0 is reserved for "none").
static FINAL: [u8; 32] = [
    NONE, FILL, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, NONE, 17, 18, 19, 20, 21, 22,
    23, 24, 25, 26, 27, NONE, NONE,
];

/// Compatibility jamo for a lone initial consonant.
static INITIAL_JAMO: [char; 19] = [
    '\u{3131}', '\u{3132}', '\u{3134}', '\u{3137}', '\u{3138}', '\u{3139}', '\u{3141}',
    '\u{3142}', '\u{3143}', '\u{3145}', '\u{3146}', '\u{3147}', '\u{3148}', '\u{3149}',
    '\u{314A}', '\u{314B}', '\u{314C}', '\u{314D}', '\u{314E}',
];

/// Compatibility jamo for a lone final consonant, from index 1.
static FINAL_JAMO: [char; 27] = [
    '\u{3131}', '\u{3132}', '\u{3133}', '\u{3134}', '\u{3135}', '\u{3136}', '\u{3137}',
    '\u{3139}', '\u{313A}', '\u{313B}', '\u{313C}', '\u{313D}', '\u{313E}', '\u{313F}',
    '\u{3140}', '\u{3141}', '\u{3142}', '\u{3144}', '\u{3145}', '\u{3146}', '\u{3147}',
    '\u{3148}', '\u{314A}', '\u{314B}', '\u{314C}', '\u{314D}', '\u{314E}',
];

const SYLLABLE_BASE: u32 = 0xAC00;
const MEDIAL_JAMO_BASE: u32 = 0x314F;

/// Decode Johab bytes, or `None` if any sequence is invalid.
pub fn decode_johab(bytes: &[u8]) -> Option<String> {
    let mut out = String::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();
    while let Some(lead) = iter.next() {
        if lead < 0x80 {
            out.push(char::from(lead));
            continue;
        }
        let trail = iter.next()?;
        out.push(decode_pair(lead, trail)?);
    }
    Some(out)
}

fn decode_pair(lead: u8, trail: u8) -> Option<char> {
    match lead {
        0x84..=0xD3 => decode_hangul(u16::from_be_bytes([lead, trail])),
        0xD9..=0xDE | 0xE0..=0xF9 => decode_ksx1001(lead, trail),
        _ => None,
    }
}

fn decode_hangul(code: u16) -> Option<char> {
    let field = |shift: u16| usize::from((code >> shift) & 0x1F);
    let initial = INITIAL[field(10)];
    let medial = MEDIAL[field(5)];
    let last = FINAL[field(0)];
    if initial == NONE || medial == NONE || last == NONE {
        return None;
    }

    match (initial, medial, last) {
        (FILL, FILL, FILL) => Some('\u{3000}'),
        (FILL, FILL, last) => FINAL_JAMO.get(usize::from(last) - 1).copied(),
        (FILL, medial, FILL) => char::from_u32(MEDIAL_JAMO_BASE + u32::from(medial)),
        (initial, FILL, FILL) => INITIAL_JAMO.get(usize::from(initial)).copied(),
        (FILL, _, _) | (_, FILL, _) => None,
        (initial, medial, last) => {
            let last = if last == FILL { 0 } else { u32::from(last) };
            char::from_u32(SYLLABLE_BASE + u32::from(initial) * 588 + u32::from(medial) * 28 + last)
        },
    }
}

/// Symbols and hanja: map the Johab pair back onto a KS X 1001 row/cell.
fn decode_ksx1001(lead: u8, trail: u8) -> Option<char> {
    if trail < 0x31
        || (0x80..0x91).contains(&trail)
        || trail & 0x7F == 0x7F
        || (lead == 0xDA && (0xA1..=0xD3).contains(&trail))
    {
        return None;
    }

    let lead = u16::from(lead);
    let trail = u16::from(trail);
    let row = if lead < 0xE0 { 2 * (lead - 0xD9) } else { 2 * lead - 0x197 };
    let cell = if trail < 0x91 { trail - 0x31 } else { trail - 0x43 };
    let (row, cell) = if cell < 0x5E {
        (row + 0x21, cell + 0x21)
    } else {
        (row + 0x22, cell - 0x5E + 0x21)
    };

    let euc = [(row as u8) | 0x80, (cell as u8) | 0x80];
    let text = encoding_rs::EUC_KR.decode_without_bom_handling_and_without_replacement(&euc)?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hangul_syllables() {
        assert_eq!(decode_johab(b"\xD0\x65\x8B\x69").unwrap(), "\u{D55C}\u{AE00}");
        assert_eq!(decode_johab(b"a\xD0\x65b").unwrap(), "a\u{D55C}b");
    }

    #[test]
    fn test_lone_jamo() {
        assert_eq!(decode_johab(b"\x88\x41").unwrap(), "\u{3131}");
        assert_eq!(decode_johab(b"\x84\x41").unwrap(), "\u{3000}");
    }

    #[test]
    fn test_symbols_and_hanja() {
        assert_eq!(decode_johab(b"\xD9\x68").unwrap(), "\u{203B}");
        assert_eq!(decode_johab(b"\xF7\xD3").unwrap(), "\u{6F22}");
    }

    #[test]
    fn test_invalid_sequences() {
        assert!(decode_johab(b"\xD0").is_none());
        assert!(decode_johab(b"\xDF\x31").is_none());
        assert!(decode_johab(b"\xD9\x20").is_none());
        assert!(decode_johab(b"\x80\x41").is_none());
    }
}
