//! Upper halves of the Macintosh single-byte codepages `encoding_rs` lacks.
//!
//! Bytes below 0x80 are ASCII in every table.

/// A single-byte Macintosh codepage.
#[derive(Debug, PartialEq, Eq)]
pub struct MacCodepage {
    /// Codec name used in diagnostics
    pub name: &'static str,
    high: [char; 128],
}

impl MacCodepage {
    /// Character for `byte`.
    #[inline]
    pub fn decode_byte(&self, byte: u8) -> char {
        match byte {
            0..=0x7F => char::from(byte),
            _ => self.high[usize::from(byte - 0x80)],
        }
    }

    /// Decode a whole buffer. Every byte is defined, so this cannot fail.
    pub fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|&byte| self.decode_byte(byte)).collect()
    }
}

/// Table for a Macintosh codepage identifier.
pub fn mac_codepage(codepage: u32) -> Option<&'static MacCodepage> {
    match codepage {
        10004 => Some(&MAC_ARABIC),
        10006 => Some(&MAC_GREEK),
        10010 => Some(&MAC_ROMANIAN),
        10029 => Some(&MAC_CENTRAL_EUROPEAN),
        10079 => Some(&MAC_ICELANDIC),
        10081 => Some(&MAC_TURKISH),
        10082 => Some(&MAC_CROATIAN),
        _ => None,
    }
}

static MAC_ARABIC: MacCodepage = MacCodepage {
    name: "Mac Arabic",
    high: [
        '\u{00C4}', '\u{00A0}', '\u{00C7}', '\u{00C9}', '\u{00D1}', '\u{00D6}', '\u{00DC}', '\u{00E1}',
        '\u{00E0}', '\u{00E2}', '\u{00E4}', '\u{06BA}', '\u{00AB}', '\u{00E7}', '\u{00E9}', '\u{00E8}',
        '\u{00EA}', '\u{00EB}', '\u{00ED}', '\u{2026}', '\u{00EE}', '\u{00EF}', '\u{00F1}', '\u{00F3}',
        '\u{00BB}', '\u{00F4}', '\u{00F6}', '\u{00F7}', '\u{00FA}', '\u{00F9}', '\u{00FB}', '\u{00FC}',
        '\u{0020}', '\u{0021}', '\u{0022}', '\u{0023}', '\u{0024}', '\u{066A}', '\u{0026}', '\u{0027}',
        '\u{0028}', '\u{0029}', '\u{002A}', '\u{002B}', '\u{060C}', '\u{002D}', '\u{002E}', '\u{002F}',
        '\u{0660}', '\u{0661}', '\u{0662}', '\u{0663}', '\u{0664}', '\u{0665}', '\u{0666}', '\u{0667}',
        '\u{0668}', '\u{0669}', '\u{003A}', '\u{061B}', '\u{003C}', '\u{003D}', '\u{003E}', '\u{061F}',
        '\u{274A}', '\u{0621}', '\u{0622}', '\u{0623}', '\u{0624}', '\u{0625}', '\u{0626}', '\u{0627}',
        '\u{0628}', '\u{0629}', '\u{062A}', '\u{062B}', '\u{062C}', '\u{062D}', '\u{062E}', '\u{062F}',
        '\u{0630}', '\u{0631}', '\u{0632}', '\u{0633}', '\u{0634}', '\u{0635}', '\u{0636}', '\u{0637}',
        '\u{0638}', '\u{0639}', '\u{063A}', '\u{005B}', '\u{005C}', '\u{005D}', '\u{005E}', '\u{005F}',
        '\u{0640}', '\u{0641}', '\u{0642}', '\u{0643}', '\u{0644}', '\u{0645}', '\u{0646}', '\u{0647}',
        '\u{0648}', '\u{0649}', '\u{064A}', '\u{064B}', '\u{064C}', '\u{064D}', '\u{064E}', '\u{064F}',
        '\u{0650}', '\u{0651}', '\u{0652}', '\u{067E}', '\u{0679}', '\u{0686}', '\u{06D5}', '\u{06A4}',
        '\u{06AF}', '\u{0688}', '\u{0691}', '\u{007B}', '\u{007C}', '\u{007D}', '\u{0698}', '\u{06D2}',
    ],
};

static MAC_GREEK: MacCodepage = MacCodepage {
    name: "Mac Greek",
    high: [
        '\u{00C4}', '\u{00B9}', '\u{00B2}', '\u{00C9}', '\u{00B3}', '\u{00D6}', '\u{00DC}', '\u{0385}',
        '\u{00E0}', '\u{00E2}', '\u{00E4}', '\u{0384}', '\u{00A8}', '\u{00E7}', '\u{00E9}', '\u{00E8}',
        '\u{00EA}', '\u{00EB}', '\u{00A3}', '\u{2122}', '\u{00EE}', '\u{00EF}', '\u{2022}', '\u{00BD}',
        '\u{2030}', '\u{00F4}', '\u{00F6}', '\u{00A6}', '\u{20AC}', '\u{00F9}', '\u{00FB}', '\u{00FC}',
        '\u{2020}', '\u{0393}', '\u{0394}', '\u{0398}', '\u{039B}', '\u{039E}', '\u{03A0}', '\u{00DF}',
        '\u{00AE}', '\u{00A9}', '\u{03A3}', '\u{03AA}', '\u{00A7}', '\u{2260}', '\u{00B0}', '\u{00B7}',
        '\u{0391}', '\u{00B1}', '\u{2264}', '\u{2265}', '\u{00A5}', '\u{0392}', '\u{0395}', '\u{0396}',
        '\u{0397}', '\u{0399}', '\u{039A}', '\u{039C}', '\u{03A6}', '\u{03AB}', '\u{03A8}', '\u{03A9}',
        '\u{03AC}', '\u{039D}', '\u{00AC}', '\u{039F}', '\u{03A1}', '\u{2248}', '\u{03A4}', '\u{00AB}',
        '\u{00BB}', '\u{2026}', '\u{00A0}', '\u{03A5}', '\u{03A7}', '\u{0386}', '\u{0388}', '\u{0153}',
        '\u{2013}', '\u{2015}', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '\u{00F7}', '\u{0389}',
        '\u{038A}', '\u{038C}', '\u{038E}', '\u{03AD}', '\u{03AE}', '\u{03AF}', '\u{03CC}', '\u{038F}',
        '\u{03CD}', '\u{03B1}', '\u{03B2}', '\u{03C8}', '\u{03B4}', '\u{03B5}', '\u{03C6}', '\u{03B3}',
        '\u{03B7}', '\u{03B9}', '\u{03BE}', '\u{03BA}', '\u{03BB}', '\u{03BC}', '\u{03BD}', '\u{03BF}',
        '\u{03C0}', '\u{03CE}', '\u{03C1}', '\u{03C3}', '\u{03C4}', '\u{03B8}', '\u{03C9}', '\u{03C2}',
        '\u{03C7}', '\u{03C5}', '\u{03B6}', '\u{03CA}', '\u{03CB}', '\u{0390}', '\u{03B0}', '\u{00AD}',
    ],
};

static MAC_ROMANIAN: MacCodepage = MacCodepage {
    name: "Mac Romanian",
    high: [
        '\u{00C4}', '\u{00C5}', '\u{00C7}', '\u{00C9}', '\u{00D1}', '\u{00D6}', '\u{00DC}', '\u{00E1}',
        '\u{00E0}', '\u{00E2}', '\u{00E4}', '\u{00E3}', '\u{00E5}', '\u{00E7}', '\u{00E9}', '\u{00E8}',
        '\u{00EA}', '\u{00EB}', '\u{00ED}', '\u{00EC}', '\u{00EE}', '\u{00EF}', '\u{00F1}', '\u{00F3}',
        '\u{00F2}', '\u{00F4}', '\u{00F6}', '\u{00F5}', '\u{00FA}', '\u{00F9}', '\u{00FB}', '\u{00FC}',
        '\u{2020}', '\u{00B0}', '\u{00A2}', '\u{00A3}', '\u{00A7}', '\u{2022}', '\u{00B6}', '\u{00DF}',
        '\u{00AE}', '\u{00A9}', '\u{2122}', '\u{00B4}', '\u{00A8}', '\u{2260}', '\u{0102}', '\u{0218}',
        '\u{221E}', '\u{00B1}', '\u{2264}', '\u{2265}', '\u{00A5}', '\u{00B5}', '\u{2202}', '\u{2211}',
        '\u{220F}', '\u{03C0}', '\u{222B}', '\u{00AA}', '\u{00BA}', '\u{03A9}', '\u{0103}', '\u{0219}',
        '\u{00BF}', '\u{00A1}', '\u{00AC}', '\u{221A}', '\u{0192}', '\u{2248}', '\u{2206}', '\u{00AB}',
        '\u{00BB}', '\u{2026}', '\u{00A0}', '\u{00C0}', '\u{00C3}', '\u{00D5}', '\u{0152}', '\u{0153}',
        '\u{2013}', '\u{2014}', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '\u{00F7}', '\u{25CA}',
        '\u{00FF}', '\u{0178}', '\u{2044}', '\u{20AC}', '\u{2039}', '\u{203A}', '\u{021A}', '\u{021B}',
        '\u{2021}', '\u{00B7}', '\u{201A}', '\u{201E}', '\u{2030}', '\u{00C2}', '\u{00CA}', '\u{00C1}',
        '\u{00CB}', '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}', '\u{00CC}', '\u{00D3}', '\u{00D4}',
        '\u{F8FF}', '\u{00D2}', '\u{00DA}', '\u{00DB}', '\u{00D9}', '\u{0131}', '\u{02C6}', '\u{02DC}',
        '\u{00AF}', '\u{02D8}', '\u{02D9}', '\u{02DA}', '\u{00B8}', '\u{02DD}', '\u{02DB}', '\u{02C7}',
    ],
};

static MAC_CENTRAL_EUROPEAN: MacCodepage = MacCodepage {
    name: "Mac Central European",
    high: [
        '\u{00C4}', '\u{0100}', '\u{0101}', '\u{00C9}', '\u{0104}', '\u{00D6}', '\u{00DC}', '\u{00E1}',
        '\u{0105}', '\u{010C}', '\u{00E4}', '\u{010D}', '\u{0106}', '\u{0107}', '\u{00E9}', '\u{0179}',
        '\u{017A}', '\u{010E}', '\u{00ED}', '\u{010F}', '\u{0112}', '\u{0113}', '\u{0116}', '\u{00F3}',
        '\u{0117}', '\u{00F4}', '\u{00F6}', '\u{00F5}', '\u{00FA}', '\u{011A}', '\u{011B}', '\u{00FC}',
        '\u{2020}', '\u{00B0}', '\u{0118}', '\u{00A3}', '\u{00A7}', '\u{2022}', '\u{00B6}', '\u{00DF}',
        '\u{00AE}', '\u{00A9}', '\u{2122}', '\u{0119}', '\u{00A8}', '\u{2260}', '\u{0123}', '\u{012E}',
        '\u{012F}', '\u{012A}', '\u{2264}', '\u{2265}', '\u{012B}', '\u{0136}', '\u{2202}', '\u{2211}',
        '\u{0142}', '\u{013B}', '\u{013C}', '\u{013D}', '\u{013E}', '\u{0139}', '\u{013A}', '\u{0145}',
        '\u{0146}', '\u{0143}', '\u{00AC}', '\u{221A}', '\u{0144}', '\u{0147}', '\u{2206}', '\u{00AB}',
        '\u{00BB}', '\u{2026}', '\u{00A0}', '\u{0148}', '\u{0150}', '\u{00D5}', '\u{0151}', '\u{014C}',
        '\u{2013}', '\u{2014}', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '\u{00F7}', '\u{25CA}',
        '\u{014D}', '\u{0154}', '\u{0155}', '\u{0158}', '\u{2039}', '\u{203A}', '\u{0159}', '\u{0156}',
        '\u{0157}', '\u{0160}', '\u{201A}', '\u{201E}', '\u{0161}', '\u{015A}', '\u{015B}', '\u{00C1}',
        '\u{0164}', '\u{0165}', '\u{00CD}', '\u{017D}', '\u{017E}', '\u{016A}', '\u{00D3}', '\u{00D4}',
        '\u{016B}', '\u{016E}', '\u{00DA}', '\u{016F}', '\u{0170}', '\u{0171}', '\u{0172}', '\u{0173}',
        '\u{00DD}', '\u{00FD}', '\u{0137}', '\u{017B}', '\u{0141}', '\u{017C}', '\u{0122}', '\u{02C7}',
    ],
};

static MAC_ICELANDIC: MacCodepage = MacCodepage {
    name: "Mac Icelandic",
    high: [
        '\u{00C4}', '\u{00C5}', '\u{00C7}', '\u{00C9}', '\u{00D1}', '\u{00D6}', '\u{00DC}', '\u{00E1}',
        '\u{00E0}', '\u{00E2}', '\u{00E4}', '\u{00E3}', '\u{00E5}', '\u{00E7}', '\u{00E9}', '\u{00E8}',
        '\u{00EA}', '\u{00EB}', '\u{00ED}', '\u{00EC}', '\u{00EE}', '\u{00EF}', '\u{00F1}', '\u{00F3}',
        '\u{00F2}', '\u{00F4}', '\u{00F6}', '\u{00F5}', '\u{00FA}', '\u{00F9}', '\u{00FB}', '\u{00FC}',
        '\u{00DD}', '\u{00B0}', '\u{00A2}', '\u{00A3}', '\u{00A7}', '\u{2022}', '\u{00B6}', '\u{00DF}',
        '\u{00AE}', '\u{00A9}', '\u{2122}', '\u{00B4}', '\u{00A8}', '\u{2260}', '\u{00C6}', '\u{00D8}',
        '\u{221E}', '\u{00B1}', '\u{2264}', '\u{2265}', '\u{00A5}', '\u{00B5}', '\u{2202}', '\u{2211}',
        '\u{220F}', '\u{03C0}', '\u{222B}', '\u{00AA}', '\u{00BA}', '\u{03A9}', '\u{00E6}', '\u{00F8}',
        '\u{00BF}', '\u{00A1}', '\u{00AC}', '\u{221A}', '\u{0192}', '\u{2248}', '\u{2206}', '\u{00AB}',
        '\u{00BB}', '\u{2026}', '\u{00A0}', '\u{00C0}', '\u{00C3}', '\u{00D5}', '\u{0152}', '\u{0153}',
        '\u{2013}', '\u{2014}', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '\u{00F7}', '\u{25CA}',
        '\u{00FF}', '\u{0178}', '\u{2044}', '\u{20AC}', '\u{00D0}', '\u{00F0}', '\u{00DE}', '\u{00FE}',
        '\u{00FD}', '\u{00B7}', '\u{201A}', '\u{201E}', '\u{2030}', '\u{00C2}', '\u{00CA}', '\u{00C1}',
        '\u{00CB}', '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}', '\u{00CC}', '\u{00D3}', '\u{00D4}',
        '\u{F8FF}', '\u{00D2}', '\u{00DA}', '\u{00DB}', '\u{00D9}', '\u{0131}', '\u{02C6}', '\u{02DC}',
        '\u{00AF}', '\u{02D8}', '\u{02D9}', '\u{02DA}', '\u{00B8}', '\u{02DD}', '\u{02DB}', '\u{02C7}',
    ],
};

static MAC_TURKISH: MacCodepage = MacCodepage {
    name: "Mac Turkish",
    high: [
        '\u{00C4}', '\u{00C5}', '\u{00C7}', '\u{00C9}', '\u{00D1}', '\u{00D6}', '\u{00DC}', '\u{00E1}',
        '\u{00E0}', '\u{00E2}', '\u{00E4}', '\u{00E3}', '\u{00E5}', '\u{00E7}', '\u{00E9}', '\u{00E8}',
        '\u{00EA}', '\u{00EB}', '\u{00ED}', '\u{00EC}', '\u{00EE}', '\u{00EF}', '\u{00F1}', '\u{00F3}',
        '\u{00F2}', '\u{00F4}', '\u{00F6}', '\u{00F5}', '\u{00FA}', '\u{00F9}', '\u{00FB}', '\u{00FC}',
        '\u{2020}', '\u{00B0}', '\u{00A2}', '\u{00A3}', '\u{00A7}', '\u{2022}', '\u{00B6}', '\u{00DF}',
        '\u{00AE}', '\u{00A9}', '\u{2122}', '\u{00B4}', '\u{00A8}', '\u{2260}', '\u{00C6}', '\u{00D8}',
        '\u{221E}', '\u{00B1}', '\u{2264}', '\u{2265}', '\u{00A5}', '\u{00B5}', '\u{2202}', '\u{2211}',
        '\u{220F}', '\u{03C0}', '\u{222B}', '\u{00AA}', '\u{00BA}', '\u{03A9}', '\u{00E6}', '\u{00F8}',
        '\u{00BF}', '\u{00A1}', '\u{00AC}', '\u{221A}', '\u{0192}', '\u{2248}', '\u{2206}', '\u{00AB}',
        '\u{00BB}', '\u{2026}', '\u{00A0}', '\u{00C0}', '\u{00C3}', '\u{00D5}', '\u{0152}', '\u{0153}',
        '\u{2013}', '\u{2014}', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '\u{00F7}', '\u{25CA}',
        '\u{00FF}', '\u{0178}', '\u{011E}', '\u{011F}', '\u{0130}', '\u{0131}', '\u{015E}', '\u{015F}',
        '\u{2021}', '\u{00B7}', '\u{201A}', '\u{201E}', '\u{2030}', '\u{00C2}', '\u{00CA}', '\u{00C1}',
        '\u{00CB}', '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}', '\u{00CC}', '\u{00D3}', '\u{00D4}',
        '\u{F8FF}', '\u{00D2}', '\u{00DA}', '\u{00DB}', '\u{00D9}', '\u{F8A0}', '\u{02C6}', '\u{02DC}',
        '\u{00AF}', '\u{02D8}', '\u{02D9}', '\u{02DA}', '\u{00B8}', '\u{02DD}', '\u{02DB}', '\u{02C7}',
    ],
};

static MAC_CROATIAN: MacCodepage = MacCodepage {
    name: "Mac Croatian",
    high: [
        '\u{00C4}', '\u{00C5}', '\u{00C7}', '\u{00C9}', '\u{00D1}', '\u{00D6}', '\u{00DC}', '\u{00E1}',
        '\u{00E0}', '\u{00E2}', '\u{00E4}', '\u{00E3}', '\u{00E5}', '\u{00E7}', '\u{00E9}', '\u{00E8}',
        '\u{00EA}', '\u{00EB}', '\u{00ED}', '\u{00EC}', '\u{00EE}', '\u{00EF}', '\u{00F1}', '\u{00F3}',
        '\u{00F2}', '\u{00F4}', '\u{00F6}', '\u{00F5}', '\u{00FA}', '\u{00F9}', '\u{00FB}', '\u{00FC}',
        '\u{2020}', '\u{00B0}', '\u{00A2}', '\u{00A3}', '\u{00A7}', '\u{2022}', '\u{00B6}', '\u{00DF}',
        '\u{00AE}', '\u{0160}', '\u{2122}', '\u{00B4}', '\u{00A8}', '\u{2260}', '\u{017D}', '\u{00D8}',
        '\u{221E}', '\u{00B1}', '\u{2264}', '\u{2265}', '\u{2206}', '\u{00B5}', '\u{2202}', '\u{2211}',
        '\u{220F}', '\u{0161}', '\u{222B}', '\u{00AA}', '\u{00BA}', '\u{03A9}', '\u{017E}', '\u{00F8}',
        '\u{00BF}', '\u{00A1}', '\u{00AC}', '\u{221A}', '\u{0192}', '\u{2248}', '\u{0106}', '\u{00AB}',
        '\u{010C}', '\u{2026}', '\u{00A0}', '\u{00C0}', '\u{00C3}', '\u{00D5}', '\u{0152}', '\u{0153}',
        '\u{0110}', '\u{2014}', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}', '\u{00F7}', '\u{25CA}',
        '\u{F8FF}', '\u{00A9}', '\u{2044}', '\u{20AC}', '\u{2039}', '\u{203A}', '\u{00C6}', '\u{00BB}',
        '\u{2013}', '\u{00B7}', '\u{201A}', '\u{201E}', '\u{2030}', '\u{00C2}', '\u{0107}', '\u{00C1}',
        '\u{010D}', '\u{00C8}', '\u{00CD}', '\u{00CE}', '\u{00CF}', '\u{00CC}', '\u{00D3}', '\u{00D4}',
        '\u{0111}', '\u{00D2}', '\u{00DA}', '\u{00DB}', '\u{00D9}', '\u{0131}', '\u{02C6}', '\u{02DC}',
        '\u{00AF}', '\u{03C0}', '\u{00CB}', '\u{02DA}', '\u{00B8}', '\u{00CA}', '\u{00E6}', '\u{02C7}',
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_tables() {
        let greek = mac_codepage(10006).unwrap();
        assert_eq!(greek.decode(b"a\xE1"), "a\u{3B1}");
        let central = mac_codepage(10029).unwrap();
        assert_eq!(central.decode(b"\x8B"), "\u{10D}");
        let turkish = mac_codepage(10081).unwrap();
        assert_eq!(turkish.decode(b"\xDA"), "\u{11E}");
        assert!(mac_codepage(10000).is_none());
        assert!(mac_codepage(10005).is_none());
    }
}
