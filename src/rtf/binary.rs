//! `\binN` payload extraction.
//!
//! Binary payloads may contain any byte, braces and backslashes included,
//! so they are cut out of the raw buffer before the lexer sees it.

use memchr::memmem;
use serde::Serialize;

/// One extracted `\binN` payload. Offsets refer to the buffer that was scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BinarySplice {
    /// Extracted payload
    pub bytes: Vec<u8>,
    /// Control word as seen in the source (`\bin`)
    pub control_word: String,
    /// Numeric parameter as seen in the source
    pub parameter: String,
    /// Offset of the backslash of `\binN`
    pub start_pos: usize,
    /// Offset of the first payload byte
    pub bin_start_pos: usize,
    /// Offset one past the last payload byte
    pub end_pos: usize,
}

/// Result of [`strip_binary_objects`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrippedBinary {
    /// Input with every `\binN` control word and payload removed
    pub rtf: Vec<u8>,
    /// Splices in source order
    pub binaries: Vec<BinarySplice>,
}

const BIN: &[u8] = b"\\bin";

/// Remove every `\binN` control word and the N bytes that follow it.
///
/// `\bin` without digits and `\bin-N` are left untouched. A single space
/// after the digits is the control word delimiter and is not part of the
/// payload. A length running past the end of the buffer is clamped.
pub fn strip_binary_objects(raw: &[u8]) -> StrippedBinary {
    let mut binaries = Vec::new();
    // Payloads are opaque, so matches inside one are skipped
    let mut resume_at = 0;

    for start in memmem::find_iter(raw, BIN) {
        if start < resume_at {
            continue;
        }

        let digits_start = start + BIN.len();
        let digits_len = raw[digits_start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits_len == 0 {
            continue;
        }
        let digits = &raw[digits_start..digits_start + digits_len];

        let mut bin_start_pos = digits_start + digits_len;
        if raw.get(bin_start_pos) == Some(&b' ') {
            bin_start_pos += 1;
        }

        let declared = atoi_simd::parse::<usize>(digits).unwrap_or(usize::MAX);
        let available = raw.len() - bin_start_pos;
        if declared > available {
            log::warn!(
                "\\bin{} at offset {} runs past the end of the input; keeping the {} bytes available",
                String::from_utf8_lossy(digits),
                start,
                available
            );
        }
        let end_pos = bin_start_pos + declared.min(available);

        binaries.push(BinarySplice {
            bytes: raw[bin_start_pos..end_pos].to_vec(),
            control_word: String::from_utf8_lossy(BIN).into_owned(),
            parameter: String::from_utf8_lossy(digits).into_owned(),
            start_pos: start,
            bin_start_pos,
            end_pos,
        });
        resume_at = end_pos;
    }

    if binaries.is_empty() {
        return StrippedBinary {
            rtf: raw.to_vec(),
            binaries,
        };
    }

    let removed: usize = binaries.iter().map(|b| b.end_pos - b.start_pos).sum();
    let mut rtf = Vec::with_capacity(raw.len() - removed);
    let mut copied_to = 0;
    for splice in &binaries {
        rtf.extend_from_slice(&raw[copied_to..splice.start_pos]);
        copied_to = splice.end_pos;
    }
    rtf.extend_from_slice(&raw[copied_to..]);

    StrippedBinary { rtf, binaries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_payload() {
        let payload = b"{}\\\\{\\par}0123456789";
        let mut input = b"A\\bin20".to_vec();
        input.extend_from_slice(payload);
        input.push(b'B');

        let stripped = strip_binary_objects(&input);
        assert_eq!(stripped.rtf, b"AB");
        assert_eq!(stripped.binaries.len(), 1);

        let splice = &stripped.binaries[0];
        assert_eq!(splice.bytes, payload);
        assert_eq!(splice.control_word, "\\bin");
        assert_eq!(splice.parameter, "20");
        assert_eq!(splice.start_pos, 1);
        assert_eq!(splice.bin_start_pos, 7);
        assert_eq!(splice.end_pos, 27);
    }

    #[test]
    fn test_space_delimiter() {
        let stripped = strip_binary_objects(b"x\\bin3 abcy");
        assert_eq!(stripped.rtf, b"xy");
        assert_eq!(stripped.binaries[0].bytes, b"abc");
        assert_eq!(stripped.binaries[0].bin_start_pos, 7);
    }

    #[test]
    fn test_untouched_forms() {
        for input in [&b"A\\bin-20 0123456789B"[..], b"A\\bin B", b"\\binary"] {
            let stripped = strip_binary_objects(input);
            assert!(stripped.binaries.is_empty());
            assert_eq!(stripped.rtf, input);
        }
    }

    #[test]
    fn test_zero_length() {
        let stripped = strip_binary_objects(b"A\\bin0B");
        assert_eq!(stripped.rtf, b"AB");
        assert_eq!(stripped.binaries.len(), 1);
        assert!(stripped.binaries[0].bytes.is_empty());
    }

    #[test]
    fn test_multiple_and_nested_marker() {
        let stripped = strip_binary_objects(b"a\\bin6\\bin2xb\\bin1zc");
        assert_eq!(stripped.rtf, b"abc");
        assert_eq!(stripped.binaries.len(), 2);
        assert_eq!(stripped.binaries[0].bytes, b"\\bin2x");
        assert_eq!(stripped.binaries[1].start_pos, 13);
        assert_eq!(stripped.binaries[1].bytes, b"z");
    }

    #[test]
    fn test_truncated_payload() {
        let stripped = strip_binary_objects(b"a\\bin99xyz");
        assert_eq!(stripped.rtf, b"a");
        assert_eq!(stripped.binaries[0].bytes, b"xyz");
        assert_eq!(stripped.binaries[0].end_pos, 10);
    }

    proptest! {
        #[test]
        fn prop_splice_exactness(
            prefix in "[a-z ]{0,16}",
            payload in proptest::collection::vec(any::<u8>(), 0..64),
            suffix in "[a-z]{0,16}",
        ) {
            let marker = format!("\\bin{} ", payload.len());
            let mut input = prefix.as_bytes().to_vec();
            input.extend_from_slice(marker.as_bytes());
            input.extend_from_slice(&payload);
            input.extend_from_slice(suffix.as_bytes());

            let stripped = strip_binary_objects(&input);
            prop_assert_eq!(stripped.binaries.len(), 1);
            let splice = &stripped.binaries[0];
            prop_assert_eq!(&splice.bytes, &payload);
            prop_assert_eq!(splice.start_pos, prefix.len());
            prop_assert_eq!(splice.end_pos, prefix.len() + marker.len() + payload.len());

            let mut expected = prefix.as_bytes().to_vec();
            expected.extend_from_slice(suffix.as_bytes());
            prop_assert_eq!(stripped.rtf, expected);
        }
    }
}
