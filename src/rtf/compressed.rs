//! Compressed RTF bodies (MS-OXRTFCP).
//!
//! Message stores keep RTF bodies either LZFu-compressed or stored behind
//! the same 16-byte header with the `MELA` signature. Only decompression
//! is supported.

use super::error::{RtfError, RtfResult};
use zerocopy::FromBytes;
use zerocopy_derive::{FromBytes as DeriveFromBytes, Immutable, KnownLayout};

const TARGET: &str = "rtfdecap::transform";

/// Signature of an LZFu-compressed body
const COMPRESSED_SIGNATURE: &[u8; 4] = b"LZFu";

/// Signature of a stored (uncompressed) body
const UNCOMPRESSED_SIGNATURE: &[u8; 4] = b"MELA";

const HEADER_SIZE: usize = 16;

/// The `compressed_size` field counts everything after itself
const SIZE_FIELD_LEN: usize = 4;

/// Dictionary contents before the first byte is decoded
const INIT_DICT: &[u8] = b"{\\rtf1\\ansi\\mac\\deff0\\deftab720{\\fonttbl;}\
{\\f0\\fnil \\froman \\fswiss \\fmodern \\fscript \\fdecor MS Sans SerifSymbolArial\
Times New RomanCourier{\\colortbl\\red0\\green0\\blue0\r\n\\par \\pard\\plain\\f0\\fs20\
\\b\\i\\u\\tab\\tx";

const DICT_SIZE: usize = 4096;

/// Upper bound on output bytes per input byte: a control byte and eight
/// references of two bytes each expand to at most 8 * 17 bytes.
const MAX_EXPANSION: usize = 8;

/// Reference lengths are stored minus this
const MIN_REFERENCE_LEN: usize = 2;

/// Header in front of every compressed RTF body, all fields little-endian.
#[repr(C)]
#[derive(Debug, Clone, Copy, DeriveFromBytes, Immutable, KnownLayout)]
struct CompressedRtfHeader {
    compressed_size: [u8; 4],
    raw_size: [u8; 4],
    compression_type: [u8; 4],
    crc32: [u8; 4],
}

impl CompressedRtfHeader {
    #[inline]
    fn compressed_size(&self) -> usize {
        u32::from_le_bytes(self.compressed_size) as usize
    }

    #[inline]
    fn raw_size(&self) -> usize {
        u32::from_le_bytes(self.raw_size) as usize
    }

    #[inline]
    fn crc32(&self) -> u32 {
        u32::from_le_bytes(self.crc32)
    }
}

/// Whether `data` starts with a compressed RTF header.
pub fn is_compressed_rtf(data: &[u8]) -> bool {
    if data.len() < HEADER_SIZE {
        return false;
    }
    let signature = &data[8..12];
    signature == COMPRESSED_SIGNATURE || signature == UNCOMPRESSED_SIGNATURE
}

/// Decompress a compressed RTF body, header included.
pub fn decompress(data: &[u8]) -> RtfResult<Vec<u8>> {
    let (header, body) = CompressedRtfHeader::read_from_prefix(data)
        .map_err(|_| RtfError::Compressed("header must be at least 16 bytes".to_string()))?;

    let declared = header
        .compressed_size()
        .checked_sub(HEADER_SIZE - SIZE_FIELD_LEN)
        .ok_or_else(|| RtfError::Compressed(format!("compressed size {} is too small", header.compressed_size())))?;
    if declared > body.len() {
        log::warn!(
            target: TARGET,
            "Compressed RTF declares {} bytes but only {} are present",
            declared,
            body.len()
        );
    }
    let body = &body[..declared.min(body.len())];

    match &header.compression_type {
        COMPRESSED_SIGNATURE => {
            let crc = checksum(body);
            if crc != header.crc32() {
                return Err(RtfError::Compressed(format!(
                    "CRC mismatch: header has {:#010x}, data has {:#010x}",
                    header.crc32(),
                    crc
                )));
            }
            decompress_lzfu(body, header.raw_size())
        },
        UNCOMPRESSED_SIGNATURE => {
            let size = header.raw_size().min(body.len());
            Ok(body[..size].to_vec())
        },
        other => Err(RtfError::Compressed(format!(
            "unknown compression type {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// CRC-32 as MS-OXRTFCP defines it: the reflected 0xEDB88320 polynomial
/// with a zero initial value and no final xor.
///
/// The standard CRC-32 differs only in its initial value and final xor,
/// both affine, so the CRC of an equally long run of zeros cancels them.
fn checksum(data: &[u8]) -> u32 {
    let standard = crc_fast::checksum(crc_fast::CrcAlgorithm::Crc32IsoHdlc, data) as u32;
    let zeros = crc_fast::checksum(crc_fast::CrcAlgorithm::Crc32IsoHdlc, &vec![0u8; data.len()]) as u32;
    standard ^ zeros
}

/// Initial output allocation; the header's raw size is not trusted beyond
/// what the body could expand to.
fn output_capacity(raw_size: usize, body_len: usize) -> usize {
    raw_size.min(body_len.saturating_mul(MAX_EXPANSION))
}

fn decompress_lzfu(body: &[u8], raw_size: usize) -> RtfResult<Vec<u8>> {
    let mut dict = [b' '; DICT_SIZE];
    dict[..INIT_DICT.len()].copy_from_slice(INIT_DICT);
    let mut write_offset = INIT_DICT.len();

    let mut output = Vec::with_capacity(output_capacity(raw_size, body.len()));
    let mut input = body.iter().copied();

    while let Some(control) = input.next() {
        for bit in 0..8 {
            if control & (1 << bit) == 0 {
                let Some(literal) = input.next() else {
                    break;
                };
                output.push(literal);
                dict[write_offset] = literal;
                write_offset = (write_offset + 1) % DICT_SIZE;
                continue;
            }

            let (Some(high), Some(low)) = (input.next(), input.next()) else {
                return Err(RtfError::Compressed("truncated dictionary reference".to_string()));
            };
            let reference = u16::from_be_bytes([high, low]);
            let offset = usize::from(reference >> 4);
            let length = usize::from(reference & 0x0F) + MIN_REFERENCE_LEN;

            // A reference to the write position ends the stream
            if offset == write_offset {
                return Ok(output);
            }

            for step in 0..length {
                let byte = dict[(offset + step) % DICT_SIZE];
                output.push(byte);
                dict[write_offset] = byte;
                write_offset = (write_offset + 1) % DICT_SIZE;
            }
        }
    }

    Err(RtfError::Compressed("missing end-of-stream reference".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `{\rtf1\ansi\ansicpg1252\pard hello world}\r\n`, compressed.
    const HELLO_WORLD: [u8; 49] = [
        0x2d, 0x00, 0x00, 0x00, 0x2b, 0x00, 0x00, 0x00, 0x4c, 0x5a, 0x46, 0x75, 0xf1, 0xc5, 0xc7, 0xa7, 0x03, 0x00,
        0x0a, 0x00, 0x72, 0x63, 0x70, 0x67, 0x31, 0x32, 0x35, 0x42, 0x32, 0x0a, 0xf3, 0x20, 0x68, 0x65, 0x6c, 0x09,
        0x00, 0x20, 0x62, 0x77, 0x05, 0xb0, 0x6c, 0x64, 0x7d, 0x0a, 0x80, 0x0f, 0xa0,
    ];

    #[test]
    fn test_init_dict_size() {
        assert_eq!(INIT_DICT.len(), 207);
    }

    #[test]
    fn test_decompress_lzfu() {
        assert!(is_compressed_rtf(&HELLO_WORLD));
        let raw = decompress(&HELLO_WORLD).unwrap();
        assert_eq!(raw, b"{\\rtf1\\ansi\\ansicpg1252\\pard hello world}\r\n");
    }

    #[test]
    fn test_oversized_raw_size() {
        let mut inflated = HELLO_WORLD;
        inflated[4..8].copy_from_slice(&u32::MAX.to_le_bytes());
        let raw = decompress(&inflated).unwrap();
        assert_eq!(raw, b"{\\rtf1\\ansi\\ansicpg1252\\pard hello world}\r\n");

        assert_eq!(output_capacity(u32::MAX as usize, 12), 12 * MAX_EXPANSION);
        assert_eq!(output_capacity(43, 33), 43);
    }

    #[test]
    fn test_crc_mismatch() {
        let mut corrupt = HELLO_WORLD;
        corrupt[20] ^= 0xFF;
        assert!(matches!(decompress(&corrupt), Err(RtfError::Compressed(_))));
    }

    #[test]
    fn test_stored_body() {
        let body = b"{\\rtf1\\ansi x}";
        let mut data = Vec::new();
        data.extend_from_slice(&((body.len() + 12) as u32).to_le_bytes());
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend_from_slice(UNCOMPRESSED_SIGNATURE);
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(body);

        assert!(is_compressed_rtf(&data));
        assert_eq!(decompress(&data).unwrap(), body);
    }

    #[test]
    fn test_not_compressed() {
        assert!(!is_compressed_rtf(b"{\\rtf1\\ansi\\fromhtml1 x}"));
        assert!(!is_compressed_rtf(b"\0\0\0\0\0\0\0\0LZFu"));
        assert!(matches!(decompress(b"short"), Err(RtfError::Compressed(_))));
    }

    #[test]
    fn test_truncated_stream() {
        let truncated = &HELLO_WORLD[..40];
        assert!(decompress(truncated).is_err());
    }
}
