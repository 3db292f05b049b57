//! Error types for RTF de-encapsulation.
//!
//! Every failure is fatal to the document being processed. The variants are
//! split so callers can tell "this is not encapsulated content" (skip it)
//! apart from "this is broken RTF or broken encapsulation" (flag it).

use thiserror::Error;

/// Result type for RTF operations.
pub type RtfResult<T> = Result<T, RtfError>;

/// De-encapsulation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RtfError {
    /// The caller passed something that is not an extracted RTF body
    #[error("Usage error: {0}")]
    Usage(String),

    /// Base RTF structure is broken (magic, charset, codepage)
    #[error("Malformed RTF: {0}")]
    MalformedRtf(String),

    /// The document intends to carry encapsulated content but breaks the
    /// placement rules for it
    #[error("Malformed encapsulated RTF: {0}")]
    MalformedEncapsulatedRtf(String),

    /// No FROMHTML/FROMTEXT header was found where one must be
    #[error("Not encapsulated RTF: {0}")]
    NotEncapsulatedRtf(String),

    /// The document has no `\fonttbl` group
    #[error("No font table found in document")]
    MissingFontTable,

    /// Unicode or codepage text decoding failed
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Tree builder failure
    #[error("RTF parse error at byte {position}: {message}")]
    Parse {
        /// Offset into the normalized input
        position: usize,
        /// What went wrong
        message: String,
    },

    /// Compressed RTF body could not be decompressed
    #[error("Compressed RTF error: {0}")]
    Compressed(String),
}

impl RtfError {
    /// Whether the input simply carries no encapsulated body.
    #[inline]
    pub fn is_not_encapsulated(&self) -> bool {
        matches!(self, RtfError::NotEncapsulatedRtf(_))
    }

    /// Whether the input is broken RTF or broken encapsulation.
    #[inline]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            RtfError::MalformedRtf(_)
                | RtfError::MalformedEncapsulatedRtf(_)
                | RtfError::MissingFontTable
                | RtfError::Parse { .. }
        )
    }

    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        RtfError::Parse {
            position,
            message: message.into(),
        }
    }
}

/// Text decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// `\uN` whose parameter is not a number
    #[error("`{0}` is not a valid escaped unicode character")]
    InvalidUnicodeEscape(String),

    /// High surrogate without a following low surrogate
    #[error("Standalone high-surrogate {high:#06x} found (next unicode value: {next:?})")]
    StandaloneSurrogate {
        /// The dangling high surrogate
        high: u32,
        /// The code unit that followed it, if any
        next: Option<u32>,
    },

    /// Value that is not a Unicode scalar (e.g. a lone low surrogate)
    #[error("{0:#06x} is not a unicode scalar value")]
    InvalidScalar(u32),

    /// A font selected a codepage the codec backend cannot decode
    #[error("Unsupported codepage {0}")]
    UnsupportedCodepage(u32),

    /// Hex-encoded bytes are not valid in the selected codepage
    #[error("Bytes are not valid {encoding} text (codepage {codepage:?})")]
    MalformedBytes {
        /// Codepage selected by the current font, if any
        codepage: Option<u32>,
        /// Name of the encoding that rejected the bytes
        encoding: &'static str,
    },
}
