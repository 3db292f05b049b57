//! rtfdecap - De-encapsulation of HTML and plain text from RTF
//!
//! Outlook and Exchange store HTML and plain-text message bodies wrapped
//! in RTF (MS-OXRTFEX). This library recovers the original content from
//! such an RTF body, byte for byte where the encapsulation allows it.
//!
//! # Features
//!
//! - **Header validation**: tells encapsulated RTF apart from ordinary RTF
//!   and from broken encapsulation
//! - **Text decoding**: `\uN` escapes, surrogate pairs and hex escapes in
//!   the codepage of the current font
//! - **HTMLRTF scoping**: drops the RTF-only regions the encapsulating
//!   writer added
//! - **Binary objects**: `\binN` payloads are extracted and returned
//! - **Compressed bodies**: LZFu and stored bodies are decompressed first
//!
//! # Example
//!
//! ```rust
//! use rtfdecap::rtf::deencapsulate;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rtf = br"{\rtf1\ansi\fromhtml1{\fonttbl{\f0 Arial;}}{\*\htmltag64 <b>}bold{\*\htmltag72 </b>}}";
//! let result = deencapsulate(rtf)?;
//! println!("{}", String::from_utf8_lossy(result.html().unwrap_or_default()));
//! # Ok(())
//! # }
//! ```

/// Codepage and charset tables shared by the decoder.
pub mod common;

/// RTF de-encapsulation pipeline
pub mod rtf;

pub use rtf::{DeEncapsulator, DecodeOptions, Encapsulated, RtfError, RtfResult, deencapsulate};
