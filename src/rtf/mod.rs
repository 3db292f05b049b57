//! De-encapsulation of HTML and plain text from RTF (MS-OXRTFEX).
//!
//! Mail clients store HTML and plain-text bodies wrapped in RTF, marking
//! the original content with `\fromhtml1`/`\fromtext`, `\*\htmltagN`
//! destinations and `\htmlrtf` regions. This module recovers the original
//! bytes.
//!
//! # Architecture
//!
//! - **Binary splicer**: cuts `\binN` payloads out of the raw bytes
//! - **Escape normalization**: turns `\\ \{ \}` into hex escapes
//! - **Tree builder**: [`Lexer`] and [`RtfTreeBuilder`] build a [`ParseTree`]
//! - **Header validator**: checks `\rtf1`, the charset, FROM placement and `\ansicpgN`
//! - **Text decoder**: resolves `\uN` and `\'XX` escapes through the font table
//! - **HTMLRTF stripper**, **cleaner** and **flattener** produce the output
//!
//! # Example
//!
//! ```rust
//! use rtfdecap::rtf::{ContentType, DecodeOptions, DeEncapsulator};
//!
//! let rtf = br"{\rtf1\ansi\fromtext{\fonttbl{\f0 Courier;}}Hello\par world}";
//! let result = DeEncapsulator::with_options(DecodeOptions::new()).deencapsulate(rtf)?;
//! assert_eq!(result.content_type, ContentType::Text);
//! assert_eq!(result.text(), Some(&b"Hello\nworld"[..]));
//! # Ok::<(), rtfdecap::rtf::RtfError>(())
//! ```

mod binary;
mod clean;
mod compressed;
mod deencapsulate;
mod error;
mod escape;
mod flatten;
mod fonts;
mod header;
mod htmlrtf;
mod lexer;
mod parser;
mod text;
mod tree;


// Re-exports
pub use binary::{BinarySplice, StrippedBinary, strip_binary_objects};
pub use compressed::{decompress, is_compressed_rtf};
pub use deencapsulate::{DeEncapsulator, DecodeOptions, Encapsulated, deencapsulate};
pub use error::{DecodeError, RtfError, RtfResult};
pub use escape::encode_escaped_control_chars;
pub use fonts::{FontDef, FontTable};
pub use header::{ContentType, Header};
pub use lexer::{CharacterSet, Lexeme, Lexer};
pub use parser::{RtfTreeBuilder, TreeBuilder};
pub use text::TextDecoder;
pub use tree::{Group, GroupKind, Leaves, Node, NodeId, ParseTree, Span, Token, TokenKind};
