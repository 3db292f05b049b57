//! Common types and tables shared across the crate.

pub mod encoding;
mod johab;
mod macintosh;

pub use encoding::{
    Codec, CodecResolver, WindowsCodepages, charset_to_codepage, codepage_to_codec, codepage_to_encoding,
    is_known_codepage,
};
pub use macintosh::MacCodepage;
