//! De-encapsulation pipeline.
//!
//! [`DeEncapsulator`] runs every stage in order and also exposes each one
//! so callers can look at intermediate results:
//!
//! 1. [`prepare`](DeEncapsulator::prepare): reject containers, decompress,
//!    strip trailing NULs
//! 2. [`strip_binary_objects`](DeEncapsulator::strip_binary_objects): cut
//!    `\binN` payloads, fold newlines in what remains
//! 3. [`encode_escaped_control_chars`](DeEncapsulator::encode_escaped_control_chars)
//! 4. [`parse`](DeEncapsulator::parse)
//! 5. [`validate_encapsulation`](DeEncapsulator::validate_encapsulation)
//! 6. [`decode_text`](DeEncapsulator::decode_text)
//! 7. [`strip_htmlrtf`](DeEncapsulator::strip_htmlrtf)
//! 8. [`clean`](DeEncapsulator::clean)
//! 9. [`flatten`](DeEncapsulator::flatten)

use super::binary::{self, BinarySplice, StrippedBinary};
use super::clean::{clean_structure, strip_non_visible_groups};
use super::compressed::{decompress, is_compressed_rtf};
use super::error::{RtfError, RtfResult};
use super::escape::{self, fold_newlines, strip_trailing_nuls};
use super::flatten;
use super::header::{self, ContentType, Header};
use super::htmlrtf::{delete_tokens, stripped_htmlrtf_ids};
use super::lexer::CharacterSet;
use super::parser::{RtfTreeBuilder, TreeBuilder};
use super::text::TextDecoder;
use super::tree::{ParseTree, Token};
use crate::common::encoding::{CodecResolver, WindowsCodepages};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

const TARGET: &str = "rtfdecap::transform";

/// Magic number of an OLE compound file (a whole .msg, not an RTF body)
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Options for de-encapsulation.
///
/// # Examples
///
/// ```rust
/// use rtfdecap::rtf::DecodeOptions;
///
/// let options = DecodeOptions::new()
///     .with_ascii_alternatives(true)
///     .with_initial_unicode_byte_count(Some(0));
/// assert!(!options.fallback_to_default_charset);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Treat a stream without a charset control word as `\ansi`.
    /// Not recommended for untrusted input.
    pub fallback_to_default_charset: bool,
    /// Use the ASCII fallback text of a `\uN` escape that cannot be decoded
    /// instead of failing
    pub use_ascii_alternatives_on_unicode_decode_failure: bool,
    /// Keep `\fN` control words in the tree
    pub keep_font_definitions: bool,
    /// `\ucN` value in effect before the document sets one
    pub initial_unicode_byte_count: Option<u32>,
    /// Decompress compressed RTF bodies before decoding
    pub decompress: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            fallback_to_default_charset: false,
            use_ascii_alternatives_on_unicode_decode_failure: false,
            keep_font_definitions: false,
            initial_unicode_byte_count: None,
            decompress: true,
        }
    }
}

impl DecodeOptions {
    /// Options with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether a missing charset falls back to `\ansi`.
    #[inline]
    pub fn with_fallback_to_default_charset(mut self, enabled: bool) -> Self {
        self.fallback_to_default_charset = enabled;
        self
    }

    /// Set whether undecodable `\uN` values use their ASCII fallback.
    #[inline]
    pub fn with_ascii_alternatives(mut self, enabled: bool) -> Self {
        self.use_ascii_alternatives_on_unicode_decode_failure = enabled;
        self
    }

    /// Set whether `\fN` control words stay in the tree.
    #[inline]
    pub fn with_keep_font_definitions(mut self, keep: bool) -> Self {
        self.keep_font_definitions = keep;
        self
    }

    /// Set the `\ucN` value in effect before the document sets one.
    ///
    /// Only useful for body fragments without the usual header.
    #[inline]
    pub fn with_initial_unicode_byte_count(mut self, count: Option<u32>) -> Self {
        self.initial_unicode_byte_count = count;
        self
    }

    /// Set whether compressed RTF bodies are decompressed first.
    #[inline]
    pub fn with_decompress(mut self, enabled: bool) -> Self {
        self.decompress = enabled;
        self
    }
}

/// De-encapsulated content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encapsulated {
    /// Whether `content` is HTML or plain text
    pub content_type: ContentType,
    /// The original HTML or text, in the encoding it was encapsulated from
    pub content: Vec<u8>,
    /// Binary objects cut out of the stream, in source order
    pub binaries: Vec<BinarySplice>,
}

impl Encapsulated {
    /// The content, if it is HTML.
    pub fn html(&self) -> Option<&[u8]> {
        (self.content_type == ContentType::Html).then_some(self.content.as_slice())
    }

    /// The content, if it is plain text.
    pub fn text(&self) -> Option<&[u8]> {
        (self.content_type == ContentType::Text).then_some(self.content.as_slice())
    }

    /// Take the content bytes.
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
}

/// De-encapsulate HTML or text from an RTF body with default options.
///
/// # Examples
///
/// ```rust
/// use rtfdecap::rtf::deencapsulate;
///
/// let rtf = br"{\rtf1\ansi\fromhtml1{\fonttbl{\f0 Arial;}}{\*\htmltag64 <p>}hi{\*\htmltag72 </p>}}";
/// let result = deencapsulate(rtf)?;
/// assert_eq!(result.html(), Some(&b"<p>hi</p>"[..]));
/// # Ok::<(), rtfdecap::rtf::RtfError>(())
/// ```
pub fn deencapsulate(raw: &[u8]) -> RtfResult<Encapsulated> {
    DeEncapsulator::new().deencapsulate(raw)
}

/// The de-encapsulation pipeline.
///
/// Codepage lookup and tree building are pluggable through
/// [`CodecResolver`] and [`TreeBuilder`].
#[derive(Debug, Clone, Default)]
pub struct DeEncapsulator<R: CodecResolver = WindowsCodepages, B: TreeBuilder = RtfTreeBuilder> {
    options: DecodeOptions,
    resolver: R,
    builder: B,
}

impl DeEncapsulator {
    /// Pipeline with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipeline with the given options.
    pub fn with_options(options: DecodeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

impl<R: CodecResolver, B: TreeBuilder> DeEncapsulator<R, B> {
    /// Replace the codepage resolver.
    pub fn with_resolver<R2: CodecResolver>(self, resolver: R2) -> DeEncapsulator<R2, B> {
        DeEncapsulator {
            options: self.options,
            resolver,
            builder: self.builder,
        }
    }

    /// Replace the tree builder.
    pub fn with_builder<B2: TreeBuilder>(self, builder: B2) -> DeEncapsulator<R, B2> {
        DeEncapsulator {
            options: self.options,
            resolver: self.resolver,
            builder,
        }
    }

    /// Options in use.
    #[inline]
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Run the whole pipeline.
    pub fn deencapsulate(&self, raw: &[u8]) -> RtfResult<Encapsulated> {
        let prepared = self.prepare(raw)?;
        let StrippedBinary { rtf, binaries } = self.strip_binary_objects(&prepared);
        let escaped = self.encode_escaped_control_chars(&rtf);

        let mut tree = self.parse(&escaped)?;
        let header = self.validate_encapsulation(&tree)?;
        log::debug!(
            target: TARGET,
            "Encapsulated {} content, charset {:?}, ansi codepage {:?}",
            header.content_type,
            header.charset,
            header.ansi_codepage
        );

        self.decode_text(&mut tree)?;
        trace_tree("text decoding", &tree);
        self.strip_htmlrtf(&mut tree)?;
        trace_tree("htmlrtf stripping", &tree);
        self.clean(&mut tree)?;
        trace_tree("cleaning", &tree);

        Ok(Encapsulated {
            content_type: header.content_type,
            content: self.flatten(&tree)?,
            binaries,
        })
    }

    /// Check the input: reject OLE containers and empty input, decompress
    /// compressed bodies and strip trailing NULs. Newlines are left alone
    /// until the binary payloads are out.
    pub fn prepare<'a>(&self, raw: &'a [u8]) -> RtfResult<Cow<'a, [u8]>> {
        if raw.starts_with(&OLE_MAGIC) {
            return Err(RtfError::Usage(
                "Data passed is a full MSG object. Extract the encapsulated RTF body first.".to_string(),
            ));
        }
        if raw.is_empty() {
            return Err(RtfError::MalformedRtf(
                "Data passed as raw RTF is empty.".to_string(),
            ));
        }

        if self.options.decompress && is_compressed_rtf(raw) {
            log::debug!(target: TARGET, "Decompressing compressed RTF body of {} bytes", raw.len());
            let decompressed = decompress(raw)?;
            return Ok(Cow::Owned(strip_trailing_nuls(&decompressed).to_vec()));
        }

        Ok(Cow::Borrowed(strip_trailing_nuls(raw)))
    }

    /// Cut every `\binN` payload out of the stream, then fold `\r\n` and
    /// `\r` to `\n` in the remaining RTF. Splice offsets refer to `rtf`.
    pub fn strip_binary_objects(&self, rtf: &[u8]) -> StrippedBinary {
        let StrippedBinary { rtf, binaries } = binary::strip_binary_objects(rtf);
        if !binaries.is_empty() {
            log::info!(
                target: TARGET,
                "Binary data found and extracted from rtf file ({} objects).",
                binaries.len()
            );
        }
        let rtf = match fold_newlines(&rtf) {
            Cow::Borrowed(_) => rtf,
            Cow::Owned(folded) => folded,
        };
        StrippedBinary { rtf, binaries }
    }

    /// Rewrite `\\`, `\{` and `\}` as hex escapes.
    pub fn encode_escaped_control_chars(&self, rtf: &[u8]) -> Vec<u8> {
        escape::encode_escaped_control_chars(rtf)
    }

    /// Build the parse tree. Input the builder rejects is reported as
    /// malformed encapsulated RTF.
    pub fn parse(&self, normalized: &[u8]) -> RtfResult<ParseTree> {
        let tree = self.builder.build(normalized).map_err(|err| match err {
            RtfError::Parse { position, message } => RtfError::MalformedEncapsulatedRtf(format!(
                "Malformed encapsulated RTF discovered at byte {}: {}",
                position, message
            )),
            other => other,
        })?;
        trace_tree("parsing", &tree);
        Ok(tree)
    }

    /// Check the header and find the content type.
    pub fn validate_encapsulation(&self, tree: &ParseTree) -> RtfResult<Header> {
        header::validate_encapsulation(tree.document()?, self.options.fallback_to_default_charset)
    }

    /// Leaves of the document header, up to the first group.
    pub fn header_control_words<'t>(&self, tree: &'t ParseTree) -> RtfResult<Vec<&'t Token>> {
        Ok(header::header_control_words(tree.document()?).collect())
    }

    /// The declared charset, honoring the default-charset fallback option.
    pub fn charset(&self, tree: &ParseTree) -> RtfResult<CharacterSet> {
        header::validate_charset(tree.document()?, self.options.fallback_to_default_charset)
    }

    /// The `\ansicpgN` codepage, if any.
    pub fn ansi_codepage(&self, tree: &ParseTree) -> RtfResult<Option<u32>> {
        header::ansi_codepage(tree.document()?)
    }

    /// The encapsulated content type.
    pub fn content_type(&self, tree: &ParseTree) -> RtfResult<ContentType> {
        header::validate_from_header(tree.document()?)
    }

    /// Decode `\uN` and `\'XX` escapes into text.
    pub fn decode_text(&self, tree: &mut ParseTree) -> RtfResult<()> {
        TextDecoder::with_resolver(&self.resolver)
            .with_keep_font_definitions(self.options.keep_font_definitions)
            .with_ascii_alternatives(self.options.use_ascii_alternatives_on_unicode_decode_failure)
            .with_initial_unicode_byte_count(self.options.initial_unicode_byte_count)
            .decode_tree(tree)
    }

    /// Delete everything inside `\htmlrtf` regions.
    pub fn strip_htmlrtf(&self, tree: &mut ParseTree) -> RtfResult<()> {
        let ids = stripped_htmlrtf_ids(tree.document()?, tree.node_count());
        log::debug!(target: TARGET, "Stripping {} leaves inside \\htmlrtf regions", ids.count_ones(..));
        delete_tokens(tree.document_mut()?, &ids);
        Ok(())
    }

    /// Drop grammar leaves and non-visible groups.
    pub fn clean(&self, tree: &mut ParseTree) -> RtfResult<()> {
        let document = tree.document_mut()?;
        clean_structure(document);
        strip_non_visible_groups(document);
        Ok(())
    }

    /// Fold the cleaned document into output bytes.
    pub fn flatten(&self, tree: &ParseTree) -> RtfResult<Vec<u8>> {
        Ok(flatten::flatten(tree.document()?))
    }
}

fn trace_tree(stage: &str, tree: &ParseTree) {
    if log::log_enabled!(target: TARGET, log::Level::Trace) {
        log::trace!(
            target: TARGET,
            "Tree after {}: {}",
            stage,
            String::from_utf8_lossy(&tree.to_rtf_bytes())
        );
    }
}
