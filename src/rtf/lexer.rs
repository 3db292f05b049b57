//! RTF lexer/tokenizer.
//!
//! Byte-oriented lexer over normalized RTF (escaped delimiters already
//! rewritten to hex escapes). It classifies every lexeme into a
//! [`TokenKind`] and records its span; the parser turns the lexemes into a
//! tree.

use super::error::{RtfError, RtfResult};
use super::tree::{Span, TokenKind};
use smallvec::SmallVec;
use std::borrow::Cow;

/// Longest control word name; further letters are text
const MAX_CONTROL_WORD_LEN: usize = 32;

/// A classified slice of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<'a> {
    /// Leaf kind (braces included)
    pub kind: TokenKind,
    /// Token bytes; owned only when newlines were dropped from a text run
    pub value: Cow<'a, [u8]>,
    /// Source position
    pub span: Span,
}

/// Character set declared in the RTF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum CharacterSet {
    /// ANSI (Windows-1252 / CP1252)
    #[default]
    Ansi,
    /// Mac (Mac Roman)
    Mac,
    /// PC (DOS / CP437)
    Pc,
    /// PC (DOS / CP850)
    Pca,
}

impl CharacterSet {
    /// Parse a charset control word (`\ansi`, `\mac`, `\pc`, `\pca`).
    pub fn from_control_word(word: &[u8]) -> Option<Self> {
        match word {
            b"\\ansi" => Some(CharacterSet::Ansi),
            b"\\mac" => Some(CharacterSet::Mac),
            b"\\pc" => Some(CharacterSet::Pc),
            b"\\pca" => Some(CharacterSet::Pca),
            _ => None,
        }
    }

    /// The control word naming this charset.
    pub fn control_word(self) -> &'static str {
        match self {
            CharacterSet::Ansi => "\\ansi",
            CharacterSet::Mac => "\\mac",
            CharacterSet::Pc => "\\pc",
            CharacterSet::Pca => "\\pca",
        }
    }
}

/// RTF lexer.
pub struct Lexer<'a> {
    /// Source input
    input: &'a [u8],
    /// Current position in bytes
    pos: usize,
    /// 1-based line at `pos`
    line: u32,
    /// 1-based column at `pos`
    column: u32,
    /// The previous lexeme was `\uN`, so a single following space is its delimiter
    after_unicode: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
            after_unicode: false,
        }
    }

    /// Tokenize the entire input.
    pub fn tokenize(&mut self) -> RtfResult<Vec<Lexeme<'a>>> {
        let mut lexemes = Vec::with_capacity(self.input.len() / 4);

        while let Some(lexeme) = self.next_token()? {
            lexemes.push(lexeme);
        }

        Ok(lexemes)
    }

    /// Get the next lexeme, or `None` at end of input.
    pub fn next_token(&mut self) -> RtfResult<Option<Lexeme<'a>>> {
        let after_unicode = std::mem::take(&mut self.after_unicode);
        self.skip_newlines();

        let Some(&byte) = self.input.get(self.pos) else {
            return Ok(None);
        };

        let start = self.mark();
        let lexeme = match byte {
            b'{' => {
                self.advance();
                self.lexeme(start, TokenKind::OpenBrace)
            },
            b'}' => {
                self.advance();
                self.lexeme(start, TokenKind::CloseBrace)
            },
            b' ' if after_unicode => {
                self.advance();
                self.lexeme(start, TokenKind::SpaceDelete)
            },
            b'\\' => self.parse_control(start)?,
            _ => self.parse_text(start),
        };
        Ok(Some(lexeme))
    }

    /// Parse a control word or control symbol.
    fn parse_control(&mut self, start: Mark) -> RtfResult<Lexeme<'a>> {
        self.advance(); // Skip '\'

        let Some(&ch) = self.input.get(self.pos) else {
            return Err(RtfError::parse(start.pos, "Unexpected end of input after backslash"));
        };

        let kind = match ch {
            b'\'' => return self.parse_hex_char(start),
            b'*' => TokenKind::StarEscape,
            b'~' => TokenKind::NonBreakingSpace,
            b'_' => TokenKind::NonBreakingHyphen,
            b'-' => TokenKind::OptionalHyphen,
            b'|' => TokenKind::FormulaCharacter,
            b':' => TokenKind::IndexSubentry,
            b'\n' | b'\r' => {
                // A backslash ending a line is a paragraph mark
                self.advance();
                let mut lexeme = self.lexeme(start, TokenKind::ControlWord);
                lexeme.value = Cow::Borrowed(b"\\par");
                return Ok(lexeme);
            },
            c if c.is_ascii_alphabetic() => return Ok(self.parse_control_word(start)),
            _ => TokenKind::ControlSymbol,
        };

        self.advance();
        Ok(self.lexeme(start, kind))
    }

    /// Parse `\letters[-digits][ ]`.
    fn parse_control_word(&mut self, start: Mark) -> Lexeme<'a> {
        let word_start = self.pos;
        while self.pos - word_start < MAX_CONTROL_WORD_LEN
            && self.peek().is_some_and(|b| b.is_ascii_alphabetic())
        {
            self.advance();
        }
        let word = &self.input[word_start..self.pos];

        let has_param = self.parse_numeric_parameter();

        let kind = match word {
            b"u" if has_param => TokenKind::Unicode,
            b"htmlrtf" => TokenKind::HtmlRtf,
            b"htmltag" => TokenKind::HtmlTag,
            b"mhtmltag" => TokenKind::MHtmlTag,
            _ => TokenKind::ControlWord,
        };

        if kind == TokenKind::Unicode {
            // The delimiter space becomes its own leaf
            self.after_unicode = true;
        } else if self.peek() == Some(b' ') {
            self.advance();
        }

        self.lexeme(start, kind)
    }

    /// Consume an optional signed decimal parameter. Returns whether one was present.
    fn parse_numeric_parameter(&mut self) -> bool {
        let digits_at = match self.peek() {
            Some(b'-') => self.pos + 1,
            Some(b) if b.is_ascii_digit() => self.pos,
            _ => return false,
        };
        if !self.input.get(digits_at).is_some_and(u8::is_ascii_digit) {
            // A lone '-' is not part of the control word
            return false;
        }

        while self.pos < digits_at {
            self.advance();
        }
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        true
    }

    /// Parse hexadecimal character escape (\').
    fn parse_hex_char(&mut self, start: Mark) -> RtfResult<Lexeme<'a>> {
        self.advance(); // Skip '\''

        let hex = self
            .input
            .get(self.pos..self.pos + 2)
            .ok_or_else(|| RtfError::parse(start.pos, "Incomplete hex escape"))?;
        if !hex.iter().all(u8::is_ascii_hexdigit) {
            return Err(RtfError::parse(
                start.pos,
                format!("Invalid hex escape: {}", String::from_utf8_lossy(hex)),
            ));
        }

        self.advance();
        self.advance();
        Ok(self.lexeme(start, TokenKind::HexEncoded))
    }

    /// Parse plain text until a delimiter. Newlines are dropped from the run.
    fn parse_text(&mut self, start: Mark) -> Lexeme<'a> {
        let mut text = SmallVec::<[u8; 64]>::new();
        let mut dropped_newline = false;

        while let Some(byte) = self.peek() {
            match byte {
                b'\\' | b'{' | b'}' => break,
                b'\r' | b'\n' => dropped_newline = true,
                _ => text.push(byte),
            }
            self.advance();
        }

        let kind = if text.iter().all(|&b| b == b' ') {
            TokenKind::SpaceSave
        } else {
            TokenKind::String
        };

        let mut lexeme = self.lexeme(start, kind);
        if dropped_newline {
            lexeme.value = Cow::Owned(text.into_vec());
        }
        lexeme
    }

    /// Build a lexeme spanning from `start` to the current position.
    #[inline]
    fn lexeme(&self, start: Mark, kind: TokenKind) -> Lexeme<'a> {
        Lexeme {
            kind,
            value: Cow::Borrowed(&self.input[start.pos..self.pos]),
            span: Span {
                start: start.pos,
                end: self.pos,
                line: start.line,
                column: start.column,
            },
        }
    }

    #[inline]
    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Advance position by one byte.
    #[inline]
    fn advance(&mut self) {
        if let Some(&byte) = self.input.get(self.pos) {
            self.pos += 1;
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Newlines between tokens are insignificant.
    #[inline]
    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(b'\n' | b'\r')) {
            self.advance();
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Mark {
    pos: usize,
    line: u32,
    column: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &[u8]) -> Vec<(TokenKind, Vec<u8>)> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|l| (l.kind, l.value.into_owned()))
            .collect()
    }

    #[test]
    fn test_simple_tokenization() {
        let tokens = kinds(br"{\rtf1\ansi Hello}");

        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].0, TokenKind::OpenBrace);
        assert_eq!(tokens[1], (TokenKind::ControlWord, b"\\rtf1".to_vec()));
        assert_eq!(tokens[2], (TokenKind::ControlWord, b"\\ansi ".to_vec()));
        assert_eq!(tokens[3], (TokenKind::String, b"Hello".to_vec()));
        assert_eq!(tokens[4].0, TokenKind::CloseBrace);
    }

    #[test]
    fn test_unicode_delimiter_space() {
        let tokens = kinds(br"\u8217 ?s");
        assert_eq!(tokens[0], (TokenKind::Unicode, b"\\u8217".to_vec()));
        assert_eq!(tokens[1], (TokenKind::SpaceDelete, b" ".to_vec()));
        assert_eq!(tokens[2], (TokenKind::String, b"?s".to_vec()));

        let tokens = kinds(br"\u-10179\u-8704");
        assert_eq!(tokens[0], (TokenKind::Unicode, b"\\u-10179".to_vec()));
        assert_eq!(tokens[1], (TokenKind::Unicode, b"\\u-8704".to_vec()));
    }

    #[test]
    fn test_special_words() {
        let tokens = kinds(br"\htmlrtf0 \*\htmltag84 \mhtmltag4 \uc1\u");
        assert_eq!(tokens[0], (TokenKind::HtmlRtf, b"\\htmlrtf0 ".to_vec()));
        assert_eq!(tokens[1].0, TokenKind::StarEscape);
        assert_eq!(tokens[2], (TokenKind::HtmlTag, b"\\htmltag84 ".to_vec()));
        assert_eq!(tokens[3], (TokenKind::MHtmlTag, b"\\mhtmltag4 ".to_vec()));
        assert_eq!(tokens[4], (TokenKind::ControlWord, b"\\uc1".to_vec()));
        assert_eq!(tokens[5], (TokenKind::ControlWord, b"\\u".to_vec()));
    }

    #[test]
    fn test_control_symbols() {
        let tokens = kinds(br"\~\_\-\|\:\;");
        let expected = [
            TokenKind::NonBreakingSpace,
            TokenKind::NonBreakingHyphen,
            TokenKind::OptionalHyphen,
            TokenKind::FormulaCharacter,
            TokenKind::IndexSubentry,
            TokenKind::ControlSymbol,
        ];
        assert_eq!(tokens.iter().map(|t| t.0).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_hex_and_newlines() {
        let tokens = kinds(b"\\'e9ab\ncd\n   ");
        assert_eq!(tokens[0], (TokenKind::HexEncoded, b"\\'e9".to_vec()));
        assert_eq!(tokens[1], (TokenKind::String, b"abcd   ".to_vec()));

        let tokens = kinds(b"a\\\nb");
        assert_eq!(tokens[1], (TokenKind::ControlWord, b"\\par".to_vec()));

        let tokens = kinds(b"\\par   ");
        assert_eq!(tokens[1], (TokenKind::SpaceSave, b"  ".to_vec()));
    }

    #[test]
    fn test_lone_minus_not_parameter() {
        let tokens = kinds(br"\li-x");
        assert_eq!(tokens[0], (TokenKind::ControlWord, b"\\li".to_vec()));
        assert_eq!(tokens[1], (TokenKind::String, b"-x".to_vec()));
    }

    #[test]
    fn test_control_word_length_cap() {
        let long = format!("\\{}xyz", "a".repeat(MAX_CONTROL_WORD_LEN));
        let tokens = kinds(long.as_bytes());
        assert_eq!(tokens[0].1.len(), MAX_CONTROL_WORD_LEN + 1);
        assert_eq!(tokens[1], (TokenKind::String, b"xyz".to_vec()));
    }

    #[test]
    fn test_spans() {
        let lexemes = Lexer::new(b"{\\rtf1\n\\ansi}").tokenize().unwrap();
        assert_eq!(lexemes[2].span, Span { start: 7, end: 12, line: 2, column: 1 });
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            Lexer::new(b"\\'4").tokenize(),
            Err(RtfError::Parse { position: 0, .. })
        ));
        assert!(Lexer::new(b"\\'zz").tokenize().is_err());
        assert!(Lexer::new(b"abc\\").tokenize().is_err());
    }
}
