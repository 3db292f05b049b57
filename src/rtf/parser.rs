//! RTF parser that builds the parse tree from lexemes.

use super::error::{RtfError, RtfResult};
use super::lexer::{Lexeme, Lexer};
use super::tree::{Group, GroupKind, Node, NodeId, ParseTree, Token, TokenKind};
use std::iter::Peekable;

/// Groups nested deeper than this are rejected
const MAX_DEPTH: usize = 1000;

/// Turns normalized RTF bytes into a [`ParseTree`].
///
/// The pipeline only depends on the tree shape, so a different grammar can
/// be plugged in through this trait.
pub trait TreeBuilder {
    /// Build a tree. Leaf ids must be assigned in source order.
    fn build(&self, normalized: &[u8]) -> RtfResult<ParseTree>;
}

/// Default tree builder: [`Lexer`] followed by [`Parser`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RtfTreeBuilder;

impl TreeBuilder for RtfTreeBuilder {
    fn build(&self, normalized: &[u8]) -> RtfResult<ParseTree> {
        let lexemes = Lexer::new(normalized).tokenize()?;
        Parser::new(lexemes).parse()
    }
}

/// A group still being filled.
struct Frame {
    kind: GroupKind,
    children: Vec<Node>,
    /// Offset of the brace that opened it
    opened_at: usize,
}

/// RTF Parser.
pub struct Parser<'a> {
    /// Lexeme stream
    lexemes: Peekable<std::vec::IntoIter<Lexeme<'a>>>,
    /// Next leaf id
    next_id: u32,
    /// Open groups, innermost last
    stack: Vec<Frame>,
}

impl<'a> Parser<'a> {
    /// Create a new parser.
    pub fn new(lexemes: Vec<Lexeme<'a>>) -> Self {
        Self {
            lexemes: lexemes.into_iter().peekable(),
            next_id: 0,
            stack: Vec::new(),
        }
    }

    /// Parse the lexeme stream into a tree.
    pub fn parse(mut self) -> RtfResult<ParseTree> {
        // Whitespace may surround the outer group
        while self
            .lexemes
            .next_if(|l| l.kind == TokenKind::SpaceSave)
            .is_some()
        {}

        let open = match self.lexemes.next() {
            Some(lexeme) if lexeme.kind == TokenKind::OpenBrace => lexeme,
            Some(lexeme) => {
                return Err(RtfError::parse(lexeme.span.start, "Document must start with {"));
            },
            None => return Err(RtfError::parse(0, "Empty token stream")),
        };
        let opened_at = open.span.start;
        let open = self.leaf(open);

        self.stack.push(Frame {
            kind: GroupKind::Document,
            children: Vec::new(),
            opened_at,
        });

        while let Some(lexeme) = self.lexemes.next() {
            match lexeme.kind {
                TokenKind::OpenBrace => self.open_group(lexeme)?,
                TokenKind::CloseBrace => {
                    if let Some(root) = self.close_group(lexeme, &open)? {
                        self.expect_end()?;
                        return Ok(ParseTree::new(root, self.next_id as usize));
                    }
                },
                TokenKind::HexEncoded => {
                    let token = self.leaf(lexeme);
                    let children = self.current_children()?;
                    match children.last_mut() {
                        Some(Node::Group(group)) if group.kind == GroupKind::HexArray => {
                            group.children.push(Node::Token(token));
                        },
                        _ => children.push(Node::Group(Group::new(
                            GroupKind::HexArray,
                            vec![Node::Token(token)],
                        ))),
                    }
                },
                _ => {
                    let token = self.leaf(lexeme);
                    self.current_children()?.push(Node::Token(token));
                },
            }
        }

        let position = self.stack.last().map_or(opened_at, |frame| frame.opened_at);
        Err(RtfError::parse(
            position,
            format!("Unbalanced braces: {} group(s) left open", self.stack.len()),
        ))
    }

    /// Open a nested group, recognizing `{\*\htmltagN` and `{\*\mhtmltagN`.
    fn open_group(&mut self, open: Lexeme<'a>) -> RtfResult<()> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(RtfError::parse(
                open.span.start,
                format!("Group nesting exceeds maximum depth of {}", MAX_DEPTH),
            ));
        }

        let opened_at = open.span.start;
        let brace = self.leaf(open);
        self.stack.push(Frame {
            kind: GroupKind::Group,
            children: vec![Node::Token(brace)],
            opened_at,
        });

        let Some(star) = self
            .lexemes
            .next_if(|l| l.kind == TokenKind::StarEscape)
        else {
            return Ok(());
        };

        let destination = match self.lexemes.peek().map(|l| l.kind) {
            Some(TokenKind::HtmlTag) => Some(GroupKind::HtmlTag),
            Some(TokenKind::MHtmlTag) => Some(GroupKind::MHtmlTag),
            _ => None,
        };

        let star = self.leaf(star);
        match (destination, self.lexemes.next_if(|_| destination.is_some())) {
            (Some(kind), Some(tag)) => {
                let tag = self.leaf(tag);
                self.stack.push(Frame {
                    kind,
                    children: vec![Node::Token(star), Node::Token(tag)],
                    opened_at,
                });
            },
            _ => self.current_children()?.push(Node::Token(star)),
        }
        Ok(())
    }

    /// Close the innermost group. Returns the finished root when the
    /// document group closes.
    fn close_group(&mut self, close: Lexeme<'a>, open: &Token) -> RtfResult<Option<Group>> {
        let position = close.span.start;
        let close = self.leaf(close);

        let mut frame = self
            .stack
            .pop()
            .ok_or_else(|| RtfError::parse(position, "Unexpected closing brace"))?;

        // A destination group ends with its enclosing group
        if matches!(frame.kind, GroupKind::HtmlTag | GroupKind::MHtmlTag) {
            let destination = Group::new(frame.kind, frame.children);
            frame = self
                .stack
                .pop()
                .ok_or_else(|| RtfError::parse(position, "Unexpected closing brace"))?;
            frame.children.push(Node::Group(destination));
        }

        if frame.kind == GroupKind::Document {
            let document = Group::new(GroupKind::Document, frame.children);
            return Ok(Some(Group::new(
                GroupKind::Root,
                vec![Node::Token(open.clone()), Node::Group(document), Node::Token(close)],
            )));
        }

        frame.children.push(Node::Token(close));
        let group = Group::new(frame.kind, frame.children);
        self.current_children()?.push(Node::Group(group));
        Ok(None)
    }

    /// Only whitespace may follow the document group.
    fn expect_end(&mut self) -> RtfResult<()> {
        for lexeme in self.lexemes.by_ref() {
            let blank = matches!(lexeme.kind, TokenKind::SpaceSave | TokenKind::String)
                && lexeme.value.iter().all(u8::is_ascii_whitespace);
            if !blank {
                return Err(RtfError::parse(
                    lexeme.span.start,
                    "Unexpected content after document group",
                ));
            }
        }
        Ok(())
    }

    fn current_children(&mut self) -> RtfResult<&mut Vec<Node>> {
        self.stack
            .last_mut()
            .map(|frame| &mut frame.children)
            .ok_or_else(|| RtfError::parse(0, "No open group"))
    }

    /// Turn a lexeme into a leaf with the next id.
    #[inline]
    fn leaf(&mut self, lexeme: Lexeme<'a>) -> Token {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        Token::new(id, lexeme.kind, lexeme.value.into_owned(), lexeme.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(input: &[u8]) -> RtfResult<ParseTree> {
        RtfTreeBuilder.build(input)
    }

    #[test]
    fn test_root_shape() {
        let tree = build(br"{\rtf1\ansi {\fonttbl{\f0 Arial;}}Hi}").unwrap();
        let root = tree.root();
        assert_eq!(root.kind, GroupKind::Root);
        assert_eq!(root.children.len(), 3);
        assert!(root.children[0].is_token_kind(TokenKind::OpenBrace));
        assert!(root.children[2].is_token_kind(TokenKind::CloseBrace));

        let doc = tree.document().unwrap();
        assert_eq!(doc.children.len(), 4);
        let fonttbl = doc.children[2].as_group().unwrap();
        assert!(fonttbl.children[0].is_token_kind(TokenKind::OpenBrace));
        assert!(fonttbl.children[1].as_token().unwrap().is_control_word(b"\\fonttbl"));
        assert!(fonttbl.children.last().unwrap().is_token_kind(TokenKind::CloseBrace));

        assert_eq!(tree.to_rtf_bytes(), br"{\rtf1\ansi {\fonttbl{\f0 Arial;}}Hi}");
    }

    #[test]
    fn test_ids_in_source_order() {
        let tree = build(br"{\rtf1{a}\'41\'42 b}").unwrap();
        let ids: Vec<usize> = tree.leaves().map(|t| t.id.index()).collect();
        assert_eq!(ids, (0..tree.node_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_hex_array() {
        let tree = build(b"{\\rtf1 \\'a4\\'a4\n\\'a4 x\\'41}").unwrap();
        let doc = tree.document().unwrap();
        let arrays: Vec<usize> = doc
            .children
            .iter()
            .filter_map(Node::as_group)
            .filter(|g| g.kind == GroupKind::HexArray)
            .map(|g| g.children.len())
            .collect();
        assert_eq!(arrays, vec![3, 1]);
    }

    #[test]
    fn test_htmltag_destination() {
        let tree = build(br"{\rtf1{\*\htmltag64 <p>}{\*\mhtmltag4 x}{\*\bkmkstart a}}").unwrap();
        let doc = tree.document().unwrap();

        let html = doc.children[1].as_group().unwrap();
        assert_eq!(html.children.len(), 3);
        let dest = html.children[1].as_group().unwrap();
        assert_eq!(dest.kind, GroupKind::HtmlTag);
        assert!(dest.children[0].is_token_kind(TokenKind::StarEscape));
        assert!(dest.children[1].is_token_kind(TokenKind::HtmlTag));
        assert_eq!(dest.children[2].as_token().unwrap().value, b"<p>");

        let mhtml = doc.children[2].as_group().unwrap();
        assert!(mhtml.children[1].is_group_kind(GroupKind::MHtmlTag));

        let star = doc.children[3].as_group().unwrap();
        assert!(star.children[1].is_token_kind(TokenKind::StarEscape));
        assert!(star.children[2].as_token().unwrap().is_control_word(b"\\bkmkstart"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(build(b"").is_err());
        assert!(build(br"\rtf1").is_err());
        assert!(build(br"{\rtf1{").is_err());
        assert!(build(br"{\rtf1}}").is_err());
        assert!(build(br"{\rtf1} trailing").is_err());
        assert!(build(b"{\\rtf1}\n  ").is_ok());
    }

    #[test]
    fn test_depth_limit() {
        let mut input = b"{\\rtf1".to_vec();
        input.extend(std::iter::repeat_n(b'{', MAX_DEPTH + 1));
        input.extend(std::iter::repeat_n(b'}', MAX_DEPTH + 2));
        assert!(matches!(build(&input), Err(RtfError::Parse { .. })));
    }
}
