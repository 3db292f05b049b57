//! Parse tree produced by the tree builder and rewritten by every later stage.
//!
//! A tree is a synthetic root group holding the outer brace leaves and the
//! Document group. Every leaf carries a [`NodeId`] assigned once, in source
//! order, when the tree is built; stages that replace a leaf keep its id so
//! deletion sets computed later still address it.

use smallvec::SmallVec;
use std::slice;

use super::error::{RtfError, RtfResult};

/// Stable identity of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Index of this leaf, usable with a bitset sized by [`ParseTree::node_count`].
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source position of a leaf in the normalized input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the first byte
    pub start: usize,
    /// Byte offset one past the last byte
    pub end: usize,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

/// Leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `\wordN` including its space delimiter, if any
    ControlWord,
    /// Backslash followed by a non-letter not covered by another kind
    ControlSymbol,
    /// `\*`
    StarEscape,
    /// Literal text run
    String,
    /// Space-only text run that is content
    SpaceSave,
    /// Delimiter space with no content value
    SpaceDelete,
    /// `\htmlrtf`, `\htmlrtf1`, `\htmlrtf0`
    HtmlRtf,
    /// `\uN`
    Unicode,
    /// `\'XX`
    HexEncoded,
    /// `\htmltagN`
    HtmlTag,
    /// `\mhtmltagN`
    MHtmlTag,
    /// `\~`
    NonBreakingSpace,
    /// `\_`
    NonBreakingHyphen,
    /// `\-`
    OptionalHyphen,
    /// `\|`
    FormulaCharacter,
    /// `\:`
    IndexSubentry,
}

/// A typed leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Identity assigned by the tree builder
    pub id: NodeId,
    /// Leaf kind
    pub kind: TokenKind,
    /// Raw bytes (decoded UTF-8 once a text stage has rewritten the leaf)
    pub value: Vec<u8>,
    /// Where the leaf came from
    pub span: Span,
}

impl Token {
    /// Create a leaf.
    #[inline]
    pub fn new(id: NodeId, kind: TokenKind, value: impl Into<Vec<u8>>, span: Span) -> Self {
        Self {
            id,
            kind,
            value: value.into(),
            span,
        }
    }

    /// Value without surrounding ASCII whitespace.
    #[inline]
    pub fn trimmed(&self) -> &[u8] {
        self.value.trim_ascii()
    }

    /// Whether this is the control word `word` (compared without delimiters).
    #[inline]
    pub fn is_control_word(&self, word: &[u8]) -> bool {
        self.kind == TokenKind::ControlWord && self.trimmed() == word
    }

    /// Digits following `prefix` if this leaf is exactly `prefix` plus an
    /// unsigned decimal argument (`\f12` for prefix `\f`, but not `\fswiss`).
    pub fn numeric_arg(&self, prefix: &[u8]) -> Option<&[u8]> {
        let rest = self.trimmed().strip_prefix(prefix)?;
        (!rest.is_empty() && rest.iter().all(u8::is_ascii_digit)).then_some(rest)
    }

    /// Parsed numeric argument following `prefix`.
    pub fn numeric_value(&self, prefix: &[u8]) -> Option<u32> {
        self.numeric_arg(prefix)
            .and_then(|digits| atoi_simd::parse::<u32>(digits).ok())
    }

    /// Leaf of another kind and value that keeps this leaf's identity.
    #[inline]
    pub fn replaced(&self, kind: TokenKind, value: impl Into<Vec<u8>>) -> Token {
        Token::new(self.id, kind, value, self.span)
    }

    /// Whether the value is empty or entirely ASCII whitespace.
    #[inline]
    pub fn is_whitespace(&self) -> bool {
        self.value.iter().all(u8::is_ascii_whitespace)
    }
}

/// Group kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Synthetic root wrapping the outer braces and the document
    Root,
    /// Content of the outermost `{...}`
    Document,
    /// Ordinary `{...}` group (brace leaves included)
    Group,
    /// Run of consecutive `\'XX` leaves
    HexArray,
    /// `\*\htmltagN ...` destination content
    HtmlTag,
    /// `\*\mhtmltagN ...` destination content
    MHtmlTag,
}

/// A group of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Group kind
    pub kind: GroupKind,
    /// Ordered children
    pub children: Vec<Node>,
}

impl Group {
    /// Create a group.
    #[inline]
    pub fn new(kind: GroupKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    /// Depth-first iterator over every leaf below this group.
    #[inline]
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves::new(&self.children)
    }

    /// Depth-first iterator over every control word below this group.
    pub fn control_words(&self) -> impl Iterator<Item = &Token> {
        self.leaves()
            .filter(|token| token.kind == TokenKind::ControlWord)
    }

    /// First direct child that is a control word.
    pub fn first_control_word(&self) -> Option<&Token> {
        self.children
            .iter()
            .filter_map(Node::as_token)
            .find(|token| token.kind == TokenKind::ControlWord)
    }

    /// First leaf in the group (and its first-group descendants).
    pub fn first_leaf(&self) -> Option<&Token> {
        self.leaves().next()
    }

    /// Concatenated raw bytes of every leaf.
    pub fn to_rtf_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for token in self.leaves() {
            out.extend_from_slice(&token.value);
        }
        out
    }
}

/// A tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested group
    Group(Group),
    /// Leaf
    Token(Token),
}

impl Node {
    /// The leaf, if this node is one.
    #[inline]
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Node::Token(token) => Some(token),
            Node::Group(_) => None,
        }
    }

    /// The group, if this node is one.
    #[inline]
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(group) => Some(group),
            Node::Token(_) => None,
        }
    }

    /// Whether this node is a leaf of `kind`.
    #[inline]
    pub fn is_token_kind(&self, kind: TokenKind) -> bool {
        matches!(self, Node::Token(token) if token.kind == kind)
    }

    /// Whether this node is a group of `kind`.
    #[inline]
    pub fn is_group_kind(&self, kind: GroupKind) -> bool {
        matches!(self, Node::Group(group) if group.kind == kind)
    }
}

impl From<Token> for Node {
    fn from(token: Token) -> Self {
        Node::Token(token)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

/// Depth-first leaf iterator.
pub struct Leaves<'a> {
    stack: SmallVec<[slice::Iter<'a, Node>; 16]>,
}

impl<'a> Leaves<'a> {
    fn new(nodes: &'a [Node]) -> Self {
        let mut stack = SmallVec::new();
        stack.push(nodes.iter());
        Self { stack }
    }
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Token;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(Node::Token(token)) => return Some(token),
                Some(Node::Group(group)) => self.stack.push(group.children.iter()),
                None => {
                    self.stack.pop();
                },
            }
        }
    }
}

/// A whole parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    root: Group,
    node_count: usize,
}

impl ParseTree {
    /// Wrap a root group. `node_count` is one past the highest leaf id.
    pub fn new(root: Group, node_count: usize) -> Self {
        Self { root, node_count }
    }

    /// The synthetic root.
    #[inline]
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Number of leaf ids handed out by the builder.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// The Document group (second child of the root).
    pub fn document(&self) -> RtfResult<&Group> {
        match self.root.children.get(1) {
            Some(Node::Group(group)) if group.kind == GroupKind::Document => Ok(group),
            _ => Err(RtfError::MalformedEncapsulatedRtf(
                "Document object in the wrong place after parsing".to_string(),
            )),
        }
    }

    /// Mutable access to the Document group.
    pub fn document_mut(&mut self) -> RtfResult<&mut Group> {
        match self.root.children.get_mut(1) {
            Some(Node::Group(group)) if group.kind == GroupKind::Document => Ok(group),
            _ => Err(RtfError::MalformedEncapsulatedRtf(
                "Document object in the wrong place after parsing".to_string(),
            )),
        }
    }

    /// Take the Document group out of the tree.
    pub fn into_document(self) -> RtfResult<Group> {
        let mut children = self.root.children;
        if children.len() < 2 {
            return Err(RtfError::MalformedEncapsulatedRtf(
                "Document object missing after parsing".to_string(),
            ));
        }
        match children.swap_remove(1) {
            Node::Group(group) if group.kind == GroupKind::Document => Ok(group),
            _ => Err(RtfError::MalformedEncapsulatedRtf(
                "Document object in the wrong place after parsing".to_string(),
            )),
        }
    }

    /// Depth-first iterator over every leaf in the tree.
    #[inline]
    pub fn leaves(&self) -> Leaves<'_> {
        self.root.leaves()
    }

    /// Re-serialize the tree as it currently stands.
    #[inline]
    pub fn to_rtf_bytes(&self) -> Vec<u8> {
        self.root.to_rtf_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: u32, kind: TokenKind, value: &[u8]) -> Node {
        Node::Token(Token::new(NodeId(id), kind, value, Span::default()))
    }

    #[test]
    fn test_numeric_arg() {
        let font = Token::new(NodeId(0), TokenKind::ControlWord, &b"\\f12 "[..], Span::default());
        assert_eq!(font.numeric_arg(b"\\f"), Some(&b"12"[..]));
        assert_eq!(font.numeric_value(b"\\f"), Some(12));

        let family = Token::new(NodeId(1), TokenKind::ControlWord, &b"\\fswiss"[..], Span::default());
        assert_eq!(family.numeric_arg(b"\\f"), None);

        let negative = Token::new(NodeId(2), TokenKind::ControlWord, &b"\\f-1"[..], Span::default());
        assert_eq!(negative.numeric_arg(b"\\f"), None);
    }

    #[test]
    fn test_leaves_depth_first() {
        let inner = Group::new(
            GroupKind::Group,
            vec![leaf(1, TokenKind::OpenBrace, b"{"), leaf(2, TokenKind::String, b"b"), leaf(3, TokenKind::CloseBrace, b"}")],
        );
        let doc = Group::new(
            GroupKind::Document,
            vec![leaf(0, TokenKind::String, b"a"), Node::Group(inner), leaf(4, TokenKind::String, b"c")],
        );
        let ids: Vec<u32> = doc.leaves().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(doc.to_rtf_bytes(), b"a{b}c");
    }

    #[test]
    fn test_document_lookup() {
        let root = Group::new(
            GroupKind::Root,
            vec![
                leaf(0, TokenKind::OpenBrace, b"{"),
                Node::Group(Group::new(GroupKind::Document, vec![leaf(1, TokenKind::ControlWord, b"\\rtf1")])),
                leaf(2, TokenKind::CloseBrace, b"}"),
            ],
        );
        let tree = ParseTree::new(root, 3);
        assert_eq!(tree.document().unwrap().children.len(), 1);
        assert_eq!(tree.to_rtf_bytes(), b"{\\rtf1}");
        assert_eq!(tree.into_document().unwrap().kind, GroupKind::Document);
    }
}
