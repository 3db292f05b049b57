//! Tree cleanup between decoding and flattening.

use super::tree::{Group, GroupKind, Node, TokenKind};

const TARGET: &str = "rtfdecap::transform";

/// Groups led by one of these control words never render.
const NON_VISIBLE_CONTROL_WORDS: [&[u8]; 3] = [b"\\context", b"\\colortbl", b"\\fonttbl"];

/// Star-escaped destinations that are interpreted rather than dropped.
/// Unknown destinations must be ignored along with their content, and
/// none are interpreted yet.
const UNDERSTOOD_DESTINATIONS: [&[u8]; 0] = [];

/// Remove brace and delimiter-space leaves at every depth and trim the
/// whitespace around control word values.
pub fn clean_structure(group: &mut Group) {
    group.children.retain_mut(|child| match child {
        Node::Group(nested) => {
            clean_structure(nested);
            true
        },
        Node::Token(token) => match token.kind {
            TokenKind::OpenBrace | TokenKind::CloseBrace | TokenKind::SpaceDelete => false,
            TokenKind::ControlWord => {
                let trimmed = token.value.trim_ascii();
                if trimmed.len() != token.value.len() {
                    token.value = trimmed.to_vec();
                }
                true
            },
            _ => true,
        },
    });
}

/// What the group filter does with one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    /// Visible destination, kept as is
    Keep,
    /// Dropped with all its content
    Drop,
    /// Kept, with its own groups filtered in turn
    Descend,
}

/// Delete groups that never render: font and color tables, `\context`,
/// MHTML tag destinations and unknown star-escaped destinations. HTML tag
/// destinations are kept untouched.
///
/// Runs after [`clean_structure`], so a group's first child is its first
/// meaningful child.
pub fn strip_non_visible_groups(group: &mut Group) {
    group.children.retain_mut(|child| {
        let Node::Group(nested) = child else {
            return true;
        };
        match visibility(nested) {
            Visibility::Keep => true,
            Visibility::Drop => {
                log::debug!(
                    target: TARGET,
                    "Dropping non-visible group led by {:?}",
                    nested
                        .first_control_word()
                        .map(|t| String::from_utf8_lossy(&t.value).into_owned())
                );
                false
            },
            Visibility::Descend => {
                strip_non_visible_groups(nested);
                true
            },
        }
    });
}

fn visibility(group: &Group) -> Visibility {
    let Some(first) = group.children.first() else {
        return Visibility::Drop;
    };

    if first.is_group_kind(GroupKind::HtmlTag) {
        return Visibility::Keep;
    }
    if first.is_group_kind(GroupKind::MHtmlTag) {
        return Visibility::Drop;
    }

    if group
        .first_control_word()
        .is_some_and(|word| NON_VISIBLE_CONTROL_WORDS.contains(&word.trimmed()))
    {
        return Visibility::Drop;
    }

    if first.is_token_kind(TokenKind::StarEscape)
        && let Some(word) = group.children.get(1).and_then(Node::as_token)
        && word.kind == TokenKind::ControlWord
    {
        if UNDERSTOOD_DESTINATIONS.contains(&word.trimmed()) {
            return Visibility::Keep;
        }
        return Visibility::Drop;
    }

    Visibility::Descend
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::parser::{RtfTreeBuilder, TreeBuilder};
    use crate::rtf::tree::ParseTree;

    fn cleaned(input: &[u8]) -> ParseTree {
        let mut tree = RtfTreeBuilder.build(input).unwrap();
        let document = tree.document_mut().unwrap();
        clean_structure(document);
        strip_non_visible_groups(document);
        tree
    }

    fn kinds(tree: &ParseTree) -> Vec<TokenKind> {
        tree.document().unwrap().leaves().map(|t| t.kind).collect()
    }

    #[test]
    fn test_braces_and_delimiters_removed() {
        let tree = cleaned(br"{\rtf1 {\b bold}\u960 x}");
        let kinds = kinds(&tree);
        assert!(!kinds.contains(&TokenKind::OpenBrace));
        assert!(!kinds.contains(&TokenKind::CloseBrace));
        assert!(!kinds.contains(&TokenKind::SpaceDelete));
        assert!(tree.leaves().any(|t| t.value == b"\\b"));
        assert!(tree.leaves().any(|t| t.value == b"\\rtf1"));
    }

    #[test]
    fn test_space_save_kept() {
        let tree = cleaned(br"{\rtf1 a{\b b}  {\i c}}");
        assert!(kinds(&tree).contains(&TokenKind::SpaceSave));
    }

    #[test]
    fn test_non_visible_tables_dropped() {
        let tree = cleaned(
            br"{\rtf1\ansi{\fonttbl{\f0 Arial;}}{\colortbl;\red0\green0\blue0;}{\*\generator Riched20;}{\context x}visible{\b bold}}",
        );
        let text: Vec<u8> = tree
            .leaves()
            .filter(|t| t.kind == TokenKind::String)
            .flat_map(|t| t.value.clone())
            .collect();
        assert_eq!(text, b"visiblebold");
    }

    #[test]
    fn test_html_tag_groups() {
        let tree = cleaned(br"{\rtf1{\*\htmltag19 <p>}{\*\mhtmltag84 http://x}{\*\htmltag64 </p>}}");
        let document = tree.document().unwrap();
        assert_eq!(document.children.len(), 3);
        let text: Vec<u8> = tree
            .leaves()
            .filter(|t| t.kind == TokenKind::String)
            .flat_map(|t| t.value.clone())
            .collect();
        assert_eq!(text, b"<p></p>");
    }

    #[test]
    fn test_nested_unknown_destination_dropped() {
        let tree = cleaned(br"{\rtf1{\b x{\*\unknown y}}}");
        assert!(!tree.leaves().any(|t| t.value == b"y"));
        assert!(tree.leaves().any(|t| t.value == b"x"));
    }

    #[test]
    fn test_empty_group_dropped() {
        let tree = cleaned(br"{\rtf1 a{}b}");
        assert_eq!(tree.document().unwrap().children.len(), 3);
    }
}
