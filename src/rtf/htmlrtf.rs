//! `\htmlrtf` suppression.
//!
//! `\htmlrtf` (or `\htmlrtf1`) starts a region of RTF that was added by the
//! encapsulating writer and is not part of the original HTML; `\htmlrtf0`
//! ends it. A group inherits the state of its parent, and a toggle inside
//! a group does not outlive the group.

use super::tree::{Group, Node, Token, TokenKind};
use fixedbitset::FixedBitSet;

const TARGET: &str = "rtfdecap::htmlrtf";

/// Ids of every leaf that falls in a suppressed region, plus every
/// `\htmlrtf` toggle itself.
pub fn stripped_htmlrtf_ids(document: &Group, node_count: usize) -> FixedBitSet {
    let mut ids = FixedBitSet::with_capacity(node_count);
    mark_group(document, false, &mut ids);
    ids
}

fn mark_group(group: &Group, inherited: bool, ids: &mut FixedBitSet) {
    let mut suppressed = inherited;

    for child in &group.children {
        match child {
            Node::Group(nested) => mark_group(nested, suppressed, ids),
            Node::Token(token) => {
                if let Some(state) = toggle_state(token) {
                    suppressed = state;
                    mark(token, ids);
                } else if suppressed {
                    mark(token, ids);
                }
            },
        }
    }
}

/// New suppression state set by an `\htmlrtf` leaf. A trailing `0` turns
/// suppression off; anything else turns it on.
#[inline]
fn toggle_state(token: &Token) -> Option<bool> {
    (token.kind == TokenKind::HtmlRtf).then(|| !token.trimmed().ends_with(b"0"))
}

#[inline]
fn mark(token: &Token, ids: &mut FixedBitSet) {
    log::debug!(
        target: TARGET,
        "Stripping {:?} at line {} column {}",
        String::from_utf8_lossy(&token.value),
        token.span.line,
        token.span.column
    );
    ids.grow(token.id.index() + 1);
    ids.insert(token.id.index());
}

/// Remove every leaf whose id is set, at any depth. Groups are kept even
/// when emptied.
pub fn delete_tokens(group: &mut Group, ids: &FixedBitSet) {
    group.children.retain_mut(|child| match child {
        Node::Token(token) => !ids.contains(token.id.index()),
        Node::Group(nested) => {
            delete_tokens(nested, ids);
            true
        },
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::parser::{RtfTreeBuilder, TreeBuilder};
    use crate::rtf::tree::ParseTree;
    use proptest::prelude::*;

    fn strip(input: &str) -> ParseTree {
        let mut tree = RtfTreeBuilder.build(input.as_bytes()).unwrap();
        let ids = stripped_htmlrtf_ids(tree.document().unwrap(), tree.node_count());
        delete_tokens(tree.document_mut().unwrap(), &ids);
        tree
    }

    fn strings(tree: &ParseTree) -> String {
        tree.leaves()
            .filter(|t| t.kind == TokenKind::String)
            .map(|t| String::from_utf8_lossy(&t.value).into_owned())
            .collect()
    }

    #[test]
    fn test_toggle_on_and_off() {
        let tree = strip(r"{\rtf1 keep\htmlrtf drop\htmlrtf0 kept}");
        assert_eq!(strings(&tree), "keepkept");
        assert!(!tree.leaves().any(|t| t.kind == TokenKind::HtmlRtf));

        let tree = strip(r"{\rtf1 a\htmlrtf1 b\htmlrtf0 c}");
        assert_eq!(strings(&tree), "ac");
    }

    #[test]
    fn test_state_is_inherited_by_groups() {
        let tree = strip(r"{\rtf1 \htmlrtf{x{y}}\htmlrtf0 z}");
        assert_eq!(strings(&tree), "z");
    }

    #[test]
    fn test_state_does_not_leave_group() {
        let tree = strip(r"{\rtf1 a{\htmlrtf b}c}");
        assert_eq!(strings(&tree), "ac");

        // Turning it off in a nested group only affects that group
        let tree = strip(r"{\rtf1 \htmlrtf a{\htmlrtf0 b}c\htmlrtf0 d}");
        assert_eq!(strings(&tree), "bd");
    }

    #[test]
    fn test_unterminated_region_runs_to_group_end() {
        let tree = strip(r"{\rtf1 a{\htmlrtf b\par c}d}");
        assert_eq!(strings(&tree), "ad");
        assert!(!tree.leaves().any(|t| t.is_control_word(b"\\par")));
    }

    #[test]
    fn test_braces_of_suppressed_groups_are_marked() {
        let tree = RtfTreeBuilder.build(br"{\rtf1 \htmlrtf{x}\htmlrtf0 }").unwrap();
        let ids = stripped_htmlrtf_ids(tree.document().unwrap(), tree.node_count());
        let braces = tree
            .leaves()
            .filter(|t| matches!(t.kind, TokenKind::OpenBrace | TokenKind::CloseBrace))
            .filter(|t| ids.contains(t.id.index()))
            .count();
        assert_eq!(braces, 2);
    }

    proptest! {
        #[test]
        fn prop_text_outside_regions_survives(
            parts in proptest::collection::vec(("[a-z]{1,8}", any::<bool>()), 1..12)
        ) {
            let mut input = String::from(r"{\rtf1 ");
            let mut expected = String::new();
            for (text, hidden) in &parts {
                if *hidden {
                    input.push_str(r"\htmlrtf ");
                    input.push_str(text);
                    input.push_str(r"\htmlrtf0 ");
                } else {
                    input.push_str(text);
                    expected.push_str(text);
                }
            }
            input.push('}');

            prop_assert_eq!(strings(&strip(&input)), expected);
        }
    }
}
