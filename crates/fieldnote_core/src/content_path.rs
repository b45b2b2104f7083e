//! Content path derivation for commentable fields.
//!
//! # Responsibility
//! - Map a document node to the dotted address comments are anchored to.
//!
//! # Invariants
//! - Segments are emitted outermost-first.
//! - Any node inside a commenting-disabled subtree resolves to `""`.
//! - `""` means "not commentable"; callers must not register a widget for it.

/// Separator placed between address segments.
pub const CONTENT_PATH_SEPARATOR: &str = ".";

/// Tree node capability needed to derive a content path.
///
/// Implemented by cheap node handles (see `document::NodeRef`).
pub trait AddressableNode: Clone {
    /// Returns the enclosing node, or `None` at the root.
    fn parent(&self) -> Option<Self>;
    /// Returns this node's own address segment, when it declares one.
    fn address_segment(&self) -> Option<&str>;
    /// Returns whether this node marks its subtree as not commentable.
    fn disables_comments(&self) -> bool;
}

/// Resolves the content path for `node`.
///
/// Returns an empty string when the node is not commentable, either because
/// an ancestor (inclusive) disables commenting or because no ancestor carries
/// an address segment.
pub fn resolve_content_path<N: AddressableNode>(node: &N) -> String {
    if closest(node.clone(), |candidate| candidate.disables_comments()).is_some() {
        return String::new();
    }

    let mut segments = Vec::new();
    let mut cursor = closest(node.clone(), has_segment);
    while let Some(tagged) = cursor {
        if let Some(segment) = tagged.address_segment() {
            segments.push(segment.to_string());
        }
        cursor = tagged
            .parent()
            .and_then(|parent| closest(parent, has_segment));
    }

    // Collected innermost-first.
    segments.reverse();
    segments.join(CONTENT_PATH_SEPARATOR)
}

fn has_segment<N: AddressableNode>(node: &N) -> bool {
    node.address_segment().is_some()
}

/// Returns the nearest node (inclusive) matching `predicate`.
fn closest<N: AddressableNode>(node: N, predicate: impl Fn(&N) -> bool) -> Option<N> {
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if predicate(&current) {
            return Some(current);
        }
        cursor = current.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{resolve_content_path, AddressableNode};

    /// Minimal parent-pointer tree: `(parent index, segment, disabled)`.
    struct Tree(Vec<(Option<usize>, Option<&'static str>, bool)>);

    #[derive(Clone)]
    struct Node<'a> {
        tree: &'a Tree,
        index: usize,
    }

    impl AddressableNode for Node<'_> {
        fn parent(&self) -> Option<Self> {
            self.tree.0[self.index].0.map(|index| Node {
                tree: self.tree,
                index,
            })
        }

        fn address_segment(&self) -> Option<&str> {
            self.tree.0[self.index].1
        }

        fn disables_comments(&self) -> bool {
            self.tree.0[self.index].2
        }
    }

    fn node(tree: &Tree, index: usize) -> Node<'_> {
        Node { tree, index }
    }

    #[test]
    fn segments_are_joined_outermost_first() {
        let tree = Tree(vec![
            (None, None, false),
            (Some(0), Some("body"), false),
            (Some(1), None, false),
            (Some(2), Some("0"), false),
            (Some(3), Some("heading"), false),
        ]);
        assert_eq!(resolve_content_path(&node(&tree, 4)), "body.0.heading");
        assert_eq!(resolve_content_path(&node(&tree, 2)), "body");
    }

    #[test]
    fn untagged_node_without_tagged_ancestor_is_empty() {
        let tree = Tree(vec![(None, None, false), (Some(0), None, false)]);
        assert_eq!(resolve_content_path(&node(&tree, 1)), "");
    }

    #[test]
    fn disabled_ancestor_wins_over_segments() {
        let tree = Tree(vec![
            (None, Some("body"), false),
            (Some(0), Some("0"), true),
            (Some(1), Some("heading"), false),
        ]);
        assert_eq!(resolve_content_path(&node(&tree, 2)), "");
        assert_eq!(resolve_content_path(&node(&tree, 1)), "");
        assert_eq!(resolve_content_path(&node(&tree, 0)), "body");
    }
}
