use crate::path::{get_node, get_node_mut, Path};
use crate::schema::{ChildItem, SchemaNode};

/// Swap two entries of the children list of the node at `parent`.
pub fn swap_children(root: &mut SchemaNode, parent: &[usize], a: usize, b: usize) -> bool {
    let Some(node) = get_node_mut(root, parent) else {
        return false;
    };
    let items = node.element_mut().child_items_mut();
    if a >= items.len() || b >= items.len() {
        return false;
    }
    items.swap(a, b);
    true
}

/// Move the node at `from` to position `to_index` in the children of
/// `to_parent`. Returns the node's new path, or `None` when the move is
/// impossible (root, missing node, moving into its own subtree).
pub fn relocate(root: &mut SchemaNode, from: &[usize], to_parent: &[usize], to_index: usize) -> Option<Path> {
    if from.is_empty() {
        return None;
    }
    // into its own subtree
    if to_parent.starts_with(from) {
        return None;
    }
    get_node(root, to_parent)?;
    let source = get_node(root, from)?.clone();

    // removing `from` shifts a later sibling branch of `to_parent` left by one
    let mut parent_after = to_parent.to_vec();
    let split = from.len() - 1;
    if to_parent.len() > split && to_parent[..split] == from[..split] && from[split] < to_parent[split] {
        parent_after[split] -= 1;
    }

    let (&from_idx, from_parent) = from.split_last()?;
    {
        let parent = get_node_mut(root, from_parent)?;
        let items = parent.element_mut().child_items_mut();
        if from_idx >= items.len() {
            return None;
        }
        items.remove(from_idx);
    }

    // same parent: the removal shifted the target index too
    let mut index = to_index;
    if from_parent == parent_after.as_slice() && from_idx < to_index {
        index = index.saturating_sub(1);
    }

    let target = get_node_mut(root, &parent_after)?;
    let items = target.element_mut().child_items_mut();
    let insert_at = index.min(items.len());
    items.insert(insert_at, ChildItem::Node(source));

    let mut final_path = parent_after;
    final_path.push(insert_at);
    Some(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NodeLookup;
    use serde_json::json;

    fn tree() -> SchemaNode {
        serde_json::from_value(json!({
            "id": "root",
            "type": "div",
            "children": [
                { "id": "a", "type": "div", "children": [{ "id": "a0", "type": "span" }] },
                { "id": "b", "type": "span" },
                { "id": "c", "type": "div", "children": [{ "id": "c0", "type": "span" }] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn relocate_within_parent() {
        let mut t = tree();
        assert_eq!(relocate(&mut t, &[0], &[], 3), Some(vec![2]));
        assert_eq!(t.id_at(&[0]).as_deref(), Some("b"));
        assert_eq!(t.id_at(&[2]).as_deref(), Some("a"));
    }

    #[test]
    fn relocate_into_later_branch_adjusts_parent() {
        let mut t = tree();
        assert_eq!(relocate(&mut t, &[1], &[2], 0), Some(vec![1, 0]));
        assert_eq!(t.path_of("b"), Some(vec![1, 0]));
        assert_eq!(t.path_of("c0"), Some(vec![1, 1]));
    }

    #[test]
    fn relocate_refuses_own_subtree_and_root() {
        let mut t = tree();
        assert!(relocate(&mut t, &[0], &[0], 0).is_none());
        assert!(relocate(&mut t, &[], &[1], 0).is_none());
        assert_eq!(t, tree());
    }

    #[test]
    fn swap_children_exchanges_entries() {
        let mut t = tree();
        assert!(swap_children(&mut t, &[], 0, 2));
        assert_eq!(t.id_at(&[0]).as_deref(), Some("c"));
        assert!(!swap_children(&mut t, &[], 0, 9));
    }
}
