/// Structural edits on the schema tree.
///
/// Every operation takes the current tree and selection, works on a clone,
/// and returns the new tree plus the selection that should follow. Rejected
/// operations return a [`MutationError`] whose message is meant for the
/// operator; the input tree is never touched.
pub mod reorder;

pub use reorder::{relocate, swap_children};

use crate::events::OperationTag;
use crate::path::{get_node, get_node_mut, parent, NodeLookup, Path};
use crate::schema::ids::{collect_ids, regenerate_ids};
use crate::schema::{ChildItem, PropValue, SchemaNode};
use crate::selection::{schema_path, SelectionPath};
use crate::states::active_edit::ActiveEdit;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Element types that cannot take pasted children.
pub const LEAF_TYPES: &[&str] = &[
    "text", "span", "label", "image", "icon", "input", "textarea", "divider", "spacer",
    "checkbox", "switch",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Select a node first")]
    NoSelection,
    #[error("Cannot {0} the root node")]
    RootNode(OperationTag),
    #[error("Nothing to paste: copy or cut a node first")]
    EmptyClipboard,
    #[error("Node '{0}' no longer exists")]
    NodeNotFound(String),
    #[error("This node has no siblings to move past")]
    NoSiblings,
    #[error("Node is already the {0} of its siblings")]
    AtBoundary(&'static str),
    #[error("Cannot paste into a '{0}' node")]
    NotAContainer(String),
    #[error("Cannot move a node into itself")]
    IntoOwnSubtree,
    #[error("No changes to apply")]
    NothingToApply,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
    /// Alias of `Up` for horizontal layouts.
    Left,
    /// Alias of `Down` for horizontal layouts.
    Right,
}

impl MoveDirection {
    fn is_backward(self) -> bool {
        matches!(self, MoveDirection::Up | MoveDirection::Left)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MutationOutcome {
    pub tree: SchemaNode,
    /// Selection after the operation; `None` clears it.
    pub selection: Option<SelectionPath>,
    pub tag: OperationTag,
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn locate(tree: &SchemaNode, selection: Option<&SelectionPath>) -> Result<Path, MutationError> {
    let sel = selection.ok_or(MutationError::NoSelection)?;
    schema_path(tree, sel).ok_or_else(|| MutationError::NodeNotFound(sel.component_id.clone()))
}

fn locate_non_root(
    tree: &SchemaNode,
    selection: Option<&SelectionPath>,
    tag: OperationTag,
) -> Result<Path, MutationError> {
    let path = locate(tree, selection)?;
    if path.is_empty() {
        return Err(MutationError::RootNode(tag));
    }
    Ok(path)
}

/// A deep copy of `node` with fresh ids that do not collide with `tree`.
fn clone_with_fresh_ids(tree: &SchemaNode, node: &SchemaNode) -> SchemaNode {
    let mut taken = HashSet::new();
    collect_ids(tree, &mut taken);
    let mut copy = node.clone();
    regenerate_ids(&mut copy, &mut taken);
    copy
}

fn remove_at(tree: &mut SchemaNode, path: &[usize]) -> Option<SchemaNode> {
    let (&idx, parent_path) = path.split_last()?;
    let items = get_node_mut(tree, parent_path)?.element_mut().child_items_mut();
    if idx >= items.len() {
        return None;
    }
    match items.remove(idx) {
        ChildItem::Node(node) => Some(node),
        _ => None,
    }
}

// ─── Operations ───────────────────────────────────────────────────────────────

/// The node to put on the clipboard. The tree is unchanged.
pub fn copy(tree: &SchemaNode, selection: Option<&SelectionPath>) -> Result<SchemaNode, MutationError> {
    let path = locate(tree, selection)?;
    get_node(tree, &path)
        .cloned()
        .ok_or_else(|| MutationError::NodeNotFound(selection.map(|s| s.component_id.clone()).unwrap_or_default()))
}

/// Remove the selected node and hand it back for the clipboard.
pub fn cut(
    tree: &SchemaNode,
    selection: Option<&SelectionPath>,
) -> Result<(MutationOutcome, SchemaNode), MutationError> {
    let path = locate_non_root(tree, selection, OperationTag::Cut)?;
    let mut next = tree.clone();
    let removed = remove_at(&mut next, &path)
        .ok_or_else(|| MutationError::NodeNotFound(selection.map(|s| s.component_id.clone()).unwrap_or_default()))?;
    tracing::debug!(id = %removed.id(), path = ?path, "cut node");
    Ok((
        MutationOutcome {
            tree: next,
            selection: None,
            tag: OperationTag::Cut,
        },
        removed,
    ))
}

/// Append a fresh-id clone of `copied` as the last child of the selection.
pub fn paste_as_child(
    tree: &SchemaNode,
    selection: Option<&SelectionPath>,
    copied: Option<&SchemaNode>,
) -> Result<MutationOutcome, MutationError> {
    let copied = copied.ok_or(MutationError::EmptyClipboard)?;
    let path = locate(tree, selection)?;
    let target = get_node(tree, &path).ok_or(MutationError::NoSelection)?;
    let target_type = target.node_type();
    if LEAF_TYPES.contains(&target_type) {
        return Err(MutationError::NotAContainer(target_type.to_string()));
    }

    let clone = clone_with_fresh_ids(tree, copied);
    tracing::debug!(id = %clone.id(), parent = ?path, "paste node");
    let mut next = tree.clone();
    let parent_node = get_node_mut(&mut next, &path).ok_or(MutationError::NoSelection)?;
    parent_node.element_mut().child_items_mut().push(ChildItem::Node(clone));

    let selection = selection.map(|s| SelectionPath::new(s.component_id.clone(), path));
    Ok(MutationOutcome {
        tree: next,
        selection,
        tag: OperationTag::Paste,
    })
}

pub fn delete(tree: &SchemaNode, selection: Option<&SelectionPath>) -> Result<MutationOutcome, MutationError> {
    let path = locate_non_root(tree, selection, OperationTag::Delete)?;
    let mut next = tree.clone();
    let removed = remove_at(&mut next, &path)
        .ok_or_else(|| MutationError::NodeNotFound(selection.map(|s| s.component_id.clone()).unwrap_or_default()))?;
    tracing::debug!(id = %removed.id(), path = ?path, "delete node");
    Ok(MutationOutcome {
        tree: next,
        selection: None,
        tag: OperationTag::Delete,
    })
}

/// Insert a fresh-id clone right after the selected node and select it.
pub fn duplicate(tree: &SchemaNode, selection: Option<&SelectionPath>) -> Result<MutationOutcome, MutationError> {
    let path = locate_non_root(tree, selection, OperationTag::Duplicate)?;
    let original = get_node(tree, &path).ok_or(MutationError::NoSelection)?;
    let clone = clone_with_fresh_ids(tree, original);
    let new_id = clone.id().to_string();

    let mut next = tree.clone();
    let (&idx, parent_path) = path.split_last().ok_or(MutationError::RootNode(OperationTag::Duplicate))?;
    let items = get_node_mut(&mut next, parent_path)
        .ok_or(MutationError::NoSelection)?
        .element_mut()
        .child_items_mut();
    items.insert(idx + 1, ChildItem::Node(clone));

    let mut new_path = parent_path.to_vec();
    new_path.push(idx + 1);
    tracing::debug!(id = %new_id, path = ?new_path, "duplicate node");
    Ok(MutationOutcome {
        tree: next,
        selection: Some(SelectionPath::new(new_id, new_path)),
        tag: OperationTag::Duplicate,
    })
}

/// Reorder the selected node one step among its navigable siblings.
/// Moves past the first or last position are rejected.
pub fn move_node(
    tree: &SchemaNode,
    selection: Option<&SelectionPath>,
    direction: MoveDirection,
) -> Result<MutationOutcome, MutationError> {
    let path = locate_non_root(tree, selection, OperationTag::Move)?;
    let parent_path = parent(&path).ok_or(MutationError::RootNode(OperationTag::Move))?;
    let own = path[path.len() - 1];
    let siblings = get_node(tree, parent_path)
        .ok_or(MutationError::NoSelection)?
        .navigable_child_indices();
    if siblings.len() <= 1 {
        return Err(MutationError::NoSiblings);
    }
    let pos = siblings
        .iter()
        .position(|&i| i == own)
        .ok_or(MutationError::NoSelection)?;
    let other = if direction.is_backward() {
        pos.checked_sub(1).map(|p| siblings[p]).ok_or(MutationError::AtBoundary("first"))?
    } else {
        siblings.get(pos + 1).copied().ok_or(MutationError::AtBoundary("last"))?
    };

    let mut next = tree.clone();
    if !swap_children(&mut next, parent_path, own, other) {
        return Err(MutationError::NoSelection);
    }
    let mut new_path = parent_path.to_vec();
    new_path.push(other);
    let id = get_node(&next, &new_path).map(|n| n.id().to_string()).unwrap_or_default();
    tracing::debug!(id = %id, from = own, to = other, "move node");
    Ok(MutationOutcome {
        tree: next,
        selection: Some(SelectionPath::new(id, new_path)),
        tag: OperationTag::Move,
    })
}

/// Move the node at `from` under `to_parent` at `to_index` (drag and drop).
pub fn move_to(
    tree: &SchemaNode,
    selection: Option<&SelectionPath>,
    to_parent: &[usize],
    to_index: usize,
) -> Result<MutationOutcome, MutationError> {
    let path = locate_non_root(tree, selection, OperationTag::Move)?;
    let target = get_node(tree, to_parent).ok_or(MutationError::NoSelection)?;
    if LEAF_TYPES.contains(&target.node_type()) {
        return Err(MutationError::NotAContainer(target.node_type().to_string()));
    }
    let mut next = tree.clone();
    let new_path = relocate(&mut next, &path, to_parent, to_index).ok_or(MutationError::IntoOwnSubtree)?;
    let id = get_node(&next, &new_path).map(|n| n.id().to_string()).unwrap_or_default();
    Ok(MutationOutcome {
        tree: next,
        selection: Some(SelectionPath::new(id, new_path)),
        tag: OperationTag::Move,
    })
}

/// Apply a committed [`ActiveEdit`]: text replaces the node's text
/// entries, class name sets the `className` prop.
pub fn update_node_content(tree: &SchemaNode, edit: &ActiveEdit) -> Result<MutationOutcome, MutationError> {
    if edit.is_empty() {
        return Err(MutationError::NothingToApply);
    }
    let mut next = tree.clone();
    let path = tree
        .path_of(&edit.node_id)
        .ok_or_else(|| MutationError::NodeNotFound(edit.node_id.clone()))?;
    let node = get_node_mut(&mut next, &path).ok_or_else(|| MutationError::NodeNotFound(edit.node_id.clone()))?;
    let element = node.element_mut();

    if let Some(text) = &edit.text {
        let items = element.child_items_mut();
        match items.iter().position(|c| matches!(c, ChildItem::Text(_))) {
            Some(first) => {
                items[first] = ChildItem::Text(text.clone());
                let mut i = items.len();
                while i > first + 1 {
                    i -= 1;
                    if matches!(items[i], ChildItem::Text(_)) {
                        items.remove(i);
                    }
                }
            }
            None if items.iter().all(|c| c.as_node().is_none()) => {
                *items = vec![ChildItem::Text(text.clone())];
            }
            None => items.insert(0, ChildItem::Text(text.clone())),
        }
    }
    if let Some(class_name) = &edit.class_name {
        element
            .props
            .insert("className".to_string(), PropValue::literal(class_name.as_str()));
    }

    tracing::debug!(id = %edit.node_id, "update node content");
    Ok(MutationOutcome {
        tree: next,
        selection: Some(SelectionPath::new(edit.node_id.clone(), path)),
        tag: OperationTag::Edit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> SchemaNode {
        serde_json::from_value(json!({
            "id": "root",
            "type": "div",
            "children": [
                { "id": "a", "type": "div", "children": [
                    { "id": "a0", "type": "text", "children": ["hello"] },
                    { "id": "a1", "type": "button" }
                ]},
                { "id": "b", "type": "text", "children": "label" },
                { "id": "c", "type": "div" }
            ]
        }))
        .unwrap()
    }

    fn sel(id: &str, path: &[usize]) -> SelectionPath {
        SelectionPath::new(id, path)
    }

    #[test]
    fn root_destructive_ops_are_rejected() {
        let t = tree();
        let root = sel("root", &[]);
        assert_eq!(delete(&t, Some(&root)).unwrap_err(), MutationError::RootNode(OperationTag::Delete));
        assert_eq!(
            cut(&t, Some(&root)).unwrap_err().to_string(),
            "Cannot cut the root node"
        );
        assert!(duplicate(&t, Some(&root)).is_err());
        assert_eq!(t, tree());
    }

    #[test]
    fn missing_selection_and_clipboard() {
        let t = tree();
        assert_eq!(delete(&t, None).unwrap_err(), MutationError::NoSelection);
        assert_eq!(
            paste_as_child(&t, Some(&sel("c", &[2])), None).unwrap_err(),
            MutationError::EmptyClipboard
        );
        assert_eq!(
            delete(&t, Some(&sel("ghost", &[9]))).unwrap_err(),
            MutationError::NodeNotFound("ghost".into())
        );
    }

    fn id_count(tree: &SchemaNode, id: &str) -> usize {
        serde_json::to_string(tree)
            .unwrap()
            .matches(&format!("\"id\":\"{}\"", id))
            .count()
    }

    #[test]
    fn clones_rename_else_nodes_and_render_elements() {
        let t: SchemaNode = serde_json::from_value(json!({
            "id": "root",
            "type": "div",
            "children": [
                { "id": "a", "type": "div", "if": { "$exp": "ready" }, "else": { "id": "fallback", "type": "text" } },
                { "id": "card", "render": { "id": "card-body", "type": "div" } }
            ]
        }))
        .unwrap();

        let dup = duplicate(&t, Some(&sel("a", &[0]))).expect("duplicated");
        assert_eq!(id_count(&dup.tree, "fallback"), 1);

        let dup = duplicate(&dup.tree, Some(&sel("card", &[2]))).expect("duplicated");
        assert_eq!(id_count(&dup.tree, "card-body"), 1);

        let copied = copy(&dup.tree, Some(&sel("card", &[2]))).expect("copied");
        let pasted = paste_as_child(&dup.tree, Some(&sel("root", &[])), Some(&copied)).expect("pasted");
        assert_eq!(id_count(&pasted.tree, "card-body"), 1);

        let mut ids = HashSet::new();
        collect_ids(&pasted.tree, &mut ids);
        // root, a, fallback, a', fallback', card, body, card', body', card'', body''
        assert_eq!(ids.len(), 11);
    }

    #[test]
    fn duplicate_inserts_clone_after_original() {
        let t = tree();
        let out = duplicate(&t, Some(&sel("a", &[0]))).unwrap();
        assert_eq!(out.tree.child_items().len(), 4);
        let new_sel = out.selection.unwrap();
        assert_eq!(new_sel.path, vec![1]);
        assert_ne!(new_sel.component_id, "a");
        assert_eq!(out.tree.id_at(&[1]), Some(new_sel.component_id.clone()));
        let clone = get_node(&out.tree, &[1]).unwrap();
        assert_eq!(clone.descendant_count(), 3);
        assert_ne!(clone.child_node(0).unwrap().id(), "a0");
        assert_eq!(out.tag, OperationTag::Duplicate);
    }

    #[test]
    fn cut_then_paste_preserves_shape() {
        let t = tree();
        let (out, clipboard) = cut(&t, Some(&sel("a", &[0]))).unwrap();
        assert!(out.selection.is_none());
        assert!(out.tree.path_of("a").is_none());
        let pasted = paste_as_child(&out.tree, Some(&sel("c", &[1])), Some(&clipboard)).unwrap();
        let moved = get_node(&pasted.tree, &[1, 0]).unwrap();
        assert_eq!(moved.descendant_count(), clipboard.descendant_count());
        assert_eq!(moved.node_type(), "div");
        assert_eq!(moved.child_node(1).unwrap().node_type(), "button");
        assert_eq!(pasted.selection, Some(sel("c", &[1])));
    }

    #[test]
    fn paste_into_leaf_is_rejected() {
        let t = tree();
        let clip = copy(&t, Some(&sel("c", &[2]))).unwrap();
        assert_eq!(
            paste_as_child(&t, Some(&sel("b", &[1])), Some(&clip)).unwrap_err(),
            MutationError::NotAContainer("text".into())
        );
    }

    #[test]
    fn move_reorders_and_rejects_boundaries() {
        let t = tree();
        let out = move_node(&t, Some(&sel("b", &[1])), MoveDirection::Up).unwrap();
        assert_eq!(out.tree.id_at(&[0]).as_deref(), Some("b"));
        assert_eq!(out.selection, Some(sel("b", &[0])));
        let right = move_node(&t, Some(&sel("b", &[1])), MoveDirection::Right).unwrap();
        assert_eq!(right.tree.id_at(&[2]).as_deref(), Some("b"));
        assert_eq!(
            move_node(&t, Some(&sel("a", &[0])), MoveDirection::Left).unwrap_err(),
            MutationError::AtBoundary("first")
        );
        assert_eq!(
            move_node(&t, Some(&sel("c", &[2])), MoveDirection::Down).unwrap_err(),
            MutationError::AtBoundary("last")
        );
    }

    #[test]
    fn move_without_siblings_is_rejected() {
        let t: SchemaNode = serde_json::from_value(json!({
            "id": "root", "type": "div", "children": ["text", { "id": "only", "type": "span" }]
        }))
        .unwrap();
        assert_eq!(
            move_node(&t, Some(&sel("only", &[1])), MoveDirection::Down).unwrap_err(),
            MutationError::NoSiblings
        );
    }

    #[test]
    fn move_to_reparents() {
        let t = tree();
        let out = move_to(&t, Some(&sel("b", &[1])), &[2], 0).unwrap();
        assert_eq!(out.tree.path_of("b"), Some(vec![1, 0]));
        assert_eq!(out.selection, Some(sel("b", &[1, 0])));
        assert_eq!(
            move_to(&t, Some(&sel("a", &[0])), &[0], 0).unwrap_err(),
            MutationError::IntoOwnSubtree
        );
    }

    #[test]
    fn active_edit_updates_text_and_class() {
        let t = tree();
        let edit = ActiveEdit::new("a0").with_text("bye").with_class_name("title");
        let out = update_node_content(&t, &edit).unwrap();
        let node = get_node(&out.tree, &[0, 0]).unwrap();
        assert_eq!(node.child_items(), &[ChildItem::Text("bye".into())]);
        assert_eq!(node.element().props["className"], PropValue::literal("title"));
        assert_eq!(out.tag, OperationTag::Edit);
        assert_eq!(
            update_node_content(&t, &ActiveEdit::new("a0")).unwrap_err(),
            MutationError::NothingToApply
        );
    }
}
