//! Node id generation.
//!
//! Ids are `<type>-<8 hex chars>` taken from a v4 uuid, checked against the
//! ids already present in the tree.

use super::node::{ChildItem, ElseBranch, SchemaNode};
use std::collections::HashSet;
use uuid::Uuid;

/// Collect every node id in the subtree rooted at `node`, including
/// component `render` elements and `else` nodes.
pub fn collect_ids(node: &SchemaNode, out: &mut HashSet<String>) {
    if !node.id().is_empty() {
        out.insert(node.id().to_string());
    }
    if let SchemaNode::Component(c) = node {
        if !c.render.id.is_empty() {
            out.insert(c.render.id.clone());
        }
    }
    if let Some(ElseBranch::Node(other)) = &node.element().else_branch {
        collect_ids(other, out);
    }
    for child in node.child_items().iter().filter_map(ChildItem::as_node) {
        collect_ids(child, out);
    }
}

/// A new id for a node of `node_type` that does not collide with `taken`.
/// The returned id is added to `taken`.
pub fn fresh_id(node_type: &str, taken: &mut HashSet<String>) -> String {
    let prefix: String = node_type
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let prefix = if prefix.is_empty() { "node".to_string() } else { prefix };
    loop {
        let uuid = Uuid::new_v4().simple().to_string();
        let candidate = format!("{}-{}", prefix, &uuid[..8]);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
    }
}

/// Give `node` and all of its descendants fresh ids.
pub fn regenerate_ids(node: &mut SchemaNode, taken: &mut HashSet<String>) {
    let id = fresh_id(node.node_type(), taken);
    node.set_id(id);
    if let SchemaNode::Component(c) = &mut *node {
        if !c.render.id.is_empty() {
            c.render.id = fresh_id(&c.render.node_type, taken);
        }
    }
    if let Some(ElseBranch::Node(other)) = &mut node.element_mut().else_branch {
        regenerate_ids(other, taken);
    }
    if !node.has_navigable_children() {
        return;
    }
    for child in node
        .element_mut()
        .child_items_mut()
        .iter_mut()
        .filter_map(ChildItem::as_node_mut)
    {
        regenerate_ids(child, taken);
    }
}

/// Assign ids to nodes that arrived without one, and re-key duplicates.
/// Returns how many nodes were changed.
pub fn ensure_ids(root: &mut SchemaNode) -> usize {
    let mut taken = HashSet::new();
    collect_ids(root, &mut taken);
    let mut seen = HashSet::new();
    ensure_ids_inner(root, &mut taken, &mut seen)
}

fn ensure_ids_inner(
    node: &mut SchemaNode,
    taken: &mut HashSet<String>,
    seen: &mut HashSet<String>,
) -> usize {
    let mut changed = 0;
    if node.id().is_empty() || !seen.insert(node.id().to_string()) {
        let id = fresh_id(node.node_type(), taken);
        seen.insert(id.clone());
        node.set_id(id);
        changed += 1;
    }
    if let SchemaNode::Component(c) = &mut *node {
        let render_id = c.render.id.clone();
        if !render_id.is_empty() && !seen.insert(render_id) {
            let id = fresh_id(&c.render.node_type, taken);
            seen.insert(id.clone());
            c.render.id = id;
            changed += 1;
        }
    }
    if let Some(ElseBranch::Node(other)) = &mut node.element_mut().else_branch {
        changed += ensure_ids_inner(other, taken, seen);
    }
    if node.has_navigable_children() {
        for child in node
            .element_mut()
            .child_items_mut()
            .iter_mut()
            .filter_map(ChildItem::as_node_mut)
        {
            changed += ensure_ids_inner(child, taken, seen);
        }
    }
    changed
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
                { "id": "a", "type": "text", "children": ["hi"] },
                { "type": "button" },
                { "id": "a", "type": "span" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn fresh_id_avoids_taken() {
        let mut taken = HashSet::new();
        let a = fresh_id("text", &mut taken);
        let b = fresh_id("text", &mut taken);
        assert!(a.starts_with("text-"));
        assert_ne!(a, b);
        assert_eq!(taken.len(), 2);
    }

    #[test]
    fn regenerate_ids_renames_whole_subtree() {
        let mut node = tree();
        let mut taken = HashSet::new();
        collect_ids(&node, &mut taken);
        regenerate_ids(&mut node, &mut taken);
        let mut after = HashSet::new();
        collect_ids(&node, &mut after);
        assert_eq!(after.len(), 4);
        assert!(!after.contains("root"));
        assert!(!after.contains("a"));
    }

    #[test]
    fn ensure_ids_fills_missing_and_duplicates() {
        let mut node = tree();
        assert_eq!(ensure_ids(&mut node), 2);
        let mut ids = HashSet::new();
        collect_ids(&node, &mut ids);
        assert_eq!(ids.len(), 4);
        assert_eq!(node.id(), "root");
        assert_eq!(node.child_node(0).unwrap().id(), "a");
    }

    fn with_else_and_component() -> SchemaNode {
        serde_json::from_value(json!({
            "id": "root",
            "type": "div",
            "children": [
                { "id": "a", "type": "div", "if": { "$exp": "ok" }, "else": { "id": "fallback", "type": "text" } },
                { "id": "card", "render": { "id": "card-body", "type": "div" } }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn else_nodes_and_render_elements_are_walked() {
        let node = with_else_and_component();
        let mut ids = HashSet::new();
        collect_ids(&node, &mut ids);
        for id in ["root", "a", "fallback", "card", "card-body"] {
            assert!(ids.contains(id), "missing {}", id);
        }

        let mut copy = node.clone();
        let mut taken = ids.clone();
        regenerate_ids(&mut copy, &mut taken);
        let mut renamed = HashSet::new();
        collect_ids(&copy, &mut renamed);
        assert_eq!(renamed.len(), 5);
        assert!(renamed.is_disjoint(&ids));
    }

    #[test]
    fn ensure_ids_rekeys_duplicate_else_node() {
        let mut node: SchemaNode = serde_json::from_value(json!({
            "id": "root",
            "type": "div",
            "children": [
                { "id": "x", "type": "div", "else": { "id": "x", "type": "text" } }
            ]
        }))
        .unwrap();
        assert_eq!(ensure_ids(&mut node), 1);
        let mut ids = HashSet::new();
        collect_ids(&node, &mut ids);
        assert_eq!(ids.len(), 3);
    }
}
