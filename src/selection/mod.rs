/// Hierarchical selection state.
///
/// A node is selectable when its path has exactly `level + 1` entries, so the
/// operator drills in and out one level at a time. Hover and click go through
/// [`targeting`] so pointing at a deep node picks the right node at the
/// current depth.
pub mod targeting;

pub use targeting::{resolve_double_click_target, resolve_hover_target};

use crate::path::{get_node, parent, NodeLookup, Path};
use crate::schema::SchemaNode;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPath {
    pub component_id: String,
    pub path: Path,
}

impl SelectionPath {
    pub fn new(component_id: impl Into<String>, path: impl Into<Path>) -> Self {
        Self {
            component_id: component_id.into(),
            path: path.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionState {
    pub selected: Option<SelectionPath>,
    pub hovered: Option<SelectionPath>,
    pub level: usize,
    /// Clipboard for copy / cut / paste.
    pub copied: Option<SchemaNode>,
    pub enabled: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SelectionState {
    pub fn new(enabled: bool) -> Self {
        Self {
            selected: None,
            hovered: None,
            level: 0,
            copied: None,
            enabled,
        }
    }

    pub fn selected_path(&self) -> Option<&[usize]> {
        self.selected.as_ref().map(|s| s.path.as_slice())
    }

    pub fn is_node_selectable(&self, path: &[usize]) -> bool {
        path.len() == self.level + 1
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_ref().map_or(false, |s| s.component_id == id)
    }

    pub fn is_hovered(&self, id: &str) -> bool {
        self.hovered.as_ref().map_or(false, |s| s.component_id == id)
    }

    /// Returns whether anything changed.
    pub fn select_node(&mut self, id: &str, path: &[usize]) -> bool {
        if !self.enabled {
            return false;
        }
        let next = SelectionPath::new(id, path);
        if self.selected.as_ref() == Some(&next) {
            return false;
        }
        tracing::debug!(id, path = ?path, "select node");
        self.selected = Some(next);
        true
    }

    pub fn set_hovered_node(&mut self, id: Option<&str>, path: &[usize]) -> bool {
        if !self.enabled {
            return false;
        }
        let next = id.map(|id| SelectionPath::new(id, path));
        if self.hovered == next {
            return false;
        }
        self.hovered = next;
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.hovered = None;
    }

    /// Drill one level down when the selected node has navigable children.
    pub fn navigate_to_children(&mut self, tree: &SchemaNode) -> bool {
        let has_children = self
            .selected
            .as_ref()
            .and_then(|s| schema_path(tree, s))
            .and_then(|p| get_node(tree, &p))
            .map_or(false, SchemaNode::has_navigable_children);
        if !has_children {
            return false;
        }
        self.level += 1;
        self.clear_selection();
        tracing::debug!(level = self.level, "navigate to children");
        true
    }

    pub fn navigate_to_parent(&mut self) -> bool {
        if self.level == 0 {
            return false;
        }
        self.level -= 1;
        self.clear_selection();
        tracing::debug!(level = self.level, "navigate to parent");
        true
    }

    // ─── Pointer ──────────────────────────────────────────────────────────────

    /// The path a hover over `raw` would target. `direct` bypasses resolution.
    pub fn hover_target(&self, raw: &[usize], direct: bool) -> Path {
        if direct {
            raw.to_vec()
        } else {
            resolve_hover_target(self.selected_path(), raw)
        }
    }

    /// Update the hover highlight for a pointer over `raw`.
    pub fn hover(&mut self, tree: &impl NodeLookup, raw: &[usize], direct: bool) -> bool {
        let target = self.hover_target(raw, direct);
        let id = tree.id_at(&target);
        self.set_hovered_node(id.as_deref(), &target)
    }

    /// Single click: commit what hover would target.
    pub fn click(&mut self, tree: &impl NodeLookup, raw: &[usize], direct: bool) -> Option<SelectionPath> {
        let target = self.hover_target(raw, direct);
        self.commit(tree, target)
    }

    pub fn double_click(&mut self, tree: &impl NodeLookup, raw: &[usize]) -> Option<SelectionPath> {
        let target = resolve_double_click_target(self.selected_path(), raw)?;
        self.commit(tree, target)
    }

    fn commit(&mut self, tree: &impl NodeLookup, target: Path) -> Option<SelectionPath> {
        if !self.enabled || target.is_empty() {
            return None;
        }
        let id = tree.id_at(&target)?;
        self.level = target.len() - 1;
        self.select_node(&id, &target);
        self.selected.clone()
    }

    // ─── Keyboard navigation ──────────────────────────────────────────────────

    /// `Escape`: clear the selection, or climb a level when nothing is selected.
    pub fn escape(&mut self) -> bool {
        if self.selected.is_some() {
            self.clear_selection();
            true
        } else {
            self.navigate_to_parent()
        }
    }

    /// `Enter`: select the first navigable child of the selection.
    pub fn select_first_child(&mut self, tree: &SchemaNode) -> Option<SelectionPath> {
        let path = schema_path(tree, self.selected.as_ref()?)?;
        let node = get_node(tree, &path)?;
        let first = *node.navigable_child_indices().first()?;
        let child = node.child_node(first)?;
        let mut child_path = path;
        child_path.push(first);
        self.level = child_path.len() - 1;
        self.select_node(child.id(), &child_path);
        self.selected.clone()
    }

    /// `Shift+Enter`: select the parent of the selection. Top-level nodes
    /// have no selectable parent.
    pub fn select_parent(&mut self, tree: &SchemaNode) -> Option<SelectionPath> {
        let path = schema_path(tree, self.selected.as_ref()?)?;
        let parent_path = parent(&path).filter(|p| !p.is_empty())?.to_vec();
        let id = get_node(tree, &parent_path)?.id().to_string();
        self.level = parent_path.len() - 1;
        self.hovered = None;
        self.select_node(&id, &parent_path);
        self.selected.clone()
    }

    /// `Tab` / `Shift+Tab`: next or previous navigable sibling, wrapping.
    pub fn select_sibling(&mut self, tree: &SchemaNode, backwards: bool) -> Option<SelectionPath> {
        let path = schema_path(tree, self.selected.as_ref()?)?;
        let (&own, parent_path) = path.split_last()?;
        let siblings = get_node(tree, parent_path)?.navigable_child_indices();
        if siblings.len() < 2 {
            return None;
        }
        let pos = siblings.iter().position(|&i| i == own)?;
        let next = if backwards {
            siblings[(pos + siblings.len() - 1) % siblings.len()]
        } else {
            siblings[(pos + 1) % siblings.len()]
        };
        let mut next_path = parent_path.to_vec();
        next_path.push(next);
        let id = get_node(tree, &next_path)?.id().to_string();
        self.select_node(&id, &next_path);
        self.selected.clone()
    }

    // ─── Consistency ──────────────────────────────────────────────────────────

    /// Recompute selected/hovered paths by id after the tree changed. Entries
    /// whose id is gone are dropped.
    pub fn revalidate(&mut self, tree: &impl NodeLookup) {
        let refresh = |entry: Option<SelectionPath>| {
            entry.and_then(|s| {
                tree.path_of(&s.component_id)
                    .filter(|p| !p.is_empty())
                    .map(|path| SelectionPath::new(s.component_id, path))
            })
        };
        let before = self.selected.clone();
        self.selected = refresh(self.selected.take());
        self.hovered = refresh(self.hovered.take());
        if let Some(sel) = &self.selected {
            self.level = sel.path.len() - 1;
        }
        if before != self.selected {
            tracing::debug!(selected = ?self.selected, "selection revalidated");
        }
    }
}

/// Current schema path of a selection: found by id, falling back to the
/// recorded path when the id lookup fails but the path still names that id.
pub fn schema_path(tree: &SchemaNode, sel: &SelectionPath) -> Option<Path> {
    tree.path_of(&sel.component_id).or_else(|| {
        get_node(tree, &sel.path)
            .filter(|n| n.id() == sel.component_id)
            .map(|_| sel.path.clone())
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
                    { "id": "a0", "type": "span" },
                    "text",
                    { "id": "a2", "type": "span" }
                ]},
                { "id": "b", "type": "div" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn selectable_iff_path_matches_level() {
        let mut s = SelectionState::new(true);
        assert!(s.is_node_selectable(&[3]));
        assert!(!s.is_node_selectable(&[0, 1]));
        s.level = 1;
        assert!(s.is_node_selectable(&[0, 1]));
        assert!(!s.is_node_selectable(&[]));
    }

    #[test]
    fn disabled_state_ignores_selection() {
        let mut s = SelectionState::new(false);
        assert!(!s.select_node("a", &[0]));
        assert!(!s.set_hovered_node(Some("a"), &[0]));
        assert!(s.selected.is_none() && s.hovered.is_none());
    }

    #[test]
    fn drill_in_and_out() {
        let t = tree();
        let mut s = SelectionState::new(true);
        s.select_node("a", &[0]);
        assert!(s.navigate_to_children(&t));
        assert_eq!(s.level, 1);
        assert!(s.selected.is_none());
        s.select_node("a0", &[0, 0]);
        assert!(!s.navigate_to_children(&t));
        assert!(s.navigate_to_parent());
        assert_eq!(s.level, 0);
        assert!(!s.navigate_to_parent());
    }

    #[test]
    fn click_commits_hover_target() {
        let t = tree();
        let mut s = SelectionState::new(true);
        let sel = s.click(&t, &[0, 2], false).unwrap();
        assert_eq!(sel, SelectionPath::new("a", vec![0]));
        assert!(s.hover(&t, &[0, 2], false));
        assert_eq!(s.hovered, Some(SelectionPath::new("a2", vec![0, 2])));
        let direct = s.click(&t, &[0, 2], true).unwrap();
        assert_eq!(direct.component_id, "a2");
        assert_eq!(s.level, 1);
    }

    #[test]
    fn double_click_drills_one_level() {
        let t = tree();
        let mut s = SelectionState::new(true);
        s.select_node("a", &[0]);
        let sel = s.double_click(&t, &[0, 2]).unwrap();
        assert_eq!(sel.component_id, "a2");
        assert!(s.double_click(&t, &[0, 2]).is_none());
    }

    #[test]
    fn keyboard_navigation() {
        let t = tree();
        let mut s = SelectionState::new(true);
        s.select_node("a", &[0]);
        assert_eq!(s.select_first_child(&t).unwrap().component_id, "a0");
        assert_eq!(s.level, 1);
        // text entry at index 1 is skipped
        assert_eq!(s.select_sibling(&t, false).unwrap().path, vec![0, 2]);
        assert_eq!(s.select_sibling(&t, false).unwrap().path, vec![0, 0]);
        assert_eq!(s.select_sibling(&t, true).unwrap().path, vec![0, 2]);
        assert_eq!(s.select_parent(&t).unwrap().component_id, "a");
        assert_eq!(s.level, 0);
        assert!(s.select_parent(&t).is_none());
        assert!(s.escape());
        assert!(s.selected.is_none());
    }

    #[test]
    fn revalidate_follows_ids() {
        let mut t = tree();
        let mut s = SelectionState::new(true);
        s.select_node("b", &[1]);
        s.set_hovered_node(Some("a2"), &[0, 2]);
        t.element_mut().child_items_mut().remove(0);
        s.revalidate(&t);
        assert_eq!(s.selected, Some(SelectionPath::new("b", vec![0])));
        assert!(s.hovered.is_none());
    }
}
