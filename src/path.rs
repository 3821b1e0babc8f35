//! Index-path addressing. `[]` is the root; each index selects an entry of
//! the (normalized) `children` list one level down. Components are walked
//! through their `render` element.

use crate::renderer::OutputNode;
use crate::schema::{ChildItem, SchemaNode};

pub type Path = Vec<usize>;

pub fn get_node<'a>(root: &'a SchemaNode, path: &[usize]) -> Option<&'a SchemaNode> {
    let mut current = root;
    for &idx in path {
        current = current.child_items().get(idx)?.as_node()?;
    }
    Some(current)
}

pub fn get_node_mut<'a>(root: &'a mut SchemaNode, path: &[usize]) -> Option<&'a mut SchemaNode> {
    let mut current = root;
    for &idx in path {
        current = current
            .element_mut()
            .children
            .as_mut()?
            .get_mut(idx)?
            .as_node_mut()?;
    }
    Some(current)
}

/// Parent path, or `None` for the root.
pub fn parent(path: &[usize]) -> Option<&[usize]> {
    path.split_last().map(|(_, rest)| rest)
}

/// Length of the shared prefix of two paths.
pub fn common_prefix_len(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// `ancestor` is a strict prefix of `path`.
pub fn is_ancestor(ancestor: &[usize], path: &[usize]) -> bool {
    ancestor.len() < path.len() && path.starts_with(ancestor)
}

/// Trees that can be searched by node id and by path.
pub trait NodeLookup {
    fn path_of(&self, id: &str) -> Option<Path>;
    fn id_at(&self, path: &[usize]) -> Option<String>;
}

impl NodeLookup for SchemaNode {
    fn path_of(&self, id: &str) -> Option<Path> {
        fn walk(node: &SchemaNode, id: &str, path: &mut Path) -> bool {
            if node.id() == id {
                return true;
            }
            for (i, child) in node.child_items().iter().enumerate() {
                if let ChildItem::Node(child) = child {
                    path.push(i);
                    if walk(child, id, path) {
                        return true;
                    }
                    path.pop();
                }
            }
            false
        }
        let mut path = Vec::new();
        walk(self, id, &mut path).then_some(path)
    }

    fn id_at(&self, path: &[usize]) -> Option<String> {
        get_node(self, path).map(|n| n.id().to_string())
    }
}

impl NodeLookup for OutputNode {
    fn path_of(&self, id: &str) -> Option<Path> {
        self.find_by_id(id).and_then(|n| n.path()).map(<[usize]>::to_vec)
    }

    fn id_at(&self, path: &[usize]) -> Option<String> {
        self.find_by_path(path).and_then(|n| n.id()).map(str::to_string)
    }
}
