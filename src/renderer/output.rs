//! Materialized output tree produced by the renderer.
//!
//! Every node carries the path it was rendered at. Paths are positions in
//! this tree, not indices into the schema once loops are involved.

use crate::schema::LinkTo;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutputNode {
    Text { text: String },
    Element(OutputElement),
    Loop(LoopOutput),
    RenderError(RenderErrorNode),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputElement {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Set when the schema type was unknown and fell back to `container`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub path: Vec<usize>,
    pub props: BTreeMap<String, Value>,
    pub children: Vec<OutputNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<PendingLink>,
}

/// A `link-to` left unresolved until click time, with the context it was
/// rendered in.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PendingLink {
    pub target: LinkTo,
    #[serde(skip)]
    pub context: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoopOutput {
    pub id: String,
    pub path: Vec<usize>,
    pub iterations: Vec<LoopIteration>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoopIteration {
    pub key: String,
    pub index: usize,
    /// `None` when the iteration body rendered nothing.
    pub node: Option<Box<OutputNode>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderErrorNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub path: Vec<usize>,
    pub message: String,
}

impl OutputNode {
    pub fn text(text: impl Into<String>) -> Self {
        OutputNode::Text { text: text.into() }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            OutputNode::Text { .. } => None,
            OutputNode::Element(e) => Some(&e.id),
            OutputNode::Loop(l) => Some(&l.id),
            OutputNode::RenderError(r) => Some(&r.id),
        }
    }

    pub fn path(&self) -> Option<&[usize]> {
        match self {
            OutputNode::Text { .. } => None,
            OutputNode::Element(e) => Some(&e.path),
            OutputNode::Loop(l) => Some(&l.path),
            OutputNode::RenderError(r) => Some(&r.path),
        }
    }

    pub fn as_element(&self) -> Option<&OutputElement> {
        match self {
            OutputNode::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Nodes one level down: element children or loop iteration bodies.
    pub fn children(&self) -> Vec<&OutputNode> {
        match self {
            OutputNode::Element(e) => e.children.iter().collect(),
            OutputNode::Loop(l) => l.iterations.iter().filter_map(|it| it.node.as_deref()).collect(),
            _ => Vec::new(),
        }
    }

    /// Depth-first search for the node rendered at `path`.
    pub fn find_by_path(&self, path: &[usize]) -> Option<&OutputNode> {
        if self.path() == Some(path) {
            return Some(self);
        }
        // a loop shares its path with nothing below it, so prefix pruning holds
        if let Some(own) = self.path() {
            if !path.starts_with(own) {
                return None;
            }
        }
        self.children().into_iter().find_map(|c| c.find_by_path(path))
    }

    /// Depth-first search for the first node with `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&OutputNode> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children().into_iter().find_map(|c| c.find_by_id(id))
    }

    /// All text under this node, concatenated in order.
    pub fn text_content(&self) -> String {
        match self {
            OutputNode::Text { text } => text.clone(),
            other => other.children().iter().map(|c| c.text_content()).collect(),
        }
    }
}
