/// Tree renderer: walks a schema and produces the materialized output tree.
///
/// Per node, in order:
/// 1. Component → its `render` element with component defaults layered
///    under the context
/// 2. `platform` override for the active surface
/// 3. `if` / `elseIf` / `else`
/// 4. `for` expansion
/// 5. props and children
///
/// Failures in 2–5 become [`OutputNode::RenderError`] placeholders; the rest
/// of the tree keeps rendering.
pub mod actions;
pub mod output;
pub mod platform;

pub use actions::{trigger, ActionHandlers, Navigation, Navigator, Triggered};
pub use output::{LoopIteration, LoopOutput, OutputElement, OutputNode, PendingLink, RenderErrorNode};

use crate::dsl::binding::{resolve_binding, resolve_value};
use crate::dsl::value::to_text;
use crate::dsl::{evaluate, TransformRegistry};
use crate::logics::{iteration_context, iteration_key, resolve_items, select_branch, Branch, LoopItems};
use crate::schema::{ChildItem, Component, Element, PropValue, SchemaNode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

// ─── Config ───────────────────────────────────────────────────────────────────

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The generic type unknown element types fall back to.
pub const FALLBACK_TYPE: &str = "container";

fn default_known_types() -> Vec<String> {
    [
        "container", "view", "div", "section", "header", "footer", "row", "column", "stack",
        "text", "span", "heading", "paragraph", "label", "link", "button", "image", "icon",
        "input", "textarea", "select", "checkbox", "switch", "list", "ul", "ol", "li", "card",
        "divider", "spacer", "form", "modal", "tabs", "tab", "grid", "table",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    /// Active surface for `platform` overrides.
    pub platform: Option<String>,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Element types rendered as-is. Empty accepts every type.
    #[serde(default = "default_known_types")]
    pub known_types: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            platform: None,
            max_depth: DEFAULT_MAX_DEPTH,
            known_types: default_known_types(),
        }
    }
}

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("maximum render depth of {0} exceeded")]
    DepthExceeded(usize),
    #[error("platform override failed: {0}")]
    Platform(String),
}

// ─── Context ──────────────────────────────────────────────────────────────────

/// Data visible while rendering one subtree.
#[derive(Clone, Debug)]
pub struct RenderContext {
    pub data: Value,
    /// `for.in` sources of the loops currently being expanded.
    pub iteration_path: Vec<String>,
    pub depth: usize,
}

impl RenderContext {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            iteration_path: Vec::new(),
            depth: 0,
        }
    }

    fn descend(&self) -> Self {
        Self {
            data: self.data.clone(),
            iteration_path: self.iteration_path.clone(),
            depth: self.depth + 1,
        }
    }

    fn with_data(&self, data: Value) -> Self {
        Self {
            data,
            iteration_path: self.iteration_path.clone(),
            depth: self.depth,
        }
    }
}

/// Layer a component's `data` / `props` / `states` defaults under `context`.
/// Context keys win; when both sides are objects they merge one level deep.
fn component_context(component: &Component, context: &Value) -> Value {
    let mut merged = match context {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    let defaults = [
        ("data", component.data.clone()),
        ("props", component.props.clone().map(Value::Object)),
        ("states", component.states.clone()),
    ];
    for (name, default) in defaults {
        let Some(default) = default else { continue };
        match (merged.get_mut(name), default) {
            (None, d) => {
                merged.insert(name.to_string(), d);
            }
            (Some(Value::Object(existing)), Value::Object(d)) => {
                for (k, v) in d {
                    existing.entry(k).or_insert(v);
                }
            }
            (Some(_), _) => {}
        }
    }
    Value::Object(merged)
}

// ─── Renderer ─────────────────────────────────────────────────────────────────

pub struct Renderer<'a> {
    config: &'a RenderConfig,
    transforms: &'a TransformRegistry,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &'a RenderConfig, transforms: &'a TransformRegistry) -> Self {
        Self { config, transforms }
    }

    /// Render a whole tree against `context`.
    pub fn render(&self, root: &SchemaNode, context: &Value) -> Option<OutputNode> {
        self.render_node(root, &RenderContext::new(context.clone()), &[])
    }

    pub fn render_node(&self, node: &SchemaNode, ctx: &RenderContext, path: &[usize]) -> Option<OutputNode> {
        match node {
            SchemaNode::Component(component) => {
                let data = component_context(component, &ctx.data);
                let inner = ctx.with_data(data);
                self.render_element(&component.render, Some(&component.id), &inner, path)
            }
            SchemaNode::Element(element) => self.render_element(element, None, ctx, path),
        }
    }

    /// Render one entry of a `children` list.
    pub fn render_child(&self, item: &ChildItem, ctx: &RenderContext, path: &[usize]) -> Option<OutputNode> {
        match item {
            ChildItem::Text(s) => {
                let text = resolve_value(&PropValue::literal(s.as_str()), &ctx.data, self.transforms);
                Some(OutputNode::text(to_text(text.as_ref())))
            }
            ChildItem::Expression(e) => Some(OutputNode::text(to_text(evaluate(&e.exp, &ctx.data).as_ref()))),
            ChildItem::Binding(b) => Some(OutputNode::text(to_text(
                resolve_binding(b, &ctx.data, self.transforms).as_ref(),
            ))),
            ChildItem::Node(node) => self.render_node(node, ctx, path),
            ChildItem::Other(Value::Null) => None,
            ChildItem::Other(v @ (Value::Number(_) | Value::Bool(_))) => {
                Some(OutputNode::text(to_text(Some(v))))
            }
            ChildItem::Other(v) => {
                tracing::warn!(path = ?path, entry = %v, "skipping invalid child entry");
                None
            }
        }
    }

    fn render_element(
        &self,
        element: &Element,
        id_override: Option<&str>,
        ctx: &RenderContext,
        path: &[usize],
    ) -> Option<OutputNode> {
        let id = id_override.unwrap_or(&element.id);
        if element.node_type.trim().is_empty() {
            tracing::warn!(id = %id, path = ?path, "element has no type, skipped");
            return None;
        }
        match self.try_render_element(element, id, ctx, path) {
            Ok(out) => out,
            Err(err) => {
                tracing::warn!(id = %id, node_type = %element.node_type, error = %err, "render failed");
                Some(OutputNode::RenderError(RenderErrorNode {
                    id: id.to_string(),
                    node_type: element.node_type.clone(),
                    path: path.to_vec(),
                    message: err.to_string(),
                }))
            }
        }
    }

    fn try_render_element(
        &self,
        element: &Element,
        id: &str,
        ctx: &RenderContext,
        path: &[usize],
    ) -> Result<Option<OutputNode>, RenderError> {
        if ctx.depth >= self.config.max_depth {
            return Err(RenderError::DepthExceeded(self.config.max_depth));
        }

        let element = platform::apply_platform(element, self.config.platform.as_deref())?;

        match select_branch(&element, &ctx.data, self.transforms) {
            Branch::Render => {}
            Branch::Else(node) => return Ok(self.render_node(node, &ctx.descend(), path)),
            Branch::Nothing => return Ok(None),
        }

        if element.for_each.is_some() {
            return Ok(Some(self.render_loop(&element, id, ctx, path)));
        }

        Ok(Some(OutputNode::Element(self.render_plain(&element, id, ctx, path))))
    }

    fn render_loop(&self, element: &Element, id: &str, ctx: &RenderContext, path: &[usize]) -> OutputNode {
        let mut out = LoopOutput {
            id: id.to_string(),
            path: path.to_vec(),
            iterations: Vec::new(),
        };
        let Some(directive) = element.for_each.as_ref() else {
            return OutputNode::Loop(out);
        };

        let identity = directive.source.identity();
        if ctx.iteration_path.contains(&identity) {
            tracing::warn!(id = %id, source = %identity, "loop re-entered on an active source, skipped");
            return OutputNode::Loop(out);
        }

        let items = match resolve_items(&directive.source, &ctx.data, self.transforms) {
            LoopItems::Items(items) => items,
            LoopItems::NotIterable(found) => {
                tracing::warn!(id = %id, source = %identity, found, "loop source is not iterable");
                return OutputNode::Loop(out);
            }
        };

        // a single typed child is the per-item template; otherwise the
        // element itself repeats, minus the directives already applied
        let template: Option<&SchemaNode> = match element.child_items() {
            [ChildItem::Node(node)] => Some(node),
            _ => None,
        };
        let mut body = element.clone();
        body.for_each = None;
        body.condition = None;
        body.else_if = None;
        body.else_branch = None;
        body.id = id.to_string();
        let body = SchemaNode::Element(body);

        let mut inner = ctx.descend();
        inner.iteration_path.push(identity);

        for (index, item) in items.into_iter().enumerate() {
            let data = iteration_context(&ctx.data, directive, item, index);
            let key = iteration_key(element, id, directive, &data, self.transforms, index);
            let iter_ctx = inner.with_data(data);
            let mut item_path = path.to_vec();
            item_path.push(index);
            let node = self.render_node(template.unwrap_or(&body), &iter_ctx, &item_path);
            out.iterations.push(LoopIteration {
                key,
                index,
                node: node.map(Box::new),
            });
        }
        OutputNode::Loop(out)
    }

    fn render_plain(&self, element: &Element, id: &str, ctx: &RenderContext, path: &[usize]) -> OutputElement {
        let (node_type, original_type) = self.effective_type(&element.node_type);

        let mut props = BTreeMap::new();
        for (name, value) in &element.props {
            if let Some(resolved) = resolve_value(value, &ctx.data, self.transforms) {
                props.insert(name.clone(), resolved);
            }
        }

        let key = element
            .key
            .as_ref()
            .map(|k| to_text(resolve_value(k, &ctx.data, self.transforms).as_ref()))
            .filter(|k| !k.is_empty());

        let child_ctx = ctx.descend();
        let mut children = Vec::new();
        for (index, item) in element.child_items().iter().enumerate() {
            let mut child_path = path.to_vec();
            child_path.push(index);
            if let Some(child) = self.render_child(item, &child_ctx, &child_path) {
                children.push(child);
            }
        }

        OutputElement {
            id: id.to_string(),
            node_type,
            original_type,
            key,
            path: path.to_vec(),
            props,
            children,
            link: element.link_to.clone().map(|target| PendingLink {
                target,
                context: ctx.data.clone(),
            }),
        }
    }

    fn effective_type(&self, node_type: &str) -> (String, Option<String>) {
        let known = &self.config.known_types;
        if known.is_empty() || known.iter().any(|t| t == node_type) {
            (node_type.to_string(), None)
        } else {
            tracing::debug!(node_type, "unknown element type, using {}", FALLBACK_TYPE);
            (FALLBACK_TYPE.to_string(), Some(node_type.to_string()))
        }
    }
}

/// Render `root` with a default renderer.
pub fn render(root: &SchemaNode, context: &Value, config: &RenderConfig, transforms: &TransformRegistry) -> Option<OutputNode> {
    Renderer::new(config, transforms).render(root, context)
}
