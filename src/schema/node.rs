use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ─── Binding forms ────────────────────────────────────────────────────────────

/// `{ "$exp": "count * 2" }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRef {
    #[serde(rename = "$exp")]
    pub exp: String,
}

/// `{ "$bind": "user.name", "$transform": ["upper"] }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindingRef {
    #[serde(rename = "$bind")]
    pub bind: String,
    #[serde(
        rename = "$transform",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub transform: Vec<String>,
}

fn one_or_many<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(d)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

/// A prop value: an Expression object, a Binding object, or a literal
/// (strings may carry `${...}` / `{{...}}` interpolation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Expression(ExpressionRef),
    Binding(BindingRef),
    Literal(Value),
}

impl PropValue {
    pub fn literal(v: impl Into<Value>) -> Self {
        PropValue::Literal(v.into())
    }
}

// ─── Directives ───────────────────────────────────────────────────────────────

/// Source of a `for` loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForSource {
    Expression(ExpressionRef),
    Binding(BindingRef),
    /// Dot path into the context, e.g. `"data.items"`.
    Path(String),
}

impl ForSource {
    /// Identity used by the self-recursion guard.
    pub fn identity(&self) -> String {
        match self {
            ForSource::Expression(e) => format!("$exp:{}", e.exp.trim()),
            ForSource::Binding(b) => b.bind.trim().to_string(),
            ForSource::Path(p) => p.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForDirective {
    #[serde(rename = "in")]
    pub source: ForSource,
    #[serde(rename = "as")]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PropValue>,
}

/// `else`: either a flag or a full node rendered in place of the element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElseBranch {
    Flag(bool),
    Node(Box<SchemaNode>),
}

/// Navigation target, resolved when the element is clicked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkTo {
    Expression(ExpressionRef),
    Binding(BindingRef),
    Target {
        ui: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Map<String, Value>>,
    },
    Path(String),
}

// ─── Children ─────────────────────────────────────────────────────────────────

/// One entry of a `children` list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildItem {
    Text(String),
    Expression(ExpressionRef),
    Binding(BindingRef),
    Node(SchemaNode),
    /// Scalars render as text; anything else failed to parse as a node and
    /// is skipped at render time.
    Other(Value),
}

impl ChildItem {
    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            ChildItem::Node(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut SchemaNode> {
        match self {
            ChildItem::Node(n) => Some(n),
            _ => None,
        }
    }
}

/// `children` accepts a single entry or a list; it is always held as a list.
fn children_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<ChildItem>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<ChildItem>),
        One(ChildItem),
    }
    Ok(match Option::<OneOrMany>::deserialize(d)? {
        None => None,
        Some(OneOrMany::Many(items)) => Some(items),
        Some(OneOrMany::One(item)) => Some(vec![item]),
    })
}

// ─── Nodes ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, PropValue>,
    #[serde(
        default,
        deserialize_with = "children_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub children: Option<Vec<ChildItem>>,
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<PropValue>,
    #[serde(rename = "elseIf", default, skip_serializing_if = "Option::is_none")]
    pub else_if: Option<PropValue>,
    #[serde(rename = "else", default, skip_serializing_if = "Option::is_none")]
    pub else_branch: Option<ElseBranch>,
    #[serde(rename = "for", default, skip_serializing_if = "Option::is_none")]
    pub for_each: Option<ForDirective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<PropValue>,
    #[serde(rename = "link-to", default, skip_serializing_if = "Option::is_none")]
    pub link_to: Option<LinkTo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<BTreeMap<String, Value>>,
}

impl Element {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Element {
            id: id.into(),
            node_type: node_type.into(),
            props: BTreeMap::new(),
            children: None,
            condition: None,
            else_if: None,
            else_branch: None,
            for_each: None,
            key: None,
            link_to: None,
            platform: None,
        }
    }

    pub fn with_prop(mut self, name: &str, value: PropValue) -> Self {
        self.props.insert(name.to_string(), value);
        self
    }

    pub fn with_children(mut self, children: Vec<ChildItem>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn child_items(&self) -> &[ChildItem] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn child_items_mut(&mut self) -> &mut Vec<ChildItem> {
        self.children.get_or_insert_with(Vec::new)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub states: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effects: Option<Vec<Value>>,
    pub render: Element,
}

/// A schema node. Serialized with an explicit `kind` tag; on input a
/// missing tag is inferred (`render` present means component).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchemaNode {
    Component(Component),
    Element(Element),
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(d)?;
        if !raw.is_object() {
            return Err(D::Error::custom("schema node must be an object"));
        }
        let kind = match raw.get("kind").and_then(Value::as_str) {
            Some(k) => k.to_string(),
            None if raw.get("render").is_some() => "component".to_string(),
            None => "element".to_string(),
        };
        match kind.as_str() {
            "component" => serde_json::from_value(raw)
                .map(SchemaNode::Component)
                .map_err(D::Error::custom),
            "element" => serde_json::from_value(raw)
                .map(SchemaNode::Element)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(format!("unknown node kind '{}'", other))),
        }
    }
}

impl SchemaNode {
    pub fn id(&self) -> &str {
        match self {
            SchemaNode::Component(c) => &c.id,
            SchemaNode::Element(e) => &e.id,
        }
    }

    pub fn set_id(&mut self, id: String) {
        match self {
            SchemaNode::Component(c) => c.id = id,
            SchemaNode::Element(e) => e.id = id,
        }
    }

    /// The displayable element: the element itself or a component's `render`.
    pub fn element(&self) -> &Element {
        match self {
            SchemaNode::Component(c) => &c.render,
            SchemaNode::Element(e) => e,
        }
    }

    pub fn element_mut(&mut self) -> &mut Element {
        match self {
            SchemaNode::Component(c) => &mut c.render,
            SchemaNode::Element(e) => e,
        }
    }

    pub fn node_type(&self) -> &str {
        &self.element().node_type
    }

    pub fn child_items(&self) -> &[ChildItem] {
        self.element().child_items()
    }

    pub fn child_node(&self, index: usize) -> Option<&SchemaNode> {
        self.child_items().get(index).and_then(ChildItem::as_node)
    }

    /// Indices of children that are nodes (text and bindings are not
    /// selectable).
    pub fn navigable_child_indices(&self) -> Vec<usize> {
        self.child_items()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.as_node().is_some())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_navigable_children(&self) -> bool {
        self.child_items().iter().any(|c| c.as_node().is_some())
    }

    /// Number of nodes in this subtree, this node included.
    pub fn descendant_count(&self) -> usize {
        1 + self
            .child_items()
            .iter()
            .filter_map(ChildItem::as_node)
            .map(SchemaNode::descendant_count)
            .sum::<usize>()
    }
}

impl From<Element> for SchemaNode {
    fn from(e: Element) -> Self {
        SchemaNode::Element(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_is_inferred_from_shape() {
        let comp: SchemaNode = serde_json::from_value(json!({
            "id": "card",
            "render": { "id": "root", "type": "div" }
        }))
        .unwrap();
        assert!(matches!(comp, SchemaNode::Component(_)));
        assert_eq!(comp.node_type(), "div");

        let el: SchemaNode = serde_json::from_value(json!({ "id": "b", "type": "button" })).unwrap();
        assert!(matches!(el, SchemaNode::Element(_)));
    }

    #[test]
    fn serialization_writes_kind_tag() {
        let el = SchemaNode::Element(Element::new("x", "text"));
        let v = serde_json::to_value(&el).unwrap();
        assert_eq!(v["kind"], json!("element"));
        assert_eq!(v["type"], json!("text"));
    }

    #[test]
    fn prop_value_forms() {
        let el: Element = serde_json::from_value(json!({
            "id": "t",
            "type": "text",
            "props": {
                "a": { "$exp": "1 + 1" },
                "b": { "$bind": "user.name", "$transform": "upper" },
                "c": "Hello {{name}}",
                "d": 4
            }
        }))
        .unwrap();
        assert!(matches!(el.props["a"], PropValue::Expression(_)));
        match &el.props["b"] {
            PropValue::Binding(b) => assert_eq!(b.transform, vec!["upper".to_string()]),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(el.props["c"], PropValue::literal("Hello {{name}}"));
        assert_eq!(el.props["d"], PropValue::literal(4));
    }

    #[test]
    fn malformed_children_do_not_poison_siblings() {
        let el: Element = serde_json::from_value(json!({
            "id": "list",
            "type": "div",
            "children": [
                { "id": "ok", "type": "text" },
                { "id": "broken" },
                "plain text",
                { "$exp": "count" }
            ]
        }))
        .unwrap();
        let items = el.child_items();
        assert!(matches!(items[0], ChildItem::Node(_)));
        assert!(matches!(items[1], ChildItem::Other(_)));
        assert!(matches!(items[2], ChildItem::Text(_)));
        assert!(matches!(items[3], ChildItem::Expression(_)));
    }

    #[test]
    fn single_child_is_held_as_list() {
        let mut el: Element = serde_json::from_value(json!({
            "id": "wrap",
            "type": "div",
            "children": { "id": "only", "type": "span" }
        }))
        .unwrap();
        assert_eq!(el.child_items().len(), 1);
        el.child_items_mut().push(ChildItem::Text("tail".into()));
        assert_eq!(el.child_items().len(), 2);
    }

    #[test]
    fn directives_parse() {
        let el: Element = serde_json::from_value(json!({
            "id": "row",
            "type": "li",
            "for": { "in": "data.items", "as": "item", "index": "i" },
            "if": { "$exp": "item.visible" },
            "else": { "id": "empty", "type": "text" },
            "link-to": { "ui": "details", "params": { "id": "{{item.id}}" } }
        }))
        .unwrap();
        let f = el.for_each.as_ref().unwrap();
        assert_eq!(f.source, ForSource::Path("data.items".into()));
        assert_eq!(f.alias, "item");
        assert!(matches!(el.else_branch, Some(ElseBranch::Node(_))));
        assert!(matches!(el.link_to, Some(LinkTo::Target { .. })));
    }
}
