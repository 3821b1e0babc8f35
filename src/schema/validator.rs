/// Schema validator: produces diagnostics from raw schema JSON.
///
/// Checks performed per node:
/// 1. Node is an object with a known `kind` (if present)
/// 2. Elements carry a non-empty `type`; components carry a `render` element
/// 3. `props` is an object and every `$exp` parses
/// 4. `for` has `in` and `as`
/// 5. `children` entries are strings, nodes, Expressions or Bindings
///
/// Diagnostics never stop the walk; the renderer skips what it cannot use.
use crate::dsl::parser;
use serde_json::{Map, Value};

// ─── Diagnostic ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    /// JSON pointer to the offending value, e.g. `/render/children/2`.
    pub location: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let at = if self.location.is_empty() { "/" } else { &self.location };
        write!(f, "{} (at {})", self.message, at)
    }
}

// ─── Public entry point ───────────────────────────────────────────────────────

/// Validate a schema tree. An empty result means the schema is valid.
pub fn validate(schema: &Value) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    check_node(schema, "", &mut diags);
    diags
}

// ─── Checks ───────────────────────────────────────────────────────────────────

fn push(diags: &mut Vec<Diagnostic>, at: &str, message: impl Into<String>) {
    diags.push(Diagnostic {
        message: message.into(),
        location: at.to_string(),
    });
}

fn check_node(node: &Value, at: &str, diags: &mut Vec<Diagnostic>) {
    let obj = match node.as_object() {
        Some(o) => o,
        None => {
            push(diags, at, "Schema node must be an object");
            return;
        }
    };

    let is_component = match obj.get("kind") {
        None => obj.contains_key("render"),
        Some(Value::String(k)) if k == "component" => true,
        Some(Value::String(k)) if k == "element" => false,
        Some(other) => {
            push(diags, at, format!("Unknown node kind {}", other));
            return;
        }
    };

    if is_component {
        match obj.get("render") {
            Some(render @ Value::Object(_)) => {
                check_element(render, &format!("{}/render", at), diags)
            }
            Some(_) => push(diags, at, "Component `render` must be an element object"),
            None => push(diags, at, "Component is missing `render`"),
        }
        if let Some(props) = obj.get("props") {
            if !props.is_object() {
                push(diags, &format!("{}/props", at), "`props` must be an object");
            }
        }
    } else {
        check_element(node, at, diags);
    }
}

fn check_element(node: &Value, at: &str, diags: &mut Vec<Diagnostic>) {
    let obj = match node.as_object() {
        Some(o) => o,
        None => {
            push(diags, at, "Element must be an object");
            return;
        }
    };

    match obj.get("type") {
        Some(Value::String(t)) if !t.trim().is_empty() => {}
        Some(Value::String(_)) => push(diags, at, "Element `type` must not be empty"),
        Some(_) => push(diags, at, "Element `type` must be a string"),
        None => push(diags, at, "Element is missing `type`"),
    }

    match obj.get("props") {
        None => {}
        Some(Value::Object(props)) => {
            for (name, value) in props {
                check_value(value, &format!("{}/props/{}", at, name), diags);
            }
        }
        Some(_) => push(diags, &format!("{}/props", at), "`props` must be an object"),
    }

    for directive in ["if", "elseIf", "key"] {
        if let Some(v) = obj.get(directive) {
            check_value(v, &format!("{}/{}", at, directive), diags);
        }
    }

    if let Some(v) = obj.get("else") {
        if !v.is_boolean() {
            check_node(v, &format!("{}/else", at), diags);
        }
    }

    if let Some(f) = obj.get("for") {
        check_for(f, &format!("{}/for", at), diags);
    }

    if let Some(children) = obj.get("children") {
        let base = format!("{}/children", at);
        match children {
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_child(item, &format!("{}/{}", base, i), diags);
                }
            }
            other => check_child(other, &base, diags),
        }
    }
}

fn check_for(f: &Value, at: &str, diags: &mut Vec<Diagnostic>) {
    let obj = match f.as_object() {
        Some(o) => o,
        None => {
            push(diags, at, "`for` must be an object");
            return;
        }
    };
    match obj.get("in") {
        Some(Value::String(_)) => {}
        Some(v @ Value::Object(_)) if is_binding_form(v) => {
            check_value(v, &format!("{}/in", at), diags)
        }
        Some(_) => push(diags, at, "`for.in` must be a path, Expression or Binding"),
        None => push(diags, at, "`for` is missing `in`"),
    }
    match obj.get("as") {
        Some(Value::String(s)) if !s.is_empty() => {}
        _ => push(diags, at, "`for` is missing `as`"),
    }
}

fn check_child(item: &Value, at: &str, diags: &mut Vec<Diagnostic>) {
    match item {
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => {}
        Value::Object(_) if is_binding_form(item) => check_value(item, at, diags),
        Value::Object(_) => check_node(item, at, diags),
        Value::Array(_) => push(diags, at, "Nested child arrays are not supported"),
    }
}

fn is_binding_form(v: &Value) -> bool {
    v.get("$exp").is_some() || v.get("$bind").is_some()
}

/// Check an Expression or Binding object; other literals are always valid.
fn check_value(v: &Value, at: &str, diags: &mut Vec<Diagnostic>) {
    let obj: &Map<String, Value> = match v.as_object() {
        Some(o) => o,
        None => return,
    };
    if let Some(exp) = obj.get("$exp") {
        match exp.as_str() {
            Some(src) => {
                if let Err(e) = parser::parse(src) {
                    push(diags, at, format!("Invalid expression '{}': {}", src, e));
                }
            }
            None => push(diags, at, "`$exp` must be a string"),
        }
    } else if let Some(bind) = obj.get("$bind") {
        if !bind.is_string() {
            push(diags, at, "`$bind` must be a string");
        }
        match obj.get("$transform") {
            None | Some(Value::String(_)) => {}
            Some(Value::Array(names)) if names.iter().all(Value::is_string) => {}
            Some(_) => push(diags, at, "`$transform` must be a name or a list of names"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_schema_has_no_diagnostics() {
        let schema = json!({
            "kind": "component",
            "id": "card",
            "render": {
                "id": "root",
                "type": "div",
                "props": { "title": { "$exp": "user.name" } },
                "children": [
                    "text",
                    { "id": "row", "type": "li", "for": { "in": "items", "as": "item" } },
                    { "$bind": "user.email", "$transform": ["lower"] }
                ]
            }
        });
        assert!(validate(&schema).is_empty());
    }

    #[test]
    fn missing_type_is_located() {
        let schema = json!({
            "id": "root",
            "type": "div",
            "children": [{ "id": "ok", "type": "span" }, { "id": "bad" }]
        });
        let diags = validate(&schema);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].location, "/children/1");
        assert!(diags[0].message.contains("missing `type`"));
    }

    #[test]
    fn bad_expression_and_for_are_reported() {
        let schema = json!({
            "id": "root",
            "type": "div",
            "if": { "$exp": "a +" },
            "for": { "as": "x" }
        });
        let diags = validate(&schema);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().any(|d| d.location == "/if"));
        assert!(diags.iter().any(|d| d.location == "/for"));
    }

    #[test]
    fn unknown_kind_is_reported() {
        let diags = validate(&json!({ "kind": "widget", "type": "div" }));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].to_string(), "Unknown node kind \"widget\" (at /)");
    }
}
