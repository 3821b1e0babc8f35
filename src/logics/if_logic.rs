use crate::dsl::binding::resolve_value;
use crate::dsl::value::is_truthy;
use crate::dsl::TransformRegistry;
use crate::schema::{Element, ElseBranch, PropValue, SchemaNode};
use serde_json::Value;

/// Outcome of the `if` / `elseIf` / `else` chain on one element.
#[derive(Debug)]
pub enum Branch<'a> {
    /// Render the element itself.
    Render,
    /// Render this node in place of the element.
    Else(&'a SchemaNode),
    Nothing,
}

/// Condition truthiness. Besides the usual falsy values, the strings
/// `"false"`, `"0"`, `"null"` and `"undefined"` count as false so that
/// interpolated conditions behave like their unquoted form.
pub fn condition_holds(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(s)) => {
            let t = s.trim();
            !matches!(t, "" | "false" | "0" | "null" | "undefined")
        }
        other => is_truthy(other),
    }
}

fn check(cond: &PropValue, context: &Value, transforms: &TransformRegistry) -> bool {
    condition_holds(resolve_value(cond, context, transforms).as_ref())
}

/// Evaluate the chain top to bottom. Without an `if` the element renders
/// unconditionally; `elseIf` is only consulted once `if` has failed.
pub fn select_branch<'a>(
    element: &'a Element,
    context: &Value,
    transforms: &TransformRegistry,
) -> Branch<'a> {
    let Some(condition) = &element.condition else {
        return Branch::Render;
    };
    if check(condition, context, transforms) {
        return Branch::Render;
    }
    if let Some(else_if) = &element.else_if {
        if check(else_if, context, transforms) {
            return Branch::Render;
        }
    }
    match &element.else_branch {
        Some(ElseBranch::Node(node)) => Branch::Else(node),
        Some(ElseBranch::Flag(_)) | None => Branch::Nothing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn el(v: Value) -> Element {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn string_conditions() {
        assert!(!condition_holds(Some(&json!("false"))));
        assert!(!condition_holds(Some(&json!(" 0 "))));
        assert!(!condition_holds(None));
        assert!(condition_holds(Some(&json!("yes"))));
        assert!(condition_holds(Some(&json!([]))));
    }

    #[test]
    fn chain_order() {
        let reg = TransformRegistry::new();
        let e = el(json!({
            "id": "x",
            "type": "div",
            "if": { "$exp": "n > 5" },
            "elseIf": { "$exp": "n > 2" },
            "else": { "id": "fallback", "type": "text" }
        }));
        assert!(matches!(select_branch(&e, &json!({ "n": 9 }), &reg), Branch::Render));
        assert!(matches!(select_branch(&e, &json!({ "n": 3 }), &reg), Branch::Render));
        match select_branch(&e, &json!({ "n": 1 }), &reg) {
            Branch::Else(node) => assert_eq!(node.id(), "fallback"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn else_flag_renders_nothing() {
        let reg = TransformRegistry::new();
        let e = el(json!({ "id": "x", "type": "div", "if": "{{flag}}", "else": true }));
        assert!(matches!(select_branch(&e, &json!({ "flag": false }), &reg), Branch::Nothing));
        assert!(matches!(select_branch(&e, &json!({ "flag": true }), &reg), Branch::Render));
        let plain = el(json!({ "id": "y", "type": "div" }));
        assert!(matches!(select_branch(&plain, &json!({}), &reg), Branch::Render));
    }

    #[test]
    fn else_if_without_if_is_ignored() {
        let reg = TransformRegistry::new();
        let e = el(json!({
            "id": "x",
            "type": "span",
            "elseIf": { "$exp": "false" },
            "else": true,
            "children": "shown"
        }));
        assert!(matches!(select_branch(&e, &json!({}), &reg), Branch::Render));
    }
}
