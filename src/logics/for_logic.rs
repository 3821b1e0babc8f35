use crate::dsl::binding::{resolve_binding, resolve_value};
use crate::dsl::value::{to_text, type_name};
use crate::dsl::{evaluate, resolve_data_path, TransformRegistry};
use crate::schema::{Element, ForDirective, ForSource};
use serde_json::Value;

/// Items produced by resolving a `for.in` source.
#[derive(Debug, PartialEq)]
pub enum LoopItems {
    Items(Vec<Value>),
    /// Source resolved to something that cannot be iterated; zero iterations.
    NotIterable(&'static str),
}

/// Resolve the loop source. Arrays iterate element-wise, a single object is
/// one iteration, anything else is not iterable.
pub fn resolve_items(
    source: &ForSource,
    context: &Value,
    transforms: &TransformRegistry,
) -> LoopItems {
    let resolved = match source {
        ForSource::Path(path) => resolve_data_path(path, context).cloned(),
        ForSource::Binding(b) => resolve_binding(b, context, transforms),
        ForSource::Expression(e) => evaluate(&e.exp, context),
    };
    match resolved {
        Some(Value::Array(items)) => LoopItems::Items(items),
        Some(obj @ Value::Object(_)) => LoopItems::Items(vec![obj]),
        other => LoopItems::NotIterable(type_name(other.as_ref())),
    }
}

/// `{ ...context, [as]: item, [index]: i }`
pub fn iteration_context(context: &Value, directive: &ForDirective, item: Value, index: usize) -> Value {
    let mut map = match context {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    map.insert(directive.alias.clone(), item);
    if let Some(name) = directive.index.as_deref().filter(|n| !n.is_empty()) {
        map.insert(name.to_string(), Value::from(index));
    }
    Value::Object(map)
}

/// Render key for one iteration: `for.key`, then the element's `key`, then
/// `<id>-<index>` where `id` is the effective id (a component's own id when
/// the loop sits on its `render` element). Keys resolving to an empty string
/// fall through.
pub fn iteration_key(
    element: &Element,
    id: &str,
    directive: &ForDirective,
    iteration_context: &Value,
    transforms: &TransformRegistry,
    index: usize,
) -> String {
    directive
        .key
        .iter()
        .chain(element.key.iter())
        .map(|k| to_text(resolve_value(k, iteration_context, transforms).as_ref()))
        .find(|k| !k.is_empty())
        .unwrap_or_else(|| format!("{}-{}", id, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn directive(v: Value) -> ForDirective {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn sources_resolve() {
        let reg = TransformRegistry::new();
        let ctx = json!({ "data": { "items": [1, 2, 3], "one": { "a": 1 }, "n": 4 } });
        let path = ForSource::Path("data.items".into());
        assert_eq!(resolve_items(&path, &ctx, &reg), LoopItems::Items(vec![json!(1), json!(2), json!(3)]));
        let exp: ForSource = serde_json::from_value(json!({ "$exp": "data.items.filter(x => x > 1)" })).unwrap();
        assert_eq!(resolve_items(&exp, &ctx, &reg), LoopItems::Items(vec![json!(2), json!(3)]));
        let single = ForSource::Path("data.one".into());
        assert_eq!(resolve_items(&single, &ctx, &reg), LoopItems::Items(vec![json!({ "a": 1 })]));
        let number = ForSource::Path("data.n".into());
        assert_eq!(resolve_items(&number, &ctx, &reg), LoopItems::NotIterable("number"));
        let missing = ForSource::Path("data.none".into());
        assert_eq!(resolve_items(&missing, &ctx, &reg), LoopItems::NotIterable("undefined"));
    }

    #[test]
    fn iteration_context_injects_alias_and_index() {
        let d = directive(json!({ "in": "items", "as": "item", "index": "i" }));
        let ctx = iteration_context(&json!({ "item": "shadowed", "x": 1 }), &d, json!("v"), 2);
        assert_eq!(ctx, json!({ "item": "v", "i": 2, "x": 1 }));
    }

    #[test]
    fn key_precedence() {
        let reg = TransformRegistry::new();
        let mut el: Element = serde_json::from_value(json!({ "id": "row", "type": "li" })).unwrap();
        let d = directive(json!({ "in": "items", "as": "item", "key": "{{item.id}}" }));
        let ctx = json!({ "item": { "id": "k7" } });
        assert_eq!(iteration_key(&el, "row", &d, &ctx, &reg, 0), "k7");

        let plain = directive(json!({ "in": "items", "as": "item" }));
        assert_eq!(iteration_key(&el, "row", &plain, &ctx, &reg, 3), "row-3");
        assert_eq!(iteration_key(&el, "card", &plain, &ctx, &reg, 1), "card-1");
        el.key = Some(serde_json::from_value(json!({ "$bind": "item.id" })).unwrap());
        assert_eq!(iteration_key(&el, "row", &plain, &ctx, &reg, 3), "k7");
    }
}
