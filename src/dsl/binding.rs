/// Binding resolver: turns prop values into concrete values for a context.
///
/// - falsy literals are returned untouched
/// - `{ "$exp": ... }` goes through the evaluator
/// - `{ "$bind": ..., "$transform": [...] }` is a dot path plus transforms
/// - strings with `${path}` / `{{expr}}` are interpolated
use super::evaluator::{evaluate, resolve_data_path, try_evaluate};
use super::transforms::TransformRegistry;
use super::value::{is_truthy, to_text};
use crate::schema::{BindingRef, PropValue};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static INTERPOLATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]*)\}|\{\{(.*?)\}\}").expect("interpolation pattern"));

/// Resolve a prop value against `context`. `None` means undefined.
pub fn resolve_value(
    value: &PropValue,
    context: &Value,
    transforms: &TransformRegistry,
) -> Option<Value> {
    match value {
        PropValue::Expression(e) => evaluate(&e.exp, context),
        PropValue::Binding(b) => resolve_binding(b, context, transforms),
        PropValue::Literal(v) => resolve_literal(v, context),
    }
}

pub fn resolve_binding(
    binding: &BindingRef,
    context: &Value,
    transforms: &TransformRegistry,
) -> Option<Value> {
    let raw = resolve_data_path(&binding.bind, context).cloned();
    if binding.transform.is_empty() {
        raw
    } else {
        transforms.apply(&binding.transform, raw)
    }
}

/// Resolve a raw JSON value that may itself be an Expression or Binding
/// object (used for link-to params and platform overrides).
pub fn resolve_json(value: &Value, context: &Value, transforms: &TransformRegistry) -> Option<Value> {
    match serde_json::from_value::<PropValue>(value.clone()) {
        Ok(prop) => resolve_value(&prop, context, transforms),
        Err(_) => Some(value.clone()),
    }
}

fn resolve_literal(v: &Value, context: &Value) -> Option<Value> {
    if !is_truthy(Some(v)) {
        return Some(v.clone());
    }
    match v {
        Value::String(s) if has_interpolation(s) => Some(Value::String(interpolate(s, context))),
        other => Some(other.clone()),
    }
}

pub fn has_interpolation(s: &str) -> bool {
    (s.contains("${") || s.contains("{{")) && INTERPOLATION.is_match(s)
}

/// Replace every `${path}` and `{{expr}}` occurrence in `template`.
///
/// `${...}` is a strict dot path. `{{...}}` is tried as an expression, then
/// as a dot path. Unresolvable and null values substitute as `""`.
pub fn interpolate(template: &str, context: &Value) -> String {
    INTERPOLATION
        .replace_all(template, |caps: &Captures| {
            if let Some(path) = caps.get(1) {
                return to_text(resolve_data_path(path.as_str(), context));
            }
            let inner = caps.get(2).map_or("", |m| m.as_str()).trim();
            if inner.is_empty() {
                return String::new();
            }
            match try_evaluate(inner, context) {
                Ok(Some(v)) => to_text(Some(&v)),
                _ => to_text(resolve_data_path(inner, context)),
            }
        })
        .into_owned()
}
