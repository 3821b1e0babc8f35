//! Named value transforms for `$transform` bindings.
//!
//! The host registers every transform it wants to expose; nothing is built in.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

pub type TransformFn = Box<dyn Fn(Option<Value>) -> Option<Value>>;

#[derive(Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, TransformFn>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Option<Value>) -> Option<Value> + 'static,
    {
        self.transforms.insert(name.into(), Box::new(f));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Apply `names` left to right. Unknown names pass the value through.
    pub fn apply(&self, names: &[String], value: Option<Value>) -> Option<Value> {
        names.iter().fold(value, |acc, name| match self.transforms.get(name) {
            Some(f) => f(acc),
            None => {
                tracing::warn!(transform = %name, "unknown transform, value left unchanged");
                acc
            }
        })
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.transforms.keys().collect();
        names.sort();
        f.debug_struct("TransformRegistry").field("transforms", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transforms_apply_in_order() {
        let mut reg = TransformRegistry::new();
        reg.register("upper", |v| {
            v.and_then(|v| v.as_str().map(|s| Value::from(s.to_uppercase())))
        })
        .register("exclaim", |v| {
            v.and_then(|v| v.as_str().map(|s| Value::from(format!("{}!", s))))
        });
        let out = reg.apply(&["upper".into(), "exclaim".into()], Some(json!("hi")));
        assert_eq!(out, Some(json!("HI!")));
    }

    #[test]
    fn unknown_transform_passes_through() {
        let reg = TransformRegistry::new();
        assert_eq!(reg.apply(&["missing".into()], Some(json!(3))), Some(json!(3)));
        assert!(!reg.contains("missing"));
    }
}
