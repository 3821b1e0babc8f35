/// UI schema model - public module facade.
pub mod ids;
pub mod node;
pub mod validator;

// --- Re-exports ---
pub use node::{
    BindingRef, ChildItem, Component, Element, ElseBranch, ExpressionRef, ForDirective,
    ForSource, LinkTo, PropValue, SchemaNode,
};
pub use validator::{validate, Diagnostic};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema root is invalid: {message}")]
    InvalidRoot {
        message: String,
        diagnostics: Vec<Diagnostic>,
    },
}

/// Parse schema JSON into a tree.
///
/// Validation diagnostics are logged; only a root that cannot be parsed at
/// all is an error. Nodes without ids (or with duplicate ids) get fresh ones.
pub fn parse_schema(src: &str) -> Result<SchemaNode, SchemaError> {
    let raw: serde_json::Value = serde_json::from_str(src)?;
    from_value(raw)
}

pub fn from_value(raw: serde_json::Value) -> Result<SchemaNode, SchemaError> {
    let diagnostics = validate(&raw);
    for d in &diagnostics {
        tracing::warn!(location = %d.location, "schema: {}", d.message);
    }
    let mut root: SchemaNode =
        serde_json::from_value(raw).map_err(|e| SchemaError::InvalidRoot {
            message: e.to_string(),
            diagnostics,
        })?;
    let fixed = ids::ensure_ids(&mut root);
    if fixed > 0 {
        tracing::debug!(count = fixed, "schema: assigned fresh node ids");
    }
    Ok(root)
}

/// Serialize a tree back to pretty JSON.
pub fn to_json_string(root: &SchemaNode) -> Result<String, SchemaError> {
    Ok(serde_json::to_string_pretty(root)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_schema_keeps_valid_siblings() {
        let root = parse_schema(
            r#"{
                "id": "root",
                "type": "div",
                "children": [
                    { "id": "a", "type": "span" },
                    { "id": "b" },
                    { "type": "span" }
                ]
            }"#,
        )
        .expect("parsed");
        assert_eq!(root.navigable_child_indices(), vec![0, 2]);
        assert!(!root.child_node(2).unwrap().id().is_empty());
    }

    #[test]
    fn parse_schema_rejects_broken_root() {
        let err = parse_schema(r#"{ "id": "root" }"#).unwrap_err();
        match err {
            SchemaError::InvalidRoot { diagnostics, .. } => assert_eq!(diagnostics.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse_schema("{"), Err(SchemaError::Json(_))));
    }

    #[test]
    fn serialized_schema_parses_back() {
        let root = parse_schema(r#"{ "render": { "id": "r", "type": "div" }, "id": "c" }"#)
            .expect("parsed");
        let text = to_json_string(&root).expect("serialized");
        assert!(text.contains("\"kind\": \"component\""));
        assert_eq!(parse_schema(&text).expect("parsed"), root);
    }
}
