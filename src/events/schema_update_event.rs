use crate::schema::SchemaNode;
use crate::states::editor_session::{EditorSession, ToastKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which structural operation produced a schema update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationTag {
    Cut,
    Paste,
    Delete,
    Duplicate,
    Move,
    Edit,
}

impl OperationTag {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationTag::Cut => "cut",
            OperationTag::Paste => "paste",
            OperationTag::Delete => "delete",
            OperationTag::Duplicate => "duplicate",
            OperationTag::Move => "move",
            OperationTag::Edit => "edit",
        }
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persistence hand-off supplied by the host.
pub type SchemaUpdateCallback = Box<dyn FnMut(&SchemaNode, OperationTag) -> anyhow::Result<()>>;

/// Low-level hand-off of the session's current tree to the host.
/// When `show_toast` is false the operation is silent on success.
/// Failures are returned and never retried.
pub fn publish_schema_update(
    session: &mut EditorSession,
    tag: OperationTag,
    show_toast: bool,
) -> anyhow::Result<()> {
    let result = match session.on_schema_update.as_mut() {
        Some(callback) => callback(&session.tree, tag),
        None => Ok(()),
    };
    match &result {
        Ok(()) => {
            tracing::debug!(%tag, "schema update handed off");
            if show_toast {
                session.show_toast(format!("Saved ({})", tag), ToastKind::Success);
            }
        }
        Err(err) => {
            tracing::warn!(%tag, error = %err, "schema update hand-off failed");
            session.show_toast(format!("Save failed: {}", err), ToastKind::Error);
        }
    }
    result
}

/// Public event: call after a mutation has been applied to the session so
/// the host can persist it.
pub fn on_schema_updated(session: &mut EditorSession, tag: OperationTag) -> anyhow::Result<()> {
    publish_schema_update(session, tag, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder_settings::BuilderConfig;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> EditorSession {
        let tree = serde_json::from_value(json!({ "id": "root", "type": "div" })).unwrap();
        EditorSession::new(tree, BuilderConfig::default())
    }

    #[test]
    fn callback_receives_tree_and_tag() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut s = session();
        s.on_schema_update = Some(Box::new(move |tree, tag| {
            sink.borrow_mut().push((tree.id().to_string(), tag));
            Ok(())
        }));
        on_schema_updated(&mut s, OperationTag::Delete).expect("handed off");
        assert_eq!(seen.borrow().as_slice(), &[("root".to_string(), OperationTag::Delete)]);
        assert!(s.toast.is_none());
    }

    #[test]
    fn failure_is_returned_and_toasted() {
        let mut s = session();
        s.on_schema_update = Some(Box::new(|_, _| Err(anyhow::anyhow!("disk full"))));
        let err = publish_schema_update(&mut s, OperationTag::Move, true).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
        let toast = s.toast.as_ref().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Save failed: disk full");
    }

    #[test]
    fn tags_serialize_lowercase() {
        assert_eq!(serde_json::to_value(OperationTag::Duplicate).unwrap(), json!("duplicate"));
        assert_eq!(OperationTag::Paste.to_string(), "paste");
    }
}
