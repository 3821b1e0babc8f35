//! Per-surface overrides (`platform: { "<surface>": { ...partial element } }`).

use super::RenderError;
use crate::schema::Element;
use serde_json::Value;
use std::borrow::Cow;

/// Shallow-merge the override for `surface` onto `element`. The result
/// never carries a `platform` field. Borrowed when there is nothing to do.
pub fn apply_platform<'a>(
    element: &'a Element,
    surface: Option<&str>,
) -> Result<Cow<'a, Element>, RenderError> {
    let overrides = match (&element.platform, surface) {
        (Some(map), Some(surface)) => map.get(surface),
        _ => None,
    };
    let patch = match overrides {
        Some(Value::Object(patch)) => patch,
        Some(other) => {
            return Err(RenderError::Platform(format!(
                "override must be an object, got {}",
                other
            )))
        }
        None if element.platform.is_none() => return Ok(Cow::Borrowed(element)),
        None => {
            let mut stripped = element.clone();
            stripped.platform = None;
            return Ok(Cow::Owned(stripped));
        }
    };

    let mut base = match serde_json::to_value(element) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(RenderError::Platform("element did not serialize to an object".into())),
        Err(e) => return Err(RenderError::Platform(e.to_string())),
    };
    for (k, v) in patch {
        base.insert(k.clone(), v.clone());
    }
    base.remove("platform");
    // id stays stable so selection keeps working across surfaces
    base.insert("id".into(), Value::String(element.id.clone()));

    serde_json::from_value(Value::Object(base))
        .map(Cow::Owned)
        .map_err(|e| RenderError::Platform(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn element() -> Element {
        serde_json::from_value(json!({
            "id": "btn",
            "type": "button",
            "props": { "label": "Go", "size": "md" },
            "platform": {
                "mobile": { "type": "touchable", "props": { "label": "Tap" } },
                "broken": 3
            }
        }))
        .unwrap()
    }

    #[test]
    fn override_is_shallow() {
        let el = element();
        let merged = apply_platform(&el, Some("mobile")).unwrap();
        assert_eq!(merged.node_type, "touchable");
        // props replaced wholesale, not deep-merged
        assert_eq!(merged.props.len(), 1);
        assert!(merged.platform.is_none());
        assert_eq!(merged.id, "btn");
    }

    #[test]
    fn missing_surface_strips_platform() {
        let el = element();
        let merged = apply_platform(&el, Some("web")).unwrap();
        assert_eq!(merged.node_type, "button");
        assert!(merged.platform.is_none());
        assert!(apply_platform(&el, Some("broken")).is_err());
    }
}
