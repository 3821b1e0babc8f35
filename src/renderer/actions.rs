//! Event dispatch for rendered elements.
//!
//! An event prop (e.g. `onClick`) names a host-registered handler. On
//! `onClick` a pending `link-to` is resolved against the context captured at
//! render time and handed to the [`Navigator`].

use super::output::{OutputElement, PendingLink};
use crate::dsl::binding::{interpolate, resolve_binding, resolve_json};
use crate::dsl::value::to_text;
use crate::dsl::{evaluate, TransformRegistry};
use crate::schema::LinkTo;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

pub type ActionHandler = Box<dyn FnMut(&Value)>;

/// Named side-effect handlers supplied by the host.
#[derive(Default)]
pub struct ActionHandlers {
    handlers: HashMap<String, ActionHandler>,
}

impl ActionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F: FnMut(&Value) + 'static>(&mut self, name: impl Into<String>, f: F) -> &mut Self {
        self.handlers.insert(name.into(), Box::new(f));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    fn invoke(&mut self, name: &str, payload: &Value) -> bool {
        match self.handlers.get_mut(name) {
            Some(h) => {
                h(payload);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for ActionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("ActionHandlers").field("handlers", &names).finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Navigation {
    pub target: String,
    pub params: Option<Map<String, Value>>,
}

pub trait Navigator {
    fn navigate(&mut self, target: &str, params: Option<&Map<String, Value>>);
}

impl<F> Navigator for F
where
    F: FnMut(&str, Option<&Map<String, Value>>),
{
    fn navigate(&mut self, target: &str, params: Option<&Map<String, Value>>) {
        self(target, params)
    }
}

/// What a [`trigger`] call ended up doing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Triggered {
    pub handler: Option<String>,
    pub navigation: Option<Navigation>,
}

impl Triggered {
    pub fn is_empty(&self) -> bool {
        self.handler.is_none() && self.navigation.is_none()
    }
}

/// Dispatch `event` on a rendered element.
pub fn trigger(
    element: &OutputElement,
    event: &str,
    payload: &Value,
    handlers: &mut ActionHandlers,
    navigator: &mut dyn Navigator,
    transforms: &TransformRegistry,
) -> Triggered {
    let mut out = Triggered::default();

    if let Some(Value::String(name)) = element.props.get(event) {
        if handlers.invoke(name, payload) {
            out.handler = Some(name.clone());
        } else {
            tracing::warn!(id = %element.id, event, handler = %name, "no handler registered");
        }
    }

    if event == "onClick" {
        if let Some(link) = &element.link {
            match resolve_link(link, transforms) {
                Some(nav) => {
                    tracing::debug!(id = %element.id, target = %nav.target, "link-to navigation");
                    navigator.navigate(&nav.target, nav.params.as_ref());
                    out.navigation = Some(nav);
                }
                None => tracing::warn!(id = %element.id, "link-to resolved to no target"),
            }
        }
    }

    out
}

/// Resolve a pending link against its captured context.
pub fn resolve_link(link: &PendingLink, transforms: &TransformRegistry) -> Option<Navigation> {
    let ctx = &link.context;
    let nav = match &link.target {
        LinkTo::Path(path) => Navigation {
            target: interpolate(path, ctx),
            params: None,
        },
        LinkTo::Target { ui, params } => Navigation {
            target: interpolate(ui, ctx),
            params: params.as_ref().map(|p| {
                p.iter()
                    .map(|(k, v)| (k.clone(), resolve_json(v, ctx, transforms).unwrap_or(Value::Null)))
                    .collect()
            }),
        },
        LinkTo::Expression(e) => navigation_from_value(evaluate(&e.exp, ctx))?,
        LinkTo::Binding(b) => navigation_from_value(resolve_binding(b, ctx, transforms))?,
    };
    if nav.target.is_empty() {
        None
    } else {
        Some(nav)
    }
}

fn navigation_from_value(value: Option<Value>) -> Option<Navigation> {
    match value? {
        Value::Object(mut obj) => {
            let target = to_text(obj.get("ui"));
            let params = match obj.remove("params") {
                Some(Value::Object(p)) => Some(p),
                _ => None,
            };
            Some(Navigation { target, params })
        }
        Value::Null => None,
        other => Some(Navigation {
            target: to_text(Some(&other)),
            params: None,
        }),
    }
}
