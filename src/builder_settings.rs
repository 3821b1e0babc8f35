use crate::keyboard::KeyboardConfig;
use crate::renderer::RenderConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Builder configuration, loaded from camelCase JSON. Every field has a
/// default so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuilderConfig {
    pub keyboard: KeyboardConfig,
    pub render: RenderConfig,
    pub selection_enabled: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            keyboard: KeyboardConfig::default(),
            render: RenderConfig::default(),
            selection_enabled: true,
        }
    }
}

impl BuilderConfig {
    pub fn from_json_str(src: &str) -> anyhow::Result<Self> {
        serde_json::from_str(src).context("invalid builder config")
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("serializing builder config")
    }
}
