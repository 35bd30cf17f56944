//! Conversion configuration for swfclip-core.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::GeometryMode;

/// Target-engine property descriptor attached to scalar (Active / Variant-Index) curves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyBinding {
    /// Attribute name of the animated property (e.g. `m_IsActive`).
    pub attribute: String,
    /// Engine class id of the component owning the attribute.
    pub class_id: i64,
    /// Script asset reference for script-defined properties; `None` for built-ins.
    #[serde(default)]
    pub script: Option<serde_json::Value>,
}

impl PropertyBinding {
    pub fn active() -> Self {
        Self {
            attribute: "m_IsActive".into(),
            class_id: 1,
            script: None,
        }
    }

    /// Frame selector of the vector frame renderer.
    pub fn variant() -> Self {
        Self {
            attribute: "_frame".into(),
            class_id: 114,
            script: None,
        }
    }
}

/// Configuration for a single document conversion.
/// Keep this minimal; metadata that belongs to the document lives in `DocumentMeta`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Clip name; falls back to the document alias.
    pub clip_name: Option<String>,
    /// Display names for slots, keyed by depth number.
    pub depth_names: BTreeMap<u16, String>,
    pub active_binding: PropertyBinding,
    pub variant_binding: PropertyBinding,
    /// How static geometry requests are grouped.
    pub geometry_mode: GeometryMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clip_name: None,
            depth_names: BTreeMap::new(),
            active_binding: PropertyBinding::active(),
            variant_binding: PropertyBinding::variant(),
            geometry_mode: GeometryMode::Composed,
        }
    }
}

impl Config {
    pub fn with_depth_name(mut self, depth: u16, name: impl Into<String>) -> Self {
        self.depth_names.insert(depth, name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{ "depthNames": { "1": "tail", "3": "hat" } }"#).unwrap();
        assert_eq!(cfg.depth_names.get(&1).map(String::as_str), Some("tail"));
        assert_eq!(cfg.depth_names.get(&3).map(String::as_str), Some("hat"));
        assert_eq!(cfg.active_binding, PropertyBinding::active());
        assert_eq!(cfg.variant_binding.attribute, "_frame");
        assert!(cfg.clip_name.is_none());
        assert_eq!(cfg.geometry_mode, GeometryMode::Composed);

        let cfg: Config = serde_json::from_str(r#"{ "geometryMode": "separateVariants" }"#).unwrap();
        assert_eq!(cfg.geometry_mode, GeometryMode::SeparateVariants);
    }
}
