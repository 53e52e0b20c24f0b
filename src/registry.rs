// src/registry.rs
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Accent/border color, `GL02` slot 5.
pub const BORDER_COLOR_SLOT: (&str, usize) = ("GL02", 5);
/// Site theme mode (`"Light"` / `"Dark"`), `GL10` slot 6.
pub const THEME_MODE_SLOT: (&str, usize) = ("GL10", 6);
/// Sticky navigation toggle, `GL11` slot 0.
pub const STICKY_NAV_SLOT: (&str, usize) = ("GL11", 0);
/// Comma separated list of block-level languages, `GL12` slot 1.
pub const AVAILABLE_LANGUAGES_SLOT: (&str, usize) = ("GL12", 1);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            // Integral numbers print without a fraction, the way the editor stores them.
            ParamValue::Number(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            ParamValue::Number(n) => write!(f, "{}", n),
            ParamValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl ParamValue {
    /// `false`, `0` and `""` mean "not configured", same as an empty slot.
    pub fn is_set(&self) -> bool {
        match self {
            ParamValue::Bool(b) => *b,
            ParamValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ParamValue::String(s) => !s.is_empty(),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::String(s.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<f64> for ParamValue {
    fn from(n: f64) -> Self {
        ParamValue::Number(n)
    }
}

/// One positional entry of a setting group. `value` is `None` when the slot
/// exists but holds nothing usable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Parameter {
    #[serde(default)]
    pub value: Option<ParamValue>,
}

impl Parameter {
    pub fn new(value: impl Into<ParamValue>) -> Self {
        Parameter {
            value: Some(value.into()),
        }
    }

    pub fn empty() -> Self {
        Parameter { value: None }
    }

    fn from_json(raw: &Value) -> Self {
        let value = match raw.get("value") {
            Some(Value::String(s)) => Some(ParamValue::String(s.clone())),
            Some(Value::Bool(b)) => Some(ParamValue::Bool(*b)),
            Some(Value::Number(n)) => n.as_f64().map(ParamValue::Number),
            _ => None,
        };
        Parameter { value }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SettingGroup {
    #[serde(default)]
    pub params: Vec<Parameter>,
}

impl SettingGroup {
    pub fn new(params: Vec<Parameter>) -> Self {
        SettingGroup { params }
    }

    /// Sets slot `index`, padding any gap with empty slots.
    pub fn set(&mut self, index: usize, value: impl Into<ParamValue>) {
        if self.params.len() <= index {
            self.params.resize(index + 1, Parameter::empty());
        }
        self.params[index] = Parameter::new(value);
    }
}

/// Named groups of positional parameters shared by every block on the page.
///
/// Lookups never fail: a missing key, an out-of-range index or a slot without
/// a usable value all come back as `None`, and the caller picks the default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct GlobalSettingsRegistry {
    groups: HashMap<String, SettingGroup>,
}

impl GlobalSettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, group: SettingGroup) {
        self.groups.insert(key.into(), group);
    }

    /// Sets a single slot, creating the group if needed.
    pub fn set(&mut self, key: &str, index: usize, value: impl Into<ParamValue>) {
        self.groups
            .entry(key.to_string())
            .or_default()
            .set(index, value);
    }

    pub fn group(&self, key: &str) -> Option<&SettingGroup> {
        self.groups.get(key)
    }

    pub fn get(&self, key: &str, index: usize) -> Option<&Parameter> {
        self.groups.get(key)?.params.get(index)
    }

    pub fn get_value(&self, key: &str, index: usize) -> Option<&ParamValue> {
        self.get(key, index)?.value.as_ref()
    }

    /// String form of a slot. `false`, `0` and empty strings count as unset.
    pub fn get_str(&self, key: &str, index: usize) -> Option<String> {
        self.get_value(key, index)
            .filter(|value| value.is_set())
            .map(ParamValue::to_string)
    }

    pub fn get_slot(&self, slot: (&str, usize)) -> Option<String> {
        self.get_str(slot.0, slot.1)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Lenient construction from arbitrary JSON.
    ///
    /// Each top-level entry is expected to look like `{"params": [{"value": ..}, ..]}`.
    /// Anything else degrades to an empty group, and a parameter without a
    /// string/bool/number `value` keeps its slot as an empty one so positional
    /// indices stay aligned.
    pub fn from_json_value(value: &Value) -> Self {
        let mut registry = Self::new();
        let Some(entries) = value.as_object() else {
            warn!("Global settings root is not an object; using an empty registry.");
            return registry;
        };

        for (key, body) in entries {
            let group = match body.get("params") {
                Some(Value::Array(items)) => {
                    SettingGroup::new(items.iter().map(Parameter::from_json).collect())
                }
                other => {
                    warn!(
                        "Setting group '{}' has no parameter list ({:?}); treating it as empty.",
                        key,
                        other.map(|v| v.to_string())
                    );
                    SettingGroup::default()
                }
            };
            registry.insert(key.clone(), group);
        }
        debug!("Built global settings registry with {} groups", registry.len());
        registry
    }

    /// Loads a registry from a `.json`, `.yml` or `.yaml` file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let raw: Value = match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(crate::err!(
                    "unsupported global settings file '{}', expected .json or .yaml",
                    path.display()
                ))
            }
        };
        let registry = Self::from_json_value(&raw);
        info!(
            "Loaded {} global setting groups from {:?}",
            registry.len(),
            path
        );
        Ok(registry)
    }
}
