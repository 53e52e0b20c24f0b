// src/overrides.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which sub-object of a [`LocalOverride`] a key lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Data,
    Layout,
    Style,
}

/// A flag that can be forced either way or left to the block's variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TriState {
    On,
    Off,
    #[default]
    Unset,
}

impl TriState {
    /// Only JSON booleans force a state; everything else defers.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Bool(true)) => TriState::On,
            Some(Value::Bool(false)) => TriState::Off,
            _ => TriState::Unset,
        }
    }

    /// Legacy string flags (`"true"`) can only switch a feature on.
    pub fn from_legacy(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) if s == "true" => TriState::On,
            _ => TriState::Unset,
        }
    }

    /// First explicit state wins.
    pub fn or(self, other: TriState) -> TriState {
        match self {
            TriState::Unset => other,
            explicit => explicit,
        }
    }

    pub fn resolve(self, default: bool) -> bool {
        match self {
            TriState::On => true,
            TriState::Off => false,
            TriState::Unset => default,
        }
    }
}

/// Block-local configuration. Any key that is missing defers to the global
/// registry or to the computed default, never to an empty value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LocalOverride {
    #[serde(default, deserialize_with = "object_or_empty")]
    pub data: Map<String, Value>,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub layout: Map<String, Value>,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub style: Map<String, Value>,
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

/// Scalar string form of a set value. `null`, `false`, `0` and `""` count as
/// unset; arrays and objects are never scalars.
pub(crate) fn truthy_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

impl LocalOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, section: Section) -> &Map<String, Value> {
        match section {
            Section::Data => &self.data,
            Section::Layout => &self.layout,
            Section::Style => &self.style,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Map<String, Value> {
        match section {
            Section::Data => &mut self.data,
            Section::Layout => &mut self.layout,
            Section::Style => &mut self.style,
        }
    }

    pub fn with(mut self, section: Section, key: &str, value: impl Into<Value>) -> Self {
        self.section_mut(section).insert(key.to_string(), value.into());
        self
    }

    pub fn raw(&self, section: Section, key: &str) -> Option<&Value> {
        self.section(section).get(key)
    }

    pub fn str_value(&self, section: Section, key: &str) -> Option<String> {
        self.raw(section, key).and_then(truthy_str)
    }

    pub fn flag(&self, section: Section, key: &str) -> TriState {
        TriState::from_json(self.raw(section, key))
    }

    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
