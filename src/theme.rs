// src/theme.rs
use crate::registry::{GlobalSettingsRegistry, THEME_MODE_SLOT};
use serde::{Deserialize, Serialize};

const THEME_LIGHT: &str = "Light";
const THEME_DARK: &str = "Dark";

/// Site-wide color mode. Only two states exist; unknown stored values read as
/// [`ThemeMode::Dark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeMode {
    Light,
    #[default]
    Dark,
}

impl ThemeMode {
    pub fn parse(value: &str) -> Self {
        if value == THEME_LIGHT {
            ThemeMode::Light
        } else {
            ThemeMode::Dark
        }
    }

    pub fn from_registry(registry: &GlobalSettingsRegistry) -> Self {
        registry
            .get_slot(THEME_MODE_SLOT)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Light => THEME_LIGHT,
            ThemeMode::Dark => THEME_DARK,
        }
    }

    pub fn is_dark(self) -> bool {
        self == ThemeMode::Dark
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
