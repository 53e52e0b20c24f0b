// src/language.rs
use crate::registry::{GlobalSettingsRegistry, AVAILABLE_LANGUAGES_SLOT};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Block dropdown list used when `GL12` has nothing usable.
pub const FALLBACK_BLOCK_LANGUAGES: &[&str] = &["en", "uk", "ru"];

const UNKNOWN_LANGUAGE_FLAG: &str = "\u{1F310}";

/// Languages the site-wide selector offers. `En` is the base language whose
/// text lives under the bare content keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
    Uk,
    De,
    Fr,
    Es,
    It,
    Zh,
    Pl,
}

/// Selector order.
pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language::En,
    Language::Ru,
    Language::Uk,
    Language::De,
    Language::Fr,
    Language::Es,
    Language::It,
    Language::Zh,
    Language::Pl,
];

impl Language {
    pub const BASE: Language = Language::En;

    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
            Language::Uk => "uk",
            Language::De => "de",
            Language::Fr => "fr",
            Language::Es => "es",
            Language::It => "it",
            Language::Zh => "zh",
            Language::Pl => "pl",
        }
    }

    /// Exact code match; `"FR"` or `" fr"` are not supported codes.
    pub fn parse(code: &str) -> Option<Self> {
        SUPPORTED_LANGUAGES
            .iter()
            .copied()
            .find(|lang| lang.as_str() == code)
    }

    pub fn is_base(self) -> bool {
        self == Self::BASE
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata for a language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageName {
    pub name: String,
    pub flag: String,
}

fn known_name(code: &str) -> Option<(&'static str, &'static str)> {
    let entry = match code {
        "en" => ("English", "\u{1F1EC}\u{1F1E7}"),
        "ru" => ("Русский", "\u{1F1F7}\u{1F1FA}"),
        "uk" => ("Українська", "\u{1F1FA}\u{1F1E6}"),
        "de" => ("Deutsch", "\u{1F1E9}\u{1F1EA}"),
        "fr" => ("Français", "\u{1F1EB}\u{1F1F7}"),
        "es" => ("Español", "\u{1F1EA}\u{1F1F8}"),
        "it" => ("Italiano", "\u{1F1EE}\u{1F1F9}"),
        "zh" => ("中文", "\u{1F1E8}\u{1F1F3}"),
        "pl" => ("Polski", "\u{1F1F5}\u{1F1F1}"),
        "ja" => ("日本語", "\u{1F1EF}\u{1F1F5}"),
        "pt" => ("Português", "\u{1F1F5}\u{1F1F9}"),
        _ => return None,
    };
    Some(entry)
}

/// Unknown codes show the raw code with a globe.
pub fn display_name(code: &str) -> LanguageName {
    match known_name(code) {
        Some((name, flag)) => LanguageName {
            name: name.to_string(),
            flag: flag.to_string(),
        },
        None => LanguageName {
            name: code.to_string(),
            flag: UNKNOWN_LANGUAGE_FLAG.to_string(),
        },
    }
}

/// Languages offered by a block's own dropdown, read from `GL12`.
///
/// Blank entries are dropped, so an absent or empty setting yields the
/// fallback list rather than a single empty language.
pub fn available_languages(registry: &GlobalSettingsRegistry) -> Vec<String> {
    let configured: Vec<String> = registry
        .get_slot(AVAILABLE_LANGUAGES_SLOT)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if configured.is_empty() {
        debug!("No usable block languages configured; using fallback list.");
        FALLBACK_BLOCK_LANGUAGES.iter().map(|s| s.to_string()).collect()
    } else {
        configured
    }
}

pub fn get_default_locale() -> String {
    sys_locale::get_locale().map_or("en-US".to_string(), |locale| locale.replace('_', "-"))
}

/// Primary subtag of the OS locale if it is supported, else the base language.
pub fn default_language_from_locale() -> Language {
    language_for_locale(&get_default_locale())
}

/// OS locales come in any case (`DE-at`), so only this path normalises.
fn language_for_locale(locale: &str) -> Language {
    let primary = locale.split('-').next().unwrap_or_default();
    Language::parse(&primary.trim().to_ascii_lowercase()).unwrap_or(Language::BASE)
}
