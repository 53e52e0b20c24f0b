// src/resolver.rs
//! Turns a block's local overrides, the global settings registry and the
//! coordinator's theme/language into the values a navigation block renders.
//!
//! Every field is resolved in the same order: new-style local key, legacy
//! local key, theme-computed default, registry slot, literal. Nothing in here
//! fails; missing or malformed input falls through to the next source.

use crate::language::{available_languages, display_name, Language};
use crate::overrides::{truthy_str, LocalOverride, Section, TriState};
use crate::registry::{GlobalSettingsRegistry, BORDER_COLOR_SLOT, STICKY_NAV_SLOT};
use crate::theme::ThemeMode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

/// Block variant that is glass by default.
pub const GLASS_VARIANT: &str = "B0102";

pub const DEFAULT_HEIGHT: u32 = 80;
pub const DEFAULT_PADDING_X: u32 = 40;
pub const DEFAULT_BACKGROUND: &str = "var(--dna-bg)";
pub const DEFAULT_TEXT_COLOR: &str = "var(--dna-text-prim)";
pub const DEFAULT_WIDTH: &str = "100%";
pub const DEFAULT_BORDER_COLOR: &str = "#000000";
pub const DEFAULT_HEADER: &str = "000-GEN";

const GLASS_BACKGROUND_DARK: &str = "rgba(0,0,0,0.2)";
const GLASS_BACKGROUND_LIGHT: &str = "rgba(255,255,255,0.2)";
const GLASS_BLUR: &str = "blur(12px)";
const NO_FILTER: &str = "none";
/// Hex alpha appended to the registry accent for the bottom border.
const BORDER_ALPHA_SUFFIX: &str = "20";

const MENU_BACKGROUND_DARK: &str = "rgba(0,0,0,0.95)";
const MENU_BACKGROUND_LIGHT: &str = "rgba(255,255,255,0.95)";
const MENU_DEFAULT_BORDER: &str = "#00000020";

type LocalKey = (Section, &'static str);

// Candidate keys, highest precedence first.
const HEIGHT_KEYS: &[LocalKey] = &[
    (Section::Layout, "height"),
    (Section::Style, "height"),
    (Section::Layout, "F-L04"),
];
const BACKGROUND_KEYS: &[LocalKey] = &[
    (Section::Style, "backgroundColor"),
    (Section::Style, "F-S02"),
];
const TEXT_COLOR_KEYS: &[LocalKey] = &[(Section::Style, "textColor")];
const WIDTH_KEYS: &[LocalKey] = &[(Section::Layout, "F-L06")];
const PADDING_X_KEYS: &[LocalKey] = &[(Section::Layout, "paddingX")];
const GLASS_KEY: LocalKey = (Section::Style, "glassEffect");
const GLASS_LEGACY_KEY: LocalKey = (Section::Style, "F-S06");
const STICKY_KEY: LocalKey = (Section::Data, "stickyLogic");
const HEADER_KEY: &str = "header";
const LINKS_KEY: &str = "links";

static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\+?(\d+)").expect("valid regex"));

/// Leading-integer coercion: `"64px"` is 64, `"abc"` and negatives are not a
/// pixel size at all.
fn parse_px(value: &Value) -> Option<u32> {
    let text = truthy_str(value)?;
    let caps = LEADING_INT.captures(&text)?;
    caps.get(1)?.as_str().parse().ok()
}

fn first_str(local: &LocalOverride, keys: &[LocalKey]) -> Option<String> {
    keys.iter()
        .find_map(|(section, key)| local.str_value(*section, key))
}

fn first_px(local: &LocalOverride, keys: &[LocalKey]) -> Option<u32> {
    keys.iter()
        .filter_map(|(section, key)| local.raw(*section, key))
        .find_map(parse_px)
}

/// Bare numbers are pixel widths; strings are passed through as CSS.
fn first_css_length(local: &LocalOverride, keys: &[LocalKey]) -> Option<String> {
    keys.iter()
        .filter_map(|(section, key)| local.raw(*section, key))
        .find_map(|value| match value {
            Value::Number(_) => truthy_str(value).map(|n| format!("{}px", n)),
            other => truthy_str(other),
        })
}

/// Glass is on when forced on, off when forced off, and otherwise follows
/// the block variant.
pub fn glass_state(local: &LocalOverride) -> TriState {
    TriState::from_json(local.raw(GLASS_KEY.0, GLASS_KEY.1))
        .or(TriState::from_legacy(local.raw(GLASS_LEGACY_KEY.0, GLASS_LEGACY_KEY.1)))
}

/// Locale lookup over a block's `data` section.
///
/// The base language reads `key` directly. Any other language reads
/// `key_<lang>` and falls back to `key`, then to the empty string. There is no
/// further chain between related locales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextResolver<'a> {
    data: &'a Map<String, Value>,
    lang: Language,
}

impl<'a> TextResolver<'a> {
    pub fn new(data: &'a Map<String, Value>, lang: Language) -> Self {
        TextResolver { data, lang }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(truthy_str)
    }

    pub fn text(&self, key: &str) -> String {
        if self.lang.is_base() {
            return self.lookup(key).unwrap_or_default();
        }
        self.lookup(&format!("{}_{}", key, self.lang))
            .or_else(|| self.lookup(key))
            .unwrap_or_default()
    }

    pub fn language(&self) -> Language {
        self.lang
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub label: String,
    pub url: Option<String>,
}

impl NavLink {
    fn from_json(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        Some(NavLink {
            label: entry.get("label").and_then(truthy_str).unwrap_or_default(),
            url: entry.get("url").and_then(truthy_str),
        })
    }

    /// In-page links (`#section`) scroll instead of navigating.
    pub fn is_anchor(&self) -> bool {
        self.url.as_deref().is_some_and(|url| url.starts_with('#'))
    }

    pub fn anchor_target(&self) -> Option<&str> {
        self.url.as_deref()?.strip_prefix('#')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageMenuEntry {
    pub code: String,
    pub name: String,
    pub flag: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageMenu {
    /// Upper-cased current code shown on the toggle button.
    pub label: String,
    pub background_color: String,
    pub border_color: String,
    pub entries: Vec<LanguageMenuEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ThemeIcon {
    Sun,
    Moon,
}

/// Final render values for one block. Rebuilt on every pass, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedViewModel<'a> {
    pub height: u32,
    pub background_color: String,
    pub text_color: String,
    pub glass_effect: bool,
    pub backdrop_filter: &'static str,
    pub border_color: String,
    pub padding_x: u32,
    pub width: String,
    pub sticky: bool,
    pub header: String,
    pub links: Vec<NavLink>,
    pub language_menu: LanguageMenu,
    pub theme_icon: ThemeIcon,
    pub theme: ThemeMode,
    #[serde(skip)]
    pub texts: TextResolver<'a>,
}

impl ResolvedViewModel<'_> {
    pub fn text(&self, key: &str) -> String {
        self.texts.text(key)
    }

    pub fn border_bottom(&self) -> String {
        format!("1px solid {}", self.border_color)
    }

    /// Inline style declarations for the block's root element.
    pub fn css_style(&self) -> String {
        [
            ("height", format!("{}px", self.height)),
            ("background-color", self.background_color.clone()),
            ("backdrop-filter", self.backdrop_filter.to_string()),
            ("border-bottom", self.border_bottom()),
            ("width", self.width.clone()),
            ("display", "flex".to_string()),
            ("align-items", "center".to_string()),
            ("justify-content", "space-between".to_string()),
            ("padding", format!("0 {}px", self.padding_x)),
            ("color", self.text_color.clone()),
        ]
        .iter()
        .map(|(property, value)| format!("{}: {};", property, value))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn resolve_background(local: &LocalOverride, theme: ThemeMode, glass: bool) -> String {
    if let Some(color) = first_str(local, BACKGROUND_KEYS) {
        return color;
    }
    let computed = match (glass, theme) {
        (true, ThemeMode::Dark) => GLASS_BACKGROUND_DARK,
        (true, ThemeMode::Light) => GLASS_BACKGROUND_LIGHT,
        (false, _) => DEFAULT_BACKGROUND,
    };
    computed.to_string()
}

fn resolve_links(data: &Map<String, Value>) -> Vec<NavLink> {
    match data.get(LINKS_KEY) {
        Some(Value::Array(items)) => items.iter().filter_map(NavLink::from_json).collect(),
        _ => Vec::new(),
    }
}

fn resolve_language_menu(
    global: &GlobalSettingsRegistry,
    theme: ThemeMode,
    lang: Language,
) -> LanguageMenu {
    let entries = available_languages(global)
        .into_iter()
        .map(|code| {
            let names = display_name(&code);
            LanguageMenuEntry {
                active: code == lang.as_str(),
                code,
                name: names.name,
                flag: names.flag,
            }
        })
        .collect();

    LanguageMenu {
        label: lang.as_str().to_uppercase(),
        background_color: if theme.is_dark() {
            MENU_BACKGROUND_DARK
        } else {
            MENU_BACKGROUND_LIGHT
        }
        .to_string(),
        border_color: global
            .get_slot(BORDER_COLOR_SLOT)
            .unwrap_or_else(|| MENU_DEFAULT_BORDER.to_string()),
        entries,
    }
}

/// Resolves a block. Pure: the same inputs always give an equal view model.
///
/// `variant` is the block's declared type identifier, which decides glass
/// when the overrides leave it unset.
pub fn resolve<'a>(
    local: &'a LocalOverride,
    global: &GlobalSettingsRegistry,
    theme: ThemeMode,
    lang: Language,
    variant: &str,
) -> ResolvedViewModel<'a> {
    let texts = TextResolver::new(&local.data, lang);
    let glass_effect = glass_state(local).resolve(variant == GLASS_VARIANT);

    let sticky = local.str_value(STICKY_KEY.0, STICKY_KEY.1).as_deref() == Some("true")
        || global.get_slot(STICKY_NAV_SLOT).as_deref() == Some("true");

    let border_color = format!(
        "{}{}",
        global
            .get_slot(BORDER_COLOR_SLOT)
            .unwrap_or_else(|| DEFAULT_BORDER_COLOR.to_string()),
        BORDER_ALPHA_SUFFIX
    );

    let header = Some(texts.text(HEADER_KEY))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_HEADER.to_string());

    ResolvedViewModel {
        height: first_px(local, HEIGHT_KEYS).unwrap_or(DEFAULT_HEIGHT),
        background_color: resolve_background(local, theme, glass_effect),
        text_color: first_str(local, TEXT_COLOR_KEYS)
            .unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
        glass_effect,
        backdrop_filter: if glass_effect { GLASS_BLUR } else { NO_FILTER },
        border_color,
        padding_x: first_px(local, PADDING_X_KEYS).unwrap_or(DEFAULT_PADDING_X),
        width: first_css_length(local, WIDTH_KEYS).unwrap_or_else(|| DEFAULT_WIDTH.to_string()),
        sticky,
        header,
        links: resolve_links(&local.data),
        language_menu: resolve_language_menu(global, theme, lang),
        theme_icon: if theme.is_dark() {
            ThemeIcon::Sun
        } else {
            ThemeIcon::Moon
        },
        theme,
        texts,
    }
}
