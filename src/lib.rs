pub mod utils;

pub mod coordinator;
pub mod language;
pub mod overrides;
pub mod registry;
pub mod resolver;
pub mod theme;

use crate::coordinator::init_coordinator;
use crate::overrides::LocalOverride;
use crate::registry::GlobalSettingsRegistry;
use crate::utils::logger::LoggerBuilder;
use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

pub use crate::coordinator::{Coordinator, DurableStorage, FileStorage, MemoryStorage};
pub use crate::language::Language;
pub use crate::resolver::{resolve, ResolvedViewModel, TextResolver};
pub use crate::theme::ThemeMode;

const USAGE: &str =
    "usage: dnablock <globals.json|globals.yaml> <override.json> [variant] [--lang <code>] [--toggle-theme]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    registry_path: String,
    override_path: String,
    variant: String,
    lang: Option<String>,
    toggle_theme: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut positional = Vec::new();
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--lang" => {
                let code = iter.next().context("--lang needs a language code")?;
                parsed.lang = Some(code.clone());
            }
            "--toggle-theme" => parsed.toggle_theme = true,
            flag if flag.starts_with("--") => bail!("unknown option '{}'\n{}", flag, USAGE),
            value => positional.push(value.to_string()),
        }
    }

    let mut positional = positional.into_iter();
    parsed.registry_path = positional.next().context(USAGE)?;
    parsed.override_path = positional.next().context(USAGE)?;
    parsed.variant = positional.next().unwrap_or_default();
    if let Some(extra) = positional.next() {
        bail!("unexpected argument '{}'\n{}", extra, USAGE);
    }
    Ok(parsed)
}

fn resolve_from_files(args: &CliArgs) -> Result<String> {
    let registry = GlobalSettingsRegistry::load_from_file(Path::new(&args.registry_path))
        .with_context(|| format!("Failed to load global settings from {}", args.registry_path))?;
    let raw_override = fs::read_to_string(&args.override_path)
        .with_context(|| format!("Failed to read block overrides {}", args.override_path))?;
    let local = LocalOverride::from_json_str(&raw_override)
        .with_context(|| format!("Failed to parse block overrides {}", args.override_path))?;

    let shared = init_coordinator(&registry);
    let mut coordinator = shared
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(code) = &args.lang {
        coordinator.set_language(code);
    }
    if args.toggle_theme {
        coordinator.toggle_theme();
    }

    let view_model = coordinator.resolve_block(&local, &registry, &args.variant);
    debug!("Resolved block style: {}", view_model.css_style());
    Ok(serde_json::to_string_pretty(&view_model)?)
}

pub fn run() {
    if let Err(e) = LoggerBuilder::new().file_prefix("dnablock").init() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }
    info!("Log initialized");

    let args: Vec<String> = env::args().skip(1).collect();
    let outcome = parse_args(&args).and_then(|parsed| resolve_from_files(&parsed));
    match outcome {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_positional_and_flags() {
        let parsed = parse_args(&args(&["g.yaml", "o.json", "B0102", "--lang", "fr", "--toggle-theme"])).unwrap();
        assert_eq!(
            parsed,
            CliArgs {
                registry_path: "g.yaml".into(),
                override_path: "o.json".into(),
                variant: "B0102".into(),
                lang: Some("fr".into()),
                toggle_theme: true,
            }
        );
    }

    #[test]
    fn variant_is_optional() {
        let parsed = parse_args(&args(&["g.json", "o.json"])).unwrap();
        assert_eq!(parsed.variant, "");
        assert_eq!(parsed.lang, None);
    }

    #[test]
    fn rejects_bad_invocations() {
        assert!(parse_args(&args(&["g.json"])).is_err());
        assert!(parse_args(&args(&["g.json", "o.json", "--lang"])).is_err());
        assert!(parse_args(&args(&["g.json", "o.json", "--verbose"])).is_err());
        assert!(parse_args(&args(&["g.json", "o.json", "B0102", "extra"])).is_err());
    }
}
