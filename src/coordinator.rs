// src/coordinator.rs
use crate::language::{default_language_from_locale, Language};
use crate::overrides::LocalOverride;
use crate::registry::GlobalSettingsRegistry;
use crate::resolver::{resolve, ResolvedViewModel};
use crate::theme::ThemeMode;
use crate::utils::error::Result;
use crate::utils::path::get_storage_path;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Durable storage key holding the visitor's language choice.
pub const LANGUAGE_STORAGE_KEY: &str = "dna-lang-pref";

/// Minimal key/value persistence, shaped like browser local storage.
pub trait DurableStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file of string values, rewritten in full on every `set_item`.
#[derive(Debug)]
pub struct FileStorage {
    items: HashMap<String, String>,
    path: PathBuf,
}

impl FileStorage {
    /// Opens the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut storage = FileStorage {
            items: HashMap::new(),
            path,
        };
        storage.load_from_file();
        storage
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_file(&mut self) {
        if !self.path.exists() {
            info!("Storage file {:?} not found. Starting with an empty store.", self.path);
            return;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
                Ok(items) => {
                    debug!("Loaded {} stored items from {:?}", items.len(), self.path);
                    self.items = items;
                }
                Err(e) => {
                    error!(
                        "Failed to parse storage file {:?}: {}. Starting with an empty store.",
                        self.path, e
                    );
                }
            },
            Err(e) => {
                error!(
                    "Failed to read storage file {:?}: {}. Starting with an empty store.",
                    self.path, e
                );
            }
        }
    }

    fn save_to_file(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.items)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl DurableStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        self.save_to_file()
    }
}

/// Stored preference if it is a supported code, otherwise `fallback()`.
fn seed_language(stored: Option<&str>, fallback: impl FnOnce() -> Language) -> Language {
    match stored {
        Some(code) => Language::parse(code).unwrap_or_else(|| {
            warn!(
                "Stored language '{}' is not supported. Falling back to the system locale.",
                code
            );
            fallback()
        }),
        None => fallback(),
    }
}

/// Owner of the active language and theme.
///
/// Resolvers only read this state. It changes through [`Coordinator::set_language`]
/// and [`Coordinator::toggle_theme`] alone.
#[derive(Debug)]
pub struct Coordinator<S: DurableStorage> {
    language: Language,
    theme: ThemeMode,
    storage: S,
}

impl<S: DurableStorage> Coordinator<S> {
    /// Seeds the language from storage (then the OS locale) and the theme from
    /// the registry.
    pub fn new(storage: S, registry: &GlobalSettingsRegistry) -> Self {
        let stored = storage.get_item(LANGUAGE_STORAGE_KEY);
        let language = seed_language(stored.as_deref(), default_language_from_locale);
        let theme = ThemeMode::from_registry(registry);
        info!("Coordinator started with language '{}' and theme '{}'", language, theme);
        Self::with_state(storage, language, theme)
    }

    pub fn with_state(storage: S, language: Language, theme: ThemeMode) -> Self {
        Coordinator {
            language,
            theme,
            storage,
        }
    }

    pub fn current_language(&self) -> Language {
        self.language
    }

    pub fn current_theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Switches the active language and persists it.
    ///
    /// Unsupported codes are ignored without touching storage. A failed write
    /// is logged; the in-memory switch stands. Returns whether the code was
    /// accepted.
    pub fn set_language(&mut self, code: &str) -> bool {
        let Some(language) = Language::parse(code) else {
            warn!("Ignoring unsupported language code '{}'", code);
            return false;
        };

        if language != self.language {
            info!("Language changed from '{}' to '{}'", self.language, language);
        }
        self.language = language;

        if let Err(e) = self.storage.set_item(LANGUAGE_STORAGE_KEY, language.as_str()) {
            error!("Failed to persist language preference '{}': {}", language, e);
        }
        true
    }

    pub fn toggle_theme(&mut self) -> ThemeMode {
        self.theme = self.theme.toggled();
        info!("Theme toggled to '{}'", self.theme);
        self.theme
    }

    /// Resolves one block against the current language and theme.
    pub fn resolve_block<'a>(
        &self,
        local: &'a LocalOverride,
        registry: &GlobalSettingsRegistry,
        variant: &str,
    ) -> ResolvedViewModel<'a> {
        resolve(local, registry, self.theme, self.language, variant)
    }
}

pub type SharedCoordinator = Arc<Mutex<Coordinator<FileStorage>>>;

pub static GLOBAL_COORDINATOR: OnceCell<SharedCoordinator> = OnceCell::new();

fn lock(shared: &SharedCoordinator) -> MutexGuard<'_, Coordinator<FileStorage>> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Creates the process-wide coordinator backed by the default storage file.
/// Later calls keep the first instance.
pub fn init_coordinator(registry: &GlobalSettingsRegistry) -> SharedCoordinator {
    GLOBAL_COORDINATOR
        .get_or_init(|| {
            let storage = FileStorage::open(get_storage_path());
            info!("Coordinator state initialized from {:?}", storage.path());
            Arc::new(Mutex::new(Coordinator::new(storage, registry)))
        })
        .clone()
}

/// Active language, or the base language before initialisation.
pub fn current_language() -> Language {
    GLOBAL_COORDINATOR
        .get()
        .map(|shared| lock(shared).current_language())
        .unwrap_or(Language::BASE)
}

pub fn current_theme() -> ThemeMode {
    GLOBAL_COORDINATOR
        .get()
        .map(|shared| lock(shared).current_theme())
        .unwrap_or_default()
}

pub fn set_language(code: &str) -> bool {
    match GLOBAL_COORDINATOR.get() {
        Some(shared) => lock(shared).set_language(code),
        None => {
            warn!("Coordinator not initialized. Cannot set language '{}'.", code);
            false
        }
    }
}

pub fn toggle_theme() -> Option<ThemeMode> {
    match GLOBAL_COORDINATOR.get() {
        Some(shared) => Some(lock(shared).toggle_theme()),
        None => {
            warn!("Coordinator not initialized. Cannot toggle theme.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::SUPPORTED_LANGUAGES;

    /// Counts writes and can be told to fail them.
    #[derive(Default)]
    struct RecordingStorage {
        inner: MemoryStorage,
        writes: usize,
        fail: bool,
    }

    impl DurableStorage for RecordingStorage {
        fn get_item(&self, key: &str) -> Option<String> {
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
            self.writes += 1;
            if self.fail {
                return Err(crate::err!("storage quota exceeded"));
            }
            self.inner.set_item(key, value)
        }
    }

    fn coordinator(storage: RecordingStorage) -> Coordinator<RecordingStorage> {
        Coordinator::with_state(storage, Language::En, ThemeMode::Dark)
    }

    #[test]
    fn seeds_language_from_storage_and_theme_from_registry() {
        let mut storage = MemoryStorage::new();
        storage.set_item(LANGUAGE_STORAGE_KEY, "uk").unwrap();
        let mut registry = GlobalSettingsRegistry::new();
        registry.set("GL10", 6, "Light");

        let coordinator = Coordinator::new(storage, &registry);
        assert_eq!(coordinator.current_language(), Language::Uk);
        assert_eq!(coordinator.current_theme(), ThemeMode::Light);
    }

    #[test]
    fn unsupported_stored_language_uses_fallback() {
        assert_eq!(seed_language(Some("xx"), || Language::It), Language::It);
        assert_eq!(seed_language(Some("FR"), || Language::It), Language::It);
        assert_eq!(seed_language(Some(""), || Language::It), Language::It);
        assert_eq!(seed_language(None, || Language::Pl), Language::Pl);
        assert_eq!(seed_language(Some("fr"), || Language::It), Language::Fr);
    }

    #[test]
    fn unsupported_stored_language_is_left_in_storage() {
        let mut storage = MemoryStorage::new();
        storage.set_item(LANGUAGE_STORAGE_KEY, "xx").unwrap();
        let coordinator = Coordinator::new(storage, &GlobalSettingsRegistry::new());
        assert!(SUPPORTED_LANGUAGES.contains(&coordinator.current_language()));
        assert_eq!(coordinator.storage().get_item(LANGUAGE_STORAGE_KEY).as_deref(), Some("xx"));
    }

    #[test]
    fn unknown_registry_theme_starts_dark() {
        let mut registry = GlobalSettingsRegistry::new();
        registry.set("GL10", 6, "Auto");
        let coordinator = Coordinator::new(MemoryStorage::new(), &registry);
        assert_eq!(coordinator.current_theme(), ThemeMode::Dark);
    }

    #[test]
    fn set_language_updates_and_persists() {
        let mut coordinator = coordinator(RecordingStorage::default());
        assert!(coordinator.set_language("fr"));
        assert_eq!(coordinator.current_language(), Language::Fr);
        assert_eq!(coordinator.storage().get_item(LANGUAGE_STORAGE_KEY).as_deref(), Some("fr"));
        assert_eq!(coordinator.storage().writes, 1);
    }

    #[test]
    fn unsupported_language_is_ignored_without_writing() {
        let mut coordinator = coordinator(RecordingStorage::default());
        assert!(!coordinator.set_language("xx"));
        assert!(!coordinator.set_language(" FR "));
        assert_eq!(coordinator.current_language(), Language::En);
        assert_eq!(coordinator.storage().writes, 0);
        assert_eq!(coordinator.storage().get_item(LANGUAGE_STORAGE_KEY), None);
    }

    #[test]
    fn setting_the_same_language_twice_only_rewrites_storage() {
        let mut coordinator = coordinator(RecordingStorage::default());
        coordinator.set_language("de");
        coordinator.set_language("de");
        assert_eq!(coordinator.current_language(), Language::De);
        assert_eq!(coordinator.storage().writes, 2);
        assert_eq!(coordinator.storage().get_item(LANGUAGE_STORAGE_KEY).as_deref(), Some("de"));
    }

    #[test]
    fn storage_failure_does_not_block_the_switch() {
        let mut coordinator = coordinator(RecordingStorage {
            fail: true,
            ..Default::default()
        });
        assert!(coordinator.set_language("pl"));
        assert_eq!(coordinator.current_language(), Language::Pl);
        assert_eq!(coordinator.storage().writes, 1);
    }

    #[test]
    fn toggle_theme_twice_restores_the_original() {
        let mut coordinator = coordinator(RecordingStorage::default());
        assert_eq!(coordinator.toggle_theme(), ThemeMode::Light);
        assert_eq!(coordinator.toggle_theme(), ThemeMode::Dark);
        assert_eq!(coordinator.storage().writes, 0);
    }

    #[test]
    fn resolve_block_reads_coordinator_state() {
        let mut coordinator = coordinator(RecordingStorage::default());
        coordinator.set_language("fr");
        coordinator.toggle_theme();

        let local: LocalOverride = serde_json::from_value(serde_json::json!({
            "data": {"header": "Home", "header_fr": "Accueil"}
        }))
        .unwrap();
        let vm = coordinator.resolve_block(&local, &GlobalSettingsRegistry::new(), "B0102");
        assert_eq!(vm.header, "Accueil");
        assert_eq!(vm.background_color, "rgba(255,255,255,0.2)");
    }

    #[test]
    fn file_storage_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut storage = FileStorage::open(&path);
        assert_eq!(storage.get_item(LANGUAGE_STORAGE_KEY), None);
        storage.set_item(LANGUAGE_STORAGE_KEY, "zh").unwrap();

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get_item(LANGUAGE_STORAGE_KEY).as_deref(), Some("zh"));

        let coordinator = Coordinator::new(reopened, &GlobalSettingsRegistry::new());
        assert_eq!(coordinator.current_language(), Language::Zh);
    }

    #[test]
    fn corrupt_storage_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{not json").unwrap();
        let storage = FileStorage::open(&path);
        assert_eq!(storage.get_item(LANGUAGE_STORAGE_KEY), None);
    }

    #[test]
    fn file_storage_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // The parent "directory" is a regular file, so the write cannot succeed.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut storage = FileStorage::open(blocker.join("storage.json"));
        assert!(storage.set_item(LANGUAGE_STORAGE_KEY, "en").is_err());

        let mut coordinator =
            Coordinator::with_state(storage, Language::En, ThemeMode::Dark);
        assert!(coordinator.set_language("es"));
        assert_eq!(coordinator.current_language(), Language::Es);
    }
}
