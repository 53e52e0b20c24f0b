use lazy_static::lazy_static;
use std::env;
use std::path::PathBuf;

const BASE_DIR: &str = "data";
const STORAGE_FILE_NAME: &str = "storage.json";

lazy_static! {
    static ref CWD: PathBuf = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
}

pub fn get_log_dir() -> PathBuf {
    PathBuf::from(BASE_DIR).join("logs")
}

fn get_base_dir() -> PathBuf {
    CWD.join(BASE_DIR)
}

pub fn get_cwd() -> PathBuf {
    CWD.clone()
}

pub fn get_config_dir() -> PathBuf {
    get_base_dir().join("config")
}

/// Backing file of the durable key/value store (language preference etc.).
pub fn get_storage_path() -> PathBuf {
    get_config_dir().join(STORAGE_FILE_NAME)
}
