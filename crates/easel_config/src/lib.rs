//! Configuration store
//!
//! All tunables of the easel crates (default canvas size, ready handshake timing, frame rate)
//! live in one process-wide store. Defaults come from the embedded `settings.json`; a storage
//! adapter can override them.

mod errors;
pub mod settings;
pub mod storage;

pub use crate::errors::Error;
use crate::settings::{Setting, SettingInfo};
use crate::storage::MemoryStorageAdapter;
use easel_shared::types::Result;
use lazy_static::lazy_static;
use log::warn;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::mem;
use std::str::FromStr;
use wildmatch::WildMatch;

/// Settings are stored in a json file, but this is included in the binary for easy editing.
const SETTINGS_JSON: &str = include_str!("./settings.json");

/// `StorageAdapter` is the interface for storing and retrieving settings.
/// Adapters must be `Send + Sync` as the store is shared process-wide.
pub trait StorageAdapter: Send + Sync {
    /// Retrieves a setting from the storage
    fn get(&self, key: &str) -> Option<Setting>;

    /// Stores a given setting to the storage
    fn set(&self, key: &str, value: Setting) -> Result<()>;

    /// Retrieves all the settings in the storage in one go. Used for preloading the store.
    fn all(&self) -> Result<HashMap<String, Setting>>;
}

lazy_static! {
    // Initial config store has a memory storage adapter. It keeps settings within the session
    // but does not persist them.
    static ref CONFIG_STORE: RwLock<ConfigStore> = RwLock::new(ConfigStore::default());
}

/// Returns a read guard on the config store
pub fn config_store() -> RwLockReadGuard<'static, ConfigStore> {
    CONFIG_STORE.read()
}

pub fn config_store_write() -> RwLockWriteGuard<'static, ConfigStore> {
    CONFIG_STORE.write()
}

/// These macros simplify calls to the config store:
///
/// let retries = config!(uint "surface.ready.max_retries");
/// config_set!(uint "frame.default_fps", 30);
///
/// Unknown keys yield a zero value. Use `config_store().has("key")` to test for existence.
#[macro_export]
macro_rules! config {
    (string $key:expr) => {
        match $crate::config_store().get($key) {
            Some(setting) => setting.to_string(),
            None => String::new(),
        }
    };
    (bool $key:expr) => {
        match $crate::config_store().get($key) {
            Some(setting) => setting.to_bool(),
            None => false,
        }
    };
    (uint $key:expr) => {
        match $crate::config_store().get($key) {
            Some(setting) => setting.to_uint(),
            None => 0,
        }
    };
    (sint $key:expr) => {
        match $crate::config_store().get($key) {
            Some(setting) => setting.to_sint(),
            None => 0,
        }
    };
    (map $key:expr) => {
        match $crate::config_store().get($key) {
            Some(setting) => setting.to_map(),
            None => Vec::new(),
        }
    };
}

#[macro_export]
macro_rules! config_set {
    (string $key:expr, $val:expr) => {
        $crate::config_store().set($key, $crate::settings::Setting::String($val))
    };
    (bool $key:expr, $val:expr) => {
        $crate::config_store().set($key, $crate::settings::Setting::Bool($val))
    };
    (uint $key:expr, $val:expr) => {
        $crate::config_store().set($key, $crate::settings::Setting::UInt($val))
    };
    (sint $key:expr, $val:expr) => {
        $crate::config_store().set($key, $crate::settings::Setting::SInt($val))
    };
    (map $key:expr, $val:expr) => {
        $crate::config_store().set($key, $crate::settings::Setting::Map($val))
    };
}

/// `JsonEntry` is used for parsing the settings.json file
#[derive(Debug, Deserialize)]
struct JsonEntry {
    key: String,
    #[serde(rename = "type")]
    _entry_type: String,
    default: String,
    description: String,
}

/// Configuration storage holding every configurable option
pub struct ConfigStore {
    /// All current values, keyed by dotted name
    settings: Mutex<HashMap<String, Setting>>,
    /// Descriptions, default values and type information
    settings_info: HashMap<String, SettingInfo>,
    /// Keys of all settings in declaration order
    setting_keys: Vec<String>,
    /// The storage adapter used for persisting and loading keys
    storage: Box<dyn StorageAdapter>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        let mut store = Self {
            settings: Mutex::new(HashMap::new()),
            settings_info: HashMap::new(),
            setting_keys: Vec::new(),
            storage: Box::new(MemoryStorageAdapter::new()),
        };

        if let Err(err) = store.populate_default_settings() {
            warn!("config: cannot load default settings: {err}");
        }
        store
    }
}

impl ConfigStore {
    /// Sets a new storage engine and overwrites current settings with whatever the storage
    /// holds.
    pub fn set_storage(&mut self, storage: Box<dyn StorageAdapter>) {
        self.storage = storage;

        match self.storage.all() {
            Ok(all_settings) => {
                let mut settings = self.settings.lock();
                for (key, value) in all_settings {
                    settings.insert(key, value);
                }
            }
            Err(err) => warn!("config: cannot read settings from storage: {err}"),
        }
    }

    /// Returns true when the store knows about the given key
    pub fn has(&self, key: &str) -> bool {
        self.settings.lock().contains_key(key)
    }

    /// Returns the keys matching the given search string (`?` and `*` wildcards)
    pub fn find(&self, search: &str) -> Vec<String> {
        let search = WildMatch::new(search);

        self.setting_keys
            .iter()
            .filter(|key| search.matches(key.as_str()))
            .cloned()
            .collect()
    }

    /// Retrieves information about the given key, or returns None when key is unknown
    pub fn get_info(&self, key: &str) -> Option<SettingInfo> {
        self.settings_info.get(key).cloned()
    }

    /// Returns the setting with the given key. Falls back to the storage and then to the
    /// declared default. Unknown keys return None.
    pub fn get(&self, key: &str) -> Option<Setting> {
        if let Some(setting) = self.settings.lock().get(key) {
            return Some(setting.clone());
        }

        if let Some(setting) = self.storage.get(key) {
            self.settings.lock().insert(key.to_string(), setting.clone());
            return Some(setting);
        }

        if let Some(info) = self.settings_info.get(key) {
            return Some(info.default.clone());
        }

        warn!("config: setting {key} is not known");
        None
    }

    /// Sets the given setting and persists it to the storage. The setting must be declared
    /// and of the declared type, otherwise nothing is stored.
    pub fn set(&self, key: &str, value: Setting) {
        let Some(info) = self.settings_info.get(key) else {
            warn!("config: setting {key} is not known");
            return;
        };

        if mem::discriminant(&info.default) != mem::discriminant(&value) {
            warn!("config: setting {key} is of different type than setting expects");
            return;
        }

        self.settings.lock().insert(key.to_owned(), value.clone());

        if let Err(err) = self.storage.set(key, value) {
            warn!("config: cannot persist setting {key}: {err}");
        }
    }

    /// Populates the settings from the embedded settings.json file
    fn populate_default_settings(&mut self) -> Result<()> {
        let json_data: Value = serde_json::from_str(SETTINGS_JSON)?;

        if let Value::Object(data) = json_data {
            for (section_prefix, section_entries) in data {
                let section_entries: Vec<JsonEntry> = serde_json::from_value(section_entries)?;

                for entry in section_entries {
                    let key = format!("{}.{}", section_prefix, entry.key);

                    let info = SettingInfo {
                        key: key.clone(),
                        description: entry.description,
                        default: Setting::from_str(&entry.default)?,
                    };

                    self.setting_keys.push(key.clone());
                    self.settings.lock().insert(key.clone(), info.default.clone());
                    self.settings_info.insert(key, info);
                }
            }
        }

        Ok(())
    }
}
