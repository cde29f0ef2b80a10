use crate::errors::Error;
use crate::settings::Setting;
use crate::StorageAdapter;
use easel_shared::types::Result;
use log::warn;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores settings as a flat json object (`{"surface.ready.max_retries": "u:20"}`). Every `set`
/// rewrites the whole file.
pub struct JsonStorageAdapter {
    path: PathBuf,
    elements: Mutex<HashMap<String, Setting>>,
}

impl TryFrom<&Path> for JsonStorageAdapter {
    type Error = anyhow::Error;

    fn try_from(path: &Path) -> Result<Self> {
        if let Ok(metadata) = fs::metadata(path) {
            if !metadata.is_file() {
                return Err(Error::Config(format!("{} is not a regular file", path.display())).into());
            }
        } else {
            fs::write(path, "{}")?;
        }

        let adapter = JsonStorageAdapter {
            path: path.to_path_buf(),
            elements: Mutex::new(read_file(path)?),
        };

        Ok(adapter)
    }
}

impl StorageAdapter for JsonStorageAdapter {
    fn get(&self, key: &str) -> Option<Setting> {
        self.elements.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: Setting) -> Result<()> {
        let mut lock = self.elements.lock();
        lock.insert(key.to_owned(), value);

        // sorted so the file stays diffable
        let sorted: BTreeMap<_, _> = lock.iter().collect();
        let json = serde_json::to_string_pretty(&sorted).map_err(Error::from)?;
        fs::write(&self.path, json).map_err(Error::from)?;

        Ok(())
    }

    fn all(&self) -> Result<HashMap<String, Setting>> {
        Ok(self.elements.lock().clone())
    }
}

/// Reads the whole json file. Entries that cannot be parsed are skipped with a warning.
fn read_file(path: &Path) -> Result<HashMap<String, Setting>> {
    let buf = fs::read_to_string(path)?;
    let parsed_json: Value = serde_json::from_str(&buf)?;

    let mut elements = HashMap::new();
    if let Value::Object(settings) = parsed_json {
        for (key, value) in settings {
            match serde_json::from_value(value) {
                Ok(setting) => {
                    elements.insert(key, setting);
                }
                Err(err) => {
                    warn!("problem reading setting {key} from json: {err}");
                }
            }
        }
    }

    Ok(elements)
}
