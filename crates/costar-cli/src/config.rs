//! Project configuration stored in `.costar/config.json`.

use costar_graph::{ClosureSchedule, PathOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_DIR: &str = ".costar";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    /// Snapshot store directory, relative to `.costar/`.
    pub store: PathBuf,
    pub paths: PathOptions,
    pub closure: ClosureSchedule,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            store: PathBuf::from("graph.db"),
            paths: PathOptions::default(),
            closure: ClosureSchedule::default(),
        }
    }
}

impl Config {
    /// Loads the config for a project directory, falling back to defaults
    /// when no config file exists.
    pub fn load(project: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path(project);
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Writes the config, creating `.costar/` if needed.
    pub fn save(&self, project: &Path) -> Result<(), Box<dyn std::error::Error>> {
        fs::create_dir_all(project.join(CONFIG_DIR))?;
        fs::write(Self::path(project), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn path(project: &Path) -> PathBuf {
        project.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Absolute location of the snapshot store.
    pub fn store_path(&self, project: &Path) -> PathBuf {
        if self.store.is_absolute() {
            self.store.clone()
        } else {
            project.join(CONFIG_DIR).join(&self.store)
        }
    }
}
