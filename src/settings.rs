use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Json struct for deployment settings
#[derive(Serialize, Deserialize, Clone)]
pub struct Settings {
    /// Path of the SQLite database file, created on first run
    pub db_file: PathBuf,

    /// Root directory for certificate template assets
    pub asset_dir: PathBuf,

    pub web_port: Option<u16>,
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Settings> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_file: PathBuf::from("eventdesk.db"),
            asset_dir: PathBuf::from("assets"),
            web_port: None,
        }
    }
}
