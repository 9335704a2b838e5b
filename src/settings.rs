use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::coerce::PhoneFixups;
use crate::error::{Result, SbciError};
use crate::season::AgeBrackets;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the season's exports. Empty means derive it from
    /// provider and season.
    #[serde(default)]
    pub season_dir: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_season")]
    pub season: String,
    /// Normalized phone number -> replacement.
    #[serde(default)]
    pub phone_fixups: PhoneFixups,
    /// Bracket name -> [start, end] as dd/mm/yyyy; a null end is open.
    #[serde(default)]
    pub age_groups: BTreeMap<String, (String, Option<String>)>,
}

fn default_provider() -> String {
    "PlayHQ".to_string()
}

fn default_season() -> String {
    "2021-winter".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            season_dir: String::new(),
            provider: default_provider(),
            season: default_season(),
            phone_fixups: PhoneFixups::new(),
            age_groups: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Apply `SEASON`, `PROVIDER` and `SEASONDIR` overrides from `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(season) = lookup("SEASON").filter(|s| !s.is_empty()) {
            self.season = season;
        }
        if let Some(provider) = lookup("PROVIDER").filter(|s| !s.is_empty()) {
            self.provider = provider;
        }
        if let Some(dir) = lookup("SEASONDIR").filter(|s| !s.is_empty()) {
            self.season_dir = dir;
        }
        self
    }

    pub fn season_dir(&self) -> PathBuf {
        if !self.season_dir.is_empty() {
            return PathBuf::from(shellexpand_path(&self.season_dir));
        }
        home_dir()
            .join("basketball")
            .join("shooters")
            .join(&self.provider)
            .join(&self.season)
    }

    pub fn brackets(&self) -> Result<AgeBrackets> {
        if self.age_groups.is_empty() {
            return Err(SbciError::Settings(format!(
                "no age_groups table in {}",
                settings_path().display()
            )));
        }
        AgeBrackets::from_table(&self.age_groups)
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn config_dir() -> PathBuf {
    home_dir().join(".config").join("sbci")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Settings file merged with defaults, then environment overrides.
pub fn load_settings() -> Settings {
    read_settings_file(&settings_path()).with_env(|k| std::env::var(k).ok())
}

/// Missing or unreadable files yield defaults.
pub fn read_settings_file(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read settings; using defaults");
            return Settings::default();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "invalid settings; using defaults");
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    write_settings_file(&settings_path(), settings)
}

pub fn write_settings_file(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SbciError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
