use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use tracing::{debug, info};

use crate::{
    config::CustomizationConfig,
    error::{NoReelError, Result},
    rules::Section,
};

pub const PREFERENCES_FILE: &str = "preferences.json";

/// Platform data directory, e.g. `~/.local/share/noreel` on Linux.
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("", "", "noreel")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(NoReelError::NoDataDir)
}

/// Boolean preferences persisted as a flat JSON object keyed by `pref_*` names.
///
/// Unknown keys found in the file are kept and written back untouched.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, bool>,
}

impl PreferenceStore {
    /// Opens `preferences.json` inside `data_dir`. A missing file means defaults.
    pub fn open(data_dir: &Path) -> Result<Self> {
        Self::load(data_dir.join(PREFERENCES_FILE))
    }

    pub fn load(path: PathBuf) -> Result<Self> {
        let values = read_values(&path)?;
        debug!("Loaded {} preferences from {}", values.len(), path.display());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, section: Section) -> bool {
        self.values
            .get(section.pref_key())
            .copied()
            .unwrap_or_else(|| CustomizationConfig::default().hides(section))
    }

    /// Snapshot of the hiding flags, defaults filled in.
    pub fn config(&self) -> CustomizationConfig {
        Section::ALL
            .into_iter()
            .fold(CustomizationConfig::default(), |config, section| {
                config.with(section, self.get(section))
            })
    }

    /// Stores and persists a flag. Returns whether the effective value changed.
    pub fn set(&mut self, section: Section, hide: bool) -> Result<bool> {
        let changed = self.get(section) != hide;
        self.values.insert(section.pref_key().to_string(), hide);
        self.save()?;
        if changed {
            info!("Preference {} set to {}", section.pref_key(), hide);
        }
        Ok(changed)
    }

    pub fn save(&self) -> Result<()> {
        let io_err = |source: std::io::Error| NoReelError::PreferencesIo {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.values).map_err(|source| {
            NoReelError::PreferencesFormat {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, json).map_err(io_err)
    }

    /// Re-reads the file and returns the keys whose effective value changed.
    /// On error the in-memory values are left as they were.
    pub fn reload(&mut self) -> Result<Vec<&'static str>> {
        let before = self.config();
        self.values = read_values(&self.path)?;
        let after = self.config();
        Ok(Section::ALL
            .into_iter()
            .filter(|section| before.hides(*section) != after.hides(*section))
            .map(Section::pref_key)
            .collect())
    }
}

fn read_values(path: &Path) -> Result<BTreeMap<String, bool>> {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| {
            NoReelError::PreferencesFormat {
                path: path.to_path_buf(),
                source,
            }
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(source) => Err(NoReelError::PreferencesIo {
            path: path.to_path_buf(),
            source,
        }),
    }
}
