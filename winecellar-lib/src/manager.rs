//! Listing and lifecycle of all bottles known to winecellar

use crate::bottle::{folder_name, Bottle};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::BottleMetadata;
use crate::scanner::BottleScanner;
use crate::wine::Wine;
use crate::windows::{AudioDriver, Bit, Windows, DEFAULT_AUDIO_DRIVER, DEFAULT_WINDOWS};
use crate::winetricks::Winetricks;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const UNKNOWN: &str = "- Unknown -";

/// Everything shown for one bottle in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BottleSummary {
    pub name: String,
    pub description: String,
    pub status: bool,
    pub windows: Windows,
    pub bit: Bit,
    pub wine_version: String,
    pub prefix: PathBuf,
    pub c_drive: String,
    pub last_updated: String,
    pub audio_driver: AudioDriver,
    pub virtual_desktop: Option<String>,
    pub is_default: bool,
    /// First problem met while reading the bottle
    pub error: Option<String>,
}

impl BottleSummary {
    fn defaults(prefix: &Path, wine_version: &str) -> Self {
        Self {
            name: folder_name(prefix),
            description: String::new(),
            status: false,
            windows: Windows::WindowsXP,
            bit: Bit::Win32,
            wine_version: wine_version.to_string(),
            prefix: prefix.to_path_buf(),
            c_drive: UNKNOWN.to_string(),
            last_updated: UNKNOWN.to_string(),
            audio_driver: DEFAULT_AUDIO_DRIVER,
            virtual_desktop: None,
            is_default: false,
            error: None,
        }
    }
}

/// Options for a new bottle
#[derive(Debug, Clone)]
pub struct NewBottle {
    pub name: String,
    pub description: String,
    pub bit: Bit,
    pub windows: Windows,
    pub virtual_desktop: Option<String>,
    pub audio_driver: AudioDriver,
    pub disable_gecko_mono: bool,
}

impl NewBottle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            bit: Bit::Win64,
            windows: DEFAULT_WINDOWS,
            virtual_desktop: None,
            audio_driver: DEFAULT_AUDIO_DRIVER,
            disable_gecko_mono: false,
        }
    }
}

/// Ties the scanner, the bottles and the Wine bridges together
pub struct BottleManager {
    config: Config,
    scanner: BottleScanner,
}

impl BottleManager {
    pub fn new(config: Config) -> Self {
        let scanner = BottleScanner::new(config.default_bottle.clone());
        Self { config, scanner }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Prefixes of all bottles, default bottle last when enabled
    pub fn bottle_paths(&self) -> Result<Vec<PathBuf>> {
        let root = self.config.prefixes_root();
        if !root.is_dir() {
            debug!("Prefixes root {} does not exist yet", root.display());
            let mut paths = Vec::new();
            if self.config.settings.display_default_bottle && self.config.default_bottle.is_dir() {
                paths.push(self.config.default_bottle.clone());
            }
            return Ok(paths);
        }
        self.scanner
            .list_bottle_paths(root, self.config.settings.display_default_bottle)
    }

    /// Summaries of every bottle
    ///
    /// A bottle that cannot be read is still listed, with its first error
    /// message attached; only a failing directory scan aborts.
    pub fn list(&self, wine_version: &str) -> Result<Vec<BottleSummary>> {
        let summaries: Vec<BottleSummary> = self
            .bottle_paths()?
            .iter()
            .map(|prefix| self.summary(prefix, wine_version))
            .collect();
        info!("Found {} bottle(s)", summaries.len());
        Ok(summaries)
    }

    /// Summary of one bottle
    pub fn summary(&self, prefix: &Path, wine_version: &str) -> BottleSummary {
        let bottle = Bottle::new(prefix);
        let mut summary = BottleSummary::defaults(prefix, wine_version);
        summary.is_default = bottle.is_default(&self.config.default_bottle);
        summary.status = bottle.status();

        let mut first_error: Option<Error> = None;
        let mut record = |e: Error| {
            warn!("{}", e);
            first_error.get_or_insert(e);
        };

        match BottleMetadata::load(prefix) {
            Ok(metadata) => {
                summary.name = metadata.name;
                summary.description = metadata.description;
            }
            Err(e) => record(e),
        }
        match bottle.windows_version() {
            Ok(windows) => summary.windows = windows,
            Err(e) => record(e),
        }
        match bottle.bitness() {
            Ok(bit) => summary.bit = bit,
            Err(e) => record(e),
        }
        match bottle.c_drive() {
            Ok(c_drive) => summary.c_drive = c_drive.to_string_lossy().to_string(),
            Err(e) => record(e),
        }
        match bottle.last_updated() {
            Ok(last_updated) => summary.last_updated = last_updated,
            Err(e) => record(e),
        }
        match bottle.audio_driver() {
            Ok(driver) => summary.audio_driver = driver,
            Err(e) => record(e),
        }
        match bottle.virtual_desktop() {
            Ok(resolution) => summary.virtual_desktop = resolution,
            Err(e) => record(e),
        }

        summary.error = first_error.map(|e| e.to_string());
        summary
    }

    /// Create a bottle inside the prefixes root and apply its settings
    ///
    /// Settings equal to Wine's defaults are not passed to winetricks.
    pub fn create(&self, wine: &Wine, winetricks: &Winetricks, options: &NewBottle) -> Result<PathBuf> {
        self.config.ensure_dirs()?;
        let prefix = self.config.prefixes_root().join(&options.name);
        if prefix.exists() {
            return Err(Error::BottleCreate {
                folder: folder_name(&prefix),
                command: String::from("(none, prefix already exists)"),
                prefix,
            });
        }

        wine.create_bottle(&prefix, options.bit, options.disable_gecko_mono)?;
        Wine::wait_for_wineserver(&prefix)?;

        if options.windows != DEFAULT_WINDOWS {
            winetricks.set_windows_version(&prefix, options.windows)?;
        }
        if let Some(resolution) = &options.virtual_desktop {
            winetricks.set_virtual_desktop(&prefix, resolution)?;
        }
        if options.audio_driver != DEFAULT_AUDIO_DRIVER {
            winetricks.set_audio_driver(&prefix, options.audio_driver)?;
        }

        let mut metadata = BottleMetadata::defaults(&prefix);
        metadata.name = options.name.clone();
        metadata.description = options.description.clone();
        metadata.save(&prefix)?;

        info!("Created bottle {}", prefix.display());
        Ok(prefix)
    }

    /// Delete a bottle; the default bottle is never removed
    pub fn remove(&self, prefix: &Path) -> Result<()> {
        if Bottle::new(prefix).is_default(&self.config.default_bottle) {
            return Err(Error::BottleRemove {
                reason: "refusing to remove the default Wine machine".into(),
                folder: folder_name(prefix),
                prefix: prefix.to_path_buf(),
            });
        }
        Wine::remove_bottle(prefix)
    }

    /// Give a bottle a new folder name inside its parent directory
    pub fn rename(&self, prefix: &Path, new_name: &str) -> Result<PathBuf> {
        let target = prefix
            .parent()
            .map(|parent| parent.join(new_name))
            .ok_or_else(|| Error::BottleRename {
                reason: "prefix has no parent directory".into(),
                folder: folder_name(prefix),
                from: prefix.to_path_buf(),
                to: PathBuf::from(new_name),
            })?;
        Wine::rename_bottle(prefix, &target)?;

        let mut metadata = BottleMetadata::load(&target)?;
        if metadata.name == folder_name(prefix) {
            metadata.name = folder_name(&target);
            metadata.save(&target)?;
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn manager(home: &Path) -> BottleManager {
        BottleManager::new(Config::with_home(home))
    }

    #[test]
    fn broken_bottle_is_listed_with_error() {
        let home = tempfile::tempdir().unwrap();
        let manager = manager(home.path());
        let prefix = manager.config().prefixes_root().join("empty");
        fs::create_dir_all(&prefix).unwrap();

        let list = manager.list("9.0").unwrap();
        assert_eq!(list.len(), 1);
        let summary = &list[0];
        assert_eq!(summary.name, "empty");
        assert!(!summary.status);
        assert_eq!(summary.windows, Windows::WindowsXP);
        assert_eq!(summary.bit, Bit::Win32);
        assert_eq!(summary.c_drive, UNKNOWN);
        assert_eq!(summary.wine_version, "9.0");
        let error = summary.error.as_deref().unwrap();
        assert!(error.contains("Could not open registry file"), "{}", error);
    }

    #[test]
    fn default_bottle_is_listed_when_root_is_missing() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir(home.path().join(".wine")).unwrap();
        let manager = manager(home.path());

        let paths = manager.bottle_paths().unwrap();
        assert_eq!(paths, vec![home.path().join(".wine")]);
        assert!(manager.summary(&paths[0], "9.0").is_default);
    }

    #[test]
    fn default_bottle_cannot_be_removed() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir(home.path().join(".wine")).unwrap();
        let manager = manager(home.path());

        assert!(matches!(
            manager.remove(&home.path().join(".wine")),
            Err(Error::BottleRemove { .. })
        ));
        assert!(home.path().join(".wine").is_dir());
    }

    #[test]
    fn rename_updates_default_name() {
        let home = tempfile::tempdir().unwrap();
        let manager = manager(home.path());
        let prefix = manager.config().prefixes_root().join("old");
        fs::create_dir_all(&prefix).unwrap();
        BottleMetadata::defaults(&prefix).save(&prefix).unwrap();

        let target = manager.rename(&prefix, "new").unwrap();
        assert!(!prefix.exists());
        assert_eq!(BottleMetadata::load(&target).unwrap().name, "new");
    }
}
