//! Configuration management for winecellar
//!
//! All locations derived from the home directory are computed once by
//! [`Config::new`] and handed to the components that need them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the general settings file inside the data directory
pub const SETTINGS_FILE: &str = "config.ini";

/// Winecellar configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory (~/.winecellar)
    pub data_dir: PathBuf,

    /// Default Wine bottle (~/.wine)
    pub default_bottle: PathBuf,

    /// Location of the winetricks script
    pub winetricks_bin: PathBuf,

    /// Desktop files Wine creates for Start Menu entries
    pub applications_dir: PathBuf,

    /// Icons Wine extracts for Start Menu entries
    pub icons_dir: PathBuf,

    /// User settings
    pub settings: GeneralSettings,

    /// Verbosity level (0-2)
    pub verbosity: u8,
}

/// Settings stored in `config.ini`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Directory holding the bottles
    pub default_folder: PathBuf,

    /// Also list the default `~/.wine` bottle
    pub display_default_bottle: bool,

    /// Use `wine64` instead of `wine`
    pub prefer_wine64: bool,

    /// Include stderr when capturing program output
    pub enable_logging_stderr: bool,
}

impl GeneralSettings {
    fn defaults(data_dir: &Path) -> Self {
        Self {
            default_folder: data_dir.join("prefixes"),
            display_default_bottle: true,
            prefer_wine64: false,
            enable_logging_stderr: true,
        }
    }
}

impl Config {
    /// Create a new config with default paths and settings
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".into()))?;
        Ok(Self::with_home(&home))
    }

    /// Build the configuration relative to `home`
    pub fn with_home(home: &Path) -> Self {
        let data_dir = home.join(".winecellar");
        let settings = GeneralSettings::defaults(&data_dir);

        Self {
            winetricks_bin: data_dir.join("winetricks"),
            default_bottle: home.join(".wine"),
            applications_dir: home.join(".local/share/applications/wine"),
            icons_dir: home.join(".local/share/icons/hicolor/32x32/apps"),
            data_dir,
            settings,
            verbosity: 0,
        }
    }

    /// Create the config and load `config.ini` and the environment on top
    pub fn load() -> Result<Self> {
        let mut config = Self::new()?;
        config.settings = config.read_settings()?;
        Ok(config)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    /// Directory the bottles live in
    pub fn prefixes_root(&self) -> &Path {
        &self.settings.default_folder
    }

    /// Read settings: defaults, then `config.ini`, then `WINECELLAR__GENERAL__*`
    /// environment variables
    pub fn read_settings(&self) -> Result<GeneralSettings> {
        let defaults = GeneralSettings::defaults(&self.data_dir);
        let path = self.settings_file();
        debug!("Reading settings from {:?}", path);

        let settings = ::config::Config::builder()
            .set_default(
                "general.default_folder",
                defaults.default_folder.to_string_lossy().to_string(),
            )?
            .set_default("general.display_default_bottle", defaults.display_default_bottle)?
            .set_default("general.prefer_wine64", defaults.prefer_wine64)?
            .set_default("general.enable_logging_stderr", defaults.enable_logging_stderr)?
            .add_source(::config::File::from(path).format(::config::FileFormat::Ini).required(false))
            .add_source(::config::Environment::with_prefix("WINECELLAR").separator("__"))
            .build()?;

        Ok(settings.get::<GeneralSettings>("general")?)
    }

    /// Write the current settings to `config.ini`
    pub fn save_settings(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let s = &self.settings;
        let content = format!(
            "[general]\ndefault_folder={}\ndisplay_default_bottle={}\nprefer_wine64={}\nenable_logging_stderr={}\n",
            ini_escape(&s.default_folder.to_string_lossy()),
            s.display_default_bottle,
            s.prefer_wine64,
            s.enable_logging_stderr
        );
        std::fs::write(self.settings_file(), content)?;
        info!("Settings written to {:?}", self.settings_file());
        Ok(())
    }

    /// Ensure directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.prefixes_root())?;
        Ok(())
    }

    /// Turn a bottle name or path given by the user into a prefix path
    ///
    /// Existing directories are used as-is, anything else is taken as the
    /// name of a bottle inside the prefixes root.
    pub fn resolve_prefix(&self, name_or_path: &str) -> PathBuf {
        let path = Path::new(name_or_path);
        if path.is_dir() || path.is_absolute() {
            path.to_path_buf()
        } else {
            self.prefixes_root().join(name_or_path)
        }
    }
}

/// Escape a value for the INI reader behind the `config` crate
///
/// Backslashes, quotes and line breaks would otherwise be read back as escape
/// sequences or quoting.
pub(crate) fn ini_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}
