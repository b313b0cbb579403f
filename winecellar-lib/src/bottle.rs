//! Bottle configuration resolved from a prefix's registry files
//!
//! Nothing here is cached: every call goes back to disk, so the answers always
//! reflect what Wine (or winetricks) last wrote.

use crate::error::{Error, Result};
use crate::registry::{KeyFilter, RegistryFile};
use crate::windows::{
    self, AudioDriver, Bit, LoadOrder, Windows, DEFAULT_AUDIO_DRIVER, DEFAULT_WINDOWS,
};
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SYSTEM_REG: &str = "system.reg";
pub const USER_REG: &str = "user.reg";
pub const UPDATE_TIMESTAMP: &str = ".update-timestamp";

const KEY_9X: &str = r"[Software\\Microsoft\\Windows\\CurrentVersion]";
const KEY_NT: &str = r"[Software\\Microsoft\\Windows NT\\CurrentVersion]";
const KEY_PRODUCT_OPTIONS: &str = r"[System\\CurrentControlSet\\Control\\ProductOptions]";
const KEY_WINE: &str = r"[Software\\Wine]";
const KEY_AUDIO: &str = r"[Software\\Wine\\Drivers]";
const KEY_VIRTUAL_DESKTOP: &str = r"[Software\\Wine\\Explorer]";
const KEY_VIRTUAL_DESKTOPS: &str = r"[Software\\Wine\\Explorer\\Desktops]";
const KEY_DLL_OVERRIDES: &str = r"[Software\\Wine\\DllOverrides]";
const KEY_MENU_FILES: &str = r"[Software\\Wine\\MenuFiles]";
const KEY_UNINSTALL: &str = r"[Software\\Microsoft\\Windows\\CurrentVersion\\Uninstall\\";
const KEY_FONTS_32: &str = r"[Software\\Microsoft\\Windows\\CurrentVersion\\Fonts]";
const KEY_FONTS_64: &str = r"[Software\\Wow6432Node\\Microsoft\\Windows\\CurrentVersion\\Fonts]";

/// Snapshot of the settings a bottle is running with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BottleConfiguration {
    pub windows_version: Windows,
    pub bitness: Bit,
    pub audio_driver: AudioDriver,
    pub virtual_desktop_resolution: Option<String>,
    pub folder_name: String,
}

/// A single `DllOverrides` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DllOverride {
    pub dll_name: String,
    pub load_order: LoadOrder,
}

/// A Wine bottle, identified by its prefix directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bottle {
    prefix: PathBuf,
}

impl Bottle {
    pub fn new<P: Into<PathBuf>>(prefix: P) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn user_registry(&self) -> RegistryFile {
        RegistryFile::new(self.prefix.join(USER_REG))
    }

    pub fn system_registry(&self) -> RegistryFile {
        RegistryFile::new(self.prefix.join(SYSTEM_REG))
    }

    /// Directory name of the bottle, without the leading dot of hidden folders
    pub fn folder_name(&self) -> String {
        folder_name(&self.prefix)
    }

    /// Resolve all settings at once
    pub fn configuration(&self) -> Result<BottleConfiguration> {
        Ok(BottleConfiguration {
            windows_version: self.windows_version()?,
            bitness: self.bitness()?,
            audio_driver: self.audio_driver()?,
            virtual_desktop_resolution: self.virtual_desktop()?,
            folder_name: self.folder_name(),
        })
    }

    /// Determine the emulated Windows release
    ///
    /// Tries the version Wine records in the user registry, then the NT
    /// version keys of the system registry, then the 9x version key.
    pub fn windows_version(&self) -> Result<Windows> {
        let user = self.user_registry();
        if let Some(tag) = non_empty(user.value(KEY_WINE, "Version")?) {
            if let Some(windows) = windows::find_by_tag(&tag) {
                debug!("{}: Windows version from user registry: {}", self.folder_name(), tag);
                return Ok(windows);
            }
        }

        let system = self.system_registry();
        if let Some(version) = non_empty(system.value(KEY_NT, "CurrentVersion")?) {
            let build = non_empty(system.value(KEY_NT, "CurrentBuildNumber")?);
            let product_type = non_empty(system.value(KEY_PRODUCT_OPTIONS, "ProductType")?);
            debug!(
                "{}: NT version {} build {:?} type {:?}",
                self.folder_name(),
                version,
                build,
                product_type
            );
            return windows::find_by_nt_version(&version, build.as_deref(), product_type.as_deref())
                .ok_or_else(|| self.unknown_windows_version());
        }

        if let Some(version) = non_empty(system.value(KEY_9X, "VersionNumber")?) {
            debug!("{}: 9x version {}", self.folder_name(), version);
            return Ok(windows::find_by_9x_version(&version).unwrap_or(DEFAULT_WINDOWS));
        }

        Err(self.unknown_windows_version())
    }

    /// 32 or 64-bit, from the `#arch` meta line of the user registry
    pub fn bitness(&self) -> Result<Bit> {
        match non_empty(self.user_registry().meta_data("arch")?) {
            Some(value) => match value.as_str() {
                "win32" => Ok(Bit::Win32),
                "win64" => Ok(Bit::Win64),
                _ => Err(Error::UnknownBitness {
                    value,
                    folder: self.folder_name(),
                    prefix: self.prefix.clone(),
                }),
            },
            None => Err(Error::MissingBitness {
                folder: self.folder_name(),
                prefix: self.prefix.clone(),
            }),
        }
    }

    /// Configured audio driver, Wine's default when unset or unknown
    pub fn audio_driver(&self) -> Result<AudioDriver> {
        let value = self.user_registry().value(KEY_AUDIO, "Audio")?;
        Ok(match non_empty(value) {
            Some(value) => value.parse().unwrap_or_else(|_| {
                warn!("{}: unknown audio driver {:?}", self.folder_name(), value);
                DEFAULT_AUDIO_DRIVER
            }),
            None => DEFAULT_AUDIO_DRIVER,
        })
    }

    /// Virtual desktop resolution (e.g. `1024x768`), `None` when disabled
    pub fn virtual_desktop(&self) -> Result<Option<String>> {
        let user = self.user_registry();
        let Some(desktop) = non_empty(user.value(KEY_VIRTUAL_DESKTOP, "Desktop")?) else {
            return Ok(None);
        };
        // The resolution is stored under the desktop's name, "Default" unless renamed
        Ok(non_empty(user.value(KEY_VIRTUAL_DESKTOPS, &desktop)?))
    }

    /// Whether `dll_name` is overridden with exactly `load_order`
    pub fn dll_override(&self, dll_name: &str, load_order: LoadOrder) -> Result<bool> {
        let value = self.user_registry().value(KEY_DLL_OVERRIDES, dll_name)?;
        Ok(value.as_deref() == Some(load_order.as_str()))
    }

    /// All DLL overrides of the bottle
    pub fn dll_overrides(&self) -> Result<Vec<DllOverride>> {
        let lines = self.user_registry().keys(KEY_DLL_OVERRIDES)?;
        Ok(lines
            .iter()
            .filter_map(|line| {
                let (name, order) = line.split_once('=')?;
                let dll_name = name.trim_matches('"').to_string();
                match order.trim_matches('"').parse() {
                    Ok(load_order) => Some(DllOverride {
                        dll_name,
                        load_order,
                    }),
                    Err(e) => {
                        debug!("{}: skipping override {}: {}", self.folder_name(), dll_name, e);
                        None
                    }
                }
            })
            .collect())
    }

    /// Display name of an installed program, by GUID or uninstall key name
    pub fn uninstaller(&self, uninstaller_key: &str) -> Result<Option<String>> {
        let key = format!("{}{}", KEY_UNINSTALL, uninstaller_key);
        Ok(non_empty(self.system_registry().value(&key, "DisplayName")?))
    }

    /// File name registered for `font_name`
    pub fn font_filename(&self, bit: Bit, font_name: &str) -> Result<Option<String>> {
        let key = match bit {
            Bit::Win32 => KEY_FONTS_32,
            Bit::Win64 => KEY_FONTS_64,
        };
        Ok(non_empty(self.system_registry().value(key, font_name)?))
    }

    /// Start Menu shortcuts (`.lnk` paths) Wine created menu entries for
    pub fn menu_items(&self) -> Result<Vec<String>> {
        let filter = KeyFilter::including("Start Menu").excluding("applications-merged");
        self.user_registry().keys_data(KEY_MENU_FILES, &filter)
    }

    /// Minimal sanity check: the prefix looks like a Wine bottle and its
    /// Windows version can be resolved
    pub fn status(&self) -> bool {
        if !self.prefix.is_dir()
            || !self.prefix.join("dosdevices").is_dir()
            || !self.prefix.join(SYSTEM_REG).is_file()
        {
            return false;
        }
        match self.windows_version() {
            Ok(_) => true,
            Err(e) => {
                debug!("{}: status check failed: {}", self.folder_name(), e);
                false
            }
        }
    }

    /// Local date/time of the last `wineboot` update
    pub fn last_updated(&self) -> Result<String> {
        let path = self.prefix.join(UPDATE_TIMESTAMP);
        let content = std::fs::read_to_string(&path).map_err(|_| self.last_updated_error())?;
        let secs: i64 = content
            .trim()
            .parse()
            .map_err(|_| self.last_updated_error())?;
        let time = Local
            .timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| self.last_updated_error())?;
        Ok(time.format("%c").to_string())
    }

    /// Location of the C:\ drive
    pub fn c_drive(&self) -> Result<PathBuf> {
        let c_drive = self.prefix.join("dosdevices").join("c:");
        if self.prefix.is_dir() && c_drive.is_dir() {
            Ok(c_drive)
        } else {
            Err(Error::CDrive {
                folder: self.folder_name(),
                prefix: self.prefix.clone(),
            })
        }
    }

    /// Whether this is the default `~/.wine` bottle
    pub fn is_default(&self, default_bottle: &Path) -> bool {
        self.prefix == default_bottle
    }

    fn unknown_windows_version(&self) -> Error {
        Error::UnknownWindowsVersion {
            assumed: DEFAULT_WINDOWS.to_string(),
            folder: self.folder_name(),
            prefix: self.prefix.clone(),
        }
    }

    fn last_updated_error(&self) -> Error {
        Error::LastUpdated {
            folder: self.folder_name(),
            prefix: self.prefix.clone(),
        }
    }
}

/// Last component of a prefix path, leading dot removed
pub fn folder_name(prefix: &Path) -> String {
    let Some(name) = prefix.file_name() else {
        return "- Unknown -".to_string();
    };
    let name = name.to_string_lossy();
    name.strip_prefix('.').unwrap_or(&name).to_string()
}

/// Icon of a Start Menu shortcut, looked up through the `.desktop` file Wine
/// generated for it
///
/// Returns `Ok(None)` when the desktop file has no `Icon=` entry.
pub fn program_icon_path(
    shortcut_path: &str,
    applications_dir: &Path,
    icons_dir: &Path,
) -> Result<Option<PathBuf>> {
    const START_MENU: &str = "Start Menu\\";

    let pos = shortcut_path.find(START_MENU).ok_or_else(|| {
        Error::MenuItem(format!(
            "Application menu item is not part of the start menu: {}",
            shortcut_path
        ))
    })?;
    let relative = shortcut_path[pos + START_MENU.len()..].replace('\\', "/");

    let desktop_file = Path::new(&relative);
    if desktop_file.extension().is_none() {
        return Err(Error::MenuItem(format!(
            "Could not find extension in application menu item: {}",
            shortcut_path
        )));
    }
    let desktop_file = applications_dir.join(desktop_file.with_extension("desktop"));

    let content = std::fs::read_to_string(&desktop_file)?;
    Ok(content
        .lines()
        .find_map(|line| line.strip_prefix("Icon="))
        .map(|icon| icons_dir.join(format!("{}.png", icon.trim()))))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_name_strips_hidden_dot() {
        assert_eq!(folder_name(Path::new("/home/user/.wine")), "wine");
        assert_eq!(folder_name(Path::new("/home/user/prefixes/Steam")), "Steam");
        assert_eq!(folder_name(Path::new("/")), "- Unknown -");
    }

    #[test]
    fn icon_path_requires_start_menu() {
        let err = program_icon_path(
            r"C:\users\Public\Desktop\Game.lnk",
            Path::new("/apps"),
            Path::new("/icons"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("not part of the start menu"));
    }

    #[test]
    fn icon_path_requires_extension() {
        let err = program_icon_path(
            r"C:\users\Public\Start Menu\Programs\Game",
            Path::new("/apps"),
            Path::new("/icons"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Could not find extension"));
    }

    #[test]
    fn icon_path_from_desktop_file() {
        let dir = tempfile::tempdir().unwrap();
        let apps = dir.path().join("applications");
        std::fs::create_dir_all(apps.join("Programs/Game")).unwrap();
        std::fs::write(
            apps.join("Programs/Game/Play.desktop"),
            "[Desktop Entry]\nName=Play\nIcon=ABCD_play.0\nType=Application\n",
        )
        .unwrap();

        let icon = program_icon_path(
            r"C:\users\Public\Start Menu\Programs\Game\Play.lnk",
            &apps,
            Path::new("/icons"),
        )
        .unwrap();
        assert_eq!(icon, Some(PathBuf::from("/icons/ABCD_play.0.png")));
    }
}
