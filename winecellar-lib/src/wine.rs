//! Wine interface for creating bottles and running programs inside them

use crate::bottle::folder_name;
use crate::error::{Error, Result};
use crate::windows::Bit;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info, warn};
use which::which;

const WINE: &str = "wine";
const WINE64: &str = "wine64";

/// Exit status of `timeout` when the command ran out of time
const TIMEOUT_EXIT_CODE: i32 = 124;

/// Wine installation and version information
#[derive(Debug, Clone)]
pub struct Wine {
    /// Path to wine binary
    pub wine_bin: PathBuf,

    /// Whether `wine_bin` is the 64-bit `wine64` binary
    pub wine64: bool,

    /// Wine version string (e.g., "wine-8.0 (Staging)")
    pub version: String,

    /// Stripped version (e.g., "8.0")
    pub version_stripped: String,
}

impl Wine {
    /// Detect the Wine installation, trying `wine` then `wine64` (reversed
    /// when `prefer_wine64` is set)
    pub fn detect(prefer_wine64: bool) -> Result<Self> {
        let order = if prefer_wine64 {
            [WINE64, WINE]
        } else {
            [WINE, WINE64]
        };

        let (wine_bin, name) = order
            .iter()
            .find_map(|name| which(name).ok().map(|path| (path, *name)))
            .ok_or_else(|| Error::Wine("Could not receive Wine version!\n\nIs Wine installed?".into()))?;

        let version = Self::get_version(&wine_bin)?;
        let version_stripped = Self::strip_version(&version);
        debug!("Using {} ({})", wine_bin.display(), version);

        Ok(Self {
            wine_bin,
            wine64: name == WINE64,
            version,
            version_stripped,
        })
    }

    /// Get wine version
    fn get_version(wine_bin: &Path) -> Result<String> {
        let output = Command::new(wine_bin)
            .arg("--version")
            .output()
            .map_err(|e| Error::CommandExecution {
                command: format!("{} --version", wine_bin.display()),
                error: e.to_string(),
            })?;

        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if version.is_empty() {
            return Err(Error::Wine(
                "Could not receive Wine version!\n\nIs Wine installed?".into(),
            ));
        }

        Ok(version)
    }

    /// Strip version string to just the number
    /// e.g., "wine-8.0 (Staging)" -> "8.0"
    pub fn strip_version(version: &str) -> String {
        let version = version.strip_prefix("wine-").unwrap_or(version);
        version
            .split_whitespace()
            .next()
            .unwrap_or(version)
            .to_string()
    }

    /// Create a new bottle by running `wineboot` in an empty prefix
    pub fn create_bottle(&self, prefix: &Path, bit: Bit, disable_gecko_mono: bool) -> Result<()> {
        let mut command = Command::new(&self.wine_bin);
        command
            .arg("wineboot")
            .env("WINEPREFIX", prefix)
            .env("WINEARCH", bit.as_str());
        if disable_gecko_mono {
            command.env("WINEDLLOVERRIDES", "mscoree=d;mshtml=d");
        }

        let described = describe(&command);
        info!("Creating bottle: {}", described);

        let create_error = || Error::BottleCreate {
            folder: folder_name(prefix),
            command: described.clone(),
            prefix: prefix.to_path_buf(),
        };

        let status = command.status().map_err(|e| {
            warn!("Could not start wineboot: {}", e);
            create_error()
        })?;
        if !status.success() {
            return Err(create_error());
        }
        Ok(())
    }

    /// Delete a bottle directory with everything in it
    pub fn remove_bottle(prefix: &Path) -> Result<()> {
        if !prefix.is_dir() {
            return Err(Error::BottleRemove {
                reason: "prefix is not a directory".into(),
                folder: folder_name(prefix),
                prefix: prefix.to_path_buf(),
            });
        }
        info!("Removing bottle {}", prefix.display());
        std::fs::remove_dir_all(prefix).map_err(|e| Error::BottleRemove {
            reason: e.to_string(),
            folder: folder_name(prefix),
            prefix: prefix.to_path_buf(),
        })
    }

    /// Move a bottle to a new prefix
    pub fn rename_bottle(current: &Path, new: &Path) -> Result<()> {
        let rename_error = |reason: String| Error::BottleRename {
            reason,
            folder: folder_name(current),
            from: current.to_path_buf(),
            to: new.to_path_buf(),
        };

        if !current.is_dir() {
            return Err(rename_error("prefix is not a directory".into()));
        }
        if new.exists() {
            return Err(rename_error("destination already exists".into()));
        }
        info!("Renaming bottle {} to {}", current.display(), new.display());
        std::fs::rename(current, new).map_err(|e| rename_error(e.to_string()))
    }

    /// Run a Windows program inside a bottle and capture its output
    ///
    /// With `stderr_output` set, stderr is appended to the returned text.
    pub fn run_program<I, S>(
        &self,
        prefix: &Path,
        debug_log_level: u8,
        program: &str,
        args: I,
        stderr_output: bool,
    ) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.wine_bin);
        command.arg(program).args(args).env("WINEPREFIX", prefix);
        if let Some(debug) = winedebug(debug_log_level) {
            command.env("WINEDEBUG", debug);
        }

        let output = self.output(&mut command)?;
        if !output.status.success() {
            warn!(
                "{} exited with {:?}",
                program,
                output.status.code()
            );
        }

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        if stderr_output {
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }
        Ok(text)
    }

    /// Block until the wineserver of `prefix` has exited, at most 60 seconds
    pub fn wait_for_wineserver(prefix: &Path) -> Result<()> {
        let mut command = Command::new("timeout");
        command
            .args(["60", "wineserver", "-w"])
            .env("WINEPREFIX", prefix);

        let status = command.status().map_err(|e| Error::CommandExecution {
            command: describe(&command),
            error: e.to_string(),
        })?;
        if status.code() == Some(TIMEOUT_EXIT_CODE) {
            warn!("Time-out of wineserver wait command triggered (wineserver is still running..)");
        }
        Ok(())
    }

    /// GUID of an installed application, as listed by `uninstaller --list`
    pub fn guid(&self, prefix: &Path, application_name: &str) -> Result<Option<String>> {
        let mut command = Command::new(&self.wine_bin);
        command.args(["uninstaller", "--list"]).env("WINEPREFIX", prefix);
        let output = self.output(&mut command)?;

        Ok(parse_guid(&String::from_utf8_lossy(&output.stdout), application_name))
    }

    fn output(&self, command: &mut Command) -> Result<Output> {
        debug!("Executing: {}", describe(command));
        command.output().map_err(|e| Error::CommandExecution {
            command: describe(command),
            error: e.to_string(),
        })
    }
}

/// `WINEDEBUG` value for a debug log level; `None` for level 1 (Wine's default)
///
/// Levels above 9 are not defined and map to `None` as well.
pub fn winedebug(log_level: u8) -> Option<&'static str> {
    match log_level {
        0 => Some("-all"),
        2 => Some("fixme-all"),
        3 => Some("warn+all"),
        4 => Some("+fps"),
        5 => Some("-d3d"),
        6 => Some("+relay,+heap"),
        7 => Some("+relay,+msgbox"),
        8 => Some("+all,-relay"),
        9 => Some("+all"),
        _ => None,
    }
}

/// Find the `{GUID}` on the first line of an `uninstaller --list` output
/// that mentions `application_name`
fn parse_guid(listing: &str, application_name: &str) -> Option<String> {
    listing
        .lines()
        .find(|line| line.contains(application_name))
        .and_then(|line| {
            let start = line.find('{')? + 1;
            let end = line[start..].find('}')? + start;
            Some(line[start..end].to_string())
        })
}

/// Render a command with its environment like a shell line, for messages
fn describe(command: &Command) -> String {
    let env = command
        .get_envs()
        .filter_map(|(key, value)| {
            value.map(|v| format!("{}=\"{}\" ", key.to_string_lossy(), v.to_string_lossy()))
        })
        .collect::<String>();
    let args = command
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}{} {}", env, command.get_program().to_string_lossy(), args)
        .trim_end()
        .to_string()
}
