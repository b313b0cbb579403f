//! Bridge to the winetricks helper script

use crate::download::{make_executable, Downloader, WINETRICKS_URL};
use crate::error::{Error, Result};
use crate::windows::{AudioDriver, Windows};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Smallest virtual desktop winetricks is asked to create
pub const MIN_RESOLUTION: (u32, u32) = (640, 480);

/// A winetricks script on disk
#[derive(Debug, Clone)]
pub struct Winetricks {
    bin: PathBuf,
}

impl Winetricks {
    pub fn new<P: Into<PathBuf>>(bin: P) -> Self {
        Self { bin: bin.into() }
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    pub fn is_installed(&self) -> bool {
        self.bin.is_file()
    }

    /// Download the script from upstream and mark it executable
    pub async fn install(&self, progress: bool) -> Result<()> {
        if let Some(parent) = self.bin.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Winetricks(format!(
                    "Incorrect permissions to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Downloader::new()?
            .download(WINETRICKS_URL, &self.bin, progress)
            .await?;
        make_executable(&self.bin)?;

        if !self.is_installed() {
            return Err(Error::Winetricks(
                "Winetricks helper script can not be found after installation".into(),
            ));
        }
        Ok(())
    }

    /// Let winetricks replace itself with the latest release
    pub fn self_update(&self) -> Result<()> {
        self.require_installed(
            "Try to update the Winetricks script, while there is no winetricks installed",
        )?;
        if !self.run(None, &["--self-update"])? {
            let current = self.version().unwrap_or_default();
            return Err(Error::Winetricks(format!(
                "Could not update Winetricks, keep using the v{}",
                current
            )));
        }
        Ok(())
    }

    /// Release date of the script as `YYYYMMDD`
    pub fn version(&self) -> Result<String> {
        self.require_installed("Winetricks is not installed")?;
        let output = Command::new(&self.bin)
            .arg("--version")
            .output()
            .map_err(|e| Error::CommandExecution {
                command: format!("{} --version", self.bin.display()),
                error: e.to_string(),
            })?;

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.trim().chars().take(8).collect())
    }

    pub fn set_windows_version(&self, prefix: &Path, windows: Windows) -> Result<()> {
        self.require_installed("Winetricks is not installed")?;
        if !self.run(Some(prefix), &[windows.winetricks_verb()])? {
            return Err(Error::Winetricks("Could not set Windows OS version".into()));
        }
        Ok(())
    }

    /// Enable a virtual desktop of `resolution` (e.g. `1920x1080`)
    ///
    /// Resolutions smaller than 640x480 in either direction are raised to it.
    pub fn set_virtual_desktop(&self, prefix: &Path, resolution: &str) -> Result<()> {
        self.require_installed("Winetricks is not installed")?;
        let resolution = clamp_resolution(resolution)?;
        let arg = format!("vd={}", resolution);
        if !self.run(Some(prefix), &[arg.as_str()])? {
            return Err(Error::Winetricks(
                "Could not set virtual desktop resolution".into(),
            ));
        }
        Ok(())
    }

    pub fn disable_virtual_desktop(&self, prefix: &Path) -> Result<()> {
        self.require_installed("Winetricks is not installed")?;
        if !self.run(Some(prefix), &["vd=off"])? {
            return Err(Error::Winetricks("Could not Disable Virtual Desktop".into()));
        }
        Ok(())
    }

    pub fn set_audio_driver(&self, prefix: &Path, driver: AudioDriver) -> Result<()> {
        self.require_installed("Winetricks is not installed")?;
        let arg = format!("sound={}", driver.as_str());
        if !self.run(Some(prefix), &[arg.as_str()])? {
            return Err(Error::Winetricks("Could not set Audio driver".into()));
        }
        Ok(())
    }

    fn require_installed(&self, message: &str) -> Result<()> {
        if self.is_installed() {
            Ok(())
        } else {
            Err(Error::Winetricks(format!(
                "{} ({})",
                message,
                self.bin.display()
            )))
        }
    }

    /// Run winetricks with its output discarded; true on exit status 0
    fn run(&self, prefix: Option<&Path>, args: &[&str]) -> Result<bool> {
        let mut command = Command::new(&self.bin);
        command
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(prefix) = prefix {
            command.env("WINEPREFIX", prefix);
        }

        info!("Running winetricks {}", args.join(" "));
        let status = command.status().map_err(|e| Error::CommandExecution {
            command: format!("{} {}", self.bin.display(), args.join(" ")),
            error: e.to_string(),
        })?;
        debug!("winetricks exited with {:?}", status.code());
        Ok(status.success())
    }
}

/// Validate `WxH` and raise it to [`MIN_RESOLUTION`] when too small
pub fn clamp_resolution(resolution: &str) -> Result<String> {
    let re = Regex::new(r"^(\d+)x(\d+)$")
        .map_err(|e| Error::InvalidResolution(e.to_string()))?;
    let caps = re
        .captures(resolution.trim())
        .ok_or_else(|| Error::InvalidResolution(resolution.to_string()))?;

    let parse = |i: usize| {
        caps[i]
            .parse::<u32>()
            .map_err(|_| Error::InvalidResolution(resolution.to_string()))
    };
    let (width, height) = (parse(1)?, parse(2)?);

    if width < MIN_RESOLUTION.0 || height < MIN_RESOLUTION.1 {
        Ok(format!("{}x{}", MIN_RESOLUTION.0, MIN_RESOLUTION.1))
    } else {
        Ok(format!("{}x{}", width, height))
    }
}
