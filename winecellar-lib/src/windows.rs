//! Bottle enums and the Windows version table
//!
//! The table maps the strings Wine writes into a bottle's registry onto a
//! [`Windows`] release. Its order matters: lookups return the first match, so
//! newer releases and server editions come before the releases they share
//! version numbers with.
//! Source of the values: `programs/winecfg/appdefaults.c` in the Wine tree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Windows releases a bottle can emulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Windows {
    Windows20,
    Windows30,
    Windows31,
    WindowsNT351,
    WindowsNT40,
    Windows95,
    Windows98,
    WindowsME,
    Windows2000,
    WindowsXP,
    Windows2003,
    WindowsVista,
    Windows2008,
    Windows7,
    Windows2008R2,
    Windows8,
    Windows81,
    Windows10,
}

impl Windows {
    pub fn as_str(&self) -> &'static str {
        match self {
            Windows::Windows20 => "Windows 2.0",
            Windows::Windows30 => "Windows 3.0",
            Windows::Windows31 => "Windows 3.1",
            Windows::WindowsNT351 => "Windows NT 3.51",
            Windows::WindowsNT40 => "Windows NT 4.0",
            Windows::Windows95 => "Windows 95",
            Windows::Windows98 => "Windows 98",
            Windows::WindowsME => "Windows ME",
            Windows::Windows2000 => "Windows 2000",
            Windows::WindowsXP => "Windows XP",
            Windows::Windows2003 => "Windows 2003",
            Windows::WindowsVista => "Windows Vista",
            Windows::Windows2008 => "Windows 2008",
            Windows::Windows7 => "Windows 7",
            Windows::Windows2008R2 => "Windows 2008 R2",
            Windows::Windows8 => "Windows 8",
            Windows::Windows81 => "Windows 8.1",
            Windows::Windows10 => "Windows 10",
        }
    }

    /// Winetricks verb that switches a bottle to this release
    pub fn winetricks_verb(&self) -> &'static str {
        match self {
            // winxp64 only exists for 64-bit bottles, plain winxp works for both
            Windows::WindowsXP => "winxp",
            other => WINDOWS_VERSIONS
                .iter()
                .find(|entry| entry.windows == *other)
                .map(|entry| entry.version)
                .unwrap_or("win7"),
        }
    }
}

impl fmt::Display for Windows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Windows {
    type Err = String;

    /// Parse a version tag such as `win7` or `winxp64`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        find_by_tag(&s.to_lowercase()).ok_or_else(|| format!("Unknown Windows version: {}", s))
    }
}

/// Bottle architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bit {
    #[serde(rename = "win32")]
    Win32,
    #[serde(rename = "win64")]
    Win64,
}

impl Bit {
    /// Value used by `WINEARCH` and the registry `#arch` meta line
    pub fn as_str(&self) -> &'static str {
        match self {
            Bit::Win32 => "win32",
            Bit::Win64 => "win64",
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bit::Win32 => f.write_str("32"),
            Bit::Win64 => f.write_str("64"),
        }
    }
}

impl FromStr for Bit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "win32" | "32" => Ok(Bit::Win32),
            "win64" | "64" => Ok(Bit::Win64),
            _ => Err(format!("Unknown architecture: {}", s)),
        }
    }
}

/// Audio drivers supported by Wine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioDriver {
    #[serde(rename = "pulse")]
    PulseAudio,
    #[serde(rename = "alsa")]
    Alsa,
    #[serde(rename = "coreaudio")]
    CoreAudio,
    #[serde(rename = "oss")]
    Oss,
    #[serde(rename = "disabled")]
    Disabled,
}

impl AudioDriver {
    /// Registry value and winetricks `sound=` argument
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioDriver::PulseAudio => "pulse",
            AudioDriver::Alsa => "alsa",
            AudioDriver::CoreAudio => "coreaudio",
            AudioDriver::Oss => "oss",
            AudioDriver::Disabled => "disabled",
        }
    }
}

impl fmt::Display for AudioDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioDriver::PulseAudio => "PulseAudio",
            AudioDriver::Alsa => "Advanced Linux Sound Architecture (ALSA)",
            AudioDriver::CoreAudio => "Core Audio",
            AudioDriver::Oss => "Open Sound System (OSS)",
            AudioDriver::Disabled => "Disabled",
        };
        f.write_str(name)
    }
}

impl FromStr for AudioDriver {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pulse" | "pulseaudio" => Ok(AudioDriver::PulseAudio),
            "alsa" => Ok(AudioDriver::Alsa),
            "coreaudio" => Ok(AudioDriver::CoreAudio),
            "oss" => Ok(AudioDriver::Oss),
            "disabled" => Ok(AudioDriver::Disabled),
            _ => Err(format!("Unknown audio driver: {}", s)),
        }
    }
}

/// DLL load order as written in the `DllOverrides` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadOrder {
    Builtin,
    Native,
    BuiltinNative,
    NativeBuiltin,
    Disabled,
}

impl LoadOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadOrder::Builtin => "builtin",
            LoadOrder::Native => "native",
            LoadOrder::BuiltinNative => "builtin,native",
            LoadOrder::NativeBuiltin => "native,builtin",
            LoadOrder::Disabled => "",
        }
    }
}

impl fmt::Display for LoadOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadOrder::Disabled => f.write_str("disabled"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for LoadOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "builtin" => Ok(LoadOrder::Builtin),
            "native" => Ok(LoadOrder::Native),
            "builtin,native" => Ok(LoadOrder::BuiltinNative),
            "native,builtin" => Ok(LoadOrder::NativeBuiltin),
            "" | "disabled" => Ok(LoadOrder::Disabled),
            _ => Err(format!("Unknown load order: {}", s)),
        }
    }
}

/// Windows release Wine uses when nothing else can be determined
pub const DEFAULT_WINDOWS: Windows = Windows::Windows7;

/// Audio driver Wine uses when none is configured
pub const DEFAULT_AUDIO_DRIVER: AudioDriver = AudioDriver::PulseAudio;

/// Product type of a workstation install; assumed when the registry has none
pub const DEFAULT_PRODUCT_TYPE: &str = "WinNT";

/// One row of the Windows version table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowsVersionEntry {
    pub windows: Windows,
    /// Short tag as used by `[Software\\Wine]` "Version" and winetricks
    pub version: &'static str,
    pub version_number: &'static str,
    pub build_number: &'static str,
    pub product_type: &'static str,
}

const fn entry(
    windows: Windows,
    version: &'static str,
    version_number: &'static str,
    build_number: &'static str,
    product_type: &'static str,
) -> WindowsVersionEntry {
    WindowsVersionEntry {
        windows,
        version,
        version_number,
        build_number,
        product_type,
    }
}

/// Known Windows releases, most specific first
pub static WINDOWS_VERSIONS: [WindowsVersionEntry; 19] = [
    entry(Windows::Windows10, "win10", "10.0", "18362", "WinNT"),
    entry(Windows::Windows81, "win81", "6.3", "9600", "WinNT"),
    entry(Windows::Windows8, "win8", "6.2", "9200", "WinNT"),
    entry(Windows::Windows2008R2, "win2008r2", "6.1", "7601", "ServerNT"),
    entry(Windows::Windows7, "win7", "6.1", "7601", "WinNT"),
    entry(Windows::Windows2008, "win2008", "6.0", "6002", "ServerNT"),
    entry(Windows::WindowsVista, "vista", "6.0", "6002", "WinNT"),
    entry(Windows::Windows2003, "win2003", "5.2", "3790", "ServerNT"),
    entry(Windows::WindowsXP, "winxp64", "5.2", "3790", "WinNT"),
    entry(Windows::WindowsXP, "winxp", "5.1", "2600", "WinNT"),
    entry(Windows::Windows2000, "win2k", "5.0", "2195", "WinNT"),
    entry(Windows::WindowsME, "winme", "4.90", "3000", ""),
    entry(Windows::Windows98, "win98", "4.10", "2222", ""),
    entry(Windows::Windows95, "win95", "4.0", "950", ""),
    entry(Windows::WindowsNT40, "nt40", "4.0", "1381", "WinNT"),
    entry(Windows::WindowsNT351, "nt351", "3.51", "1057", "WinNT"),
    entry(Windows::Windows31, "win31", "3.10", "0", ""),
    entry(Windows::Windows30, "win30", "3.0", "0", ""),
    entry(Windows::Windows20, "win20", "2.0", "0", ""),
];

/// Match the `Version` value Wine stores in the user registry
pub fn find_by_tag(tag: &str) -> Option<Windows> {
    WINDOWS_VERSIONS
        .iter()
        .find(|entry| entry.version == tag)
        .map(|entry| entry.windows)
}

/// Match the NT `CurrentVersion` / `CurrentBuildNumber` / `ProductType` triple
///
/// Entries matching both version and build are preferred; when none do, the
/// version alone is used. Among the candidates the one with the requested
/// product type wins (a missing product type means a workstation, `WinNT`),
/// otherwise the first candidate in table order.
pub fn find_by_nt_version(
    version: &str,
    build_number: Option<&str>,
    product_type: Option<&str>,
) -> Option<Windows> {
    let product_type = product_type.unwrap_or(DEFAULT_PRODUCT_TYPE);

    let with_build: Vec<&WindowsVersionEntry> = WINDOWS_VERSIONS
        .iter()
        .filter(|e| e.version_number == version && Some(e.build_number) == build_number)
        .collect();

    let candidates = if with_build.is_empty() {
        WINDOWS_VERSIONS
            .iter()
            .filter(|e| e.version_number == version)
            .collect()
    } else {
        with_build
    };

    candidates
        .iter()
        .find(|e| e.product_type == product_type)
        .or_else(|| candidates.first())
        .map(|e| e.windows)
}

/// Match the 9x style `VersionNumber` value, e.g. `4.10.2222`
///
/// Returns `None` when the string cannot be matched exactly; callers fall back
/// to [`DEFAULT_WINDOWS`].
pub fn find_by_9x_version(version_number: &str) -> Option<Windows> {
    let parts: Vec<&str> = version_number.split('.').collect();
    let version = (parts.len() >= 2).then(|| format!("{}.{}", parts[0], parts[1]))?;
    let build = parts.get(2).copied().unwrap_or_default();

    WINDOWS_VERSIONS
        .iter()
        .find(|e| e.version_number == version && e.build_number == build)
        .map(|e| e.windows)
}
