//! Error types for winecellar

use std::path::PathBuf;
use thiserror::Error;

/// Winecellar result type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for bottle operations
///
/// A key or value that is simply missing from a registry file is never an
/// error: readers return `Ok(None)` or an empty list for that case.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not open registry file {}: {source}", .path.display())]
    RegistryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Could not determine Windows version, we assume {assumed}. Wine machine: {folder}\n\nFull location: {}",
        .prefix.display()
    )]
    UnknownWindowsVersion {
        assumed: String,
        folder: String,
        prefix: PathBuf,
    },

    #[error(
        "Could not determine Windows system bit, for Wine machine: {folder}\n\nFull location: {}",
        .prefix.display()
    )]
    MissingBitness { folder: String, prefix: PathBuf },

    #[error(
        "Could not determine Windows system bit (not win32 and not win64, value: {value}), for Wine machine: {folder}\n\nFull location: {}",
        .prefix.display()
    )]
    UnknownBitness {
        value: String,
        folder: String,
        prefix: PathBuf,
    },

    #[error(
        "Could not determine last time wine update timestamp, for Wine machine: {folder}\n\nFull location: {}",
        .prefix.display()
    )]
    LastUpdated { folder: String, prefix: PathBuf },

    #[error(
        "Could not determine C:\\ drive location, for Wine machine: {folder}\n\nFull location: {}",
        .prefix.display()
    )]
    CDrive { folder: String, prefix: PathBuf },

    #[error(
        "Something went wrong when creating a new Windows machine. Wine prefix: {folder}\n\nCommand executed: {command}\nFull path location: {}",
        .prefix.display()
    )]
    BottleCreate {
        folder: String,
        command: String,
        prefix: PathBuf,
    },

    #[error("Could not remove Windows Machine: {reason}. Wine machine: {folder}\n\nFull path location: {}", .prefix.display())]
    BottleRemove {
        reason: String,
        folder: String,
        prefix: PathBuf,
    },

    #[error(
        "Could not rename Windows Machine: {reason}. Wine machine: {folder}\n\nCurrent full path location: {}. Tried to rename to: {}",
        .from.display(),
        .to.display()
    )]
    BottleRename {
        reason: String,
        folder: String,
        from: PathBuf,
        to: PathBuf,
    },

    #[error("Application menu item error: {0}")]
    MenuItem(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("Wine error: {0}")]
    Wine(String),

    #[error("Winetricks error: {0}")]
    Winetricks(String),

    #[error("Invalid virtual desktop resolution: {0}")]
    InvalidResolution(String),

    #[error("Command execution failed: {command} - {error}")]
    CommandExecution { command: String, error: String },

    #[error("Download error: {0}")]
    Download(String),

    #[error("Directory scan error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
