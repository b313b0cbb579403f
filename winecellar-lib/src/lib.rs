//! Winecellar Library
//!
//! Reads the configuration of Wine bottles (prefixes) straight from their
//! registry files and drives `wine` and `winetricks` to create and change them.

pub mod bottle;
pub mod config;
pub mod download;
pub mod error;
pub mod manager;
pub mod metadata;
pub mod registry;
pub mod scanner;
pub mod unescape;
pub mod windows;
pub mod wine;
pub mod winetricks;

pub use bottle::{Bottle, BottleConfiguration, DllOverride};
pub use config::{Config, GeneralSettings};
pub use error::{Error, Result};
pub use manager::{BottleManager, BottleSummary, NewBottle};
pub use metadata::BottleMetadata;
pub use registry::{KeyFilter, RegistryFile};
pub use scanner::BottleScanner;
pub use windows::{AudioDriver, Bit, LoadOrder, Windows};
pub use wine::Wine;
pub use winetricks::Winetricks;
