//! Per-bottle metadata stored next to the registry files

use crate::bottle::folder_name;
use crate::config::ini_escape;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const METADATA_FILE: &str = "winecellar.ini";

/// Name, description and logging preferences of a bottle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BottleMetadata {
    pub name: String,
    pub description: String,
    pub logging_enabled: bool,
    /// Wine debug log level, see [`crate::wine::winedebug`]
    pub debug_log_level: u8,
}

#[derive(Deserialize)]
struct MetadataFile {
    general: GeneralSection,
    logging: LoggingSection,
}

#[derive(Deserialize)]
struct GeneralSection {
    name: String,
    description: String,
}

#[derive(Deserialize)]
struct LoggingSection {
    enabled: bool,
    debug_level: u8,
}

impl BottleMetadata {
    /// Defaults for a bottle without a metadata file
    pub fn defaults(prefix: &Path) -> Self {
        Self {
            name: folder_name(prefix),
            description: String::new(),
            logging_enabled: false,
            debug_log_level: 1,
        }
    }

    pub fn path(prefix: &Path) -> PathBuf {
        prefix.join(METADATA_FILE)
    }

    /// Read the metadata file, missing keys take their default value
    pub fn load(prefix: &Path) -> Result<Self> {
        let defaults = Self::defaults(prefix);
        let path = Self::path(prefix);
        debug!("Reading bottle metadata from {:?}", path);

        let file: MetadataFile = ::config::Config::builder()
            .set_default("general.name", defaults.name)?
            .set_default("general.description", defaults.description)?
            .set_default("logging.enabled", defaults.logging_enabled)?
            .set_default("logging.debug_level", i64::from(defaults.debug_log_level))?
            .add_source(::config::File::from(path).format(::config::FileFormat::Ini).required(false))
            .build()?
            .try_deserialize()?;

        Ok(Self {
            name: file.general.name,
            description: file.general.description,
            logging_enabled: file.logging.enabled,
            debug_log_level: file.logging.debug_level,
        })
    }

    /// Write the metadata file into `prefix`
    pub fn save(&self, prefix: &Path) -> Result<()> {
        let content = format!(
            "[general]\nname={}\ndescription={}\n\n[logging]\nenabled={}\ndebug_level={}\n",
            ini_escape(&self.name),
            ini_escape(&self.description),
            self.logging_enabled,
            self.debug_log_level
        );
        std::fs::write(Self::path(prefix), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_folder_name() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join(".gaming");
        std::fs::create_dir(&prefix).unwrap();

        let metadata = BottleMetadata::load(&prefix).unwrap();
        assert_eq!(metadata.name, "gaming");
        assert_eq!(metadata.debug_log_level, 1);
        assert!(!metadata.logging_enabled);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = BottleMetadata {
            name: "Office 2010".into(),
            description: "Word and Excel".into(),
            logging_enabled: true,
            debug_log_level: 3,
        };
        metadata.save(dir.path()).unwrap();

        assert_eq!(BottleMetadata::load(dir.path()).unwrap(), metadata);
    }

    #[test]
    fn windows_paths_and_quotes_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = BottleMetadata {
            name: r#""Quoted" C:\Games"#.into(),
            description: "Installed to C:\\new \"fast\"\nsecond line; it's here".into(),
            logging_enabled: false,
            debug_log_level: 0,
        };
        metadata.save(dir.path()).unwrap();

        assert_eq!(BottleMetadata::load(dir.path()).unwrap(), metadata);
    }
}
