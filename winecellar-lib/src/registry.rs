//! Line oriented reader for Wine registry files (`system.reg`, `user.reg`)
//!
//! A registry file is a sequence of key sections:
//!
//! ```text
//! [Software\\Wine\\Explorer] 1700000000
//! #time=1d9f5c8c5b2a3e0
//! "Desktop"="Default"
//!
//! ```
//!
//! Key names are passed exactly as they appear in the file, including the
//! opening bracket and the doubled backslashes. A section header matches when
//! it starts with the given key, so a key without the closing `]` matches by
//! prefix. Every query opens the file, scans it once and closes it again.

use crate::error::{Error, Result};
use crate::unescape::unescape;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Substring filters for [`RegistryFile::keys_data`]
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyFilter<'a> {
    /// Only keep lines containing this text
    pub include: Option<&'a str>,
    /// Drop lines containing this text
    pub exclude: Option<&'a str>,
}

impl<'a> KeyFilter<'a> {
    /// Keep lines containing `include`
    pub fn including(include: &'a str) -> Self {
        Self {
            include: Some(include),
            exclude: None,
        }
    }

    /// Drop lines containing `exclude` as well
    pub fn excluding(mut self, exclude: &'a str) -> Self {
        self.exclude = Some(exclude);
        self
    }

    fn matches(&self, line: &str) -> bool {
        self.include.map_or(true, |f| line.contains(f))
            && self.exclude.map_or(true, |f| !line.contains(f))
    }
}

/// A Wine registry file on disk
#[derive(Debug, Clone)]
pub struct RegistryFile {
    path: PathBuf,
}

impl RegistryFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the data of `value_name` inside the section(s) matching `key`
    ///
    /// Returns `Ok(None)` when no matching section holds the value.
    pub fn value(&self, key: &str, value_name: &str) -> Result<Option<String>> {
        let pattern = format!("\"{}\"=", value_name);
        let mut in_section = false;

        for line in self.lines()? {
            let line = line?;
            if !in_section {
                in_section = line.starts_with(key);
                continue;
            }
            if line.is_empty() {
                in_section = false;
                continue;
            }
            if let Some(pos) = line.find(&pattern) {
                let value = strip_quotes(&line[pos + pattern.len()..]);
                trace!("{} {}: {}={:?}", self.path.display(), key, value_name, value);
                return Ok(Some(value));
            }
        }

        trace!("{} {}: {} not found", self.path.display(), key, value_name);
        Ok(None)
    }

    /// Get all raw lines of the first section matching `key`, meta lines excluded
    pub fn keys(&self, key: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        self.scan_section(key, |line| {
            if !line.starts_with('#') {
                keys.push(line.to_string());
            }
        })?;
        Ok(keys)
    }

    /// Get the unescaped data (everything after the first `=`) of the first
    /// section matching `key`
    ///
    /// The filter is tested against the whole unescaped line, so it can select
    /// on the value name as well as on the data.
    pub fn keys_data(&self, key: &str, filter: &KeyFilter<'_>) -> Result<Vec<String>> {
        let mut data = Vec::new();
        self.scan_section(key, |line| {
            let line = unescape(line);
            if line.starts_with('#') || !filter.matches(&line) {
                return;
            }
            if let Some((_, value)) = line.split_once('=') {
                data.push(strip_quotes(value));
            }
        })?;
        Ok(data)
    }

    /// Get a file level meta value such as `#arch=win64`
    pub fn meta_data(&self, meta_value_name: &str) -> Result<Option<String>> {
        let pattern = format!("#{}=", meta_value_name);
        for line in self.lines()? {
            let line = line?;
            if let Some(pos) = line.find(&pattern) {
                return Ok(Some(strip_quotes(&line[pos + pattern.len()..])));
            }
        }
        Ok(None)
    }

    /// Call `f` for each line of the first section matching `key`
    fn scan_section<F: FnMut(&str)>(&self, key: &str, mut f: F) -> Result<()> {
        let mut in_section = false;
        for line in self.lines()? {
            let line = line?;
            if !in_section {
                in_section = line.starts_with(key);
            } else if line.is_empty() {
                break;
            } else {
                f(&line);
            }
        }
        Ok(())
    }

    /// Open the file and iterate over its lines
    ///
    /// Lines are decoded lossily; Wine escapes everything outside ASCII so a
    /// well formed file never hits the replacement path.
    fn lines(&self) -> Result<impl Iterator<Item = Result<String>> + '_> {
        let file = File::open(&self.path).map_err(|source| self.unreadable(source))?;
        let reader = BufReader::new(file);

        Ok(reader.split(b'\n').map(move |line| {
            let line = line.map_err(|source| self.unreadable(source))?;
            let line = String::from_utf8_lossy(&line);
            Ok(line.strip_suffix('\r').unwrap_or(&line).to_string())
        }))
    }

    fn unreadable(&self, source: std::io::Error) -> Error {
        Error::RegistryUnreadable {
            path: self.path.clone(),
            source,
        }
    }
}

fn strip_quotes(s: &str) -> String {
    s.replace('"', "")
}
