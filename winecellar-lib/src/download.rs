//! Download of helper scripts with a progress bar

use crate::error::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Upstream location of the winetricks script
pub const WINETRICKS_URL: &str =
    "https://raw.githubusercontent.com/Winetricks/winetricks/master/src/winetricks";

/// HTTP downloader
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("winecellar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Download `url` into `destination`
    ///
    /// The body is written to a temporary file next to `destination` which is
    /// renamed into place once complete, so a failed transfer never leaves a
    /// truncated file behind.
    pub async fn download(&self, url: &str, destination: &Path, progress: bool) -> Result<()> {
        debug!("Downloading {} to {:?}", url, destination);
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "{} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let total_size = response.content_length().unwrap_or(0);
        let pb = if progress && total_size > 0 {
            let pb = ProgressBar::new(total_size);
            let style = ProgressStyle::default_bar()
                .template("{msg} {bar:40.cyan/blue} {bytes}/{total_bytes} {eta}")
                .map_err(|e| Error::Download(format!("Progress bar template error: {}", e)))?;
            pb.set_style(style);
            pb.set_message("Downloading");
            Some(pb)
        } else {
            None
        };

        let partial = destination.with_extension("part");
        let written = write_body(&mut response, &partial, pb.as_ref()).await;
        discard_partial(&partial, written)?;

        if let Some(pb) = pb {
            pb.finish_with_message("Downloaded");
        }

        discard_partial(&partial, std::fs::rename(&partial, destination).map_err(Error::from))?;
        info!("Downloaded {}", destination.display());
        Ok(())
    }
}

async fn write_body(
    response: &mut reqwest::Response,
    partial: &Path,
    pb: Option<&ProgressBar>,
) -> Result<()> {
    let mut file = std::fs::File::create(partial)?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)?;
        if let Some(pb) = pb {
            pb.inc(chunk.len() as u64);
        }
    }
    file.flush()?;
    Ok(())
}

/// Remove the partial file when writing it failed
fn discard_partial<T>(partial: &Path, result: Result<T>) -> Result<T> {
    if result.is_err() {
        if let Err(e) = std::fs::remove_file(partial) {
            debug!("Could not remove {:?}: {}", partial, e);
        }
    }
    result
}

/// Set the permission bits of `path` to `rwxr-xr-x`
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
