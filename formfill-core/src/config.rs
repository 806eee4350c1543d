//! Library-level configuration

use crate::image_source::{DEFAULT_MAX_IMAGE_BYTES, FETCH_TIMEOUT};
use std::path::PathBuf;
use std::time::Duration;

/// Directory used for file output when a request names none
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Settings shared by every fill a [`FormFiller`](crate::FormFiller) runs
#[derive(Debug, Clone, PartialEq)]
pub struct FillConfig {
    /// Default directory for file output; `<cwd>/downloads` when unset
    pub download_dir: Option<PathBuf>,
    /// Timeout applied to remote image fetches
    pub fetch_timeout: Duration,
    /// Size ceiling for images that do not set `maxBytes`
    pub default_max_image_bytes: u64,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            fetch_timeout: FETCH_TIMEOUT,
            default_max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl FillConfig {
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// The directory file output goes to when a request names none
    pub fn resolved_download_dir(&self) -> PathBuf {
        match &self.download_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_DOWNLOAD_DIR),
        }
    }
}
