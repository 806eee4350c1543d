//! Server configuration from environment variables

use formfill::FillConfig;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default cap on request bodies (64 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Default directory for `file` return mode
    pub download_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            download_dir: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `FORMFILL_DOWNLOAD_DIR` and
    /// `FORMFILL_MAX_BODY_BYTES`, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            download_dir: env::var_os("FORMFILL_DOWNLOAD_DIR")
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
            max_body_bytes: env::var("FORMFILL_MAX_BODY_BYTES")
                .ok()
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_body_bytes),
        }
    }

    pub fn fill_config(&self) -> FillConfig {
        FillConfig {
            download_dir: self.download_dir.clone(),
            ..FillConfig::default()
        }
    }

    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address().unwrap().to_string(), "0.0.0.0:5000");
        assert_eq!(config.max_body_bytes, 64 * 1024 * 1024);
        assert_eq!(config.fill_config().download_dir, None);
    }

    #[test]
    fn test_download_dir_is_passed_through() {
        let config = ServerConfig {
            download_dir: Some(PathBuf::from("/srv/pdfs")),
            ..ServerConfig::default()
        };
        assert_eq!(
            config.fill_config().download_dir,
            Some(PathBuf::from("/srv/pdfs"))
        );
    }
}
