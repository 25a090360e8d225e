//! JSON config file adapter.
//!
//! Implements [`ConfigPort`] over a file on disk.  A missing file means
//! "first run": defaults are returned.  Anything unreadable or invalid is
//! an error; nothing is silently clamped.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::ExhibitConfig;

pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<ExhibitConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("no config at {}, using defaults", self.path.display());
                return Ok(ExhibitConfig::default());
            }
            Err(e) => {
                warn!("reading {} failed: {}", self.path.display(), e);
                return Err(ConfigError::IoError);
            }
        };

        let config: ExhibitConfig = serde_json::from_str(&text).map_err(|e| {
            warn!("{} is not valid config: {}", self.path.display(), e);
            ConfigError::Corrupted
        })?;
        config.validate()?;
        info!("config loaded from {}", self.path.display());
        Ok(config)
    }
}
