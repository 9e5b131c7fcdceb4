use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use gluecodec::ipc::{DEFAULT_MAX_FRAME_LENGTH, GlueServerConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub server: ServerConfig,
    /// Catalog served by `serve` when `--catalog` is not given
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub max_frame_length: usize,
    pub event_channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            event_channel_capacity: 256,
        }
    }
}

impl ServerConfig {
    pub fn to_server_config(&self) -> GlueServerConfig {
        GlueServerConfig::default()
            .with_max_frame_length(self.max_frame_length)
            .with_event_channel_capacity(self.event_channel_capacity)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            server: ServerConfig::default(),
            catalog: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.max_frame_length == 0 {
            bail!("server.max_frame_length must be greater than zero");
        }
        if self.server.max_frame_length > u32::MAX as usize {
            bail!("server.max_frame_length cannot exceed {}", u32::MAX);
        }
        if self.server.event_channel_capacity == 0 {
            bail!("server.event_channel_capacity must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_level.as_deref(), Some("info"));
        assert_eq!(config.server.max_frame_length, 16 * 1024 * 1024);
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "log_level: debug\nserver:\n  event_channel_capacity: 8\ncatalog: objects.yml").unwrap();
        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.server.event_channel_capacity, 8);
        assert_eq!(config.server.max_frame_length, DEFAULT_MAX_FRAME_LENGTH);
        assert_eq!(config.catalog, Some(PathBuf::from("objects.yml")));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let path = PathBuf::from("/nonexistent/gluecodec.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  event_channel_capacity: 0").unwrap();
        let err = Config::load(Some(&file.path().to_path_buf())).unwrap_err();
        assert!(format!("{:#}", err).contains("event_channel_capacity"));
    }

    #[test]
    fn test_to_server_config() {
        let mut config = Config::default();
        config.server.max_frame_length = 4096;
        let server = config.server.to_server_config();
        assert_eq!(server.max_frame_length, 4096);
        assert_eq!(server.event_channel_capacity, 256);
    }
}
