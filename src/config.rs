//! Server Configuration
//!
//! Loaded once at startup from a TOML file. Every field has a default so a
//! missing file or a partial one still yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::shop::{
    ChanceTable, ChanceTier, ConfigSnapshot, DEFAULT_UNLIMITED_QUANTITY, StockResolver,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("chance for tier '{}' must be within 0..=1, got {value}", .tier.as_str())]
    InvalidChance { tier: ChanceTier, value: f64 },

    #[error("restock interval must be at least one second")]
    ZeroRestockInterval,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Items live under `<data_dir>/items`, shops under `<data_dir>/shops`
    pub data_dir: PathBuf,
    pub restock_interval_secs: u64,
    /// What `QuantityPolicy::Unlimited` replenishes to
    pub unlimited_quantity: u32,
    pub hot_reload: bool,
    /// Seeds the per-vendor RNG streams; entropy when absent
    pub seed: Option<u64>,
    pub chances: ChanceTable,
    /// Feature flags exposed to shop conditions
    pub features: ConfigSnapshot,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:2568".to_string(),
            data_dir: PathBuf::from("data"),
            restock_interval_secs: 3600,
            unlimited_quantity: DEFAULT_UNLIMITED_QUANTITY,
            hot_reload: true,
            seed: None,
            chances: ChanceTable::default(),
            features: ConfigSnapshot::default(),
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file, falling back to defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some((tier, value)) = self.chances.invalid_tier() {
            return Err(ConfigError::InvalidChance { tier, value });
        }
        if self.restock_interval_secs == 0 {
            return Err(ConfigError::ZeroRestockInterval);
        }
        Ok(())
    }

    pub fn shops_dir(&self) -> PathBuf {
        self.data_dir.join("shops")
    }

    /// Resolver configured with this server's chance table and unlimited default
    pub fn resolver(&self) -> StockResolver {
        StockResolver::new(self.chances, self.unlimited_quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config.restock_interval_secs, 3600);
        assert_eq!(config.unlimited_quantity, 999);
        assert_eq!(config.chances, ChanceTable::default());
        assert_eq!(config.shops_dir(), PathBuf::from("data/shops"));
    }

    #[test]
    fn test_parse_full_config() {
        let config = ServerConfig::from_toml_str(
            r#"
bind_address = "127.0.0.1:9000"
data_dir = "content"
restock_interval_secs = 600
unlimited_quantity = 250
hot_reload = false
seed = 42

[chances]
rare = 0.1
very_rare = 0.01

[features]
renaissance = true
monsters_on_boats = false
"#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.chances.rare, 0.1);
        assert_eq!(config.chances.common, ChanceTable::default().common);
        assert_eq!(config.features.get("renaissance"), Some(true));
        assert_eq!(config.features.get("monsters_on_boats"), Some(false));
        assert_eq!(config.resolver().unlimited_quantity(), 250);
    }

    #[test]
    fn test_invalid_chance_rejected() {
        let err = ServerConfig::from_toml_str("[chances]\ncommon = 1.2\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidChance { tier: ChanceTier::Common, .. }
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = ServerConfig::from_toml_str("restock_interval_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroRestockInterval));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = ServerConfig::load(&temp_dir.path().join("config.toml")).unwrap();
        assert!(config.hot_reload);
    }
}
