//! # Cart Configuration
//!
//! Where the cart lives and how large it may grow.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CAVALRY_STORAGE_BACKEND=file                                       │
//! │     CAVALRY_DATA_DIR=/var/lib/cavalry                                  │
//! │     CAVALRY_CART_SLOT=cav-cart-v1                                      │
//! │     CAVALRY_STORAGE_QUOTA_BYTES=5242880                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cavalry-cart/cart.toml (Linux)                           │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     memory backend, slot cav-cart-v1, no quota                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # cart.toml
//! [storage]
//! backend = "file"        # memory | file
//! data_dir = "/var/lib/cavalry"
//! quota_bytes = 5242880
//!
//! [cart]
//! slot = "cav-cart-v1"
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use cavalry_core::validation::validate_slot_name;
use cavalry_core::DEFAULT_CART_SLOT;

use crate::error::{ConfigError, ConfigResult};
use crate::storage::{DurableStorage, FileStorage, MemoryStorage};
use crate::store::CartStore;

// =============================================================================
// Storage Backend
// =============================================================================

/// Which [`DurableStorage`] implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local slots; gone when the process exits.
    #[default]
    Memory,

    /// One JSON file per slot in the data directory.
    File,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::File => write!(f, "file"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "file" | "disk" => Ok(StorageBackend::File),
            other => Err(ConfigError::Invalid(format!(
                "Unknown storage backend: '{}'. Valid options: memory, file",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Data directory for the file backend. Defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Byte limit for stored values. Unset means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<usize>,
}

/// `[cart]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSettings {
    /// Durable slot name. Must carry a `-v<N>` version suffix.
    #[serde(default = "default_slot")]
    pub slot: String,
}

fn default_slot() -> String {
    DEFAULT_CART_SLOT.to_string()
}

impl Default for CartSettings {
    fn default() -> Self {
        CartSettings {
            slot: default_slot(),
        }
    }
}

// =============================================================================
// Cart Configuration
// =============================================================================

/// Complete cart configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub cart: CartSettings,
}

impl CartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (cart.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading cart config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides_from(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load cart config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Cart config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_slot_name(&self.cart.slot)
            .map_err(|e| ConfigError::Invalid(format!("cart.slot: {}", e)))?;

        if self.storage.quota_bytes == Some(0) {
            return Err(ConfigError::Invalid(
                "storage.quota_bytes must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// [`CartConfig::load`]). Unparsable values are logged and skipped.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("CAVALRY_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(parsed) => {
                    debug!(backend = %backend, "Overriding storage backend from environment");
                    self.storage.backend = parsed;
                }
                Err(_) => warn!(backend = %backend, "Unknown storage backend in environment"),
            }
        }

        if let Some(dir) = lookup("CAVALRY_DATA_DIR") {
            debug!(dir = %dir, "Overriding data dir from environment");
            self.storage.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(slot) = lookup("CAVALRY_CART_SLOT") {
            self.cart.slot = slot;
        }

        if let Some(quota) = lookup("CAVALRY_STORAGE_QUOTA_BYTES") {
            match quota.trim().parse::<usize>() {
                Ok(q) => self.storage.quota_bytes = Some(q),
                Err(_) => warn!(quota = %quota, "Invalid storage quota in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "cavalry", "cavalry-cart")
            .map(|dirs| dirs.config_dir().join("cart.toml"))
    }

    /// Data directory for the file backend: configured, else platform default.
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.storage.data_dir.clone().or_else(|| {
            directories::ProjectDirs::from("com", "cavalry", "cavalry-cart")
                .map(|dirs| dirs.data_dir().to_path_buf())
        })
    }

    pub fn slot(&self) -> &str {
        &self.cart.slot
    }

    // =========================================================================
    // Factories
    // =========================================================================

    /// Opens the configured storage backend.
    pub fn open_storage(&self) -> ConfigResult<Arc<dyn DurableStorage>> {
        let storage: Arc<dyn DurableStorage> = match self.storage.backend {
            StorageBackend::Memory => match self.storage.quota_bytes {
                Some(quota) => Arc::new(MemoryStorage::with_quota(quota)),
                None => Arc::new(MemoryStorage::new()),
            },
            StorageBackend::File => {
                let dir = self.data_dir().ok_or_else(|| {
                    ConfigError::Invalid("no data directory available for file storage".into())
                })?;
                let storage = FileStorage::open(dir)?;
                match self.storage.quota_bytes {
                    Some(quota) => Arc::new(storage.with_quota(quota)),
                    None => Arc::new(storage),
                }
            }
        };

        info!(backend = %self.storage.backend, slot = %self.cart.slot, "Cart storage opened");
        Ok(storage)
    }

    /// Opens storage and builds a store on the configured slot.
    pub fn open_store(&self) -> ConfigResult<CartStore> {
        Ok(CartStore::with_slot(self.open_storage()?, self.cart.slot.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!("FILE".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert_eq!("disk".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = CartConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.slot(), "cav-cart-v1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = CartConfig::default();

        config.cart.slot = "cart".to_string();
        assert!(config.validate().is_err());

        config.cart.slot = "cav-cart-v2".to_string();
        assert!(config.validate().is_ok());

        config.storage.quota_bytes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = CartConfig::default();
        config.apply_overrides_from(env(&[
            ("CAVALRY_STORAGE_BACKEND", "file"),
            ("CAVALRY_DATA_DIR", "/tmp/cavalry"),
            ("CAVALRY_CART_SLOT", "shop-cart-v3"),
            ("CAVALRY_STORAGE_QUOTA_BYTES", "1024"),
        ]));

        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/cavalry")));
        assert_eq!(config.slot(), "shop-cart-v3");
        assert_eq!(config.storage.quota_bytes, Some(1024));
    }

    #[test]
    fn test_bad_env_values_ignored() {
        let mut config = CartConfig::default();
        config.apply_overrides_from(env(&[
            ("CAVALRY_STORAGE_BACKEND", "cloud"),
            ("CAVALRY_STORAGE_QUOTA_BYTES", "lots"),
        ]));

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.quota_bytes, None);
    }

    #[test]
    fn test_toml_roundtrip() {
        let parsed: CartConfig = toml::from_str(
            r#"
            [storage]
            backend = "file"
            quota_bytes = 4096

            [cart]
            slot = "cav-cart-v1"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.storage.backend, StorageBackend::File);
        assert_eq!(parsed.storage.quota_bytes, Some(4096));

        let toml_str = toml::to_string_pretty(&parsed).unwrap();
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[cart]"));
    }

    #[test]
    fn test_missing_sections_default() {
        let parsed: CartConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.slot(), DEFAULT_CART_SLOT);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cart.toml");

        let mut config = CartConfig::default();
        config.cart.slot = "saved-cart-v2".to_string();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: CartConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.slot(), "saved-cart-v2");
    }

    #[test]
    fn test_open_memory_store() {
        let config = CartConfig::default();
        let store = config.open_store().unwrap();
        store.add("p1", 2, None).unwrap();
        assert_eq!(store.get_count(None), 2);
        assert_eq!(store.slot(), "cav-cart-v1");
    }
}
