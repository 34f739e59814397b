//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysinv_core::{machine_cache_path, CacheFormat, ResolverConfig};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// PCI ID catalog
    #[serde(default = "default_pci_ids")]
    pub pci_ids: PathBuf,
    /// USB ID catalog
    #[serde(default = "default_usb_ids")]
    pub usb_ids: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            pci_ids: default_pci_ids(),
            usb_ids: default_usb_ids(),
        }
    }
}

fn default_pci_ids() -> PathBuf {
    PathBuf::from("/usr/share/misc/pci.ids")
}

fn default_usb_ids() -> PathBuf {
    PathBuf::from("/usr/share/misc/usb.ids")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Keep resolved IDs between runs
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory holding one cache file per machine
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// "json", or "toml" for the legacy encoding
    #[serde(default)]
    pub format: CacheFormat,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            format: CacheFormat::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("/var/cache/sysinv")
}

impl Config {
    /// Convert to the resolver's settings for the machine called `hostname`
    pub fn to_resolver_config(&self, hostname: &str) -> ResolverConfig {
        ResolverConfig {
            pci_ids: self.catalog.pci_ids.clone(),
            usb_ids: self.catalog.usb_ids.clone(),
            cache_path: self
                .cache
                .enabled
                .then(|| machine_cache_path(&self.cache.dir, hostname)),
            cache_format: self.cache.format,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("sysinv.toml")).unwrap();

        assert_eq!(config.catalog.pci_ids, default_pci_ids());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.format, CacheFormat::Json);
    }

    #[test]
    fn test_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sysinv.toml");
        std::fs::write(
            &path,
            "[catalog]\npci_ids = \"/opt/ids/pci.ids\"\n\n[cache]\nformat = \"toml\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.catalog.pci_ids, PathBuf::from("/opt/ids/pci.ids"));
        assert_eq!(config.catalog.usb_ids, default_usb_ids());
        assert_eq!(config.cache.format, CacheFormat::Toml);
        assert_eq!(config.cache.dir, default_cache_dir());
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sysinv.toml");
        std::fs::write(&path, "[cache]\nformat = \"xml\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_default_config_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sysinv.toml");
        save_default_config(&path).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.cache.dir, default_cache_dir());
        assert_eq!(config.catalog.usb_ids, default_usb_ids());
    }

    #[test]
    fn test_resolver_config() {
        let mut config = Config::default();
        let resolver = config.to_resolver_config("host-a");
        assert_eq!(
            resolver.cache_path,
            Some(machine_cache_path(&default_cache_dir(), "host-a"))
        );
        assert_ne!(
            resolver.cache_path,
            config.to_resolver_config("host-b").cache_path
        );

        config.cache.enabled = false;
        assert!(config.to_resolver_config("host-a").cache_path.is_none());
    }
}
