//! Persistent cache of resolved hardware IDs
//!
//! Resolving IDs means scanning catalogs with tens of thousands of lines, so
//! results are kept in a per-machine cache file shaped like:
//!
//! ```text
//! {"hw": {"pci": {"10de": {"1b82": {"vendor": "...", "device": "..."}}}, "usb": {...}}}
//! ```
//!
//! JSON is the preferred encoding. The same shape in TOML is the legacy
//! encoding and is still accepted on read. The file is always rewritten
//! whole, without locking, so concurrent writers can leave it truncated; a
//! cache that no longer decodes is simply treated as empty by the resolver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fs::FileSource;
use crate::ids::{BusType, DiscoveredIds, IdPair, IdRecord};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TOML decode error: {0}")]
    TomlDecodeError(#[from] toml::de::Error),
    #[error("TOML encode error: {0}")]
    TomlEncodeError(#[from] toml::ser::Error),
}

/// On-disk encoding of the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheFormat {
    /// Preferred encoding
    #[default]
    Json,
    /// Legacy encoding
    Toml,
}

impl CacheFormat {
    /// The encoding tried when this one fails to decode
    pub fn fallback(self) -> Self {
        match self {
            CacheFormat::Json => CacheFormat::Toml,
            CacheFormat::Toml => CacheFormat::Json,
        }
    }

    pub fn decode(self, content: &str) -> Result<IdCache, CacheError> {
        Ok(match self {
            CacheFormat::Json => serde_json::from_str(content)?,
            CacheFormat::Toml => toml::from_str(content)?,
        })
    }

    pub fn encode(self, cache: &IdCache) -> Result<String, CacheError> {
        Ok(match self {
            CacheFormat::Json => serde_json::to_string(cache)?,
            CacheFormat::Toml => toml::to_string(cache)?,
        })
    }
}

/// Names resolved for one vendor/device pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedName {
    pub vendor: String,
    pub device: String,
}

/// vendor code -> device code -> names
pub type VendorBucket = BTreeMap<String, BTreeMap<String, CachedName>>;

/// The cache contents, keyed by bus cache key (`pci`, `usb`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdCache {
    #[serde(default)]
    hw: BTreeMap<String, VendorBucket>,
}

impl IdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `content`, trying `format` first and then its fallback.
    ///
    /// When both fail the error from `format` is returned.
    pub fn decode(content: &str, format: CacheFormat) -> Result<Self, CacheError> {
        format
            .decode(content)
            .or_else(|e| format.fallback().decode(content).map_err(|_| e))
    }

    /// Load a cache file
    pub fn load<F: FileSource>(source: &F, path: &Path, format: CacheFormat) -> Result<Self, CacheError> {
        let content = source.read_to_string(path)?;
        Self::decode(&content, format)
    }

    /// Replace a cache file with the current contents
    pub fn save<F: FileSource>(&self, source: &F, path: &Path, format: CacheFormat) -> Result<(), CacheError> {
        let content = format.encode(self)?;
        source.write(path, content.as_bytes())?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.hw.values().all(|bucket| bucket.is_empty())
    }

    pub fn bucket(&self, bus: BusType) -> Option<&VendorBucket> {
        self.hw.get(bus.cache_key())
    }

    pub fn lookup(&self, bus: BusType, pair: &IdPair) -> Option<&CachedName> {
        self.bucket(bus)?.get(pair.vendor())?.get(pair.device())
    }

    /// Whether every pair in `pairs` already has cached names
    pub fn covers(&self, bus: BusType, pairs: &DiscoveredIds) -> bool {
        pairs.iter().all(|pair| self.lookup(bus, pair).is_some())
    }

    pub fn insert(&mut self, bus: BusType, pair: &IdPair, name: CachedName) {
        self.hw
            .entry(bus.cache_key().to_string())
            .or_default()
            .entry(pair.vendor().to_string())
            .or_default()
            .insert(pair.device().to_string(), name);
    }

    /// Records for the cached pairs that are in `pairs`, in cache order
    pub fn records(&self, bus: BusType, pairs: &DiscoveredIds) -> Vec<IdRecord> {
        let Some(bucket) = self.bucket(bus) else {
            return Vec::new();
        };

        let mut records = Vec::new();
        for (vendor, devices) in bucket {
            for (device, name) in devices {
                let pair = IdPair::from_normalized(vendor.clone(), device.clone());
                if pairs.contains(&pair) {
                    records.push(IdRecord::new(bus, &pair, &name.vendor, &name.device));
                }
            }
        }
        records
    }
}

/// Cache file for the machine called `hostname` inside `dir`.
///
/// Machines sharing a cache directory get distinct files.
pub fn machine_cache_path(dir: &Path, hostname: &str) -> PathBuf {
    let digest = sha256_hex(hostname.as_bytes());
    dir.join(format!("ids-{}.cache", &digest[..16]))
}

/// Compute SHA256 hash of data and return as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}
