//! Hardware ID catalogs (`pci.ids`, `usb.ids`) and the cached resolver
//!
//! Catalog files list vendors at column zero and their devices indented
//! below them:
//!
//! ```text
//! 10de  NVIDIA Corporation
//! 	1b82  GP104 [GeForce GTX 1070 Ti]
//! 		1043 8674  ROG STRIX
//! ```
//!
//! The third line is a subsystem entry: a pair of codes separated by a single
//! space. Subsystems are recognised by that shape rather than by depth, since
//! real catalogs mix tab and space indentation.

use serde::{Deserialize, Serialize};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::cache::{CacheFormat, CachedName, IdCache};
use crate::fs::{FileSource, LocalFiles};
use crate::ids::{BusType, Discovered, DiscoveredIds, IdEnumerator, IdPair, IdRecord};

/// A catalog line that carries a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLine<'a> {
    /// `^[0-9a-fA-F]{4}\s+.+$`
    Vendor { code: String, name: &'a str },
    /// `^\s+[0-9a-fA-F]{4}\s+.+$`
    Device { indent: usize, code: String, name: &'a str },
    /// `^\s+[0-9a-fA-F]{4} [0-9a-fA-F]{4}\s+.+$`
    Subsystem { vendor: String, device: String, name: &'a str },
}

fn hex_code(text: &str) -> Option<&str> {
    let code = text.get(..4)?;
    code.bytes().all(|b| b.is_ascii_hexdigit()).then_some(code)
}

/// Classify one catalog line. Names come back right-trimmed; codes lowercase.
pub fn parse_line(line: &str) -> Option<CatalogLine<'_>> {
    let line = line.trim_end();
    let body = line.trim_start();
    let indent = line.len() - body.len();

    let code = hex_code(body)?;
    let rest = &body[4..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim_start();
    if name.is_empty() {
        return None;
    }

    let code = code.to_ascii_lowercase();
    if indent == 0 {
        return Some(CatalogLine::Vendor { code, name });
    }

    if let Some(subdevice) = rest.strip_prefix(' ').and_then(hex_code) {
        let after = &rest[5..];
        let subname = after.trim_start();
        if after.starts_with(char::is_whitespace) && !subname.is_empty() {
            return Some(CatalogLine::Subsystem {
                vendor: code,
                device: subdevice.to_ascii_lowercase(),
                name: subname,
            });
        }
    }
    Some(CatalogLine::Device { indent, code, name })
}

/// Vendor whose device block is being read
struct CurrentVendor {
    code: String,
    name: String,
}

/// Stream a catalog and collect names for the pairs in `wanted`, in catalog
/// order. Pairs missing from the catalog are left out.
pub fn scan_catalog<R: BufRead>(mut reader: R, wanted: &DiscoveredIds) -> io::Result<Vec<(IdPair, CachedName)>> {
    let mut found = Vec::new();
    let mut current: Option<CurrentVendor> = None;
    let mut buf = Vec::new();

    while found.len() < wanted.len() {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);

        match parse_line(&line) {
            Some(CatalogLine::Vendor { code, name }) => {
                current = Some(CurrentVendor {
                    code,
                    name: name.to_string(),
                });
            }
            Some(CatalogLine::Device { code, name, .. }) => {
                let Some(vendor) = current.as_ref() else {
                    continue;
                };

                let pair = IdPair::from_normalized(vendor.code.clone(), code);
                if wanted.contains(&pair) && !found.iter().any(|(seen, _)| seen == &pair) {
                    let name = CachedName {
                        vendor: vendor.name.clone(),
                        device: name.to_string(),
                    };
                    found.push((pair, name));
                }
            }
            Some(CatalogLine::Subsystem { .. }) | None => {}
        }
    }

    Ok(found)
}

/// Everything the resolver needs to know about its surroundings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// PCI catalog (`pci.ids`)
    pub pci_ids: PathBuf,
    /// USB catalog (`usb.ids`)
    pub usb_ids: PathBuf,
    /// Machine-scoped cache file; `None` disables caching
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default)]
    pub cache_format: CacheFormat,
}

impl ResolverConfig {
    pub fn catalog_path(&self, bus: BusType) -> &Path {
        match bus {
            BusType::Pci => &self.pci_ids,
            BusType::Usb => &self.usb_ids,
        }
    }
}

/// Resolves discovered ID pairs to vendor and device names.
///
/// Each bus type is served from the cache when every discovered pair of that
/// bus is already cached. Otherwise the bus's catalog is scanned in full and
/// the merged cache is written back.
pub struct IdCatalogResolver<F = LocalFiles> {
    config: ResolverConfig,
    source: F,
    cache: IdCache,
}

impl IdCatalogResolver<LocalFiles> {
    /// Resolver reading catalogs and cache from the local filesystem
    pub fn local(config: ResolverConfig) -> Self {
        Self::new(config, LocalFiles)
    }
}

impl<F: FileSource> IdCatalogResolver<F> {
    /// Create a resolver, loading the cache if there is a usable one
    pub fn new(config: ResolverConfig, source: F) -> Self {
        let cache = match &config.cache_path {
            Some(path) => match IdCache::load(&source, path, config.cache_format) {
                Ok(cache) => {
                    debug!(path = %path.display(), "Loaded hardware ID cache");
                    cache
                }
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "No usable hardware ID cache");
                    IdCache::new()
                }
            },
            None => IdCache::new(),
        };

        Self {
            config,
            source,
            cache,
        }
    }

    /// The cache as it stands after the last resolution
    pub fn cache(&self) -> &IdCache {
        &self.cache
    }

    /// Resolve PCI and USB pairs; PCI records come first
    pub fn resolve(&mut self, pci: &DiscoveredIds, usb: &DiscoveredIds) -> Vec<IdRecord> {
        let mut records = Vec::new();
        let mut scanned = false;

        for (bus, wanted) in [(BusType::Pci, pci), (BusType::Usb, usb)] {
            if self.cache.covers(bus, wanted) {
                debug!(bus = %bus, count = wanted.len(), "Hardware IDs served from cache");
                records.extend(self.cache.records(bus, wanted));
                continue;
            }

            match self.scan(bus, wanted) {
                Ok(found) => {
                    scanned = true;
                    info!(bus = %bus, wanted = wanted.len(), resolved = found.len(), "Scanned hardware ID catalog");
                    for (pair, name) in found {
                        records.push(IdRecord::new(bus, &pair, &name.vendor, &name.device));
                        self.cache.insert(bus, &pair, name);
                    }
                }
                Err(e) => {
                    warn!(
                        bus = %bus,
                        path = %self.config.catalog_path(bus).display(),
                        error = %e,
                        "Hardware ID catalog unreadable"
                    );
                }
            }
        }

        if scanned {
            self.persist();
        }
        records
    }

    /// Resolve everything in `discovered`
    pub fn resolve_discovered(&mut self, discovered: &Discovered) -> Vec<IdRecord> {
        self.resolve(&discovered.pci, &discovered.usb)
    }

    /// Ask `enumerator` for the machine's pairs and resolve them
    pub fn resolve_from<E: IdEnumerator + ?Sized>(&mut self, enumerator: &E) -> Vec<IdRecord> {
        let discovered = enumerator.enumerate();
        self.resolve_discovered(&discovered)
    }

    fn scan(&self, bus: BusType, wanted: &DiscoveredIds) -> io::Result<Vec<(IdPair, CachedName)>> {
        let path = self.config.catalog_path(bus);
        debug!(bus = %bus, path = %path.display(), "Scanning hardware ID catalog");
        let reader = self.source.open(path)?;
        scan_catalog(reader, wanted)
    }

    fn persist(&self) {
        let Some(path) = &self.config.cache_path else {
            return;
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        if !self.source.is_writable_dir(dir) {
            debug!(dir = %dir.display(), "Cache directory not writable, skipping cache write");
            return;
        }

        match self.cache.save(&self.source, path, self.config.cache_format) {
            Ok(()) => info!(path = %path.display(), "Wrote hardware ID cache"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write hardware ID cache"),
        }
    }
}
