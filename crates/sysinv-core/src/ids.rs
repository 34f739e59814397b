//! Hardware identifiers: bus types, vendor/device code pairs and resolved records

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Invalid hardware ID code {0:?}, expected four hex digits")]
    InvalidCode(String),
    #[error("Invalid ID pair {0:?}, expected vendor:device")]
    InvalidPair(String),
    #[error("Unknown bus type: {0}")]
    UnknownBus(String),
}

/// Hardware attachment class, selecting catalog file and cache bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BusType {
    Pci,
    Usb,
}

impl BusType {
    /// Key of this bus inside the cache file
    pub fn cache_key(self) -> &'static str {
        match self {
            BusType::Pci => "pci",
            BusType::Usb => "usb",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BusType::Pci => "PCI",
            BusType::Usb => "USB",
        }
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BusType {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pci" => Ok(BusType::Pci),
            "usb" => Ok(BusType::Usb),
            _ => Err(IdError::UnknownBus(s.to_string())),
        }
    }
}

/// Normalize a vendor or device code to four lowercase hex digits
pub fn normalize_code(code: &str) -> Result<String, IdError> {
    if code.len() == 4 && code.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(code.to_ascii_lowercase())
    } else {
        Err(IdError::InvalidCode(code.to_string()))
    }
}

/// A `(vendor, device)` code pair as seen on the bus
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdPair {
    vendor: String,
    device: String,
}

impl IdPair {
    pub fn new(vendor: &str, device: &str) -> Result<Self, IdError> {
        Ok(Self {
            vendor: normalize_code(vendor)?,
            device: normalize_code(device)?,
        })
    }

    /// Build from codes already known to be four lowercase hex digits
    pub(crate) fn from_normalized(vendor: String, device: String) -> Self {
        Self { vendor, device }
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl fmt::Display for IdPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.vendor, self.device)
    }
}

impl FromStr for IdPair {
    type Err = IdError;

    /// Parse `vendor:device`, e.g. `10de:1b82`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (vendor, device) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| IdError::InvalidPair(s.to_string()))?;
        Self::new(vendor, device)
    }
}

/// Set of pairs discovered on one bus
pub type DiscoveredIds = BTreeSet<IdPair>;

/// Everything an enumerator found, per bus type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovered {
    pub pci: DiscoveredIds,
    pub usb: DiscoveredIds,
}

impl Discovered {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_bus(&self, bus: BusType) -> &DiscoveredIds {
        match bus {
            BusType::Pci => &self.pci,
            BusType::Usb => &self.usb,
        }
    }

    /// Record a pair; returns false if it was already present
    pub fn insert(&mut self, bus: BusType, pair: IdPair) -> bool {
        match bus {
            BusType::Pci => self.pci.insert(pair),
            BusType::Usb => self.usb.insert(pair),
        }
    }

    pub fn len(&self) -> usize {
        self.pci.len() + self.usb.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pci.is_empty() && self.usb.is_empty()
    }
}

/// Produces the ID pairs present on the current machine.
///
/// Real implementations walk sysfs or run bus listing tools; the resolver
/// only depends on this trait.
pub trait IdEnumerator {
    fn enumerate(&self) -> Discovered;
}

/// A discovered pair resolved to human-readable names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRecord {
    pub vendor_code: String,
    pub device_code: String,
    pub vendor_name: String,
    pub device_name: String,
    pub bus_type: BusType,
}

impl IdRecord {
    pub fn new(bus_type: BusType, pair: &IdPair, vendor_name: &str, device_name: &str) -> Self {
        Self {
            vendor_code: pair.vendor.clone(),
            device_code: pair.device.clone(),
            vendor_name: vendor_name.to_string(),
            device_name: device_name.to_string(),
            bus_type,
        }
    }

    pub fn pair(&self) -> IdPair {
        IdPair::from_normalized(self.vendor_code.clone(), self.device_code.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_parsing() {
        let pair: IdPair = "10DE:1b82".parse().unwrap();
        assert_eq!(pair.vendor(), "10de");
        assert_eq!(pair.device(), "1b82");
        assert_eq!(pair.to_string(), "10de:1b82");

        assert_eq!(
            "10de".parse::<IdPair>(),
            Err(IdError::InvalidPair("10de".to_string()))
        );
        assert_eq!(
            "10de:1b8".parse::<IdPair>(),
            Err(IdError::InvalidCode("1b8".to_string()))
        );
        assert!("xyzw:1b82".parse::<IdPair>().is_err());
    }

    #[test]
    fn test_bus_type_names() {
        assert_eq!("usb".parse::<BusType>().unwrap(), BusType::Usb);
        assert_eq!("PCI".parse::<BusType>().unwrap(), BusType::Pci);
        assert!("isa".parse::<BusType>().is_err());

        assert_eq!(BusType::Pci.cache_key(), "pci");
        assert_eq!(BusType::Usb.to_string(), "USB");
        assert_eq!(serde_json::to_string(&BusType::Pci).unwrap(), "\"PCI\"");
    }

    #[test]
    fn test_discovered_sets() {
        let mut discovered = Discovered::new();
        let pair = IdPair::new("8086", "1916").unwrap();

        assert!(discovered.insert(BusType::Pci, pair.clone()));
        assert!(!discovered.insert(BusType::Pci, pair.clone()));
        assert!(discovered.insert(BusType::Usb, IdPair::new("046d", "c52b").unwrap()));

        assert_eq!(discovered.len(), 2);
        assert!(discovered.for_bus(BusType::Pci).contains(&pair));
    }

    #[test]
    fn test_record_pair() {
        let pair = IdPair::new("10de", "1b82").unwrap();
        let record = IdRecord::new(BusType::Pci, &pair, "NVIDIA Corporation", "GP104");
        assert_eq!(record.pair(), pair);
        assert_eq!(record.bus_type, BusType::Pci);
    }
}
