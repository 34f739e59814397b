//! Sysinv Core - structured data extraction for host inventory
//!
//! This crate provides the pieces that turn semi-structured text into typed data:
//! - A path-addressable nested dictionary
//! - Tree reconstruction from indentation-sensitive `key: value` reports
//! - Vendor/device ID resolution against `pci.ids`/`usb.ids` style catalogs,
//!   with a per-machine result cache

pub mod cache;
pub mod catalog;
pub mod fs;
pub mod hierarchy;
pub mod ids;
pub mod indent;
pub mod list;

pub use cache::{machine_cache_path, CacheError, CacheFormat, CachedName, IdCache};
pub use catalog::{IdCatalogResolver, ResolverConfig};
pub use fs::{FileSource, LocalFiles};
pub use hierarchy::{HierarchicalDict, Node};
pub use ids::{BusType, Discovered, DiscoveredIds, IdEnumerator, IdError, IdPair, IdRecord};
pub use indent::{parse_indent_tree, IndentTreeParser};
pub use list::ListEnumerator;
