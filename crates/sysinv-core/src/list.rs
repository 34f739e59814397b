//! Discovered IDs supplied as plain text
//!
//! One pair per line, prefixed by its bus:
//!
//! ```text
//! # gpu and a receiver
//! pci 10de:1b82
//! usb 046d:c52b
//! ```
//!
//! Blank lines, `#` comments and lines that do not parse are skipped.

use std::io;
use std::path::Path;

use tracing::debug;

use crate::fs::FileSource;
use crate::ids::{BusType, Discovered, IdEnumerator, IdPair};

/// [`IdEnumerator`] backed by a fixed list of pairs
#[derive(Debug, Clone, Default)]
pub struct ListEnumerator {
    discovered: Discovered,
}

impl ListEnumerator {
    pub fn new(discovered: Discovered) -> Self {
        Self { discovered }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut discovered = Discovered::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_entry(line) {
                Some((bus, pair)) => {
                    discovered.insert(bus, pair);
                }
                None => debug!(line, "Skipping malformed ID list entry"),
            }
        }
        Self { discovered }
    }

    pub fn from_file<F: FileSource>(source: &F, path: &Path) -> io::Result<Self> {
        Ok(Self::from_lines(source.read_lines(path)?))
    }
}

fn parse_entry(line: &str) -> Option<(BusType, IdPair)> {
    let mut parts = line.split_whitespace();
    let bus = parts.next()?.parse().ok()?;
    let pair = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((bus, pair))
}

impl IdEnumerator for ListEnumerator {
    fn enumerate(&self) -> Discovered {
        self.discovered.clone()
    }
}
