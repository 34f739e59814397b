//! Tree reconstruction from indentation-sensitive `key: value` text
//!
//! Tools like `system_profiler` print nested reports where nesting is only
//! expressed through leading whitespace:
//!
//! ```text
//! Hardware:
//!
//!     Hardware Overview:
//!
//!       Model Name: MacBook Air
//!       Chip: Apple M2
//! ```
//!
//! A line ending in `:` opens a section; a `key: value` line stores a leaf
//! under the currently open sections. Indentation widths are raw character
//! counts, so tabs and spaces are not normalized against each other.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::fs::FileSource;
use crate::hierarchy::HierarchicalDict;

/// A line that survived the grammar check
#[derive(Debug, Clone, PartialEq, Eq)]
struct TreeLine<'a> {
    indent: usize,
    key: &'a str,
    value: Option<&'a str>,
}

/// Split a line into indent width, key and optional value.
///
/// Accepts `<indent><key>: <value>` and `<indent><key>:`; anything else
/// yields `None`.
fn split_line(line: &str) -> Option<TreeLine<'_>> {
    let line = line.trim_end();
    if line.is_empty() {
        return None;
    }

    let body = line.trim_start();
    let indent = line.chars().count() - body.chars().count();

    let (key, rest) = body.split_once(':')?;
    if key.is_empty() {
        return None;
    }

    let value = if rest.is_empty() {
        None
    } else {
        let value = rest.strip_prefix(' ')?.trim();
        (!value.is_empty()).then_some(value)
    };

    Some(TreeLine { indent, key, value })
}

/// Incremental parser state
#[derive(Debug, Default)]
pub struct IndentTreeParser {
    tree: HierarchicalDict,
    /// Currently open section keys
    path: Vec<String>,
    /// Indent width -> path length recorded when that width first opened a section
    levels: HashMap<usize, usize>,
    /// Width of the previous line, `None` before the first one
    last_indent: Option<usize>,
    /// Whether the previous line opened a section
    last_opened: bool,
}

impl IndentTreeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed every line into the tree and return it.
    ///
    /// Calling this again without [`reset`](Self::reset) continues the same
    /// tree.
    pub fn parse<I, S>(&mut self, lines: I) -> &HierarchicalDict
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.feed_line(line.as_ref());
        }
        &self.tree
    }

    /// Parse a file read through `source`; unreadable files leave the tree
    /// untouched
    pub fn parse_file<F: FileSource>(&mut self, source: &F, path: &Path) -> &HierarchicalDict {
        match source.read_lines(path) {
            Ok(lines) => self.parse(lines),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unreadable input");
                &self.tree
            }
        }
    }

    /// Process a single line
    pub fn feed_line(&mut self, line: &str) {
        let Some(TreeLine { indent, key, value }) = split_line(line) else {
            return;
        };

        let depth = self.parent_depth(indent);
        self.path.truncate(depth);

        match value {
            None => {
                self.path.push(key.to_string());
                self.levels.entry(indent).or_insert(self.path.len());
            }
            Some(value) => {
                self.path.push(key.to_string());
                self.tree.set(&self.path, value);
                self.path.pop();
            }
        }

        self.last_indent = Some(indent);
        self.last_opened = value.is_none();
    }

    /// Number of open sections the next entry at `indent` nests under
    fn parent_depth(&self, indent: usize) -> usize {
        let Some(last) = self.last_indent else {
            return 0;
        };

        if indent > last {
            return self.path.len();
        }

        if indent == last {
            // A section opener at the same width as the previous opener is
            // its sibling and replaces it
            return if self.last_opened {
                self.path.len().saturating_sub(1)
            } else {
                self.path.len()
            };
        }

        // Dedent: go back to where a section at this width was opened
        if let Some(&len) = self.levels.get(&indent) {
            return len.saturating_sub(1).min(self.path.len());
        }
        self.levels
            .iter()
            .filter(|&(&width, _)| width < indent)
            .max_by_key(|&(&width, _)| width)
            .map(|(_, &len)| len.min(self.path.len()))
            .unwrap_or(0)
    }

    /// The tree built so far
    pub fn tree(&self) -> &HierarchicalDict {
        &self.tree
    }

    pub fn into_tree(self) -> HierarchicalDict {
        self.tree
    }

    /// Forget all state so the parser can take a new input
    pub fn reset(&mut self) {
        self.tree.clear();
        self.path.clear();
        self.levels.clear();
        self.last_indent = None;
        self.last_opened = false;
    }
}

/// Parse `lines` with a fresh parser
pub fn parse_indent_tree<I, S>(lines: I) -> HierarchicalDict
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = IndentTreeParser::new();
    parser.parse(lines);
    parser.into_tree()
}
