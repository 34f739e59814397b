//! Path-addressable nested string store
//!
//! A [`HierarchicalDict`] is a tree of sections keyed by string segments,
//! with string values at the leaves. Paths are slices of segments, e.g.
//! `["Hardware", "Hardware Overview", "Model Name"]`.
//!
//! Keys keep the order in which they were first set, so a parsed report
//! reads back in document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single entry in the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Leaf value
    Value(String),
    /// Nested section
    Section(HierarchicalDict),
}

impl Node {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Node::Value(value) => Some(value),
            Node::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&HierarchicalDict> {
        match self {
            Node::Section(section) => Some(section),
            Node::Value(_) => None,
        }
    }
}

/// Nested mapping from key paths to string values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HierarchicalDict {
    entries: IndexMap<String, Node>,
}

impl HierarchicalDict {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at `path`, creating intermediate sections as needed.
    ///
    /// Whatever already lives at `path` is replaced, including a whole
    /// section. A leaf found on the way is turned into an empty section.
    /// An empty path is ignored.
    pub fn set<S: AsRef<str>>(&mut self, path: &[S], value: impl Into<String>) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        self.set_under(parents, last.as_ref(), value.into());
    }

    fn set_under<S: AsRef<str>>(&mut self, parents: &[S], last: &str, value: String) {
        let Some((key, rest)) = parents.split_first() else {
            self.entries.insert(last.to_string(), Node::Value(value));
            return;
        };

        let node = self
            .entries
            .entry(key.as_ref().to_string())
            .or_insert_with(|| Node::Section(HierarchicalDict::new()));
        if let Node::Value(_) = node {
            *node = Node::Section(HierarchicalDict::new());
        }
        if let Node::Section(section) = node {
            section.set_under(rest, last, value);
        }
    }

    /// Look up the leaf value at `path`.
    ///
    /// Returns `None` when any segment is missing or the path ends on a
    /// section.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        self.node(path)?.as_value()
    }

    /// Look up the section at `path`; the empty path is the root
    pub fn section<S: AsRef<str>>(&self, path: &[S]) -> Option<&HierarchicalDict> {
        if path.is_empty() {
            return Some(self);
        }
        self.node(path)?.as_section()
    }

    /// Look up whatever node lives at `path`
    pub fn node<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let (last, parents) = path.split_last()?;

        let mut current = self;
        for key in parents {
            current = current.entries.get(key.as_ref())?.as_section()?;
        }
        current.entries.get(last.as_ref())
    }

    /// Whether anything (value or section) lives at `path`
    pub fn contains<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.node(path).is_some()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of direct children
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned snapshot of the tree; changes to it never reach `self`
    pub fn to_mapping(&self) -> IndexMap<String, Node> {
        self.entries.clone()
    }

    /// The tree as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Every leaf with its full path, depth first in document order
    pub fn leaves(&self) -> Vec<(Vec<String>, &str)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &mut Vec<String>, out: &mut Vec<(Vec<String>, &'a str)>) {
        for (key, node) in &self.entries {
            prefix.push(key.clone());
            match node {
                Node::Value(value) => out.push((prefix.clone(), value.as_str())),
                Node::Section(section) => section.collect_leaves(prefix, out),
            }
            prefix.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let mut dict = HierarchicalDict::new();
        dict.set(&["Hardware", "Overview", "Model Name"], "MacBook Air");
        dict.set(&["Top"], "level");

        assert_eq!(dict.get(&["Hardware", "Overview", "Model Name"]), Some("MacBook Air"));
        assert_eq!(dict.get(&["Top"]), Some("level"));
    }

    #[test]
    fn test_missing_paths() {
        let mut dict = HierarchicalDict::new();
        dict.set(&["a", "b"], "1");

        assert_eq!(dict.get(&["a", "c"]), None);
        assert_eq!(dict.get(&["x", "y", "z"]), None);
        // Walking through a leaf
        assert_eq!(dict.get(&["a", "b", "c"]), None);
        // Path ends on a section
        assert_eq!(dict.get(&["a"]), None);
        assert_eq!(dict.get::<&str>(&[]), None);
    }

    #[test]
    fn test_overwrite_section_with_value() {
        let mut dict = HierarchicalDict::new();
        dict.set(&["a", "b", "c"], "deep");
        dict.set(&["a", "b"], "flat");

        assert_eq!(dict.get(&["a", "b"]), Some("flat"));
        assert!(!dict.contains(&["a", "b", "c"]));
    }

    #[test]
    fn test_value_replaced_by_section() {
        let mut dict = HierarchicalDict::new();
        dict.set(&["a"], "leaf");
        dict.set(&["a", "b"], "child");

        assert_eq!(dict.get(&["a", "b"]), Some("child"));
        assert!(dict.section(&["a"]).is_some());
    }

    #[test]
    fn test_clear() {
        let mut dict = HierarchicalDict::new();
        dict.set(&["a", "b"], "1");
        dict.clear();

        assert!(dict.is_empty());
        assert_eq!(dict.get(&["a", "b"]), None);
    }

    #[test]
    fn test_mapping_is_snapshot() {
        let mut dict = HierarchicalDict::new();
        dict.set(&["a"], "1");

        let mut mapping = dict.to_mapping();
        mapping.insert("b".to_string(), Node::Value("2".to_string()));

        assert_eq!(dict.len(), 1);
        assert!(!dict.contains(&["b"]));
    }

    #[test]
    fn test_json_and_leaves() {
        let mut dict = HierarchicalDict::new();
        dict.set(&["Hardware", "Cores"], "8");
        dict.set(&["Hardware", "Model"], "Mac");
        dict.set(&["Software", "Version"], "14.1");

        assert_eq!(
            dict.to_json(),
            serde_json::json!({
                "Hardware": {"Cores": "8", "Model": "Mac"},
                "Software": {"Version": "14.1"}
            })
        );

        let leaves = dict.leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].0, vec!["Hardware", "Cores"]);
        assert_eq!(leaves[2].1, "14.1");

        let decoded: HierarchicalDict = serde_json::from_value(dict.to_json()).unwrap();
        assert_eq!(decoded, dict);
    }

    #[test]
    fn test_keys_keep_document_order() {
        let mut dict = HierarchicalDict::new();
        dict.set(&["Zeta", "Model"], "Mac");
        dict.set(&["Alpha", "Version"], "14.1");
        dict.set(&["Zeta", "Cores"], "8");
        // Overwriting keeps the original slot
        dict.set(&["Zeta", "Model"], "MacBook");

        let mapping = dict.to_mapping();
        let keys: Vec<&str> = mapping.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);

        let paths: Vec<Vec<String>> = dict.leaves().into_iter().map(|(path, _)| path).collect();
        assert_eq!(
            paths,
            vec![
                vec!["Zeta".to_string(), "Model".to_string()],
                vec!["Zeta".to_string(), "Cores".to_string()],
                vec!["Alpha".to_string(), "Version".to_string()],
            ]
        );

        assert_eq!(
            serde_json::to_string(&dict).unwrap(),
            r#"{"Zeta":{"Model":"MacBook","Cores":"8"},"Alpha":{"Version":"14.1"}}"#
        );
        let json = dict.to_json();
        let json_keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(json_keys, vec!["Zeta", "Alpha"]);
    }
}
