//! The immutable decision tree and its queries.
//!
//! A tree is loaded once (from JSON, a `TreeBuilder`, any `IntoTree` source, or a
//! compiled cache file), validated eagerly, and then only read. Nodes live in an
//! arena addressed by `NodeId`; each node maps its option keys to child ids.

use crate::error::TreeError;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;

mod artifact;
mod builder;
mod compiler;
mod definition;
mod resolve;

pub use builder::{NodeBuilder, TreeBuilder};
pub use definition::{IntoTree, NodeDefinition, TreeDefinition};
pub use resolve::Resolution;

use compiler::TreeCompiler;

/// Option key that becomes a node's default continuation when the source does not
/// name one explicitly.
pub const DEFAULT_KEY: &str = "_DEFAULT";

/// Index of a node inside a `DecisionTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A single node of a validated tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionNode {
    pub(crate) label: String,
    pub(crate) children: AHashMap<String, NodeId>,
    pub(crate) profile: Option<String>,
    pub(crate) default_child: Option<String>,
    pub(crate) required_inputs: Vec<String>,
    pub(crate) optional_inputs: Vec<String>,
}

impl DecisionNode {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn default_child(&self) -> Option<&str> {
        self.default_child.as_deref()
    }

    pub fn required_inputs(&self) -> &[String] {
        &self.required_inputs
    }

    pub fn optional_inputs(&self) -> &[String] {
        &self.optional_inputs
    }

    /// Looks up the child reached through `key`, default continuation included.
    pub fn child(&self, key: &str) -> Option<NodeId> {
        self.children.get(key).copied()
    }

    /// All option keys, including the default continuation, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).sorted().collect()
    }

    /// The option keys a user may pick: every child except the default continuation.
    pub fn visible_keys(&self) -> Vec<String> {
        self.children
            .keys()
            .filter(|key| self.default_child.as_deref() != Some(key.as_str()))
            .sorted()
            .cloned()
            .collect()
    }

    pub fn is_terminal(&self) -> bool {
        self.profile.is_some()
    }
}

/// An immutable, validated decision tree.
///
/// Cheap to share: wrap it in an `Arc` and hand it to as many services and threads
/// as needed. Nothing mutates it after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<DecisionNode>,
}

impl DecisionTree {
    /// Parses and validates a tree from its JSON source.
    pub fn from_json_str(json: &str) -> Result<Self, TreeError> {
        let definition: TreeDefinition =
            serde_json::from_str(json).map_err(|e| TreeError::Parse(e.to_string()))?;
        Self::from_definition(definition)
    }

    /// Loads a tree from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| TreeError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loading decision tree source");
        Self::from_json_str(&json)
    }

    /// Converts any supported source into a validated tree.
    pub fn from_definition(source: impl IntoTree) -> Result<Self, TreeError> {
        TreeCompiler::compile(source.into_tree()?)
    }

    pub fn root(&self) -> &DecisionNode {
        self.node(NodeId::ROOT)
    }

    /// Returns the node with the given id.
    ///
    /// Ids are only produced by the tree itself, so they are always in bounds.
    pub fn node(&self, id: NodeId) -> &DecisionNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every profile in the tree with the shortest path that reaches it,
    /// sorted by path.
    pub fn profiles(&self) -> Vec<(Vec<String>, String)> {
        let mut found = Vec::new();
        let mut queue = VecDeque::from([(NodeId::ROOT, Vec::<String>::new())]);
        let mut seen = AHashSet::new();
        while let Some((id, path)) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let node = self.node(id);
            if let Some(profile) = &node.profile {
                found.push((path.clone(), profile.clone()));
            }
            for key in node.keys() {
                if let Some(child) = node.child(key) {
                    let mut child_path = path.clone();
                    child_path.push(key.to_string());
                    queue.push_back((child, child_path));
                }
            }
        }
        found.sort();
        found
    }
}
