use crate::error::TreeError;
use serde::{Deserialize, Serialize};

/// The complete, declarative definition of a decision tree, ready for compilation.
/// This is the target structure for any custom source format conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeDefinition {
    pub root: NodeDefinition,
}

/// Defines a single node of the tree as authored.
///
/// `options` keeps every entry in source order, duplicates included, so the compiler
/// can reject a repeated key instead of silently keeping the last one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(
        default,
        with = "option_entries",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<(String, NodeDefinition)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(
        default,
        alias = "default_child",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_inputs: Vec<String>,
    /// Path from the root to another node whose subtree this option reuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Vec<String>>,
}

impl NodeDefinition {
    /// True when the node only carries a `link` and nothing of its own.
    pub(crate) fn is_bare_link(&self) -> bool {
        self.label.is_empty()
            && self.options.is_empty()
            && self.profile.is_none()
            && self.default.is_none()
            && self.required_inputs.is_empty()
            && self.optional_inputs.is_empty()
    }
}

/// A trait for custom tree formats that can be converted into a `TreeDefinition`.
///
/// This is the extension point for loading trees that are not authored in the
/// native JSON shape (a database table of nodes, a YAML file with a different
/// layout, ...). Implement it on your own structs and hand them to
/// `DecisionTree::from_definition`.
///
/// # Example
///
/// ```rust,no_run
/// use sentaku::error::TreeError;
/// use sentaku::tree::{DecisionTree, IntoTree, NodeDefinition, TreeDefinition};
///
/// // A flat list of (parent path, key, profile) rows.
/// struct ProfileRows(Vec<(Vec<String>, String, Option<String>)>);
///
/// impl IntoTree for ProfileRows {
///     fn into_tree(self) -> Result<TreeDefinition, TreeError> {
///         let mut root = NodeDefinition::default();
///         for (parent, key, profile) in self.0 {
///             if !parent.is_empty() {
///                 return Err(TreeError::Conversion("only top-level rows supported".into()));
///             }
///             let child = NodeDefinition { profile, ..Default::default() };
///             root.options.push((key, child));
///         }
///         Ok(TreeDefinition { root })
///     }
/// }
///
/// let rows = ProfileRows(vec![(vec![], "LF".into(), Some("HLA_LF".into()))]);
/// let tree = DecisionTree::from_definition(rows).unwrap();
/// assert_eq!(tree.options_at(&["LF"]).unwrap(), Vec::<String>::new());
/// ```
pub trait IntoTree {
    /// Consumes the object and converts it into a tree definition.
    fn into_tree(self) -> Result<TreeDefinition, TreeError>;
}

impl IntoTree for TreeDefinition {
    fn into_tree(self) -> Result<TreeDefinition, TreeError> {
        Ok(self)
    }
}

impl IntoTree for NodeDefinition {
    fn into_tree(self) -> Result<TreeDefinition, TreeError> {
        Ok(TreeDefinition { root: self })
    }
}

/// (De)serializes `options` as a JSON object while keeping repeated keys.
mod option_entries {
    use super::NodeDefinition;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(entries: &[(String, NodeDefinition)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, node) in entries {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, NodeDefinition)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Vec<(String, NodeDefinition)>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of option keys to nodes")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, NodeDefinition>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}
