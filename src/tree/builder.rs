use super::{DecisionTree, NodeDefinition, TreeDefinition};
use crate::error::TreeError;

/// Builds a single node of a tree in code.
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
    definition: NodeDefinition,
}

impl NodeBuilder {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            definition: NodeDefinition {
                label: label.into(),
                ..Default::default()
            },
        }
    }

    /// An option that reuses the subtree found at `target`.
    pub fn link<I, S>(target: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            definition: NodeDefinition {
                link: Some(target.into_iter().map(Into::into).collect()),
                ..Default::default()
            },
        }
    }

    pub fn option(mut self, key: impl Into<String>, child: NodeBuilder) -> Self {
        self.definition
            .options
            .push((key.into(), child.into_definition()));
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.definition.profile = Some(profile.into());
        self
    }

    pub fn default_child(mut self, key: impl Into<String>) -> Self {
        self.definition.default = Some(key.into());
        self
    }

    pub fn required_inputs<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.required_inputs = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn optional_inputs<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition.optional_inputs = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn into_definition(self) -> NodeDefinition {
        self.definition
    }
}

/// Builds and validates a whole tree in code.
///
/// ```rust,no_run
/// use sentaku::tree::{NodeBuilder, TreeBuilder};
///
/// let tree = TreeBuilder::new(
///     NodeBuilder::new("Choose analysis type").option(
///         "HLA",
///         NodeBuilder::new("HLA (immunopeptidomics)").option(
///             "LF",
///             NodeBuilder::new("Label-free")
///                 .profile("HLA_LF")
///                 .required_inputs(["mzml_input_dir", "database", "out_dir"]),
///         ),
///     ),
/// )
/// .build()
/// .unwrap();
/// assert_eq!(tree.options_at(&["HLA"]).unwrap(), vec!["LF".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root: NodeBuilder,
}

impl TreeBuilder {
    pub fn new(root: NodeBuilder) -> Self {
        Self { root }
    }

    pub fn into_definition(self) -> TreeDefinition {
        TreeDefinition {
            root: self.root.into_definition(),
        }
    }

    pub fn build(self) -> Result<DecisionTree, TreeError> {
        DecisionTree::from_definition(self.into_definition())
    }
}
