use super::{Inputs, SessionId, SessionStatus, WizardSession, is_filled};
use crate::error::PathError;
use crate::tree::DecisionTree;
use serde::{Deserialize, Serialize};

/// Everything a client needs to render the current wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub path: Vec<String>,
    pub label: String,
    pub profile: Option<String>,
    pub status: SessionStatus,
    pub inputs: Inputs,
    /// Keys selectable at this step.
    pub options: Vec<String>,
    /// Deeper choices below an already resolved profile.
    pub specializations: Vec<String>,
    pub is_leaf: bool,
    pub required_inputs: Vec<String>,
    pub optional_inputs: Vec<String>,
    pub missing: Vec<String>,
    /// A profile is resolved and nothing required is missing.
    pub complete: bool,
    pub version: u64,
}

impl SessionView {
    pub(crate) fn project(tree: &DecisionTree, session: &WizardSession) -> Result<Self, PathError> {
        let node = tree.node_at(session.path())?;
        let missing = missing_required(tree, session)?;
        Ok(Self {
            id: session.id(),
            path: session.path().to_vec(),
            label: node.label().to_string(),
            profile: session.profile().map(str::to_string),
            status: session.status(),
            inputs: session.inputs().clone(),
            options: tree.options_at(session.path())?,
            specializations: tree.specializations_at(session.path())?,
            is_leaf: session.profile().is_some(),
            required_inputs: node.required_inputs().to_vec(),
            optional_inputs: node.optional_inputs().to_vec(),
            complete: session.profile().is_some() && missing.is_empty(),
            missing,
            version: session.version(),
        })
    }
}

/// Required inputs of the node at the session's path that are absent or falsy, in
/// declared order. Empty while no profile is resolved.
pub(crate) fn missing_required(
    tree: &DecisionTree,
    session: &WizardSession,
) -> Result<Vec<String>, PathError> {
    if session.profile().is_none() {
        return Ok(Vec::new());
    }
    let node = tree.node_at(session.path())?;
    Ok(node
        .required_inputs()
        .iter()
        .filter(|key| !session.inputs().get(key.as_str()).is_some_and(is_filled))
        .cloned()
        .collect())
}
