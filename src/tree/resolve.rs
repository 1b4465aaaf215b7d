use super::{DecisionNode, DecisionTree, NodeId};
use crate::error::{PathError, ResolveError};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// The outcome of resolving a path: the profile it leads to, if any, and the path
/// with every default continuation that was followed appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub profile: Option<String>,
    pub path: Vec<String>,
}

impl DecisionTree {
    /// Follows `path` from the root and returns the id of the node it reaches.
    pub fn walk<S: AsRef<str>>(&self, path: &[S]) -> Result<NodeId, PathError> {
        let mut current = NodeId::ROOT;
        for (depth, step) in path.iter().enumerate() {
            let step = step.as_ref();
            current = self.node(current).child(step).ok_or_else(|| PathError {
                step: step.to_string(),
                valid_prefix: to_owned_path(&path[..depth]),
            })?;
        }
        Ok(current)
    }

    pub fn node_at<S: AsRef<str>>(&self, path: &[S]) -> Result<&DecisionNode, PathError> {
        self.walk(path).map(|id| self.node(id))
    }

    /// The keys a user may choose at `path`, sorted.
    ///
    /// The default continuation is never offered, and a node carrying a profile offers
    /// nothing here: its deeper children are listed by `specializations_at`.
    pub fn options_at<S: AsRef<str>>(&self, path: &[S]) -> Result<Vec<String>, PathError> {
        let node = self.node_at(path)?;
        if node.is_terminal() {
            return Ok(Vec::new());
        }
        Ok(node.visible_keys())
    }

    /// The visible children of a profile-carrying node at `path`, sorted. Choosing one
    /// refines the resolved profile into a more specific one.
    pub fn specializations_at<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> Result<Vec<String>, PathError> {
        let node = self.node_at(path)?;
        if !node.is_terminal() {
            return Ok(Vec::new());
        }
        Ok(node.visible_keys())
    }

    /// Resolves `path` to a profile, chasing default continuations.
    ///
    /// If the node at `path` carries a profile it is returned with `path` unchanged.
    /// Otherwise each default continuation is followed and its key appended to the
    /// returned path until a profile turns up or no default remains. Resolving an
    /// already-resolved path returns it unchanged.
    pub fn resolve_profile<S: AsRef<str>>(&self, path: &[S]) -> Result<Resolution, ResolveError> {
        let mut current = self.walk(path)?;
        let mut normalized = to_owned_path(path);
        let mut visited = AHashSet::new();
        visited.insert(current);

        loop {
            let node = self.node(current);
            if let Some(profile) = &node.profile {
                return Ok(Resolution {
                    profile: Some(profile.clone()),
                    path: normalized,
                });
            }
            let Some(key) = &node.default_child else {
                return Ok(Resolution {
                    profile: None,
                    path: normalized,
                });
            };
            let next = node.child(key).ok_or_else(|| PathError {
                step: key.clone(),
                valid_prefix: normalized.clone(),
            })?;
            normalized.push(key.clone());
            if !visited.insert(next) {
                return Err(ResolveError::DefaultCycle { path: normalized });
            }
            current = next;
        }
    }

    /// Undoes the last user choice on `path`.
    ///
    /// Trailing default continuations are dropped together with the choice that
    /// triggered them, so `step_back` is the inverse of choosing and resolving. An
    /// empty path stays empty.
    pub fn step_back<S: AsRef<str>>(&self, path: &[S]) -> Result<Vec<String>, PathError> {
        let mut parents = Vec::with_capacity(path.len());
        let mut current = NodeId::ROOT;
        for (depth, step) in path.iter().enumerate() {
            parents.push(current);
            current = self
                .node(current)
                .child(step.as_ref())
                .ok_or_else(|| PathError {
                    step: step.as_ref().to_string(),
                    valid_prefix: to_owned_path(&path[..depth]),
                })?;
        }

        let mut end = path.len();
        while end > 0 && self.node(parents[end - 1]).default_child() == Some(path[end - 1].as_ref())
        {
            end -= 1;
        }
        Ok(to_owned_path(&path[..end.saturating_sub(1)]))
    }
}

fn to_owned_path<S: AsRef<str>>(path: &[S]) -> Vec<String> {
    path.iter().map(|step| step.as_ref().to_string()).collect()
}
