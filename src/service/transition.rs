//! The pure state transitions of a session. Each one either changes the session
//! completely or returns an error without touching it.

use crate::error::WizardError;
use crate::session::{Inputs, WizardSession};
use crate::tree::DecisionTree;

pub(super) fn ensure_mutable(session: &WizardSession) -> Result<(), WizardError> {
    if session.is_submitted() {
        return Err(WizardError::AlreadySubmitted(session.id()));
    }
    Ok(())
}

/// Resolves `path` and records the outcome on the session.
pub(super) fn resolve_into<S: AsRef<str>>(
    tree: &DecisionTree,
    session: &mut WizardSession,
    path: &[S],
) -> Result<(), WizardError> {
    let resolution = tree.resolve_profile(path)?;
    tracing::debug!(
        session = %session.id(),
        path = ?resolution.path,
        profile = ?resolution.profile,
        "Resolved session path"
    );
    session.apply_resolution(resolution.path, resolution.profile);
    Ok(())
}

/// The keys `choose` accepts for the session's current position.
pub(super) fn offered_keys(
    tree: &DecisionTree,
    session: &WizardSession,
) -> Result<Vec<String>, WizardError> {
    let options = tree.options_at(session.path())?;
    if !options.is_empty() {
        return Ok(options);
    }
    Ok(tree.specializations_at(session.path())?)
}

pub(super) fn choose(
    tree: &DecisionTree,
    session: &mut WizardSession,
    key: &str,
) -> Result<(), WizardError> {
    ensure_mutable(session)?;
    let offered = offered_keys(tree, session)?;
    if offered.is_empty() {
        return Err(WizardError::NoFurtherOptions {
            path: session.path().to_vec(),
        });
    }
    if !offered.iter().any(|option| option == key) {
        return Err(WizardError::InvalidChoice {
            choice: key.to_string(),
            options: offered,
        });
    }

    let mut path = session.path().to_vec();
    path.push(key.to_string());
    resolve_into(tree, session, &path)
}

pub(super) fn back(tree: &DecisionTree, session: &mut WizardSession) -> Result<(), WizardError> {
    ensure_mutable(session)?;
    let path = tree.step_back(session.path())?;
    resolve_into(tree, session, &path)
}

pub(super) fn set_inputs(session: &mut WizardSession, partial: Inputs) -> Result<(), WizardError> {
    ensure_mutable(session)?;
    session.merge_inputs(partial);
    Ok(())
}
