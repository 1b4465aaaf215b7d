//! The wizard session service: the only component that changes sessions.
//!
//! Every operation loads the session, applies one transition to the loaded copy and
//! saves it back with the version it was loaded at. A failed transition never
//! reaches the store, and a concurrent change makes the save fail with `Conflict`.

use crate::error::WizardError;
use crate::job::{JobRequest, JobSink, SubmissionReceipt};
use crate::session::{Inputs, SessionId, SessionView, WizardSession, missing_required};
use crate::store::SessionStore;
use crate::tree::DecisionTree;
use std::sync::Arc;

mod transition;

pub type WizardResult<T> = Result<T, WizardError>;

pub struct WizardSessionService<S> {
    tree: Arc<DecisionTree>,
    store: S,
}

impl<S: SessionStore> WizardSessionService<S> {
    pub fn new(tree: Arc<DecisionTree>, store: S) -> Self {
        Self { tree, store }
    }

    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates and stores an empty session, positioned at the root (after any
    /// default continuation the root has).
    pub fn create(&self) -> WizardResult<WizardSession> {
        let mut session = WizardSession::new(SessionId::new());
        transition::resolve_into(&self.tree, &mut session, &[] as &[&str])?;
        self.store.insert(&session)?;
        tracing::info!(session = %session.id(), status = %session.status(), "Created wizard session");
        Ok(session)
    }

    pub fn get(&self, id: SessionId) -> WizardResult<WizardSession> {
        Ok(self.store.load(id)?)
    }

    /// Picks option `key` at the session's current position.
    pub fn choose(&self, id: SessionId, key: &str) -> WizardResult<WizardSession> {
        let session = self.update(id, |tree, session| transition::choose(tree, session, key))?;
        tracing::info!(
            session = %id,
            choice = key,
            profile = ?session.profile(),
            status = %session.status(),
            "Wizard step chosen"
        );
        Ok(session)
    }

    /// Undoes the last choice. A no-op at the root.
    ///
    /// Default continuations that choice led through are dropped with it, so the
    /// path can shrink by more than one step.
    pub fn back(&self, id: SessionId) -> WizardResult<WizardSession> {
        let session = self.update(id, transition::back)?;
        tracing::info!(session = %id, path = ?session.path(), "Wizard step undone");
        Ok(session)
    }

    /// Merges `partial` into the session's inputs.
    pub fn set_inputs(&self, id: SessionId, partial: Inputs) -> WizardResult<WizardSession> {
        let keys = partial.len();
        let session = self.update(id, |_, session| transition::set_inputs(session, partial))?;
        tracing::info!(session = %id, keys, "Wizard inputs updated");
        Ok(session)
    }

    /// Required inputs of the resolved node that are still absent or falsy.
    pub fn missing_required_inputs(&self, session: &WizardSession) -> WizardResult<Vec<String>> {
        Ok(missing_required(&self.tree, session)?)
    }

    pub fn describe(&self, session: &WizardSession) -> WizardResult<SessionView> {
        Ok(SessionView::project(&self.tree, session)?)
    }

    /// Hands a complete session to `sink` and marks it submitted.
    ///
    /// The sink runs before the session is saved. If that save fails the job
    /// exists while the session still looks unsubmitted; the error is logged with
    /// the job id.
    pub fn submit<J: JobSink + ?Sized>(
        &self,
        id: SessionId,
        sink: &J,
    ) -> WizardResult<SubmissionReceipt> {
        let mut session = self.store.load(id)?;
        transition::ensure_mutable(&session)?;

        let profile = session
            .profile()
            .map(str::to_string)
            .ok_or(WizardError::NoProfileResolved)?;
        let missing = self.missing_required_inputs(&session)?;
        if !missing.is_empty() {
            tracing::debug!(session = %id, ?missing, "Submission refused");
            return Err(WizardError::IncompleteSubmission { missing });
        }

        let request = JobRequest {
            session_id: id,
            profile: profile.clone(),
            path: session.path().to_vec(),
            inputs: session.inputs().clone(),
        };
        let job = sink.create_job(&request)?;

        session.mark_submitted();
        if let Err(e) = self.commit(&mut session) {
            tracing::error!(
                session = %id,
                job = %job.id,
                error = %e,
                "Job created but the session could not be marked submitted"
            );
            return Err(e);
        }

        tracing::info!(session = %id, job = %job.id, profile = %profile, "Wizard session submitted");
        Ok(SubmissionReceipt {
            session_id: id,
            profile,
            job,
            submitted_at: session.updated_at(),
        })
    }

    fn update<F>(&self, id: SessionId, transition: F) -> WizardResult<WizardSession>
    where
        F: FnOnce(&DecisionTree, &mut WizardSession) -> WizardResult<()>,
    {
        let mut session = self.store.load(id)?;
        transition(&*self.tree, &mut session)?;
        self.commit(&mut session)?;
        Ok(session)
    }

    /// Saves `session` against the version it was loaded at.
    fn commit(&self, session: &mut WizardSession) -> WizardResult<()> {
        let expected = session.version();
        session.touch();
        if let Err(e) = self.store.save(session, expected) {
            tracing::warn!(session = %session.id(), error = %e, "Could not save wizard session");
            return Err(e.into());
        }
        Ok(())
    }
}
