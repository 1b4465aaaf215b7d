//! The durable record of one user's progress through the wizard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

mod formatter;
mod view;

pub use formatter::ViewFormatter;
pub use view::SessionView;
pub(crate) use view::missing_required;

/// Free-form inputs collected alongside navigation.
pub type Inputs = serde_json::Map<String, Value>;

/// Stable identity of a wizard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// A fresh random identity.
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(SessionId)
    }
}

/// Coarse lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No profile resolved yet
    Draft,
    /// A profile is resolved; inputs may still be missing
    Ready,
    /// Handed to the job sink; no further transitions allowed
    Submitted,
}

impl SessionStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Submitted)
    }

    /// The status a non-submitted session has for a given resolved profile.
    pub fn for_profile(profile: Option<&str>) -> Self {
        if profile.is_some() {
            Self::Ready
        } else {
            Self::Draft
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Ready => write!(f, "ready"),
            Self::Submitted => write!(f, "submitted"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "ready" => Ok(Self::Ready),
            "submitted" => Ok(Self::Submitted),
            _ => Err(format!("Invalid session status: {s}")),
        }
    }
}

/// Whether an input value counts as supplied.
///
/// `null`, `false`, `0`, `""` and empty arrays or objects count as missing.
pub fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// One user's progress through the tree.
///
/// Only the session service changes a session; everything else reads it through
/// the getters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardSession {
    id: SessionId,
    path: Vec<String>,
    #[serde(default)]
    inputs: Inputs,
    profile: Option<String>,
    status: SessionStatus,
    #[serde(default)]
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WizardSession {
    pub(crate) fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            path: Vec::new(),
            inputs: Inputs::new(),
            profile: None,
            status: SessionStatus::Draft,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Revision counter, bumped by every persisted change.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_submitted(&self) -> bool {
        self.status.is_terminal()
    }

    /// Records a resolved path and profile and derives the status from them.
    pub(crate) fn apply_resolution(&mut self, path: Vec<String>, profile: Option<String>) {
        self.status = SessionStatus::for_profile(profile.as_deref());
        self.path = path;
        self.profile = profile;
    }

    /// Merges `partial` key by key; later values overwrite.
    pub(crate) fn merge_inputs(&mut self, partial: Inputs) {
        for (key, value) in partial {
            self.inputs.insert(key, value);
        }
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.status = SessionStatus::Submitted;
    }

    /// Bumps the revision and the modification time ahead of a save.
    pub(crate) fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
