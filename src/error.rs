use crate::session::SessionId;
use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

/// Renders a tree path for error messages, e.g. `HLA/LF` or `<root>`.
pub fn display_path<S: AsRef<str>>(path: &[S]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.iter().map(|step| step.as_ref()).join("/")
    }
}

/// Errors that can occur while loading or validating a decision tree.
///
/// All of these are configuration errors: a tree that fails to load is never
/// handed to the session service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Failed to parse tree source: {0}")]
    Parse(String),

    #[error("Could not read tree source '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Invalid tree definition: {0}")]
    Conversion(String),

    #[error("Node '{node}' declares the option key '{key}' more than once")]
    DuplicateKey { node: String, key: String },

    #[error("Node '{node}' declares an empty option key")]
    EmptyKey { node: String },

    #[error("Default continuation '{key}' of node '{node}' is not one of its options")]
    DanglingDefault { node: String, key: String },

    #[error("Node '{node}' has a '_DEFAULT' option but continues through '{default}' by default")]
    ShadowedDefaultKey { node: String, default: String },

    #[error("Link at '{node}' is invalid: {message}")]
    InvalidLink { node: String, message: String },

    #[error("Link at '{node}' points to '{target}', which does not exist")]
    UnresolvedLink { node: String, target: String },

    #[error("Default continuations starting at '{node}' form a cycle")]
    DefaultCycle { node: String },

    #[error("Option '{key}' of node '{node}' leads back to one of its ancestors")]
    CyclicLink { node: String, key: String },

    #[error("Compiled tree cache error: {0}")]
    Cache(String),
}

/// A tree path that names a step absent from the node reached so far.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid path step '{step}' after '{}'", display_path(.valid_prefix))]
pub struct PathError {
    /// The step that could not be followed.
    pub step: String,
    /// The part of the path that was valid before `step`.
    pub valid_prefix: Vec<String>,
}

/// Errors that can occur while resolving a path to its profile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Default continuations form a cycle at '{}'", display_path(.path))]
    DefaultCycle { path: Vec<String> },
}

/// Errors reported by a `SessionStore`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Wizard session '{0}' not found")]
    NotFound(SessionId),

    #[error("Wizard session '{0}' already exists")]
    AlreadyExists(SessionId),

    #[error(
        "Wizard session '{id}' was modified concurrently (expected version {expected}, found {found})"
    )]
    Conflict {
        id: SessionId,
        expected: u64,
        found: u64,
    },

    #[error("Session storage I/O failed: {0}")]
    Io(String),

    #[error("Session serialization failed: {0}")]
    Serialization(String),
}

/// Errors reported by a downstream `JobSink`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Could not prepare the run directory: {0}")]
    Io(String),

    #[error("Job was rejected: {0}")]
    Rejected(String),
}

/// Errors returned by the wizard session service.
///
/// Every variant is a recoverable condition for the caller; none leaves a stored
/// session partially updated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("Invalid choice '{choice}', available options: [{}]", .options.join(", "))]
    InvalidChoice {
        choice: String,
        options: Vec<String>,
    },

    #[error("No further options at '{}'", display_path(.path))]
    NoFurtherOptions { path: Vec<String> },

    #[error("Wizard session '{0}' not found")]
    NotFound(SessionId),

    #[error("Wizard session '{0}' has already been submitted")]
    AlreadySubmitted(SessionId),

    #[error("Wizard session not complete (no profile resolved)")]
    NoProfileResolved,

    #[error("Missing required inputs: {}", .missing.join(", "))]
    IncompleteSubmission { missing: Vec<String> },

    #[error("Wizard session '{id}' was modified concurrently, reload and retry")]
    Conflict { id: SessionId },

    #[error("Default continuations form a cycle at '{}'", display_path(.path))]
    DefaultCycle { path: Vec<String> },

    #[error("Session storage failed: {0}")]
    Storage(StoreError),

    #[error(transparent)]
    Job(#[from] JobError),
}

impl From<StoreError> for WizardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WizardError::NotFound(id),
            StoreError::Conflict { id, .. } => WizardError::Conflict { id },
            other => WizardError::Storage(other),
        }
    }
}

impl From<ResolveError> for WizardError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Path(path_err) => WizardError::Path(path_err),
            ResolveError::DefaultCycle { path } => WizardError::DefaultCycle { path },
        }
    }
}

impl WizardError {
    /// A stable, machine-readable name for the error.
    pub fn kind(&self) -> &'static str {
        match self {
            WizardError::Path(_) => "path_error",
            WizardError::InvalidChoice { .. } => "invalid_choice",
            WizardError::NoFurtherOptions { .. } => "no_further_options",
            WizardError::NotFound(_) => "not_found",
            WizardError::AlreadySubmitted(_) => "already_submitted",
            WizardError::NoProfileResolved => "no_profile_resolved",
            WizardError::IncompleteSubmission { .. } => "missing_required_inputs",
            WizardError::Conflict { .. } => "conflict",
            WizardError::DefaultCycle { .. } => "default_cycle",
            WizardError::Storage(_) => "storage_error",
            WizardError::Job(_) => "job_error",
        }
    }

    /// The HTTP status a transport adapter should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            WizardError::Path(_)
            | WizardError::InvalidChoice { .. }
            | WizardError::NoFurtherOptions { .. }
            | WizardError::NoProfileResolved
            | WizardError::IncompleteSubmission { .. } => 400,
            WizardError::NotFound(_) => 404,
            WizardError::AlreadySubmitted(_) | WizardError::Conflict { .. } => 409,
            WizardError::Job(_) => 502,
            WizardError::DefaultCycle { .. } | WizardError::Storage(_) => 500,
        }
    }

    /// The JSON error body for the transport layer.
    pub fn body(&self) -> ErrorBody {
        let (options, missing) = match self {
            WizardError::InvalidChoice { options, .. } => (Some(options.clone()), None),
            WizardError::IncompleteSubmission { missing } => (None, Some(missing.clone())),
            _ => (None, None),
        };
        ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
            options,
            missing,
        }
    }
}

/// Serializable error payload, enough for a client to resume the wizard.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
}

/// Errors that can occur while loading the wizard configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration value for '{field}': {message}")]
    Invalid { field: String, message: String },
}
