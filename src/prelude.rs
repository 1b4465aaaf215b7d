//! Prelude module for convenient imports
//!
//! Re-exports the types most callers need to load a tree and drive sessions.
//!
//! # Example
//!
//! ```rust,no_run
//! use sentaku::prelude::*;
//! use std::sync::Arc;
//!
//! # fn run_example() -> Result<()> {
//! let config = ConfigLoader::load(std::path::Path::new("sentaku.toml"))?;
//! let tree = Arc::new(config.load_tree()?);
//! let service = WizardSessionService::new(tree, open_store(&config)?);
//!
//! let session = service.create()?;
//! println!("Options: {:?}", service.describe(&session)?.options);
//! # Ok(())
//! # }
//! ```

// Tree loading and queries
pub use crate::tree::{DecisionTree, IntoTree, NodeBuilder, Resolution, TreeBuilder};

// Sessions and their service
pub use crate::service::{WizardResult, WizardSessionService};
pub use crate::session::{Inputs, SessionId, SessionStatus, SessionView, ViewFormatter, WizardSession};

// Storage and job creation
pub use crate::job::{JobReference, JobRequest, JobSink, RunDirectorySink, SubmissionReceipt};
pub use crate::store::{FileSessionStore, MemorySessionStore, SessionStore, open_store};

// Configuration
pub use crate::config::{ConfigLoader, WizardConfig};

// Error types
pub use crate::error::{
    ConfigError, JobError, PathError, ResolveError, StoreError, TreeError, WizardError,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
