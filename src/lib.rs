//! # Sentaku - Decision-Tree Wizard Resolver
//!
//! **Sentaku** walks users through a static tree of configuration options one step at
//! a time, collects free-form inputs along the way, and tells the caller when the path
//! has reached a terminal *profile* and which inputs that profile still needs.
//!
//! ## Core Workflow
//!
//! 1.  **Load the Tree**: Parse a JSON tree source, build one in code with `TreeBuilder`,
//!     or implement `IntoTree` for your own format. Loading validates the whole tree.
//! 2.  **Pick a Store**: Sessions are persisted through the `SessionStore` trait.
//!     `MemorySessionStore` and `FileSessionStore` ship with the crate.
//! 3.  **Drive Sessions**: `WizardSessionService` is the only component that changes a
//!     session: `create`, `choose`, `back`, `set_inputs` and `submit`.
//! 4.  **Render**: `describe` projects a session into a serializable `SessionView` for
//!     the transport layer; `ViewFormatter` renders it for terminals.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sentaku::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let tree = DecisionTree::from_json_file("data/wizard_tree.json")?;
//!     let service = WizardSessionService::new(Arc::new(tree), MemorySessionStore::new());
//!
//!     let session = service.create()?;
//!     service.choose(session.id(), "HLA")?;
//!     let session = service.choose(session.id(), "LF")?;
//!     println!("Resolved profile: {:?}", session.profile());
//!
//!     let mut inputs = Inputs::new();
//!     inputs.insert("mzml_input_dir".to_string(), json!("/data/run42"));
//!     inputs.insert("database".to_string(), json!("uniprot_human.fasta"));
//!     inputs.insert("out_dir".to_string(), json!("/results/run42"));
//!     let session = service.set_inputs(session.id(), inputs)?;
//!
//!     let view = service.describe(&session)?;
//!     println!("{}", ViewFormatter::format_view(&view));
//!
//!     let sink = RunDirectorySink::new("jobs", "pipeline/main.nf");
//!     let receipt = service.submit(session.id(), &sink)?;
//!     println!("Created job {}", receipt.job.id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod prelude;
pub mod service;
pub mod session;
pub mod store;
pub mod tree;
