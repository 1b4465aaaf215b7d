//! Common test utilities: fixture trees, services and job sinks.
use sentaku::prelude::*;
use serde_json::Value;
use std::cell::RefCell;
use std::sync::Arc;

/// The empty path, typed for the tree queries.
#[allow(dead_code)]
pub const ROOT: &[&str] = &[];

#[allow(dead_code)]
pub const LAB_INPUTS: [&str; 3] = ["mzml_input_dir", "database", "out_dir"];

/// A trimmed version of the lab intake tree.
///
/// ```text
/// HLA -> LF (HLA_LF), TMT10 (HLA_TMT10)
/// PRO -> TMT10 -> MS2 (PRO_TMT10MS2) -> SEMI (PRO_TMT10MS2_SEMI)
/// ```
#[allow(dead_code)]
pub fn lab_tree() -> DecisionTree {
    let leaf = |label: &str, profile: &str| {
        NodeBuilder::new(label)
            .profile(profile)
            .required_inputs(LAB_INPUTS)
    };

    TreeBuilder::new(
        NodeBuilder::new("Choose analysis type")
            .option(
                "HLA",
                NodeBuilder::new("HLA (immunopeptidomics)")
                    .option("LF", leaf("Label-free", "HLA_LF").optional_inputs(["HLA"]))
                    .option("TMT10", leaf("TMT10 (MHC I)", "HLA_TMT10").optional_inputs(["HLA"])),
            )
            .option(
                "PRO",
                NodeBuilder::new("Proteome").option(
                    "TMT10",
                    NodeBuilder::new("TMT10").option(
                        "MS2",
                        leaf("MS2", "PRO_TMT10MS2")
                            .option("SEMI", leaf("Semi-enzymatic", "PRO_TMT10MS2_SEMI")),
                    ),
                ),
            ),
    )
    .build()
    .expect("lab tree is valid")
}

/// A tree exercising default continuations.
///
/// `QC` continues through an implicit `_DEFAULT` child; `DIA` names `library_free` as
/// its default, which continues through another `_DEFAULT`.
#[allow(dead_code)]
pub const DEFAULTS_TREE_JSON: &str = r#"
{
    "id": "root",
    "label": "Root",
    "options": {
        "QC": {
            "label": "Quality control",
            "options": {
                "_DEFAULT": {
                    "label": "Standard QC",
                    "profile": "QC_STD",
                    "required_inputs": ["mzml_input_dir"]
                }
            }
        },
        "DIA": {
            "label": "DIA",
            "default": "library_free",
            "options": {
                "library_free": {
                    "label": "Library-free",
                    "options": {
                        "_DEFAULT": { "label": "Default search", "profile": "DIA_LIBFREE" }
                    }
                },
                "library": {
                    "label": "Spectral library",
                    "profile": "DIA_LIB",
                    "required_inputs": ["library"]
                }
            }
        },
        "DDA": {
            "label": "DDA",
            "options": {
                "open": { "label": "Open search" }
            }
        }
    }
}
"#;

#[allow(dead_code)]
pub fn defaults_tree() -> DecisionTree {
    DecisionTree::from_json_str(DEFAULTS_TREE_JSON).expect("defaults tree is valid")
}

#[allow(dead_code)]
pub fn service_for(tree: DecisionTree) -> WizardSessionService<MemorySessionStore> {
    WizardSessionService::new(Arc::new(tree), MemorySessionStore::new())
}

#[allow(dead_code)]
pub fn lab_service() -> WizardSessionService<MemorySessionStore> {
    service_for(lab_tree())
}

/// Turns a JSON object literal into an input patch.
#[allow(dead_code)]
pub fn inputs(value: Value) -> Inputs {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// Values for every input the lab profiles require.
#[allow(dead_code)]
pub fn complete_lab_inputs() -> Inputs {
    inputs(serde_json::json!({
        "mzml_input_dir": "/data/run42",
        "database": "uniprot_human.fasta",
        "out_dir": "/results/run42",
    }))
}

/// Records every request it receives and answers with sequential job ids.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingSink {
    pub requests: RefCell<Vec<JobRequest>>,
}

impl JobSink for RecordingSink {
    fn create_job(&self, request: &JobRequest) -> std::result::Result<JobReference, JobError> {
        let mut requests = self.requests.borrow_mut();
        requests.push(request.clone());
        Ok(JobReference {
            id: format!("job-{}", requests.len()),
            location: None,
        })
    }
}

/// Rejects every job.
#[allow(dead_code)]
pub struct RejectingSink;

impl JobSink for RejectingSink {
    fn create_job(&self, _request: &JobRequest) -> std::result::Result<JobReference, JobError> {
        Err(JobError::Rejected("queue is closed".to_string()))
    }
}
