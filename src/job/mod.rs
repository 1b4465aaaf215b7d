//! Handing a completed session over to downstream job creation.

use crate::error::JobError;
use crate::session::{Inputs, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod run_dir;

pub use run_dir::RunDirectorySink;

/// What a sink receives when a session is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub session_id: SessionId,
    pub profile: String,
    pub path: Vec<String>,
    pub inputs: Inputs,
}

/// Identifies the job a sink created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReference {
    pub id: String,
    /// Where the job's files live, for sinks that write any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<PathBuf>,
}

/// Returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub session_id: SessionId,
    pub profile: String,
    pub job: JobReference,
    pub submitted_at: DateTime<Utc>,
}

/// Creates downstream jobs from submitted sessions.
pub trait JobSink {
    fn create_job(&self, request: &JobRequest) -> Result<JobReference, JobError>;
}

impl<T: JobSink + ?Sized> JobSink for &T {
    fn create_job(&self, request: &JobRequest) -> Result<JobReference, JobError> {
        (**self).create_job(request)
    }
}
