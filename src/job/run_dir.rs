use super::{JobReference, JobRequest, JobSink};
use crate::config::JobsConfig;
use crate::error::JobError;
use chrono::Utc;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Prepares a run directory per job: `<root>/<job-id>/` holding the parameters,
/// the profile and a launch script for the pipeline.
#[derive(Debug, Clone)]
pub struct RunDirectorySink {
    root: PathBuf,
    pipeline: PathBuf,
    nextflow_config: Option<PathBuf>,
}

impl RunDirectorySink {
    pub fn new(root: impl Into<PathBuf>, pipeline: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            pipeline: pipeline.into(),
            nextflow_config: None,
        }
    }

    /// Passes `config` to the launch script and snapshots it into every run directory.
    pub fn with_nextflow_config(mut self, config: impl Into<PathBuf>) -> Self {
        self.nextflow_config = Some(config.into());
        self
    }

    pub fn from_config(config: &JobsConfig) -> Self {
        Self {
            root: config.root.clone(),
            pipeline: config.pipeline.clone(),
            nextflow_config: config.nextflow_config.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn launch_script(&self, profile: &str) -> String {
        let mut command = vec![
            "nextflow".to_string(),
            "run".to_string(),
            shell_quote(&self.pipeline.display().to_string()),
        ];
        if let Some(config) = &self.nextflow_config {
            command.push("-c".to_string());
            command.push(shell_quote(&config.display().to_string()));
        }
        command.push("-profile".to_string());
        command.push(shell_quote(profile));
        command.push("-params-file".to_string());
        command.push("params.json".to_string());

        [
            "#!/usr/bin/env bash".to_string(),
            "set -euo pipefail".to_string(),
            "cd \"$(dirname \"$0\")\"".to_string(),
            command.join(" "),
            String::new(),
        ]
        .join("\n")
    }
}

impl RunDirectorySink {
    /// Writes every run file into `dir`.
    fn fill_run_dir(&self, dir: &Path, request: &JobRequest) -> Result<(), JobError> {
        let params = serde_json::to_string_pretty(&request.inputs)
            .map_err(|e| JobError::Io(format!("Could not serialize params: {}", e)))?;
        write_file(&dir.join("params.json"), &params)?;
        write_file(&dir.join("profile.txt"), &format!("{}\n", request.profile))?;

        let origin = json!({
            "wizard_session_id": request.session_id,
            "path": request.path,
            "profile": request.profile,
        });
        write_file(&dir.join("wizard.json"), &format!("{:#}", origin))?;

        let script_path = dir.join("run.sh");
        write_file(&script_path, &self.launch_script(&request.profile))?;
        make_executable(&script_path)?;

        if let Some(config) = &self.nextflow_config {
            let snapshot = dir.join("nextflow.config.snapshot");
            fs::copy(config, &snapshot).map_err(|e| io_error(config, e))?;
        }
        Ok(())
    }
}

impl JobSink for RunDirectorySink {
    /// Builds the run directory under a hidden staging name and renames it into
    /// place once complete, so a failed job leaves nothing under the root.
    fn create_job(&self, request: &JobRequest) -> Result<JobReference, JobError> {
        let job_id = format!(
            "{}-{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let run_dir = self.root.join(&job_id);
        let staging = self.root.join(format!(".{}.partial", job_id));
        fs::create_dir_all(&staging).map_err(|e| io_error(&staging, e))?;

        let filled = self
            .fill_run_dir(&staging, request)
            .and_then(|()| fs::rename(&staging, &run_dir).map_err(|e| io_error(&run_dir, e)));
        if let Err(e) = filled {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                tracing::warn!(
                    staging = %staging.display(),
                    error = %cleanup,
                    "Could not remove incomplete run directory"
                );
            }
            return Err(e);
        }

        tracing::info!(
            job = %job_id,
            session = %request.session_id,
            profile = %request.profile,
            run_dir = %run_dir.display(),
            "Prepared run directory"
        );

        Ok(JobReference {
            id: job_id,
            location: Some(run_dir),
        })
    }
}

/// Quotes `value` for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

fn write_file(path: &Path, contents: &str) -> Result<(), JobError> {
    fs::write(path, contents).map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, err: std::io::Error) -> JobError {
    JobError::Io(format!("'{}': {}", path.display(), err))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), JobError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| io_error(path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), JobError> {
    Ok(())
}
