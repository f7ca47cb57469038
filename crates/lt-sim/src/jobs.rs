//! Launching simulator runs.

use std::fs::{self, File};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::info;
use lt_core::{ErrorInfo, LtError};
use serde::{Deserialize, Serialize};

/// One simulator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimJob {
    /// Init macro passed to the simulator in batch mode.
    pub init: PathBuf,
    /// File receiving the simulator's standard output.
    pub log: PathBuf,
    pub events: u64,
}

/// Executes or submits simulator jobs.
///
/// Runners may return before the job finishes; the table builder copes with
/// results that do not exist yet.
pub trait JobRunner {
    fn submit(&mut self, job: &SimJob) -> Result<(), LtError>;
}

/// Runs the simulator on this machine, one job at a time.
#[derive(Debug, Clone)]
pub struct LocalRunner {
    executable: PathBuf,
}

impl LocalRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }
}

impl JobRunner for LocalRunner {
    fn submit(&mut self, job: &SimJob) -> Result<(), LtError> {
        if let Some(parent) = job.log.parent() {
            fs::create_dir_all(parent).map_err(|err| LtError::io("create-dir", parent, err))?;
        }
        let log = File::create(&job.log).map_err(|err| LtError::io("log-create", &job.log, err))?;
        info!(
            "running {} -b {} -n {}",
            self.executable.display(),
            job.init.display(),
            job.events
        );
        let status = Command::new(&self.executable)
            .arg("-b")
            .arg(&job.init)
            .arg("-n")
            .arg(job.events.to_string())
            .stdout(Stdio::from(log))
            .status()
            .map_err(|err| LtError::io("sim-spawn", &self.executable, err))?;
        if !status.success() {
            return Err(LtError::Io(
                ErrorInfo::new("sim-failed", "simulator exited with an error")
                    .with_context("init", job.init.display().to_string())
                    .with_context("status", status.to_string())
                    .with_hint(format!("see {}", job.log.display())),
            ));
        }
        Ok(())
    }
}

/// Collects jobs without running them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingRunner {
    pub jobs: Vec<SimJob>,
}

impl JobRunner for RecordingRunner {
    fn submit(&mut self, job: &SimJob) -> Result<(), LtError> {
        info!("dry run: {} ({} events)", job.init.display(), job.events);
        self.jobs.push(job.clone());
        Ok(())
    }
}
