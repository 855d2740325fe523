//! # Tipos del Sistema de Jobs
//! src/jobs/types.rs
//!
//! Identificadores, estados y errores compartidos por el registry, el pool y
//! el gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Identificador de job: entero denso y monótono, empieza en 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    pub const FIRST: JobId = JobId(1);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Clave usada en `/api/jobs` y en el nombre del archivo de resultado
    pub fn key(&self) -> String {
        format!("job_id_{}", self.0)
    }

    /// Parsea el segmento de path de `/api/get_results/{job_id}`
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<u64>().ok().map(JobId)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Estado de un job
///
/// `Running` es el único estado no terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errores del ciclo de vida de un job
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("Job {0} not found")]
    NotFound(JobId),

    #[error("Invalid transition for job {job_id}: {from:?} -> {to}")]
    InvalidTransition {
        job_id: JobId,
        from: Option<JobStatus>,
        to: JobStatus,
    },

    #[error("Worker pool is no longer accepting jobs")]
    Rejected,
}

/// Error opaco de una tarea
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Cómputo diferido que ejecuta un worker
pub type Task = Box<dyn FnOnce() -> Result<Value, TaskError> + Send>;

/// Unidad de trabajo encolada en el pool
pub struct WorkItem {
    pub job_id: JobId,
    pub task: Task,
}

impl WorkItem {
    pub fn new<F>(job_id: JobId, task: F) -> Self
    where
        F: FnOnce() -> Result<Value, TaskError> + Send + 'static,
    {
        Self {
            job_id,
            task: Box::new(task),
        }
    }
}

impl fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkItem").field("job_id", &self.job_id).finish()
    }
}
