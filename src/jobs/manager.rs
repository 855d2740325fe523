//! # Gestor Central de Jobs
//! src/jobs/manager.rs
//!
//! Coordina registry, result store y worker pool: asigna ids, valida los
//! payloads, despacha agregaciones y resuelve los polls.

use crate::config::Config;
use crate::dataset::Table;
use crate::jobs::pool::{error_payload, WorkerPool};
use crate::jobs::registry::JobRegistry;
use crate::jobs::storage::{FileResultStore, MemoryResultStore, ResultStore, StoreError};
use crate::jobs::types::{JobError, JobId, JobStatus, WorkItem};
use crate::stats::{Aggregation, Query, ValidationError};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuración del Job Manager
#[derive(Debug, Clone)]
pub struct JobManagerConfig {
    /// Número de workers del pool
    pub workers: usize,

    /// Directorio para espejar resultados en disco
    pub results_dir: Option<PathBuf>,
}

impl Default for JobManagerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            results_dir: None,
        }
    }
}

impl JobManagerConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.worker_count(),
            results_dir: config.results_dir.clone(),
        }
    }
}

/// Lo que ve un cliente al consultar un job
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Running,
    Done(Value),
    Error(Value),
}

/// Gestor central de jobs
pub struct JobManager {
    registry: Arc<JobRegistry>,
    results: Arc<dyn ResultStore>,
    pool: WorkerPool,
    table: Arc<Table>,
}

impl JobManager {
    /// Crea el manager y lanza los workers
    pub fn new(config: JobManagerConfig, table: Arc<Table>) -> Result<Self, StoreError> {
        let results: Arc<dyn ResultStore> = match &config.results_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "mirroring results to disk");
                Arc::new(FileResultStore::new(dir)?)
            }
            None => Arc::new(MemoryResultStore::new()),
        };

        let registry = Arc::new(JobRegistry::new());
        let pool = WorkerPool::new(config.workers, Arc::clone(&registry), Arc::clone(&results))?;

        Ok(Self {
            registry,
            results,
            pool,
            table,
        })
    }

    /// Acepta una agregación y retorna su id sin esperar al cómputo.
    ///
    /// Un payload inválido también recibe id: el job queda en `error` con
    /// `{"error_message": "Invalid input"}`. Sólo falla si el pool ya no
    /// acepta trabajo.
    pub fn submit(&self, aggregation: Aggregation, body: Option<&Value>) -> Result<JobId, JobError> {
        match Query::validate(aggregation, body, &self.table) {
            Ok(query) => self.enqueue(aggregation, query),
            Err(e) => self.record_invalid(aggregation, e),
        }
    }

    fn enqueue(&self, aggregation: Aggregation, query: Query) -> Result<JobId, JobError> {
        let table = Arc::clone(&self.table);

        let job_id = self.pool.submit(|| {
            WorkItem::new(self.registry.allocate(), move || {
                aggregation.evaluate(&table, &query).map_err(Into::into)
            })
        })?;

        tracing::info!(job_id = %job_id, aggregation = %aggregation, "job submitted");
        Ok(job_id)
    }

    fn record_invalid(&self, aggregation: Aggregation, error: ValidationError) -> Result<JobId, JobError> {
        let job_id = self.pool.admit(|| self.registry.allocate())?;

        if let Err(e) = self
            .results
            .write(job_id, &error_payload(ValidationError::PUBLIC_MESSAGE))
        {
            tracing::error!(job_id = %job_id, error = %e, "failed to store result");
        }
        self.registry.set_status(job_id, JobStatus::Error)?;

        tracing::warn!(
            job_id = %job_id,
            aggregation = %aggregation,
            reason = %error,
            "invalid input"
        );
        Ok(job_id)
    }

    /// Estado y, si es terminal, resultado de un job
    pub fn poll(&self, job_id: JobId) -> Result<JobOutcome, JobError> {
        let status = self.registry.get_status(job_id)?;

        let outcome = match status {
            JobStatus::Running => JobOutcome::Running,
            JobStatus::Done => JobOutcome::Done(self.read_result(job_id)),
            JobStatus::Error => JobOutcome::Error(self.read_result(job_id)),
        };
        Ok(outcome)
    }

    fn read_result(&self, job_id: JobId) -> Value {
        self.results.read(job_id).unwrap_or_else(|e| {
            tracing::error!(job_id = %job_id, error = %e, "terminal job without result");
            error_payload(&e.to_string())
        })
    }

    /// Todos los jobs asignados, en orden de id
    pub fn list(&self) -> Vec<(JobId, JobStatus)> {
        self.registry.snapshot()
    }

    /// Jobs en estado `running`
    pub fn num_running(&self) -> usize {
        self.registry.count(JobStatus::Running)
    }

    /// Deja de aceptar trabajo; no espera a los jobs en curso
    pub fn shutdown(&self) -> bool {
        self.pool.shutdown()
    }

    pub fn is_accepting(&self) -> bool {
        self.pool.is_accepting()
    }

    /// Espera a que los workers terminen (tras `shutdown`)
    pub fn join(&self) {
        self.pool.join();
    }
}
