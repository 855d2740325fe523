//! # Job Registry
//! src/jobs/registry.rs
//!
//! Mapa job_id → estado. Los ids son densos: el job `n` vive en el índice
//! `n - 1`, así que existe una entrada para todo `1 <= id < next_id()` y
//! ninguna fuera de ese rango.

use crate::jobs::types::{JobError, JobId, JobStatus};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct JobRegistry {
    statuses: Mutex<Vec<JobStatus>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<JobStatus>> {
        // un worker que hizo panic no deja el vector a medio escribir
        self.statuses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reserva el siguiente id y lo registra como `running`
    pub fn allocate(&self) -> JobId {
        let mut statuses = self.lock();
        statuses.push(JobStatus::Running);
        JobId::new(statuses.len() as u64)
    }

    /// Transición `running → done | error`
    pub fn set_status(&self, job_id: JobId, status: JobStatus) -> Result<(), JobError> {
        let mut statuses = self.lock();

        let current = index_of(job_id).and_then(|idx| statuses.get_mut(idx));
        match current {
            Some(slot) if *slot == JobStatus::Running && status.is_terminal() => {
                *slot = status;
                Ok(())
            }
            other => Err(JobError::InvalidTransition {
                job_id,
                from: other.map(|slot| *slot),
                to: status,
            }),
        }
    }

    pub fn get_status(&self, job_id: JobId) -> Result<JobStatus, JobError> {
        let statuses = self.lock();
        index_of(job_id)
            .and_then(|idx| statuses.get(idx).copied())
            .ok_or(JobError::NotFound(job_id))
    }

    /// Número de jobs en un estado dado
    pub fn count(&self, status: JobStatus) -> usize {
        self.lock().iter().filter(|s| **s == status).count()
    }

    /// Todos los jobs asignados, en orden de id
    pub fn snapshot(&self) -> Vec<(JobId, JobStatus)> {
        self.lock()
            .iter()
            .enumerate()
            .map(|(idx, status)| (JobId::new(idx as u64 + 1), *status))
            .collect()
    }

    /// Próximo id a asignar
    pub fn next_id(&self) -> JobId {
        JobId::new(self.lock().len() as u64 + 1)
    }
}

fn index_of(job_id: JobId) -> Option<usize> {
    job_id.get().checked_sub(1).map(|idx| idx as usize)
}
