//! # Worker Pool
//! src/jobs/pool.rs
//!
//! N threads consumiendo la [`JobQueue`]. Por cada item:
//!
//! 1. ejecuta la tarea bajo `catch_unwind`
//! 2. escribe el resultado (o `{"error_message": ...}`) en el Result Store
//! 3. marca el job `done` / `error` en el registry
//!
//! El paso 2 ocurre antes que el 3, así que quien observe un estado
//! terminal encuentra el resultado ya escrito.

use crate::jobs::queue::{JobQueue, PoolState};
use crate::jobs::registry::JobRegistry;
use crate::jobs::storage::ResultStore;
use crate::jobs::types::{JobError, JobId, JobStatus, WorkItem};
use serde_json::{json, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Payload de error almacenado como resultado
pub fn error_payload(message: &str) -> Value {
    json!({ "error_message": message })
}

pub struct WorkerPool {
    queue: Arc<JobQueue>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Lanza `workers` threads (al menos uno)
    pub fn new(
        workers: usize,
        registry: Arc<JobRegistry>,
        results: Arc<dyn ResultStore>,
    ) -> std::io::Result<Self> {
        let queue = Arc::new(JobQueue::new());
        let mut handles = Vec::with_capacity(workers.max(1));

        for i in 0..workers.max(1) {
            let queue = Arc::clone(&queue);
            let registry = Arc::clone(&registry);
            let results = Arc::clone(&results);

            queue.worker_started();
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", i))
                .spawn({
                    let queue = Arc::clone(&queue);
                    move || worker_loop(i, &queue, &registry, results.as_ref())
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    queue.worker_exited();
                    queue.close();
                    return Err(e);
                }
            }
        }

        tracing::info!(workers = handles.len(), "worker pool started");

        Ok(Self {
            queue,
            handles: Mutex::new(handles),
        })
    }

    /// Ejecuta `f` bajo el lock de admisión (ver [`JobQueue::admit`])
    pub fn admit<T>(&self, f: impl FnOnce() -> T) -> Result<T, JobError> {
        self.queue.admit(f)
    }

    /// Encola el item que construye `f`; no bloquea
    pub fn submit(&self, f: impl FnOnce() -> WorkItem) -> Result<JobId, JobError> {
        self.queue.push(f)
    }

    /// Deja de aceptar trabajo sin esperar a los jobs en curso
    pub fn shutdown(&self) -> bool {
        let first = self.queue.close();
        if first {
            tracing::info!(pending = self.queue.len(), "worker pool draining");
        }
        first
    }

    pub fn state(&self) -> PoolState {
        self.queue.state()
    }

    pub fn is_accepting(&self) -> bool {
        self.state() == PoolState::Accepting
    }

    /// Espera a que todos los workers terminen. Sólo tiene sentido tras
    /// `shutdown()`.
    pub fn join(&self) {
        let handles: Vec<_> = {
            let mut guard = self
                .handles
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            guard.drain(..).collect()
        };

        for handle in handles {
            let _ = handle.join();
        }
    }
}

/// Descuenta al worker de la cola al salir del loop, incluso por panic
struct ExitGuard<'a> {
    queue: &'a JobQueue,
    index: usize,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.queue.worker_exited();
        tracing::debug!(worker = self.index, "worker exited");
    }
}

fn worker_loop(index: usize, queue: &JobQueue, registry: &JobRegistry, results: &dyn ResultStore) {
    tracing::debug!(worker = index, "worker started");
    let _exit = ExitGuard { queue, index };

    while let Some(item) = queue.dequeue() {
        run_item(item, registry, results);
    }
}

/// Ejecuta un item y lo lleva a estado terminal
fn run_item(item: WorkItem, registry: &JobRegistry, results: &dyn ResultStore) {
    let WorkItem { job_id, task } = item;

    let (status, payload) = match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(Ok(value)) => (JobStatus::Done, value),
        Ok(Err(e)) => {
            tracing::warn!(job_id = %job_id, error = %e, "job failed");
            (JobStatus::Error, error_payload(&e.to_string()))
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(job_id = %job_id, panic = %message, "job panicked");
            (JobStatus::Error, error_payload(&message))
        }
    };

    match panic::catch_unwind(AssertUnwindSafe(|| results.write(job_id, &payload))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(job_id = %job_id, error = %e, "failed to store result"),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(job_id = %job_id, panic = %message, "result store panicked");
        }
    }

    match registry.set_status(job_id, status) {
        Ok(()) => tracing::info!(job_id = %job_id, status = %status, "job finished"),
        Err(e) => tracing::error!(job_id = %job_id, error = %e, "status update rejected"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}
