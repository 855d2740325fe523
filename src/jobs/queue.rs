//! # Cola de Trabajo del Pool
//! src/jobs/queue.rs
//!
//! Cola FIFO thread-safe (`Mutex` + `Condvar`) que además guarda el estado
//! del pool:
//!
//! ```text
//! Accepting ──close()──► Draining ──último worker sale──► Stopped
//! ```
//!
//! Mientras está en `Draining` los workers siguen vaciando la cola; cuando
//! está vacía, `dequeue` retorna `None` y el worker termina.

use crate::jobs::types::{JobError, JobId, WorkItem};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

/// Estado del pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Accepting,
    Draining,
    Stopped,
}

#[derive(Debug)]
struct Inner {
    items: VecDeque<WorkItem>,
    state: PoolState,
    live_workers: usize,
}

#[derive(Debug)]
pub struct JobQueue {
    inner: Mutex<Inner>,
    condvar: Condvar,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                state: PoolState::Accepting,
                live_workers: 0,
            }),
            condvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ejecuta `f` bajo el lock sólo si el pool acepta trabajo.
    ///
    /// Mientras `f` corre, `close()` no puede intercalarse: lo que `f` haga
    /// (p. ej. reservar un job id) queda ordenado antes del cierre.
    pub fn admit<T>(&self, f: impl FnOnce() -> T) -> Result<T, JobError> {
        let inner = self.lock();
        if inner.state != PoolState::Accepting {
            return Err(JobError::Rejected);
        }
        Ok(f())
    }

    /// Como `admit`, pero encola el `WorkItem` que produce `f`.
    /// Retorna el id del job encolado.
    pub fn push(&self, f: impl FnOnce() -> WorkItem) -> Result<JobId, JobError> {
        let mut inner = self.lock();
        if inner.state != PoolState::Accepting {
            return Err(JobError::Rejected);
        }

        let item = f();
        let job_id = item.job_id;
        inner.items.push_back(item);
        self.condvar.notify_one();
        Ok(job_id)
    }

    /// Bloquea hasta que haya trabajo. `None` cuando el pool está drenado.
    pub fn dequeue(&self) -> Option<WorkItem> {
        let mut inner = self.lock();
        loop {
            if let Some(item) = inner.items.pop_front() {
                return Some(item);
            }
            if inner.state != PoolState::Accepting {
                return None;
            }
            inner = self
                .condvar
                .wait(inner)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Deja de aceptar trabajo y despierta a los workers ociosos.
    ///
    /// Idempotente y no bloqueante. Retorna `true` sólo en la primera llamada.
    pub fn close(&self) -> bool {
        let mut inner = self.lock();
        if inner.state != PoolState::Accepting {
            return false;
        }

        inner.state = if inner.live_workers == 0 && inner.items.is_empty() {
            PoolState::Stopped
        } else {
            PoolState::Draining
        };
        self.condvar.notify_all();
        true
    }

    /// Registra un worker vivo
    pub fn worker_started(&self) {
        self.lock().live_workers += 1;
    }

    /// Un worker terminó su loop; el último en salir detiene el pool
    pub fn worker_exited(&self) {
        let mut inner = self.lock();
        inner.live_workers = inner.live_workers.saturating_sub(1);
        if inner.live_workers == 0 && inner.state == PoolState::Draining {
            inner.state = PoolState::Stopped;
        }
    }

    pub fn state(&self) -> PoolState {
        self.lock().state
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
