//! # Sistema de Jobs
//!
//! Ejecuta las agregaciones fuera del thread de la conexión HTTP.
//!
//! ```text
//! submit → JobRegistry::allocate (running) → JobQueue → worker
//!        worker → ResultStore::write → JobRegistry::set_status (done | error)
//! ```
//!
//! ## Endpoints
//!
//! - `POST /api/<aggregation>` - Encolar job
//! - `GET /api/get_results/{job_id}` - Estado y resultado
//! - `GET /api/jobs` - Todos los jobs
//! - `GET /api/num_jobs` - Jobs en ejecución
//! - `GET /api/graceful_shutdown` - Dejar de aceptar jobs

pub mod handlers;
pub mod manager;
pub mod pool;
pub mod queue;
pub mod registry;
pub mod storage;
pub mod types;

pub use manager::{JobManager, JobManagerConfig, JobOutcome};
pub use pool::WorkerPool;
pub use queue::PoolState;
pub use registry::JobRegistry;
pub use storage::{FileResultStore, MemoryResultStore, ResultStore, StoreError};
pub use types::{JobError, JobId, JobStatus, WorkItem};
