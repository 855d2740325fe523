//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes (un thread por conexión)
//! 3. Lee y parsea requests HTTP (headers + body según `Content-Length`)
//! 4. Despacha al [`Router`] y envía la respuesta
//!
//! Aquí también vive la tabla de rutas de la API.

pub mod tcp;

pub use tcp::Server;

use crate::http::Method;
use crate::jobs::{handlers, JobManager};
use crate::router::Router;
use crate::stats::Aggregation;

/// Estado compartido por todos los handlers
pub struct AppState {
    pub jobs: JobManager,

    /// Líneas de la página de índice
    pub endpoints: Vec<String>,
}

impl AppState {
    pub fn new(jobs: JobManager, router: &Router<AppState>) -> Self {
        Self {
            jobs,
            endpoints: router.describe(),
        }
    }
}

/// Construye el router con todas las rutas de la API
pub fn build_router() -> Router<AppState> {
    let mut router = Router::new();

    router.register(Method::GET, "/", handlers::index_handler);
    router.register(Method::GET, "/index", handlers::index_handler);

    for aggregation in Aggregation::ALL {
        router.register(Method::POST, &aggregation.path(), handlers::submit_handler);
    }

    router.register(Method::GET, "/api/get_results/{job_id}", handlers::get_results_handler);
    router.register(Method::GET, "/api/jobs", handlers::jobs_handler);
    router.register(Method::GET, "/api/num_jobs", handlers::num_jobs_handler);
    router.register(Method::GET, "/api/graceful_shutdown", handlers::graceful_shutdown_handler);

    router
}
