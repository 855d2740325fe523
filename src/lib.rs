//! # Stats Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de estadísticas sobre un dataset de nutrición, actividad
//! física y obesidad. Cada request de agregación se convierte en un job que
//! un pool de workers ejecuta en segundo plano; el cliente recibe un id y
//! consulta el resultado después.
//!
//! ## Arquitectura
//!
//! - `http`: Parsing y manejo del protocolo HTTP/1.0
//! - `server`: Servidor TCP, tabla de rutas y estado compartido
//! - `router`: Enrutamiento por método y path
//! - `dataset`: Carga del CSV en una tabla inmutable
//! - `stats`: Agregaciones y validación de payloads
//! - `jobs`: Registry, result store, worker pool y handlers de la API
//! - `config` / `logging`: CLI, variables de entorno y `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use stats_server::config::Config;
//! use stats_server::dataset::Table;
//! use stats_server::jobs::{JobManager, JobManagerConfig};
//! use stats_server::server::Server;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let table = Arc::new(Table::load(&config.data_file).unwrap());
//! let jobs = JobManager::new(JobManagerConfig::from_config(&config), table).unwrap();
//! Server::bind(&config, jobs).unwrap().run().unwrap();
//! ```

pub mod config;
pub mod dataset;
pub mod http;
pub mod jobs;
pub mod logging;
pub mod router;
pub mod server;
pub mod stats;
