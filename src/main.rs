//! # Stats Server - Entry Point
//! src/main.rs
//!
//! Carga el dataset, lanza el pool de workers y atiende HTTP hasta que el
//! proceso termine.

use stats_server::config::Config;
use stats_server::dataset::Table;
use stats_server::jobs::{JobManager, JobManagerConfig};
use stats_server::logging::init_logging;
use stats_server::server::Server;
use std::process;
use std::sync::Arc;

fn main() {
    println!("=================================");
    println!("  Stats HTTP/1.0 Server");
    println!("  Jobs asíncronos sobre el dataset");
    println!("=================================\n");

    let config = Config::new();

    if let Err(e) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", e);
        process::exit(1);
    }

    // El guard debe vivir hasta el final del proceso
    let _log_guard = init_logging(&config);
    config.log_summary();

    let table = match Table::load(&config.data_file) {
        Ok(table) => Arc::new(table),
        Err(e) => {
            tracing::error!(error = %e, "failed to load dataset");
            process::exit(1);
        }
    };

    let jobs = match JobManager::new(JobManagerConfig::from_config(&config), table) {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::error!(error = %e, "failed to start job manager");
            process::exit(1);
        }
    };

    let server = match Server::bind(&config, jobs) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, address = %config.address(), "failed to bind");
            process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!(error = %e, "fatal server error");
        process::exit(1);
    }
}
