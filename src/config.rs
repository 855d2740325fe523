//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de estadísticas con soporte para argumentos CLI
//! y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./stats_server --port 5000 --threads 8 --data-file ./data.csv
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! TP_NUM_OF_THREADS=4 HTTP_PORT=5000 ./stats_server
//! ```

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

/// Errores de validación de la configuración
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Worker threads must be >= 1")]
    ZeroWorkers,

    #[error("Data file path must not be empty")]
    EmptyDataFile,
}

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "stats_server")]
#[command(about = "Servidor HTTP/1.0 de estadísticas con jobs asíncronos")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "5000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Archivo CSV con el dataset (se carga una sola vez al arrancar)
    #[arg(
        long = "data-file",
        default_value = "./nutrition_activity_obesity_usa_subset.csv",
        env = "DATA_FILE"
    )]
    pub data_file: PathBuf,

    // === Workers ===

    /// Número de workers del pool. Si no se indica se usa el número de
    /// cores lógicos del host.
    #[arg(long = "threads", env = "TP_NUM_OF_THREADS")]
    pub threads: Option<usize>,

    // === Storage ===

    /// Directorio donde se espejan los resultados (`job_id_<n>.json`).
    /// Sin valor, los resultados sólo viven en memoria.
    #[arg(long = "results-dir", env = "RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,

    // === Logging ===

    /// Directorio para el log rotativo `webserver.log`
    #[arg(long = "log-dir", env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Nivel de log por defecto (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use stats_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:5000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Número efectivo de workers del pool
    pub fn worker_count(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDataFile);
        }
        Ok(())
    }

    /// Registra un resumen de la configuración en el log
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            data_file = %self.data_file.display(),
            workers = self.worker_count(),
            results_dir = ?self.results_dir,
            log_dir = ?self.log_dir,
            "server configuration"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "127.0.0.1".to_string(),
            data_file: PathBuf::from("./nutrition_activity_obesity_usa_subset.csv"),
            threads: None,
            results_dir: None,
            log_dir: None,
            log_level: "info".to_string(),
        }
    }
}
