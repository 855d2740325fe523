//! # Logging Estructurado
//! src/logging.rs
//!
//! Inicializa `tracing` con salida a consola y, opcionalmente, a un archivo
//! rotativo diario `webserver.log` que conserva los últimos
//! [`MAX_LOG_FILES`] archivos.

use crate::config::Config;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_NAME: &str = "webserver.log";

/// Archivo activo más 10 respaldos
pub const MAX_LOG_FILES: usize = 11;

/// Inicializa el subscriber global.
///
/// Retorna el guard del writer no bloqueante cuando hay log a archivo; debe
/// mantenerse vivo mientras corra el proceso o se pierden las últimas líneas.
pub fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let console = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_filter(build_filter(&config.log_level));

    let appender = match config.log_dir.as_deref().map(file_appender).transpose() {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("⚠️  No se pudo abrir el log a archivo: {}", e);
            None
        }
    };

    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .with_filter(build_filter(&config.log_level));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // try_init: en tests puede haber ya un subscriber global
    if tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("global tracing subscriber already installed");
    }

    tracing::info!(
        pid = std::process::id(),
        log_dir = ?config.log_dir,
        "🔧 logging initialized"
    );

    guard
}

fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_NAME)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
}

/// RUST_LOG tiene prioridad sobre el nivel configurado
fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
