//! # Result Store
//! src/jobs/storage.rs
//!
//! Mapa job_id → payload JSON. Se escribe una vez por job, antes de que el
//! registry lo marque terminal.
//!
//! - [`MemoryResultStore`]: `HashMap` protegido por `Mutex`.
//! - [`FileResultStore`]: misma caché en memoria, espejada en
//!   `<dir>/job_id_<n>.json` con escritura atómica (archivo temporal + rename).

use crate::jobs::types::JobId;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No result stored for job {0}")]
    NotFound(JobId),

    #[error("Result store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Result serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Contrato del Result Store
pub trait ResultStore: Send + Sync {
    /// Guarda (o reemplaza) el resultado de un job
    fn write(&self, job_id: JobId, payload: &Value) -> Result<(), StoreError>;

    /// Lee el resultado de un job
    fn read(&self, job_id: JobId) -> Result<Value, StoreError>;
}

/// Store en memoria para toda la vida del proceso
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: Mutex<HashMap<JobId, Value>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, Value>> {
        self.results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for MemoryResultStore {
    fn write(&self, job_id: JobId, payload: &Value) -> Result<(), StoreError> {
        self.lock().insert(job_id, payload.clone());
        Ok(())
    }

    fn read(&self, job_id: JobId) -> Result<Value, StoreError> {
        self.lock()
            .get(&job_id)
            .cloned()
            .ok_or(StoreError::NotFound(job_id))
    }
}

/// Store en memoria con copia en disco de cada resultado
#[derive(Debug)]
pub struct FileResultStore {
    dir: PathBuf,
    cache: MemoryResultStore,
}

impl FileResultStore {
    /// Crea el directorio de resultados si no existe
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            cache: MemoryResultStore::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ruta del archivo de un job
    pub fn path_for(&self, job_id: JobId) -> PathBuf {
        self.dir.join(format!("{}.json", job_id.key()))
    }

    fn save_to_file(&self, job_id: JobId, payload: &Value) -> Result<(), StoreError> {
        let path = self.path_for(job_id);
        let temp_path = path.with_extension("json.tmp");

        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, payload)?;
        writer.flush()?;

        // rename atómico: un lector nunca ve un archivo a medias
        fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

impl ResultStore for FileResultStore {
    fn write(&self, job_id: JobId, payload: &Value) -> Result<(), StoreError> {
        self.cache.write(job_id, payload)?;

        if let Err(e) = self.save_to_file(job_id, payload) {
            tracing::error!(job_id = %job_id, error = %e, "failed to mirror result to disk");
        }
        Ok(())
    }

    fn read(&self, job_id: JobId) -> Result<Value, StoreError> {
        self.cache.read(job_id)
    }
}
