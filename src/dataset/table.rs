//! # Tabla de Datos
//! src/dataset/table.rs
//!
//! Carga el CSV del dataset con el crate `csv` y deriva los conjuntos de
//! preguntas y estados conocidos.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errores al cargar el dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open dataset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset contains no rows")]
    Empty,
}

/// Una fila del dataset. Las demás columnas del CSV se ignoran.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Row {
    #[serde(rename = "LocationDesc")]
    pub state: String,

    #[serde(rename = "Question")]
    pub question: String,

    /// Vacío en el CSV → `None`; las medias lo ignoran
    #[serde(rename = "Data_Value")]
    pub value: Option<f64>,

    #[serde(rename = "StratificationCategory1", default)]
    pub stratification_category: Option<String>,

    #[serde(rename = "Stratification1", default)]
    pub stratification: Option<String>,
}

impl Row {
    /// Constructor corto para filas sin estratificación
    pub fn new(state: &str, question: &str, value: f64) -> Self {
        Self {
            state: state.to_string(),
            question: question.to_string(),
            value: Some(value),
            stratification_category: None,
            stratification: None,
        }
    }

    /// Agrega categoría y subcategoría de estratificación
    pub fn with_strata(mut self, category: &str, stratification: &str) -> Self {
        self.stratification_category = Some(category.to_string());
        self.stratification = Some(stratification.to_string());
        self
    }
}

/// Tabla inmutable con las filas y los dominios de validación
#[derive(Debug, Clone)]
pub struct Table {
    rows: Vec<Row>,
    questions: BTreeSet<String>,
    states: BTreeSet<String>,
}

impl Table {
    /// Construye la tabla a partir de filas ya decodificadas
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let questions = rows.iter().map(|row| row.question.clone()).collect();
        let states = rows.iter().map(|row| row.state.clone()).collect();

        Self {
            rows,
            questions,
            states,
        }
    }

    /// Lee un CSV con headers desde cualquier `Read`
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let rows = csv_reader
            .deserialize::<Row>()
            .collect::<Result<Vec<_>, _>>()?;

        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }

        Ok(Self::from_rows(rows))
    }

    /// Carga el dataset desde disco
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let table = Self::from_reader(BufReader::new(file))?;

        tracing::info!(
            path = %path.display(),
            rows = table.len(),
            questions = table.questions.len(),
            states = table.states.len(),
            "dataset loaded"
        );

        Ok(table)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_known_question(&self, question: &str) -> bool {
        self.questions.contains(question)
    }

    pub fn is_known_state(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    /// Filas de una pregunta
    pub fn rows_for<'a>(&'a self, question: &'a str) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows.iter().filter(move |row| row.question == question)
    }

    /// Filas de una pregunta en un estado
    pub fn rows_for_state<'a>(
        &'a self,
        question: &'a str,
        state: &'a str,
    ) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows_for(question).filter(move |row| row.state == state)
    }
}
