//! # Validación de Payloads
//! src/stats/query.rs

use crate::dataset::Table;
use crate::stats::aggregations::Aggregation;
use serde_json::Value;
use thiserror::Error;

/// Motivo por el que un payload fue rechazado.
///
/// El cliente sólo ve `"Invalid input"`; el detalle queda en el log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Request body is not a JSON object")]
    NotAnObject,

    #[error("Missing or non-string field '{0}'")]
    MissingField(&'static str),

    #[error("Unknown question: {0}")]
    UnknownQuestion(String),

    #[error("Unknown state: {0}")]
    UnknownState(String),
}

impl ValidationError {
    /// Mensaje que se guarda como resultado del job
    pub const PUBLIC_MESSAGE: &'static str = "Invalid input";
}

/// Consulta validada contra la tabla
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub question: String,
    pub state: Option<String>,
}

impl Query {
    /// Valida el cuerpo de un request para una agregación.
    ///
    /// `question` siempre es obligatoria; `state` sólo para las agregaciones
    /// por estado. Ambos deben existir en el dataset. Campos extra se ignoran.
    pub fn validate(
        aggregation: Aggregation,
        body: Option<&Value>,
        table: &Table,
    ) -> Result<Self, ValidationError> {
        let object = body
            .and_then(Value::as_object)
            .ok_or(ValidationError::NotAnObject)?;

        let question = object
            .get("question")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingField("question"))?;

        if !table.is_known_question(question) {
            return Err(ValidationError::UnknownQuestion(question.to_string()));
        }

        let state = if aggregation.requires_state() {
            let state = object
                .get("state")
                .and_then(Value::as_str)
                .ok_or(ValidationError::MissingField("state"))?;

            if !table.is_known_state(state) {
                return Err(ValidationError::UnknownState(state.to_string()));
            }
            Some(state.to_string())
        } else {
            None
        };

        Ok(Self {
            question: question.to_string(),
            state,
        })
    }
}
