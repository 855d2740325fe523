//! # Biblioteca de Agregaciones
//! src/stats/mod.rs
//!
//! Funciones puras `f(tabla, consulta) -> resultado JSON` que ejecutan los
//! workers, más la validación de los payloads de entrada.
//!
//! ## Agregaciones
//!
//! - **states_mean / state_mean**: media por estado
//! - **best5 / worst5**: los 5 mejores / peores estados
//! - **global_mean / diff_from_mean / state_diff_from_mean**: comparación con la media global
//! - **mean_by_category / state_mean_by_category**: media por estratificación

pub mod aggregations;
pub mod query;

pub use aggregations::{Aggregation, StatsError, StrataKey, QUESTIONS_BEST_IS_MIN};
pub use query::{Query, ValidationError};
