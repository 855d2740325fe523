//! # Agregaciones sobre la Tabla
//! src/stats/aggregations.rs
//!
//! Todas las funciones son deterministas y sin efectos secundarios: filtran
//! por pregunta (y estado si aplica) y promedian `Data_Value` ignorando los
//! valores ausentes.

use crate::dataset::{Row, Table};
use crate::stats::query::Query;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Preguntas donde un valor menor es mejor.
/// Para el resto, "best" es el valor mayor.
pub const QUESTIONS_BEST_IS_MIN: &[&str] = &[
    "Percent of adults aged 18 years and older who have an overweight classification",
    "Percent of adults aged 18 years and older who have obesity",
    "Percent of adults who engage in no leisure-time physical activity",
    "Percent of adults who report consuming fruit less than one time daily",
    "Percent of adults who report consuming vegetables less than one time daily",
];

const TOP_N: usize = 5;

/// Fallos de cómputo. El worker los convierte en `{"error_message": ...}`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("No data for question '{question}' in {scope}")]
    EmptySelection { question: String, scope: String },

    #[error("Aggregation '{0}' requires a state")]
    MissingState(&'static str),
}

impl StatsError {
    fn empty(question: &str, state: Option<&str>) -> Self {
        let scope = match state {
            Some(state) => format!("state '{}'", state),
            None => "any state".to_string(),
        };
        StatsError::EmptySelection {
            question: question.to_string(),
            scope,
        }
    }
}

/// Clave compuesta por los campos de estratificación, en orden.
///
/// Se serializa como `"(Ohio, Age (years), 18 - 24)"`. Los campos no se
/// escapan: si un valor contiene `", "` la clave renderizada no permite
/// recuperar los campos originales.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StrataKey(Vec<String>);

impl StrataKey {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for StrataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Acumulador de media aritmética
#[derive(Debug, Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

fn mean_of<'a>(rows: impl Iterator<Item = &'a Row>) -> Option<f64> {
    let mut mean = Mean::default();
    for row in rows {
        mean.push(row.value);
    }
    mean.value()
}

/// Agrupa por clave y promedia; el orden de salida es el de la clave
fn grouped_means<'a, K, F>(rows: impl Iterator<Item = &'a Row>, key: F) -> Vec<(K, f64)>
where
    K: Ord,
    F: Fn(&'a Row) -> Option<K>,
{
    let mut groups: BTreeMap<K, Mean> = BTreeMap::new();
    for row in rows {
        if let Some(k) = key(row) {
            groups.entry(k).or_default().push(row.value);
        }
    }

    groups
        .into_iter()
        .filter_map(|(k, mean)| mean.value().map(|v| (k, v)))
        .collect()
}

fn is_best_min(question: &str) -> bool {
    QUESTIONS_BEST_IS_MIN.contains(&question)
}

// ==================== Agregaciones ====================

/// Media por estado, ordenada ascendentemente por valor
/// (empates por nombre de estado).
pub fn states_mean(table: &Table, question: &str) -> Vec<(String, f64)> {
    let mut means = grouped_means(table.rows_for(question), |row| Some(row.state.clone()));
    // sort estable: los empates conservan el orden alfabético del BTreeMap
    means.sort_by(|a, b| a.1.total_cmp(&b.1));
    means
}

pub fn state_mean(table: &Table, question: &str, state: &str) -> Result<f64, StatsError> {
    mean_of(table.rows_for_state(question, state))
        .ok_or_else(|| StatsError::empty(question, Some(state)))
}

pub fn best5(table: &Table, question: &str) -> Vec<(String, f64)> {
    let means = states_mean(table, question);
    if is_best_min(question) {
        head(means)
    } else {
        tail(means)
    }
}

pub fn worst5(table: &Table, question: &str) -> Vec<(String, f64)> {
    let means = states_mean(table, question);
    if is_best_min(question) {
        tail(means)
    } else {
        head(means)
    }
}

fn head(mut means: Vec<(String, f64)>) -> Vec<(String, f64)> {
    means.truncate(TOP_N);
    means
}

fn tail(mut means: Vec<(String, f64)>) -> Vec<(String, f64)> {
    let start = means.len().saturating_sub(TOP_N);
    means.split_off(start)
}

pub fn global_mean(table: &Table, question: &str) -> Result<f64, StatsError> {
    mean_of(table.rows_for(question)).ok_or_else(|| StatsError::empty(question, None))
}

/// `media_global - media_estado` para cada estado, en el orden de `states_mean`
pub fn diff_from_mean(table: &Table, question: &str) -> Result<Vec<(String, f64)>, StatsError> {
    let global = global_mean(table, question)?;
    Ok(states_mean(table, question)
        .into_iter()
        .map(|(state, mean)| (state, global - mean))
        .collect())
}

pub fn state_diff_from_mean(table: &Table, question: &str, state: &str) -> Result<f64, StatsError> {
    let global = global_mean(table, question)?;
    Ok(global - state_mean(table, question, state)?)
}

/// Media por (estado, categoría, estratificación)
pub fn mean_by_category(table: &Table, question: &str) -> Vec<(StrataKey, f64)> {
    grouped_means(table.rows_for(question), |row| {
        let category = row.stratification_category.as_ref()?;
        let stratification = row.stratification.as_ref()?;
        Some(StrataKey::new([&row.state, category, stratification]))
    })
}

/// Media por (categoría, estratificación) dentro de un estado
pub fn state_mean_by_category(table: &Table, question: &str, state: &str) -> Vec<(StrataKey, f64)> {
    grouped_means(table.rows_for_state(question, state), |row| {
        let category = row.stratification_category.as_ref()?;
        let stratification = row.stratification.as_ref()?;
        Some(StrataKey::new([category, stratification]))
    })
}

// ==================== Serialización ====================

/// Objeto JSON que respeta el orden de entrada
fn to_object<K: ToString>(pairs: Vec<(K, f64)>) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::from(v)))
        .collect();
    Value::Object(map)
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Agregaciones expuestas por la API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    StatesMean,
    StateMean,
    Best5,
    Worst5,
    GlobalMean,
    DiffFromMean,
    StateDiffFromMean,
    MeanByCategory,
    StateMeanByCategory,
}

impl Aggregation {
    pub const ALL: [Aggregation; 9] = [
        Aggregation::StatesMean,
        Aggregation::StateMean,
        Aggregation::Best5,
        Aggregation::Worst5,
        Aggregation::GlobalMean,
        Aggregation::DiffFromMean,
        Aggregation::StateDiffFromMean,
        Aggregation::MeanByCategory,
        Aggregation::StateMeanByCategory,
    ];

    /// Nombre del endpoint (`/api/<name>`)
    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::StatesMean => "states_mean",
            Aggregation::StateMean => "state_mean",
            Aggregation::Best5 => "best5",
            Aggregation::Worst5 => "worst5",
            Aggregation::GlobalMean => "global_mean",
            Aggregation::DiffFromMean => "diff_from_mean",
            Aggregation::StateDiffFromMean => "state_diff_from_mean",
            Aggregation::MeanByCategory => "mean_by_category",
            Aggregation::StateMeanByCategory => "state_mean_by_category",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|agg| agg.name() == name)
    }

    /// Path HTTP de la agregación
    pub fn path(&self) -> String {
        format!("/api/{}", self.name())
    }

    /// Resuelve la agregación desde el path del request
    pub fn from_path(path: &str) -> Option<Self> {
        path.strip_prefix("/api/").and_then(Self::from_name)
    }

    /// Si el payload debe incluir `state` además de `question`
    pub fn requires_state(&self) -> bool {
        matches!(
            self,
            Aggregation::StateMean
                | Aggregation::StateDiffFromMean
                | Aggregation::StateMeanByCategory
        )
    }

    /// Ejecuta la agregación sobre la tabla
    pub fn evaluate(&self, table: &Table, query: &Query) -> Result<Value, StatsError> {
        let question = query.question.as_str();

        let value = match self {
            Aggregation::StatesMean => to_object(states_mean(table, question)),
            Aggregation::Best5 => to_object(best5(table, question)),
            Aggregation::Worst5 => to_object(worst5(table, question)),
            Aggregation::GlobalMean => {
                single("global_mean", Value::from(global_mean(table, question)?))
            }
            Aggregation::DiffFromMean => to_object(diff_from_mean(table, question)?),
            Aggregation::MeanByCategory => to_object(mean_by_category(table, question)),
            Aggregation::StateMean => {
                let state = self.state_of(query)?;
                single(state, Value::from(state_mean(table, question, state)?))
            }
            Aggregation::StateDiffFromMean => {
                let state = self.state_of(query)?;
                single(state, Value::from(state_diff_from_mean(table, question, state)?))
            }
            Aggregation::StateMeanByCategory => {
                let state = self.state_of(query)?;
                single(state, to_object(state_mean_by_category(table, question, state)))
            }
        };

        Ok(value)
    }

    fn state_of<'q>(&self, query: &'q Query) -> Result<&'q str, StatsError> {
        query
            .state
            .as_deref()
            .ok_or(StatsError::MissingState(self.name()))
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table1() -> Table {
        Table::from_rows(vec![
            Row::new("State1", "Question1", 10.0),
            Row::new("State1", "Question1", 245.0),
            Row::new("State1", "Question2", 12.0),
            Row::new("State2", "Question1", 15.0),
            Row::new("State2", "Question1", 22.0),
            Row::new("State2", "Question2", 8.0),
        ])
    }

    fn table2() -> Table {
        let data = [
            ("State1", 10.0, 245.0, 12.0),
            ("State2", 15.0, 22.0, 8.0),
            ("State3", 43.0, 542.0, 532.0),
            ("State4", 643.0, 22.0, 543.0),
            ("State5", 43.0, 332.0, 23.0),
            ("State6", 21.0, 277.0, 1.0),
        ];
        let mut rows = Vec::new();
        for (state, a, b, c) in data {
            rows.push(Row::new(state, "Question1", a));
            rows.push(Row::new(state, "Question1", b));
            rows.push(Row::new(state, "Question2", c));
        }
        Table::from_rows(rows)
    }

    fn table3() -> Table {
        Table::from_rows(vec![
            Row::new("State1", "Question1", 10.0).with_strata("Category1", "SubCategory1"),
            Row::new("State1", "Question1", 245.0).with_strata("Category1", "SubCategory1"),
            Row::new("State1", "Question1", 10.0).with_strata("Category1", "SubCategory2"),
            Row::new("State1", "Question1", 12.0).with_strata("Category2", "SubCategory3"),
            Row::new("State1", "Question2", 103.0).with_strata("Category1", "SubCategory1"),
            Row::new("State2", "Question1", 43.0).with_strata("Category1", "SubCategory1"),
            Row::new("State2", "Question1", 455.0).with_strata("Category1", "SubCategory1"),
            Row::new("State2", "Question1", 3.0).with_strata("Category1", "SubCategory2"),
        ])
    }

    fn query(question: &str, state: Option<&str>) -> Query {
        Query {
            question: question.to_string(),
            state: state.map(str::to_string),
        }
    }

    fn keys(value: &Value) -> Vec<String> {
        value.as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn test_states_mean_sorted_ascending() {
        let result = Aggregation::StatesMean
            .evaluate(&table1(), &query("Question1", None))
            .unwrap();

        assert_eq!(result, json!({"State1": 127.5, "State2": 18.5}));
        assert_eq!(keys(&result), vec!["State2", "State1"]);
    }

    #[test]
    fn test_state_mean() {
        let result = Aggregation::StateMean
            .evaluate(&table1(), &query("Question1", Some("State1")))
            .unwrap();
        assert_eq!(result, json!({"State1": 127.5}));
    }

    #[test]
    fn test_state_mean_without_rows_is_a_fault() {
        let table = Table::from_rows(vec![
            Row::new("State1", "Question1", 1.0),
            Row::new("State2", "Question2", 2.0),
        ]);
        let result = Aggregation::StateMean.evaluate(&table, &query("Question1", Some("State2")));
        assert!(matches!(result, Err(StatsError::EmptySelection { .. })));
    }

    #[test]
    fn test_best5_highest_by_default() {
        let result = Aggregation::Best5
            .evaluate(&table2(), &query("Question1", None))
            .unwrap();

        assert_eq!(
            result,
            json!({
                "State1": 127.5,
                "State3": 292.5,
                "State4": 332.5,
                "State5": 187.5,
                "State6": 149.0,
            })
        );
        assert_eq!(keys(&result), vec!["State1", "State6", "State5", "State3", "State4"]);
    }

    #[test]
    fn test_worst5_lowest_by_default() {
        let result = Aggregation::Worst5
            .evaluate(&table2(), &query("Question1", None))
            .unwrap();

        assert_eq!(
            result,
            json!({
                "State1": 127.5,
                "State3": 292.5,
                "State2": 18.5,
                "State5": 187.5,
                "State6": 149.0,
            })
        );
    }

    #[test]
    fn test_best5_lower_is_better_question() {
        let question = QUESTIONS_BEST_IS_MIN[1];
        let rows = (1..=7)
            .map(|i| Row::new(&format!("S{}", i), question, i as f64))
            .collect();
        let table = Table::from_rows(rows);

        let best: Vec<String> = best5(&table, question).into_iter().map(|(s, _)| s).collect();
        let worst: Vec<String> = worst5(&table, question).into_iter().map(|(s, _)| s).collect();

        assert_eq!(best, vec!["S1", "S2", "S3", "S4", "S5"]);
        assert_eq!(worst, vec!["S3", "S4", "S5", "S6", "S7"]);
    }

    #[test]
    fn test_best5_fewer_than_five_states() {
        let result = best5(&table1(), "Question1");
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_global_mean() {
        let result = Aggregation::GlobalMean
            .evaluate(&table1(), &query("Question1", None))
            .unwrap();
        assert_eq!(result, json!({"global_mean": 73.0}));
    }

    #[test]
    fn test_diff_from_mean() {
        let result = Aggregation::DiffFromMean
            .evaluate(&table1(), &query("Question1", None))
            .unwrap();
        assert_eq!(result, json!({"State1": -54.5, "State2": 54.5}));
    }

    #[test]
    fn test_state_diff_from_mean() {
        let result = Aggregation::StateDiffFromMean
            .evaluate(&table1(), &query("Question1", Some("State1")))
            .unwrap();
        assert_eq!(result, json!({"State1": -54.5}));
    }

    #[test]
    fn test_mean_by_category() {
        let result = Aggregation::MeanByCategory
            .evaluate(&table3(), &query("Question1", None))
            .unwrap();

        assert_eq!(
            result,
            json!({
                "(State1, Category1, SubCategory1)": 127.5,
                "(State1, Category1, SubCategory2)": 10.0,
                "(State1, Category2, SubCategory3)": 12.0,
                "(State2, Category1, SubCategory1)": 249.0,
                "(State2, Category1, SubCategory2)": 3.0,
            })
        );
    }

    #[test]
    fn test_state_mean_by_category() {
        let result = Aggregation::StateMeanByCategory
            .evaluate(&table3(), &query("Question1", Some("State1")))
            .unwrap();

        assert_eq!(
            result,
            json!({
                "State1": {
                    "(Category1, SubCategory1)": 127.5,
                    "(Category1, SubCategory2)": 10.0,
                    "(Category2, SubCategory3)": 12.0,
                }
            })
        );
    }

    #[test]
    fn test_missing_values_are_skipped() {
        let mut missing = Row::new("State1", "Question1", 0.0);
        missing.value = None;
        let table = Table::from_rows(vec![missing, Row::new("State1", "Question1", 4.0)]);

        assert_eq!(global_mean(&table, "Question1"), Ok(4.0));
    }

    #[test]
    fn test_rows_without_strata_are_skipped() {
        let table = Table::from_rows(vec![
            Row::new("State1", "Question1", 1.0),
            Row::new("State1", "Question1", 3.0).with_strata("Sex", "Male"),
        ]);
        let result = mean_by_category(&table, "Question1");
        assert_eq!(result, vec![(StrataKey::new(["State1", "Sex", "Male"]), 3.0)]);
    }

    #[test]
    fn test_state_required() {
        let result = Aggregation::StateMean.evaluate(&table1(), &query("Question1", None));
        assert_eq!(result, Err(StatsError::MissingState("state_mean")));
    }

    #[test]
    fn test_aggregation_names_round_trip() {
        for agg in Aggregation::ALL {
            assert_eq!(Aggregation::from_path(&agg.path()), Some(agg));
        }
        assert_eq!(Aggregation::from_path("/api/unknown"), None);
        assert!(Aggregation::StateMeanByCategory.requires_state());
        assert!(!Aggregation::Best5.requires_state());
    }

    #[test]
    fn test_strata_key_display() {
        let key = StrataKey::new(["Ohio", "Age (years)", "18 - 24"]);
        assert_eq!(key.to_string(), "(Ohio, Age (years), 18 - 24)");
    }

    #[test]
    fn test_strata_key_fields_are_not_escaped() {
        let joined = StrataKey::new(["Ohio", "Income", "$15,000 - $24,999, or less"]);
        let split = StrataKey::new(["Ohio", "Income", "$15,000 - $24,999", "or less"]);

        assert_ne!(joined, split);
        assert_eq!(joined.to_string(), split.to_string());
    }
}
