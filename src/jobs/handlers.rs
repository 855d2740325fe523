//! # Handlers HTTP para Jobs
//! src/jobs/handlers.rs
//!
//! Implementa los endpoints `/api/*`:
//! - `POST /api/<aggregation>` → `{"job_id": n}`
//! - `GET /api/get_results/{job_id}`
//! - `GET /api/jobs`
//! - `GET /api/num_jobs`
//! - `GET /api/graceful_shutdown`

use crate::http::{Request, Response, StatusCode};
use crate::jobs::manager::JobOutcome;
use crate::jobs::types::{JobError, JobId};
use crate::router::RouteParams;
use crate::server::AppState;
use crate::stats::Aggregation;
use serde_json::{json, Map, Value};

/// Handler compartido por todos los endpoints de agregación.
///
/// La agregación se deduce del path. Siempre responde `{"job_id": n}`
/// mientras el pool acepte trabajo, incluso con payload inválido.
///
/// # Ejemplo de response
/// ```json
/// {"job_id": 1}
/// ```
pub fn submit_handler(req: &Request, _params: &RouteParams, state: &AppState) -> Response {
    let Some(aggregation) = Aggregation::from_path(req.path()) else {
        return Response::error(StatusCode::NotFound, &format!("Route not found: {}", req.path()));
    };

    tracing::info!(endpoint = %aggregation, "submission received");

    let body = req.json_body();
    match state.jobs.submit(aggregation, body.as_ref()) {
        Ok(job_id) => Response::json(StatusCode::Ok, &json!({ "job_id": job_id })),
        Err(JobError::Rejected) => {
            tracing::warn!(endpoint = %aggregation, "submission rejected: shutting down");
            Response::error(StatusCode::ServiceUnavailable, "Server is shutting down")
        }
        Err(e) => {
            tracing::error!(endpoint = %aggregation, error = %e, "submission failed");
            Response::error(StatusCode::InternalServerError, &e.to_string())
        }
    }
}

/// Handler para `/api/get_results/{job_id}`
///
/// | estado | código | body |
/// |---|---|---|
/// | running | 200 | `{"status": "running"}` |
/// | done | 200 | `{"status": "done", "data": ...}` |
/// | error | 400 | `{"status": "error", "data": {"error_message": ...}}` |
/// | id inválido | 500 | `{"status": "error", "reason": "Invalid job_id"}` |
pub fn get_results_handler(_req: &Request, params: &RouteParams, state: &AppState) -> Response {
    let raw = params.get("job_id").unwrap_or_default();
    tracing::info!(job_id = %raw, "get_results");

    let outcome = JobId::parse(raw)
        .ok_or(JobError::NotFound(JobId::new(0)))
        .and_then(|job_id| state.jobs.poll(job_id));

    match outcome {
        Ok(JobOutcome::Running) => Response::json(StatusCode::Ok, &json!({ "status": "running" })),
        Ok(JobOutcome::Done(data)) => {
            Response::json(StatusCode::Ok, &json!({ "status": "done", "data": data }))
        }
        Ok(JobOutcome::Error(data)) => {
            Response::json(StatusCode::BadRequest, &json!({ "status": "error", "data": data }))
        }
        Err(_) => {
            tracing::warn!(job_id = %raw, "invalid job_id");
            Response::json(
                StatusCode::InternalServerError,
                &json!({ "status": "error", "reason": "Invalid job_id" }),
            )
        }
    }
}

/// Handler para `/api/jobs`: `[{"job_id_1": "done"}, ...]`
pub fn jobs_handler(_req: &Request, _params: &RouteParams, state: &AppState) -> Response {
    let data: Vec<Value> = state
        .jobs
        .list()
        .into_iter()
        .map(|(job_id, status)| {
            let mut entry = Map::new();
            entry.insert(job_id.key(), Value::from(status.as_str()));
            Value::Object(entry)
        })
        .collect();

    tracing::info!(jobs = data.len(), "jobs listed");
    Response::json(StatusCode::Ok, &json!({ "status": "done", "data": data }))
}

/// Handler para `/api/num_jobs`: jobs aún en `running`
pub fn num_jobs_handler(_req: &Request, _params: &RouteParams, state: &AppState) -> Response {
    let running = state.jobs.num_running();
    tracing::info!(running, "num_jobs");
    Response::json(StatusCode::Ok, &json!({ "status": "done", "data": running }))
}

/// Handler para `/api/graceful_shutdown`.
///
/// No espera a los jobs en curso; su avance se observa con `/api/num_jobs`.
pub fn graceful_shutdown_handler(_req: &Request, _params: &RouteParams, state: &AppState) -> Response {
    if state.jobs.shutdown() {
        tracing::info!(running = state.jobs.num_running(), "graceful shutdown requested");
    }
    Response::json(StatusCode::Ok, &json!({ "status": "done" }))
}

/// Handler para `/` y `/index`: lista de endpoints
pub fn index_handler(_req: &Request, _params: &RouteParams, state: &AppState) -> Response {
    let mut page = String::from("Welcome to the stats server!\n\nInteresting routes:\n");
    for line in &state.endpoints {
        page.push_str(line);
        page.push('\n');
    }
    Response::text(StatusCode::Ok, &page)
}
