//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea (método, path) a handlers.
//!
//! ```text
//! Request → Router → Handler(&Request, &RouteParams, &S) → Response
//! ```
//!
//! Los patrones admiten segmentos `{nombre}` que se capturan en
//! [`RouteParams`]. Si ningún patrón coincide se retorna 404; si coincide el
//! path pero no el método, 405.

use crate::http::{Method, Request, Response, StatusCode};
use std::collections::HashMap;

/// Un handler recibe el request, los parámetros de path y el estado compartido
pub type Handler<S> = fn(&Request, &RouteParams, &S) -> Response;

/// Parámetros capturados desde el path (`/api/get_results/{job_id}`)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RouteParams {
    values: HashMap<String, String>,
}

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|s| s.as_str())
    }
}

struct Route<S> {
    method: Method,
    pattern: String,
    handler: Handler<S>,
}

/// Router que mapea paths a handlers
pub struct Router<S> {
    routes: Vec<Route<S>>,
}

impl<S> Router<S> {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta con su handler
    ///
    /// # Ejemplo
    /// ```
    /// use stats_server::router::{Router, RouteParams};
    /// use stats_server::http::{Method, Request, Response, StatusCode};
    ///
    /// fn hello(_req: &Request, _params: &RouteParams, _state: &()) -> Response {
    ///     Response::text(StatusCode::Ok, "hello")
    /// }
    ///
    /// let mut router = Router::new();
    /// router.register(Method::GET, "/hello", hello);
    /// ```
    pub fn register(&mut self, method: Method, pattern: &str, handler: Handler<S>) {
        self.routes.push(Route {
            method,
            pattern: pattern.to_string(),
            handler,
        });
    }

    /// Encuentra y ejecuta el handler apropiado para un request
    pub fn route(&self, request: &Request, state: &S) -> Response {
        let path = request.path();
        let mut path_matched = false;

        for route in &self.routes {
            let Some(params) = match_pattern(&route.pattern, path) else {
                continue;
            };

            if &route.method != request.method() {
                path_matched = true;
                continue;
            }

            let mut response = (route.handler)(request, &params, state);
            Self::add_common_headers(&mut response);
            return response;
        }

        let mut response = if path_matched {
            tracing::warn!(
                method = request.method().as_str(),
                path = %path,
                "method not allowed"
            );
            Response::error(StatusCode::MethodNotAllowed, "Method not allowed")
        } else {
            Response::error(StatusCode::NotFound, &format!("Route not found: {}", path))
        };
        Self::add_common_headers(&mut response);
        response
    }

    /// Descripción legible de las rutas registradas (página de índice)
    pub fn describe(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|route| {
                format!(
                    "Endpoint: \"{}\" Methods: \"{}\"",
                    route.pattern,
                    route.method.as_str()
                )
            })
            .collect()
    }

    fn add_common_headers(response: &mut Response) {
        response.add_header("Server", "StatsServer/1.0");
        response.add_header("Connection", "close");
    }
}

impl<S> Default for Router<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compara un patrón con un path segmento a segmento
fn match_pattern(pattern: &str, path: &str) -> Option<RouteParams> {
    let pattern_segments: Vec<&str> = pattern.trim_end_matches('/').split('/').collect();
    let path_segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();

    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = RouteParams::default();
    for (expected, actual) in pattern_segments.iter().zip(&path_segments) {
        match expected.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) if !actual.is_empty() => {
                params.values.insert(name.to_string(), actual.to_string());
            }
            Some(_) => return None,
            None if expected == actual => {}
            None => return None,
        }
    }

    Some(params)
}
