//! # Códigos de Estado HTTP
//!
//! Códigos que usa la API:
//!
//! - **2xx**: 200 OK
//! - **4xx**: 400 (job terminado en error), 404, 405
//! - **5xx**: 500 (job_id inválido), 503 (pool cerrado)

/// Códigos de estado HTTP que soporta el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 400 Bad Request - Request malformado o job terminado en error
    BadRequest = 400,

    /// 404 Not Found - Ruta no encontrada
    NotFound = 404,

    /// 405 Method Not Allowed - Ruta existente, método equivocado
    MethodNotAllowed = 405,

    /// 413 Payload Too Large - Request por encima del límite de lectura
    PayloadTooLarge = 413,

    /// 500 Internal Server Error - job_id inválido o resultado ausente
    InternalServerError = 500,

    /// 503 Service Unavailable - El pool ya no acepta trabajo
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// # Ejemplo
    /// ```
    /// use stats_server::http::StatusCode;
    /// assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Texto de razón (reason phrase) asociado al código
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
