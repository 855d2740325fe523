//! # Módulo HTTP
//!
//! Implementa el subconjunto de HTTP/1.0 que necesita la API, sin usar
//! librerías de alto nivel:
//!
//! - Parsing de requests (request line, headers, body JSON)
//! - Construcción de responses
//! - Códigos de estado
//!
//! ### Formato de Request
//!
//! ```text
//! POST /api/states_mean HTTP/1.0\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 27\r\n
//! \r\n
//! {"question": "Percent ..."}
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 12\r\n
//! \r\n
//! {"job_id":1}
//! ```

pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

pub use request::{content_length, find_subsequence, Method, ParseError, Request, HEADER_TERMINATOR};
pub use response::Response;
pub use status::StatusCode;
