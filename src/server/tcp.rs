//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Implementación del servidor TCP que maneja múltiples conexiones
//! simultáneas usando threads. Cada conexión se procesa en su propio thread
//! y se cierra tras una única respuesta (HTTP/1.0).

use crate::config::Config;
use crate::http::{content_length, find_subsequence, Request, Response, StatusCode, HEADER_TERMINATOR};
use crate::jobs::JobManager;
use crate::router::Router;
use crate::server::{build_router, AppState};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Tamaño máximo de un request (headers + body)
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

const READ_CHUNK: usize = 4096;
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Resultado de leer un request del socket
#[derive(Debug, PartialEq, Eq)]
pub enum RawRequest {
    /// El cliente cerró sin enviar nada
    Empty,
    Complete(Vec<u8>),
    TooLarge,
}

/// Servidor HTTP/1.0 concurrente
pub struct Server {
    listener: TcpListener,
    router: Arc<Router<AppState>>,
    state: Arc<AppState>,
    next_request_id: Arc<AtomicU64>,
}

impl Server {
    /// Abre el socket y arma el router. No acepta conexiones hasta `run`.
    pub fn bind(config: &Config, jobs: JobManager) -> io::Result<Self> {
        let address = config.address();
        let listener = TcpListener::bind(&address)?;

        let router = build_router();
        let state = AppState::new(jobs, &router);

        tracing::info!(address = %listener.local_addr()?, "server listening");

        Ok(Self {
            listener,
            router: Arc::new(router),
            state: Arc::new(state),
            next_request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Estado compartido (útil para tests y para esperar el drenado)
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Loop de aceptación: un thread por conexión. Bloquea para siempre.
    pub fn run(self) -> io::Result<()> {
        tracing::info!("concurrent mode: one thread per connection");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let router = Arc::clone(&self.router);
                    let state = Arc::clone(&self.state);
                    let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);

                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, &router, &state, request_id) {
                            tracing::warn!(request_id, error = %e, "connection error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to accept connection");
                }
            }
        }

        Ok(())
    }
}

/// Atiende una conexión: lee, enruta, responde
pub fn handle_connection(
    mut stream: TcpStream,
    router: &Router<AppState>,
    state: &AppState,
    request_id: u64,
) -> io::Result<()> {
    let start = Instant::now();
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let raw = match read_request(&mut stream, MAX_REQUEST_BYTES)? {
        RawRequest::Empty => {
            tracing::debug!(request_id, peer = %peer, "connection closed without data");
            return Ok(());
        }
        RawRequest::Complete(raw) => raw,
        RawRequest::TooLarge => {
            tracing::warn!(request_id, peer = %peer, "request too large");
            let response = Response::error(StatusCode::PayloadTooLarge, "Request too large");
            return send(&mut stream, response, request_id);
        }
    };

    let (response, method, path) = match Request::parse(&raw) {
        Ok(request) => {
            let response = router.route(&request, state);
            let method = request.method().as_str().to_string();
            (response, method, request.path().to_string())
        }
        Err(e) => {
            tracing::warn!(request_id, peer = %peer, error = %e, "parse error");
            let response = Response::error(StatusCode::BadRequest, &format!("Invalid request: {}", e));
            (response, "-".to_string(), "-".to_string())
        }
    };

    let status = response.status();
    send(&mut stream, response, request_id)?;

    tracing::info!(
        request_id,
        peer = %peer,
        method = %method,
        path = %path,
        status = status.as_u16(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "request served"
    );

    Ok(())
}

fn send(stream: &mut TcpStream, mut response: Response, request_id: u64) -> io::Result<()> {
    response.add_header("X-Request-Id", &request_id.to_string());
    response.add_header("Connection", "close");
    stream.write_all(&response.to_bytes())?;
    stream.flush()
}

/// Lee un request completo: headers hasta `\r\n\r\n` y luego exactamente
/// `Content-Length` bytes de body.
pub fn read_request<R: Read>(reader: &mut R, limit: usize) -> io::Result<RawRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    let mut expected: Option<usize> = None;

    loop {
        if let Some(total) = expected {
            if buffer.len() >= total {
                buffer.truncate(total);
                return Ok(RawRequest::Complete(buffer));
            }
        }

        let n = reader.read(&mut chunk)?;
        if n == 0 {
            // EOF: se entrega lo recibido; el parser decide si es válido
            return Ok(if buffer.is_empty() {
                RawRequest::Empty
            } else {
                RawRequest::Complete(buffer)
            });
        }
        buffer.extend_from_slice(&chunk[..n]);

        if expected.is_none() {
            if let Some(pos) = find_subsequence(&buffer, HEADER_TERMINATOR) {
                let body_len = content_length(&buffer[..pos]).unwrap_or(0);
                match (pos + HEADER_TERMINATOR.len()).checked_add(body_len) {
                    Some(total) => expected = Some(total),
                    None => return Ok(RawRequest::TooLarge),
                }
            }
        }

        let over_limit = match expected {
            Some(total) => total > limit,
            None => buffer.len() > limit,
        };
        if over_limit {
            return Ok(RawRequest::TooLarge);
        }
    }
}
