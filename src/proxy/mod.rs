//! # Proxy Inverso
//! src/proxy/mod.rs
//!
//! Un request por conexión, igual que el servidor de aplicación:
//!
//! ```text
//! cliente ──► leer mensaje ──► header Host ──► Balancer::select
//!                                   │                 │
//!                              (sin host: 400)   (host desconocido: 404)
//!                                                     │
//!                      backend ◄── connect_timeout ◄──┘ (falla: 502)
//!                         │
//!                         └──► respuesta reenviada tal cual hasta EOF
//! ```
//!
//! El [`BackendGuard`] vive durante todo el intercambio para que
//! least_conn cuente la conexión como abierta.

use crate::http::response::NOT_FOUND_BODY;
use crate::http::{read_message, ReadError, Request, Response, StatusCode};
use crate::router::RouteTable;
use crate::vhost::{BackendGuard, Balancer};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const BAD_GATEWAY_BODY: &[u8] = b"502 Bad Gateway";
const RELAY_CHUNK: usize = 8192;

/// Tiempos y límites del proxy
#[derive(Debug, Clone, Copy)]
pub struct ProxySettings {
    pub backend_timeout: Duration,
    pub read_timeout: Duration,
    pub max_request_bytes: usize,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_millis(5000),
            read_timeout: Duration::from_millis(5000),
            max_request_bytes: 1024 * 1024,
        }
    }
}

/// Proxy inverso con un thread por conexión
pub struct Proxy {
    listener: TcpListener,
    balancer: Arc<Balancer>,
    settings: ProxySettings,
}

impl Proxy {
    pub fn bind(address: &str, balancer: Balancer, settings: ProxySettings) -> io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(address)?,
            balancer: Arc::new(balancer),
            settings,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn run(self) -> io::Result<()> {
        let address = self.local_addr()?;
        tracing::info!(address = %address, hosts = self.balancer.len(), "Proxy escuchando");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let balancer = Arc::clone(&self.balancer);
                    let settings = self.settings;
                    let spawned = thread::Builder::new()
                        .name("proxy-conn".to_string())
                        .spawn(move || {
                            if let Err(e) = handle_client(stream, &balancer, &settings) {
                                tracing::error!(error = %e, "Error en thread del proxy");
                            }
                        });

                    if let Err(e) = spawned {
                        tracing::error!(error = %e, "No se pudo crear el thread del proxy");
                    }
                }
                Err(e) => tracing::error!(error = %e, "Error al aceptar conexión"),
            }
        }

        Ok(())
    }
}

/// Nombre de host sin puerto (`app.local:8080` → `app.local`)
pub fn host_without_port(host: &str) -> &str {
    let host = host.trim();
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

fn reply(stream: &mut TcpStream, status: StatusCode, body: &[u8]) -> io::Result<()> {
    let response = Response::fixed(status, body).with_standard_headers(None);
    stream.write_all(&response.to_bytes())?;
    stream.flush()
}

/// Atiende un cliente del proxy de principio a fin
pub fn handle_client(mut client: TcpStream, balancer: &Balancer, settings: &ProxySettings) -> io::Result<()> {
    let start = Instant::now();
    client.set_read_timeout(Some(settings.read_timeout))?;

    let raw = match read_message(&mut client, settings.max_request_bytes) {
        Ok(raw) => raw,
        Err(ReadError::Closed) => return Ok(()),
        Err(ReadError::Timeout) => {
            return reply(&mut client, StatusCode::RequestTimeout, b"408 Request Timeout")
        }
        Err(ReadError::TooLarge { .. }) => {
            return reply(&mut client, StatusCode::PayloadTooLarge, b"413 Payload Too Large")
        }
        Err(ReadError::Io(e)) => return Err(e),
    };

    let request = match Request::parse(&raw, &RouteTable::new()) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Request mal formado en el proxy");
            return reply(&mut client, StatusCode::BadRequest, b"400 Bad Request");
        }
    };

    let Some(host) = request.header("Host").map(host_without_port) else {
        tracing::warn!(path = request.path(), "Request sin header Host");
        return reply(&mut client, StatusCode::BadRequest, b"400 Bad Request");
    };

    let Some(backend) = balancer.select(host) else {
        tracing::info!(host = %host, "Host desconocido");
        return reply(&mut client, StatusCode::NotFound, NOT_FOUND_BODY);
    };

    let mut upstream = match connect(&backend, settings.backend_timeout) {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!(host = %host, backend = %backend.addr, error = %e, "Backend inalcanzable");
            return reply(&mut client, StatusCode::BadGateway, BAD_GATEWAY_BODY);
        }
    };

    if let Err(e) = upstream.write_all(&raw).and_then(|_| upstream.flush()) {
        tracing::error!(backend = %backend.addr, error = %e, "Error enviando al backend");
        return reply(&mut client, StatusCode::BadGateway, BAD_GATEWAY_BODY);
    }

    let relayed = relay(&mut upstream, &mut client)?;
    if relayed == 0 {
        tracing::warn!(backend = %backend.addr, "Backend cerró sin responder");
        return reply(&mut client, StatusCode::BadGateway, BAD_GATEWAY_BODY);
    }

    tracing::info!(
        host = %host,
        backend = %backend.addr,
        method = %request.method(),
        path = request.path(),
        bytes = relayed,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Request reenviado"
    );

    Ok(())
}

fn connect(backend: &BackendGuard, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = io::Error::new(io::ErrorKind::NotFound, "backend address did not resolve");

    for addr in backend.addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                return Ok(stream);
            }
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

/// Copia la respuesta del backend al cliente hasta EOF o timeout.
/// Retorna cuántos bytes se reenviaron.
fn relay(upstream: &mut TcpStream, client: &mut TcpStream) -> io::Result<usize> {
    let mut buf = [0u8; RELAY_CHUNK];
    let mut total = 0;

    loop {
        let n = match upstream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                tracing::warn!(bytes = total, "Timeout leyendo del backend");
                break;
            }
            Err(e) if total == 0 => {
                tracing::warn!(error = %e, "Error leyendo del backend");
                break;
            }
            Err(e) => return Err(e),
        };
        client.write_all(&buf[..n])?;
        total += n;
    }

    client.flush()?;
    Ok(total)
}
