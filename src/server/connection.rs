//! # Manejador de Conexión
//! src/server/connection.rs
//!
//! Una conexión = un request = una respuesta. Cada conexión recorre:
//!
//! ```text
//! Reading ──► Parsing ──► Dispatching ──┬─► Preflight (OPTIONS)
//!                                       ├─► Hook      (ruta registrada)
//!                                       ├─► Login     (POST /login)
//!                                       └─► Static    (gate + disco)
//!                                                 │
//!                                  Responding ◄───┘ ──► Closed
//! ```
//!
//! Estados terminales anticipados:
//! - el peer cierra sin enviar nada → se cierra sin responder
//! - timeout de lectura → 408
//! - mensaje más grande que el límite → 413
//! - request mal formado → 400
//! - hook que falla o hace panic → se cierra sin enviar bytes

use crate::http::response::{SERVER_ERROR_BODY, UNAUTHORIZED_BODY};
use crate::http::{read_message, Method, ReadError, Request, Response, StatusCode};
use crate::router::{Hook, RouteTable};
use crate::server::static_files::StaticFiles;
use crate::session::gate::{self, GateDecision, LANDING_PAGE, LOGIN_PATH};
use crate::session::{self, Accounts, LoginOutcome, SessionStore};
use std::io::{self, Write};
use std::net::TcpStream;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Estado compartido por todos los threads de conexión
#[derive(Debug)]
pub struct AppContext {
    pub routes: RouteTable,
    pub sessions: SessionStore,
    pub accounts: Accounts,
    pub static_files: StaticFiles,
    pub limits: Limits,
}

/// Límites de lectura por conexión
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub read_timeout: Duration,
    pub max_request_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(5000),
            max_request_bytes: 1024 * 1024,
        }
    }
}

/// Rama elegida para un request ya parseado
#[derive(Debug, Clone)]
pub enum Dispatch {
    Preflight,
    Hook(Hook),
    Login,
    Static,
}

/// Resultado del despacho
#[derive(Debug)]
pub enum Outcome {
    Respond(Response),

    /// Cerrar sin escribir nada en el socket
    Close,
}

/// Decide la rama de un request
///
/// `OPTIONS` siempre es preflight, aunque haya un hook registrado para
/// esa ruta. El login solo se reconoce sin hook propio.
pub fn dispatch(request: &Request) -> Dispatch {
    if request.method() == Method::OPTIONS {
        return Dispatch::Preflight;
    }

    if let Some(hook) = request.hook() {
        return Dispatch::Hook(hook.clone());
    }

    if request.method() == Method::POST && request.path() == LOGIN_PATH {
        return Dispatch::Login;
    }

    Dispatch::Static
}

/// Procesa un request parseado y produce la respuesta completa
/// (incluyendo headers estándar) o la orden de cerrar.
pub fn handle_request(request: &Request, ctx: &AppContext) -> Outcome {
    let response = match dispatch(request) {
        Dispatch::Preflight => Response::preflight(),
        Dispatch::Hook(hook) => match run_hook(&hook, request) {
            Some(response) => response,
            None => return Outcome::Close,
        },
        Dispatch::Login => handle_login(request, ctx),
        Dispatch::Static => {
            let decision = gate::check(request.path(), request.header("Cookie"), &ctx.sessions);
            serve_gated(&decision, ctx)
        }
    };

    Outcome::Respond(response.with_standard_headers(Some(request.headers())))
}

/// Ejecuta un hook. `None` si retornó error, hizo panic o su resultado
/// no se pudo serializar.
fn run_hook(hook: &Hook, request: &Request) -> Option<Response> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        hook.call(request.headers(), request.body())
    }));

    let map = match result {
        Ok(Ok(map)) => map,
        Ok(Err(e)) => {
            tracing::error!(method = %request.method(), path = request.path(), error = %e, "Hook falló");
            return None;
        }
        Err(_) => {
            tracing::error!(method = %request.method(), path = request.path(), "Hook hizo panic");
            return None;
        }
    };

    match Response::from_hook_result(&map) {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::error!(path = request.path(), error = %e, "Resultado de hook no serializable");
            None
        }
    }
}

fn handle_login(request: &Request, ctx: &AppContext) -> Response {
    let outcome = session::login(request.body(), &ctx.accounts, &ctx.sessions);

    match &outcome {
        LoginOutcome::Authenticated { username, .. } => {
            tracing::info!(user = %username, "Login exitoso");
            let mut response = serve_static(LANDING_PAGE, StatusCode::Ok, ctx);
            if let Some(cookie) = outcome.set_cookie() {
                response.add_header("Set-Cookie", &cookie);
            }
            response
        }
        LoginOutcome::Rejected => {
            tracing::info!("Login rechazado");
            Response::fixed(StatusCode::Unauthorized, UNAUTHORIZED_BODY)
        }
    }
}

fn serve_gated(decision: &GateDecision, ctx: &AppContext) -> Response {
    let mut response = serve_static(decision.served_path(), decision.status(), ctx);
    if let GateDecision::Redirect { location } = decision {
        response.add_header("Location", location);
    }
    response
}

/// Un tipo MIME no soportado termina en un 500 bien formado
fn serve_static(path: &str, status: StatusCode, ctx: &AppContext) -> Response {
    match ctx.static_files.serve(path, status) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(path = %path, error = %e, "No se puede servir el objeto");
            Response::fixed(StatusCode::InternalServerError, SERVER_ERROR_BODY)
        }
    }
}

/// Respuesta mínima para los estados de error previos al despacho
fn status_page(status: StatusCode) -> Response {
    Response::fixed(status, status.to_string().as_bytes()).with_standard_headers(None)
}

/// Atiende una conexión completa y la cierra
pub fn handle_connection(mut stream: TcpStream, ctx: &AppContext) -> io::Result<()> {
    let start = Instant::now();
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    stream.set_read_timeout(Some(ctx.limits.read_timeout))?;

    let raw = match read_message(&mut stream, ctx.limits.max_request_bytes) {
        Ok(raw) => raw,
        Err(ReadError::Closed) => {
            tracing::debug!(peer = %peer, "Conexión cerrada sin datos");
            return Ok(());
        }
        Err(ReadError::Timeout) => {
            tracing::warn!(peer = %peer, "Timeout leyendo request");
            return write_response(&mut stream, &status_page(StatusCode::RequestTimeout));
        }
        Err(e @ ReadError::TooLarge { .. }) => {
            tracing::warn!(peer = %peer, error = %e, "Request rechazado");
            return write_response(&mut stream, &status_page(StatusCode::PayloadTooLarge));
        }
        Err(ReadError::Io(e)) => return Err(e),
    };

    let request = match Request::parse(&raw, &ctx.routes) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(peer = %peer, error = %e, "Request mal formado");
            return write_response(&mut stream, &status_page(StatusCode::BadRequest));
        }
    };

    match handle_request(&request, ctx) {
        Outcome::Respond(response) => {
            write_response(&mut stream, &response)?;
            tracing::info!(
                peer = %peer,
                method = %request.method(),
                path = request.path(),
                status = response.status().as_u16(),
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Request atendido"
            );
        }
        Outcome::Close => {
            tracing::warn!(peer = %peer, path = request.path(), "Conexión cerrada sin respuesta");
        }
    }

    Ok(())
}

fn write_response(stream: &mut TcpStream, response: &Response) -> io::Result<()> {
    stream.write_all(&response.to_bytes())?;
    stream.flush()
}
