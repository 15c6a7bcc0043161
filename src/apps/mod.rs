//! # Aplicaciones de Ejemplo
//! src/apps/mod.rs
//!
//! Hooks que se registran antes de arrancar el listener, según el rol:
//!
//! | Rol       | Rutas                                                          |
//! |-----------|----------------------------------------------------------------|
//! | `tracker` | `POST /submit-info`, `GET /get-list`, `PUT /hello`             |
//! | `peer`    | `POST /send-peer`, `GET /get-messages`, `GET /get-connected-peers`, `PUT /hello` |
//!
//! Todas las rutas reciben además un registro `OPTIONS` que comparte un
//! único handler de preflight.
//!
//! Los errores de aplicación (campos faltantes) se responden como JSON
//! `{"status": "error", "reason": ...}`. Un body que no se puede decodificar
//! es un [`HookError`] y la conexión se cierra sin respuesta.

pub mod chat;
pub mod tracker;

use crate::http::{Headers, Method};
use crate::router::{Hook, HookError, JsonMap, RouteTable};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub use chat::{ChatMessage, Inbox};
pub use tracker::{PeerEntry, PeerRegistry};

/// Rol del proceso
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Role {
    Tracker,
    Peer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tracker => "tracker",
            Role::Peer => "peer",
        }
    }
}

/// Estado compartido por los hooks registrados
#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<PeerRegistry>,
    pub inbox: Arc<Inbox>,
}

/// Registra las rutas del rol en `routes` y retorna el estado compartido
pub fn register(routes: &mut RouteTable, role: Role, peer_ttl: Duration) -> AppState {
    let state = AppState {
        registry: Arc::new(PeerRegistry::new(peer_ttl)),
        inbox: Arc::new(Inbox::new()),
    };

    let paths: &[&str] = match role {
        Role::Tracker => {
            tracker::register(routes, Arc::clone(&state.registry));
            &["/submit-info", "/get-list", "/hello"]
        }
        Role::Peer => {
            chat::register(routes, Arc::clone(&state.inbox), Arc::clone(&state.registry));
            &["/send-peer", "/get-messages", "/get-connected-peers", "/hello"]
        }
    };

    routes.register(Method::PUT, "/hello", hello);

    let preflight = Hook::new(|_, _| Ok(status_ok()));
    for path in paths {
        routes.insert(Method::OPTIONS, path, preflight.clone());
    }

    tracing::info!(role = role.as_str(), routes = routes.len(), "Rutas de aplicación registradas");
    state
}

fn hello(headers: &Headers, body: &[u8]) -> Result<JsonMap, HookError> {
    tracing::info!(
        headers = headers.len(),
        body = %String::from_utf8_lossy(body),
        "PUT /hello"
    );
    Ok(status_ok())
}

/// `{"status": "ok"}`
pub fn status_ok() -> JsonMap {
    let mut map = JsonMap::new();
    map.insert("status".into(), "ok".into());
    map
}

/// `{"status": "error", "reason": <reason>}`
pub fn status_error(reason: impl Into<String>) -> JsonMap {
    let mut map = JsonMap::new();
    map.insert("status".into(), "error".into());
    map.insert("reason".into(), Value::String(reason.into()));
    map
}

/// Decodifica el body como JSON (si el `Content-Type` lo declara) o como
/// formulario. Un body vacío produce un mapa vacío.
pub fn parse_body(headers: &Headers, body: &[u8]) -> Result<JsonMap, HookError> {
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        return Ok(JsonMap::new());
    }

    let content_type = headers.get("content-type").unwrap_or("").to_ascii_lowercase();
    if content_type.contains("application/json") {
        return match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(HookError::InvalidBody("expected a JSON object".into())),
            Err(e) => Err(HookError::InvalidBody(e.to_string())),
        };
    }

    Ok(crate::session::accounts::parse_form(&text)
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k, Value::String(v)))
        .collect())
}

/// Campo no vacío del body; números y booleanos se aceptan tal cual
pub fn field<'a>(data: &'a JsonMap, key: &str) -> Option<&'a Value> {
    match data.get(key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        value => Some(value),
    }
}

/// Representación textual de un valor escalar (`"9000"` y `9000` → "9000")
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
