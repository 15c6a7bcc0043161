//! # Tracker de Peers
//! src/apps/tracker.rs
//!
//! Registro `(ip, port) → peer` con keep-alive: cada `POST /submit-info`
//! refresca `last_seen`; `GET /get-list` solo devuelve los peers vistos
//! dentro del TTL y elimina el resto.

use super::{field, parse_body, status_error, status_ok, value_text};
use crate::http::Method;
use crate::router::{HookError, JsonMap, RouteTable};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Peer registrado
#[derive(Debug, Clone, Serialize)]
pub struct PeerEntry {
    pub username: Option<String>,
    pub ip: String,

    /// Se conserva tal como llegó (número en JSON, texto en formularios)
    pub port: Value,

    #[serde(skip)]
    pub last_seen: Instant,
}

/// Registro de peers protegido por un `Mutex`
#[derive(Debug)]
pub struct PeerRegistry {
    peers: Mutex<HashMap<(String, String), PeerEntry>>,
    ttl: Duration,
}

impl PeerRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Registra o refresca un peer. Retorna `true` si es nuevo.
    pub fn touch(&self, ip: &str, port: Value, username: Option<String>) -> bool {
        let key = (ip.to_string(), value_text(&port));
        let entry = PeerEntry {
            username,
            ip: ip.to_string(),
            port,
            last_seen: Instant::now(),
        };

        let mut peers = self.peers.lock().unwrap_or_else(PoisonError::into_inner);
        peers.insert(key, entry).is_none()
    }

    /// Peers vistos dentro del TTL; los vencidos se eliminan
    pub fn alive(&self) -> Vec<PeerEntry> {
        let mut peers = self.peers.lock().unwrap_or_else(PoisonError::into_inner);
        peers.retain(|_, peer| peer.last_seen.elapsed() <= self.ttl);

        let mut alive: Vec<PeerEntry> = peers.values().cloned().collect();
        alive.sort_by(|a, b| a.last_seen.cmp(&b.last_seen));
        alive
    }

    pub fn len(&self) -> usize {
        self.peers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Respuesta de listado: `{"status": "ok", "peers": [...]}`
pub(crate) fn peer_list(peers: Vec<Value>) -> JsonMap {
    let mut out = status_ok();
    let empty = peers.is_empty();
    out.insert("peers".into(), Value::Array(peers));
    if empty {
        out.insert("message".into(), "No peers online".into());
    }
    out
}

pub fn register(routes: &mut RouteTable, registry: Arc<PeerRegistry>) {
    let submit = Arc::clone(&registry);
    routes.register(Method::POST, "/submit-info", move |headers, body| {
        submit_info(&submit, &parse_body(headers, body)?)
    });

    routes.register(Method::GET, "/get-list", move |_, _| get_list(&registry));
}

fn submit_info(registry: &PeerRegistry, data: &JsonMap) -> Result<JsonMap, HookError> {
    let (Some(ip), Some(port), Some(username)) =
        (field(data, "ip"), field(data, "port"), field(data, "username"))
    else {
        return Ok(status_error("Missing ip, port or username"));
    };

    let ip = value_text(ip);
    let username = value_text(username);
    if registry.touch(&ip, port.clone(), Some(username.clone())) {
        tracing::info!(ip = %ip, port = %value_text(port), user = %username, "Peer registrado");
    } else {
        tracing::debug!(ip = %ip, port = %value_text(port), "Peer refrescado (keep-alive)");
    }

    Ok(status_ok())
}

fn get_list(registry: &PeerRegistry) -> Result<JsonMap, HookError> {
    let peers = registry
        .alive()
        .into_iter()
        .map(|p| json!({ "username": p.username, "ip": p.ip, "port": p.port }))
        .collect();
    Ok(peer_list(peers))
}
