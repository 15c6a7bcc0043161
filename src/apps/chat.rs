//! # Bandeja de Mensajes del Peer
//! src/apps/chat.rs
//!
//! `POST /send-peer` deja un mensaje en la bandeja y registra al remitente
//! como peer conectado; `GET /get-messages` devuelve la bandeja completa.
//! La bandeja guarda como máximo [`MAX_MESSAGES`]; al llenarse se descarta
//! el mensaje más antiguo. `GET /get-connected-peers` usa el mismo TTL que
//! el tracker para olvidar remitentes inactivos.

use super::tracker::{peer_list, PeerRegistry};
use super::{field, parse_body, status_error, status_ok, value_text};
use crate::http::Method;
use crate::router::{HookError, JsonMap, RouteTable};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub username: Option<String>,
    pub sender_ip: String,
    pub sender_port: Value,
    pub message: String,
}

/// Capacidad por defecto de la bandeja
pub const MAX_MESSAGES: usize = 1000;

/// Mensajes recibidos, en orden de llegada
#[derive(Debug)]
pub struct Inbox {
    messages: Mutex<VecDeque<ChatMessage>>,
    capacity: usize,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub fn new() -> Self {
        Self::with_capacity(MAX_MESSAGES)
    }

    /// Bandeja acotada a `capacity` mensajes (mínimo 1)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, message: ChatMessage) {
        let mut messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        while messages.len() >= self.capacity {
            messages.pop_front();
        }
        messages.push_back(message);
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        let messages = self.messages.lock().unwrap_or_else(PoisonError::into_inner);
        messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn register(routes: &mut RouteTable, inbox: Arc<Inbox>, registry: Arc<PeerRegistry>) {
    let send_inbox = Arc::clone(&inbox);
    let send_registry = Arc::clone(&registry);
    routes.register(Method::POST, "/send-peer", move |headers, body| {
        send_peer(&send_inbox, &send_registry, &parse_body(headers, body)?)
    });

    routes.register(Method::GET, "/get-messages", move |_, _| get_messages(&inbox));

    routes.register(Method::GET, "/get-connected-peers", move |_, _| {
        let peers = registry
            .alive()
            .into_iter()
            .map(|p| json!({ "ip": p.ip, "port": p.port }))
            .collect();
        Ok(peer_list(peers))
    });
}

fn send_peer(inbox: &Inbox, registry: &PeerRegistry, data: &JsonMap) -> Result<JsonMap, HookError> {
    let (Some(sender_ip), Some(sender_port)) = (field(data, "sender_ip"), field(data, "sender_port")) else {
        return Ok(status_error("Missing sender_ip or sender_port"));
    };

    let Some(text) = ["message", "msg", "text"]
        .iter()
        .find_map(|key| field(data, key))
        .map(value_text)
    else {
        return Ok(status_error("Missing message content"));
    };

    let username = field(data, "username").map(value_text);
    let sender_ip = value_text(sender_ip);

    tracing::info!(from = %sender_ip, port = %value_text(sender_port), "Mensaje recibido");
    registry.touch(&sender_ip, sender_port.clone(), username.clone());
    inbox.push(ChatMessage {
        username,
        sender_ip,
        sender_port: sender_port.clone(),
        message: text,
    });

    Ok(status_ok())
}

fn get_messages(inbox: &Inbox) -> Result<JsonMap, HookError> {
    let messages = serde_json::to_value(inbox.snapshot())
        .map_err(|e| HookError::Failed(e.to_string()))?;

    let mut out = status_ok();
    out.insert("messages".into(), messages);
    Ok(out)
}
