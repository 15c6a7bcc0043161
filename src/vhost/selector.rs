//! # Selector de Backends
//! src/vhost/selector.rs
//!
//! ```text
//! Host → BackendPool → estrategia (round-robin | least_conn | random)
//!      → Backend → BackendGuard (cuenta la conexión mientras vive)
//! ```
//!
//! El contador de conexiones activas de cada backend lo mantiene el
//! [`BackendGuard`]: se incrementa al seleccionar y se decrementa en `Drop`,
//! así least_conn ve las conexiones que el proxy tiene abiertas en ese momento.

use super::parser::{DistPolicy, VirtualHost, VirtualHosts};
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Un backend con su contador de conexiones en curso
#[derive(Debug)]
pub struct Backend {
    pub addr: String,
    active_connections: AtomicUsize,
}

impl Backend {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            active_connections: AtomicUsize::new(0),
        }
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Marca una conexión nueva; se libera al soltar el guard
    pub fn acquire(self: &Arc<Self>) -> BackendGuard {
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        BackendGuard {
            backend: Arc::clone(self),
        }
    }
}

/// Guard RAII de una conexión proxied
#[derive(Debug)]
pub struct BackendGuard {
    backend: Arc<Backend>,
}

impl Deref for BackendGuard {
    type Target = Backend;

    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendGuard {
    fn drop(&mut self) {
        self.backend.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Algoritmo de selección sobre una lista de backends
pub trait Strategy: Send + Sync + fmt::Debug {
    fn pick(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}

/// Recorre la lista en orden de declaración y vuelve al inicio
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl Strategy for RoundRobin {
    fn pick(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        if backends.is_empty() {
            return None;
        }
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % backends.len();
        Some(Arc::clone(&backends[index]))
    }
}

/// El de menos conexiones abiertas; en empate, el primero declarado
#[derive(Debug, Default)]
pub struct LeastConnections;

impl Strategy for LeastConnections {
    fn pick(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        backends
            .iter()
            .min_by_key(|b| b.active_connections())
            .cloned()
    }
}

/// Uniforme en cada llamada, sin estado entre llamadas
#[derive(Debug, Default)]
pub struct RandomPick;

impl Strategy for RandomPick {
    fn pick(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        if backends.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..backends.len());
        Some(Arc::clone(&backends[index]))
    }
}

fn strategy_for(policy: DistPolicy) -> Box<dyn Strategy> {
    match policy {
        DistPolicy::RoundRobin => Box::new(RoundRobin::default()),
        DistPolicy::LeastConn => Box::new(LeastConnections),
        DistPolicy::Random => Box::new(RandomPick),
    }
}

/// Backends de un virtual host con su estrategia
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    policy: DistPolicy,
    strategy: Box<dyn Strategy>,
}

impl BackendPool {
    pub fn new(addrs: &[String], policy: DistPolicy) -> Self {
        Self {
            backends: addrs.iter().map(|a| Arc::new(Backend::new(a.as_str()))).collect(),
            policy,
            strategy: strategy_for(policy),
        }
    }

    pub fn policy(&self) -> DistPolicy {
        self.policy
    }

    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Elige un backend y cuenta la conexión hasta que se suelte el guard
    pub fn select(&self) -> Option<BackendGuard> {
        self.strategy.pick(&self.backends).map(|b| b.acquire())
    }
}

impl From<&VirtualHost> for BackendPool {
    fn from(host: &VirtualHost) -> Self {
        Self::new(&host.backends, host.policy)
    }
}

/// Tabla host → pool usada por el proxy
#[derive(Debug, Default)]
pub struct Balancer {
    pools: HashMap<String, BackendPool>,
}

impl Balancer {
    pub fn new(hosts: &VirtualHosts) -> Self {
        let pools = hosts
            .iter()
            .map(|(name, host)| (name.clone(), BackendPool::from(host)))
            .collect();
        Self { pools }
    }

    /// Selecciona un backend para `host`; `None` si el host no existe
    pub fn select(&self, host: &str) -> Option<BackendGuard> {
        match self.pools.get(host) {
            Some(pool) => pool.select(),
            None => {
                tracing::debug!(host = %host, "Host sin virtual host configurado");
                None
            }
        }
    }

    pub fn pool(&self, host: &str) -> Option<&BackendPool> {
        self.pools.get(host)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
