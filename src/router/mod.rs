//! # Tabla de Rutas
//! src/router/mod.rs
//!
//! Mapea pares `(método, path)` a hooks de aplicación. La tabla se construye
//! una sola vez al arrancar y después solo se lee, así que puede compartirse
//! entre threads con un `Arc` sin sincronización adicional.
//!
//! ```text
//! Request → (method, path) → RouteTable::lookup → Some(Hook) | None
//! ```
//!
//! No hay comodines ni prefijos: la comparación es exacta. Si se registra dos
//! veces el mismo par, gana el último registro.

use crate::http::{Headers, Method};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Resultado estructurado de un hook; se serializa como objeto JSON
/// respetando el orden de inserción de los campos.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Falla a nivel de hook. El servidor la registra y cierra la conexión
/// sin enviar respuesta.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("hook failed: {0}")]
    Failed(String),
}

type HookFn = dyn Fn(&Headers, &[u8]) -> Result<JsonMap, HookError> + Send + Sync;

/// Handler registrado para un `(método, path)`
///
/// Clonar un `Hook` es barato: todas las copias comparten el mismo closure.
#[derive(Clone)]
pub struct Hook {
    handler: Arc<HookFn>,
}

impl Hook {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Headers, &[u8]) -> Result<JsonMap, HookError> + Send + Sync + 'static,
    {
        Self { handler: Arc::new(handler) }
    }

    /// Invoca el handler con los headers y el body del request
    pub fn call(&self, headers: &Headers, body: &[u8]) -> Result<JsonMap, HookError> {
        (self.handler)(headers, body)
    }

    /// Indica si dos hooks comparten el mismo handler subyacente
    pub fn same_handler(&self, other: &Hook) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

/// Tabla de rutas de solo lectura tras el arranque
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: HashMap<(Method, String), Hook>,
}

impl RouteTable {
    /// Crea una tabla vacía
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un hook para un par `(método, path)`
    ///
    /// # Ejemplo
    /// ```
    /// use http_appserver::http::Method;
    /// use http_appserver::router::{JsonMap, RouteTable};
    ///
    /// let mut routes = RouteTable::new();
    /// routes.register(Method::GET, "/hello", |_headers, _body| {
    ///     let mut out = JsonMap::new();
    ///     out.insert("status".into(), "ok".into());
    ///     Ok(out)
    /// });
    /// assert!(routes.lookup(Method::GET, "/hello").is_some());
    /// assert!(routes.lookup(Method::POST, "/hello").is_none());
    /// ```
    pub fn register<F>(&mut self, method: Method, path: &str, handler: F)
    where
        F: Fn(&Headers, &[u8]) -> Result<JsonMap, HookError> + Send + Sync + 'static,
    {
        self.insert(method, path, Hook::new(handler));
    }

    /// Registra el mismo handler bajo varios métodos para un path.
    /// Cada método produce una entrada independiente que comparte el handler.
    pub fn register_many<F>(&mut self, methods: &[Method], path: &str, handler: F)
    where
        F: Fn(&Headers, &[u8]) -> Result<JsonMap, HookError> + Send + Sync + 'static,
    {
        let hook = Hook::new(handler);
        for method in methods {
            self.insert(*method, path, hook.clone());
        }
    }

    /// Inserta un hook ya construido (último registro gana)
    pub fn insert(&mut self, method: Method, path: &str, hook: Hook) {
        self.routes.insert((method, path.to_string()), hook);
    }

    /// Búsqueda exacta
    pub fn lookup(&self, method: Method, path: &str) -> Option<Hook> {
        self.routes.get(&(method, path.to_string())).cloned()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Pares registrados, ordenados por path y método (útil para logs)
    pub fn entries(&self) -> Vec<(Method, &str)> {
        let mut entries: Vec<(Method, &str)> = self
            .routes
            .keys()
            .map(|(method, path)| (*method, path.as_str()))
            .collect();
        entries.sort_by(|a, b| a.1.cmp(b.1).then(a.0.as_str().cmp(b.0.as_str())));
        entries
    }
}
