//! # HTTP App Server
//! src/lib.rs
//!
//! Servidor de aplicaciones HTTP/1.1 sobre sockets bloqueantes, con un
//! thread por conexión, y un proxy inverso por virtual host.
//!
//! ## Arquitectura
//!
//! - `http`: parsing de requests, construcción de respuestas, tipos MIME
//! - `router`: tabla `(método, path) → hook`
//! - `session`: sesiones, gate de acceso y login
//! - `server`: listener TCP, máquina de estados por conexión, archivos estáticos
//! - `vhost`: configuración de virtual hosts y selección de backend
//! - `proxy`: reenvío de requests hacia los backends
//! - `apps`: hooks de ejemplo (tracker de peers y bandeja de mensajes)
//! - `config`, `logging`: configuración CLI/env y suscriptor de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use http_appserver::router::RouteTable;
//! use http_appserver::server::{AppContext, Limits, Server, StaticFiles};
//! use http_appserver::session::{Accounts, SessionStore};
//!
//! let context = AppContext {
//!     routes: RouteTable::new(),
//!     sessions: SessionStore::default(),
//!     accounts: Accounts::default(),
//!     static_files: StaticFiles::new("."),
//!     limits: Limits::default(),
//! };
//!
//! let server = Server::bind("127.0.0.1:8000", context).expect("bind");
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod apps;
pub mod config;
pub mod http;
pub mod logging;
pub mod proxy;
pub mod router;
pub mod server;
pub mod session;
pub mod vhost;
