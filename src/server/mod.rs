//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! 1. `tcp`: escucha en un puerto y lanza un thread por conexión
//! 2. `connection`: lee, parsea, despacha y responde un request
//! 3. `static_files`: sirve objetos desde disco según su tipo MIME

pub mod connection;
pub mod static_files;
pub mod tcp;

pub use connection::{dispatch, handle_connection, handle_request, AppContext, Dispatch, Limits, Outcome};
pub use static_files::StaticFiles;
pub use tcp::Server;
