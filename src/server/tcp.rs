//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Acepta conexiones y atiende cada una en su propio thread. El estado
//! compartido (rutas, sesiones, cuentas) vive en un `Arc<AppContext>`.
//!
//! Si las sesiones tienen TTL, un thread aparte purga las vencidas cada TTL
//! para que las que nunca se vuelven a presentar no queden en memoria.

use super::connection::{handle_connection, AppContext};
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Piso del intervalo de limpieza (un TTL de cero no debe girar en vacío)
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Servidor HTTP con un thread por conexión
pub struct Server {
    listener: TcpListener,
    context: Arc<AppContext>,
}

impl Server {
    /// Hace bind en `address` (ej: "127.0.0.1:8000"; puerto 0 = efímero)
    pub fn bind(address: &str, context: AppContext) -> io::Result<Self> {
        let listener = TcpListener::bind(address)?;
        Ok(Self {
            listener,
            context: Arc::new(context),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn context(&self) -> Arc<AppContext> {
        Arc::clone(&self.context)
    }

    /// Lanza el thread que purga sesiones vencidas cada TTL.
    /// Retorna `None` si las sesiones no vencen.
    ///
    /// El thread guarda solo una referencia débil al contexto y termina
    /// cuando el servidor se libera.
    pub fn spawn_session_sweeper(&self) -> io::Result<Option<JoinHandle<()>>> {
        let Some(ttl) = self.context.sessions.ttl() else {
            return Ok(None);
        };
        let interval = ttl.max(MIN_SWEEP_INTERVAL);
        let context = Arc::downgrade(&self.context);

        let handle = thread::Builder::new()
            .name("session-sweeper".to_string())
            .spawn(move || loop {
                thread::sleep(interval);
                let Some(context) = context.upgrade() else {
                    break;
                };

                let purged = context.sessions.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, remaining = context.sessions.len(), "Sesiones vencidas eliminadas");
                }
            })?;

        tracing::info!(interval_ms = interval.as_millis() as u64, "Limpieza de sesiones activa");
        Ok(Some(handle))
    }

    /// Loop de aceptación; solo retorna si el listener falla al iniciar
    pub fn run(self) -> io::Result<()> {
        let address = self.local_addr()?;
        tracing::info!(address = %address, "Servidor escuchando (un thread por conexión)");

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let context = Arc::clone(&self.context);
                    let spawned = thread::Builder::new()
                        .name("http-conn".to_string())
                        .spawn(move || {
                            if let Err(e) = handle_connection(stream, &context) {
                                tracing::error!(error = %e, "Error en thread de conexión");
                            }
                        });

                    if let Err(e) = spawned {
                        tracing::error!(error = %e, "No se pudo crear el thread de conexión");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Error al aceptar conexión");
                }
            }
        }

        Ok(())
    }
}
