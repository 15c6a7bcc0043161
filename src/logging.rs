//! # Logging
//! src/logging.rs
//!
//! Suscriptor de `tracing` compartido por los dos binarios. El filtro se
//! toma de `RUST_LOG`; sin esa variable se usa `http_appserver=info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "http_appserver=info";

/// Inicializa el suscriptor global. Llamadas posteriores no tienen efecto.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
