//! # Configuración
//! src/config.rs
//!
//! Configuración de los dos binarios con soporte para argumentos CLI y
//! variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./http_appserver --port 9000 --role tracker --static-root ./site
//! ./proxy --port 8080 --vhosts config/proxy.conf
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=9000 APP_ROLE=tracker SESSION_TTL=0 ./http_appserver
//! ```

use crate::apps::Role;
use crate::proxy::ProxySettings;
use crate::server::Limits;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be > 0")]
    Zero(&'static str),
}

/// Configuración del servidor de aplicación
#[derive(Debug, Clone, Parser)]
#[command(name = "http_appserver")]
#[command(about = "Servidor de aplicaciones HTTP/1.1 con sesiones y archivos estáticos")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Rol de la aplicación de ejemplo (define qué hooks se registran)
    #[arg(long, value_enum, default_value = "peer", env = "APP_ROLE")]
    pub role: Role,

    /// Raíz de los directorios www/, static/, apps/, videos/, audios/
    #[arg(long = "static-root", default_value = ".", env = "STATIC_ROOT")]
    pub static_root: PathBuf,

    /// Archivo JSON con las cuentas de usuario
    #[arg(long = "accounts-file", default_value = "db/account.json", env = "ACCOUNTS_FILE")]
    pub accounts_file: PathBuf,

    /// Vida de una sesión en segundos (0 = no vence)
    #[arg(long = "session-ttl", default_value = "3600", env = "SESSION_TTL")]
    pub session_ttl_secs: u64,

    // === Límites de conexión ===
    /// Timeout de lectura del request en milisegundos
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Tamaño máximo de un request en bytes
    #[arg(long = "max-request-bytes", default_value = "1048576", env = "MAX_REQUEST_BYTES")]
    pub max_request_bytes: usize,

    /// Segundos sin keep-alive tras los cuales un peer deja de listarse
    #[arg(long = "peer-ttl", default_value = "180", env = "PEER_TTL")]
    pub peer_ttl_secs: u64,
}

impl Config {
    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use http_appserver::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        match self.session_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn peer_ttl(&self) -> Duration {
        Duration::from_secs(self.peer_ttl_secs)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            max_request_bytes: self.max_request_bytes,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Zero("read timeout"));
        }
        if self.max_request_bytes == 0 {
            return Err(ConfigError::Zero("max request bytes"));
        }
        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("⚙️  Configuración:");
        println!("   Dirección:    {}", self.address());
        println!("   Rol:          {}", self.role.as_str());
        println!("   Static root:  {}", self.static_root.display());
        println!("   Cuentas:      {}", self.accounts_file.display());
        match self.session_ttl() {
            Some(ttl) => println!("   Sesiones:     vencen a los {} s", ttl.as_secs()),
            None => println!("   Sesiones:     sin vencimiento"),
        }
        println!("   Read timeout: {} ms", self.read_timeout_ms);
        println!("   Max request:  {} bytes", self.max_request_bytes);
        println!();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "127.0.0.1".to_string(),
            role: Role::Peer,
            static_root: PathBuf::from("."),
            accounts_file: PathBuf::from("db/account.json"),
            session_ttl_secs: 3600,
            read_timeout_ms: 5000,
            max_request_bytes: 1024 * 1024,
            peer_ttl_secs: 180,
        }
    }
}

/// Configuración del proxy inverso
#[derive(Debug, Clone, Parser)]
#[command(name = "proxy")]
#[command(about = "Proxy inverso HTTP por virtual host")]
#[command(version = "0.1.0")]
pub struct ProxyConfig {
    #[arg(short, long, default_value = "8080", env = "PROXY_PORT")]
    pub port: u16,

    #[arg(long, default_value = "0.0.0.0", env = "PROXY_HOST")]
    pub host: String,

    /// Archivo con los bloques `host "<name>" { ... }`
    #[arg(long, default_value = "config/proxy.conf", env = "PROXY_VHOSTS")]
    pub vhosts: PathBuf,

    /// Timeout de conexión y lectura hacia el backend en milisegundos
    #[arg(long = "backend-timeout-ms", default_value = "5000", env = "BACKEND_TIMEOUT_MS")]
    pub backend_timeout_ms: u64,

    #[arg(long = "read-timeout-ms", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    #[arg(long = "max-request-bytes", default_value = "1048576", env = "MAX_REQUEST_BYTES")]
    pub max_request_bytes: usize,
}

impl ProxyConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn settings(&self) -> ProxySettings {
        ProxySettings {
            backend_timeout: Duration::from_millis(self.backend_timeout_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            max_request_bytes: self.max_request_bytes,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_timeout_ms == 0 {
            return Err(ConfigError::Zero("backend timeout"));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::Zero("read timeout"));
        }
        if self.max_request_bytes == 0 {
            return Err(ConfigError::Zero("max request bytes"));
        }
        Ok(())
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            vhosts: PathBuf::from("config/proxy.conf"),
            backend_timeout_ms: 5000,
            read_timeout_ms: 5000,
            max_request_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.role, Role::Peer);
        assert_eq!(config.session_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(config.peer_ttl(), Duration::from_secs(180));
    }

    #[test]
    fn test_defaults_match_cli() {
        let parsed = Config::try_parse_from(["http_appserver"]).unwrap();
        let default = Config::default();

        assert_eq!(parsed.port, default.port);
        assert_eq!(parsed.role, default.role);
        assert_eq!(parsed.static_root, default.static_root);
        assert_eq!(parsed.max_request_bytes, default.max_request_bytes);
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::try_parse_from([
            "http_appserver",
            "--port",
            "9000",
            "--role",
            "tracker",
            "--session-ttl",
            "0",
        ])
        .unwrap();

        assert_eq!(config.address(), "127.0.0.1:9000");
        assert_eq!(config.role, Role::Tracker);
        assert_eq!(config.session_ttl(), None);
    }

    #[test]
    fn test_invalid_role_rejected() {
        assert!(Config::try_parse_from(["http_appserver", "--role", "admin"]).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.read_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("read timeout")));

        let mut config = Config::default();
        config.max_request_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max request bytes"));
    }

    #[test]
    fn test_limits() {
        let limits = Config::default().limits();
        assert_eq!(limits.read_timeout, Duration::from_millis(5000));
        assert_eq!(limits.max_request_bytes, 1024 * 1024);
    }

    #[test]
    fn test_proxy_config() {
        let config = ProxyConfig::default();
        assert_eq!(config.address(), "0.0.0.0:8080");
        assert!(config.validate().is_ok());
        assert_eq!(config.settings().backend_timeout, Duration::from_millis(5000));

        let mut config = ProxyConfig::default();
        config.backend_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("backend timeout")));
    }

    #[test]
    fn test_config_print_summary() {
        // No debe hacer panic
        Config::default().print_summary();
    }
}
