//! # Parser de Virtual Hosts
//! src/vhost/parser.rs
//!
//! Lee la configuración del proxy inverso:
//!
//! ```text
//! host "app1.local" {
//!     proxy_pass http://127.0.0.1:9001;
//!     proxy_pass http://127.0.0.1:9002;
//!     dist_policy least_conn;
//! }
//! ```
//!
//! Cada bloque produce un [`VirtualHost`] con sus backends en orden de
//! declaración y su política de distribución. Un bloque sin `proxy_pass`
//! se descarta con una advertencia.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const HOST_BLOCK: &str = r#"(?s)host\s+"([^"]+)"\s*\{(.*?)\}"#;
const PROXY_PASS: &str = r"proxy_pass\s+http://([^\s;]+);";
const DIST_POLICY: &str = r"dist_policy\s+([A-Za-z0-9\-_]+)";

#[derive(Debug, Error)]
pub enum VhostError {
    #[error("cannot read virtual host config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no host blocks found in virtual host config")]
    NoHostBlocks,

    #[error("no host block declares a backend")]
    NoRoutableHosts,

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Política para elegir un backend dentro de un host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistPolicy {
    #[default]
    RoundRobin,
    LeastConn,
    Random,
}

impl DistPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistPolicy::RoundRobin => "round-robin",
            DistPolicy::LeastConn => "least_conn",
            DistPolicy::Random => "random",
        }
    }
}

impl FromStr for DistPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "round-robin" => Ok(DistPolicy::RoundRobin),
            "least_conn" => Ok(DistPolicy::LeastConn),
            "random" => Ok(DistPolicy::Random),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for DistPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host enrutable: nombre, backends (nunca vacío) y política
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualHost {
    pub name: String,
    pub backends: Vec<String>,
    pub policy: DistPolicy,
}

/// Hosts indexados por nombre; el orden del mapa es estable
pub type VirtualHosts = BTreeMap<String, VirtualHost>;

/// Parsea el texto de configuración
///
/// # Ejemplo
/// ```
/// use http_appserver::vhost::{parse_virtual_hosts, DistPolicy};
///
/// let text = r#"
/// host "app.local" {
///     proxy_pass http://127.0.0.1:9001;
///     proxy_pass http://127.0.0.1:9002;
///     dist_policy random;
/// }
/// "#;
///
/// let hosts = parse_virtual_hosts(text).unwrap();
/// let app = &hosts["app.local"];
/// assert_eq!(app.backends, vec!["127.0.0.1:9001", "127.0.0.1:9002"]);
/// assert_eq!(app.policy, DistPolicy::Random);
/// ```
pub fn parse_virtual_hosts(text: &str) -> Result<VirtualHosts, VhostError> {
    let host_re = Regex::new(HOST_BLOCK)?;
    let proxy_re = Regex::new(PROXY_PASS)?;
    let policy_re = Regex::new(DIST_POLICY)?;

    let mut hosts = VirtualHosts::new();
    let mut blocks = 0usize;

    for caps in host_re.captures_iter(text) {
        blocks += 1;
        let name = caps[1].to_string();
        let body = &caps[2];

        let backends: Vec<String> = proxy_re
            .captures_iter(body)
            .map(|c| c[1].to_string())
            .collect();

        if backends.is_empty() {
            tracing::warn!(host = %name, "Host sin proxy_pass: se omite");
            continue;
        }

        let policy = match policy_re.captures(body) {
            None => {
                tracing::warn!(host = %name, "Sin dist_policy: se usa round-robin");
                DistPolicy::RoundRobin
            }
            Some(c) => c[1].parse().unwrap_or_else(|unknown: String| {
                tracing::warn!(host = %name, policy = %unknown, "dist_policy desconocida: se usa round-robin");
                DistPolicy::RoundRobin
            }),
        };

        tracing::debug!(host = %name, backends = backends.len(), policy = %policy, "Virtual host");

        if hosts.contains_key(&name) {
            tracing::warn!(host = %name, "Host repetido: gana el último bloque");
        }
        hosts.insert(name.clone(), VirtualHost { name, backends, policy });
    }

    if blocks == 0 {
        return Err(VhostError::NoHostBlocks);
    }
    if hosts.is_empty() {
        return Err(VhostError::NoRoutableHosts);
    }

    Ok(hosts)
}

/// Lee y parsea el archivo de configuración
pub fn load_virtual_hosts(path: &Path) -> Result<VirtualHosts, VhostError> {
    let text = fs::read_to_string(path).map_err(|source| VhostError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_virtual_hosts(&text)
}
