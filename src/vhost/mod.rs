//! # Virtual Hosts
//!
//! - `parser`: configuración `host "<name>" { proxy_pass ...; dist_policy ...; }`
//! - `selector`: elección de backend por host según la política

pub mod parser;
pub mod selector;

pub use parser::{load_virtual_hosts, parse_virtual_hosts, DistPolicy, VhostError, VirtualHost, VirtualHosts};
pub use selector::{Backend, BackendGuard, BackendPool, Balancer};
