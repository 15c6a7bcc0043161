//! # Proxy Inverso - Entry Point
//! src/bin/proxy.rs

use clap::Parser;
use http_appserver::config::ProxyConfig;
use http_appserver::logging;
use http_appserver::proxy::Proxy;
use http_appserver::vhost::{load_virtual_hosts, Balancer};

fn main() {
    println!("=================================");
    println!("  RedUnix Reverse Proxy");
    println!("=================================\n");

    logging::init();

    let config = ProxyConfig::parse();
    if let Err(e) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", e);
        std::process::exit(1);
    }

    let hosts = match load_virtual_hosts(&config.vhosts) {
        Ok(hosts) => hosts,
        Err(e) => {
            eprintln!("💥 {}", e);
            std::process::exit(1);
        }
    };

    for host in hosts.values() {
        tracing::info!(
            host = %host.name,
            backends = ?host.backends,
            policy = %host.policy,
            "Virtual host cargado"
        );
    }

    let proxy = match Proxy::bind(&config.address(), Balancer::new(&hosts), config.settings()) {
        Ok(proxy) => proxy,
        Err(e) => {
            eprintln!("💥 No se pudo escuchar en {}: {}", config.address(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = proxy.run() {
        eprintln!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }
}
