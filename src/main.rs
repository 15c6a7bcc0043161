//! # HTTP App Server - Entry Point
//! src/main.rs

use clap::Parser;
use http_appserver::apps;
use http_appserver::config::Config;
use http_appserver::logging;
use http_appserver::router::RouteTable;
use http_appserver::server::{AppContext, Server, StaticFiles};
use http_appserver::session::{Accounts, SessionStore};

fn main() {
    println!("=================================");
    println!("  RedUnix HTTP/1.1 App Server");
    println!("=================================\n");

    logging::init();

    let config = Config::parse();
    if let Err(e) = config.validate() {
        eprintln!("💥 Configuración inválida: {}", e);
        std::process::exit(1);
    }
    config.print_summary();

    let mut routes = RouteTable::new();
    apps::register(&mut routes, config.role, config.peer_ttl());
    for (method, path) in routes.entries() {
        tracing::debug!(method = %method, path = %path, "Ruta registrada");
    }

    let context = AppContext {
        routes,
        sessions: SessionStore::new(config.session_ttl()),
        accounts: Accounts::load_or_empty(&config.accounts_file),
        static_files: StaticFiles::new(&config.static_root),
        limits: config.limits(),
    };

    let server = match Server::bind(&config.address(), context) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("💥 No se pudo escuchar en {}: {}", config.address(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.spawn_session_sweeper() {
        eprintln!("💥 No se pudo iniciar la limpieza de sesiones: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        eprintln!("💥 Error fatal: {}", e);
        std::process::exit(1);
    }
}
