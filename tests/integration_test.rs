//! Tests de integración para el servidor de aplicación y el proxy
//! tests/integration_test.rs
//!
//! Cada test levanta sus propios servidores en 127.0.0.1:0 dentro del
//! proceso; no hace falta tener nada corriendo.

use http_appserver::apps::{self, Role};
use http_appserver::proxy::{Proxy, ProxySettings};
use http_appserver::router::RouteTable;
use http_appserver::server::{AppContext, Limits, Server, StaticFiles};
use http_appserver::session::{Account, Accounts, SessionStore};
use http_appserver::vhost::{parse_virtual_hosts, Balancer};
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Crea una raíz estática con páginas y un css que identifica al servidor
fn static_root(tag: &str) -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    fs::create_dir_all(root.join("www")).unwrap();
    fs::create_dir_all(root.join("static/css")).unwrap();
    fs::write(root.join("www/index.html"), format!("<h1>index {}</h1>", tag)).unwrap();
    fs::write(root.join("www/login.html"), "<form action=\"/login\"></form>").unwrap();
    fs::write(root.join("static/css/id.css"), format!("/* {} */", tag)).unwrap();
    dir
}

fn start_app(root: &Path, role: Role) -> SocketAddr {
    let mut routes = RouteTable::new();
    apps::register(&mut routes, role, Duration::from_secs(180));

    let context = AppContext {
        routes,
        sessions: SessionStore::new(Some(Duration::from_secs(60))),
        accounts: Accounts::new(vec![Account {
            username: "admin".into(),
            password: "admin123".into(),
        }]),
        static_files: StaticFiles::new(root),
        limits: Limits {
            read_timeout: Duration::from_secs(2),
            max_request_bytes: 64 * 1024,
        },
    };

    let server = Server::bind("127.0.0.1:0", context).expect("bind");
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());
    addr
}

/// Envía un request crudo y retorna la response completa
fn send(addr: SocketAddr, raw: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream.set_write_timeout(Some(Duration::from_secs(5)))?;

    stream.write_all(raw.as_bytes())?;
    stream.flush()?;

    let mut response = String::new();
    stream.read_to_string(&mut response)?;
    Ok(response)
}

fn extract_body(response: &str) -> &str {
    match response.find("\r\n\r\n") {
        Some(pos) => &response[pos + 4..],
        None => "",
    }
}

fn header<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    let head = response.split("\r\n\r\n").next()?;
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(": ")?;
        key.eq_ignore_ascii_case(name).then_some(value)
    })
}

#[test]
fn test_login_flow() {
    let root = static_root("A");
    let addr = start_app(root.path(), Role::Peer);

    // Sin cookie → página de login con 302
    let response = send(addr, "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();
    assert!(response.starts_with("HTTP/1.1 302 Found\r\n"), "got: {}", response);
    assert_eq!(header(&response, "Location"), Some("/login.html"));
    assert!(extract_body(&response).contains("<form"));

    // Login correcto → 200, index y cookie
    let body = "username=admin&password=admin123";
    let login = format!(
        "POST /login HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let response = send(addr, &login).unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(extract_body(&response), "<h1>index A</h1>");

    let set_cookie = header(&response, "Set-Cookie").expect("Set-Cookie");
    assert!(set_cookie.starts_with("sessionid="));
    assert!(set_cookie.ends_with("; Path=/; HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap();

    // Con la cookie → 200
    let request = format!("GET /index.html HTTP/1.1\r\nCookie: {}\r\n\r\n", cookie);
    let response = send(addr, &request).unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(extract_body(&response), "<h1>index A</h1>");

    // Archivo inexistente con sesión → 404 con body fijo
    let request = format!("GET /does-not-exist.html HTTP/1.1\r\nCookie: {}\r\n\r\n", cookie);
    let response = send(addr, &request).unwrap();
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert_eq!(extract_body(&response), "404 Not Found");
}

#[test]
fn test_wrong_password_is_401() {
    let root = static_root("A");
    let addr = start_app(root.path(), Role::Peer);

    let body = "username=admin&password=wrong";
    let login = format!("POST /login HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}", body.len(), body);
    let response = send(addr, &login).unwrap();

    assert!(response.starts_with("HTTP/1.1 401 Unauthorized\r\n"));
    assert!(extract_body(&response).contains("401 Unauthorized"));
    assert!(header(&response, "Set-Cookie").is_none());
}

#[test]
fn test_standard_headers() {
    let root = static_root("A");
    let addr = start_app(root.path(), Role::Peer);

    let response = send(addr, "GET /css/id.css HTTP/1.1\r\nUser-Agent: it/1.0\r\n\r\n").unwrap();
    let body = extract_body(&response);

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(header(&response, "Content-Type"), Some("text/css"));
    assert_eq!(header(&response, "Content-Length"), Some(body.len().to_string().as_str()));
    assert_eq!(header(&response, "Connection"), Some("close"));
    assert_eq!(header(&response, "Cache-Control"), Some("no-cache"));
    assert_eq!(header(&response, "User-Agent"), Some("it/1.0"));
    assert!(header(&response, "Date").unwrap().ends_with("GMT"));
}

#[test]
fn test_options_preflight_on_hook_path() {
    let root = static_root("A");
    let addr = start_app(root.path(), Role::Tracker);

    let response = send(addr, "OPTIONS /submit-info HTTP/1.1\r\n\r\n").unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(extract_body(&response), "");
    assert_eq!(header(&response, "Content-Length"), Some("0"));
    assert_eq!(header(&response, "Access-Control-Allow-Origin"), Some("*"));
    assert!(header(&response, "Access-Control-Allow-Methods").is_some());
    assert!(header(&response, "Access-Control-Allow-Headers").is_some());
}

#[test]
fn test_tracker_hooks_return_json() {
    let root = static_root("A");
    let addr = start_app(root.path(), Role::Tracker);

    let body = r#"{"ip": "10.0.0.7", "port": 9007, "username": "carol"}"#;
    let submit = format!(
        "POST /submit-info HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let response = send(addr, &submit).unwrap();
    assert_eq!(header(&response, "Content-Type"), Some("application/json"));
    assert_eq!(extract_body(&response), r#"{"status":"ok"}"#);

    let response = send(addr, "GET /get-list HTTP/1.1\r\n\r\n").unwrap();
    let json: serde_json::Value = serde_json::from_str(extract_body(&response)).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["peers"][0]["username"], "carol");
    assert_eq!(json["peers"][0]["port"], 9007);
}

#[test]
fn test_hook_with_malformed_json_closes_without_response() {
    let root = static_root("A");
    let addr = start_app(root.path(), Role::Tracker);

    let body = "{broken";
    let submit = format!(
        "POST /submit-info HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let response = send(addr, &submit).unwrap();
    assert!(response.is_empty());
}

#[test]
fn test_proxy_round_trip_two_backends() {
    let root_a = static_root("A");
    let root_b = static_root("B");
    let backend_a = start_app(root_a.path(), Role::Peer);
    let backend_b = start_app(root_b.path(), Role::Peer);

    let config = format!(
        "host \"app.local\" {{\n    proxy_pass http://{};\n    proxy_pass http://{};\n    dist_policy round-robin;\n}}\n",
        backend_a, backend_b
    );
    let hosts = parse_virtual_hosts(&config).unwrap();
    let proxy = Proxy::bind("127.0.0.1:0", Balancer::new(&hosts), ProxySettings::default()).unwrap();
    let proxy_addr = proxy.local_addr().unwrap();
    thread::spawn(move || proxy.run());

    let request = "GET /css/id.css HTTP/1.1\r\nHost: app.local:8080\r\n\r\n";
    let bodies: Vec<String> = (0..4)
        .map(|_| extract_body(&send(proxy_addr, request).unwrap()).to_string())
        .collect();

    assert_eq!(bodies, vec!["/* A */", "/* B */", "/* A */", "/* B */"]);

    let response = send(proxy_addr, "GET / HTTP/1.1\r\nHost: unknown.local\r\n\r\n").unwrap();
    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
}
